pub mod globe;
pub mod vec;

pub use globe::*;
pub use vec::*;
