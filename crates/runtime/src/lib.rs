pub mod poller;
pub mod stats;

pub use poller::*;
pub use stats::*;
