pub mod overlay;
pub mod projector;
pub mod satellites;
pub mod symbology;

pub use overlay::*;
pub use projector::{RenderPrimitive, project, project_feature};
pub use satellites::*;
pub use symbology::{StyleEntry, StyleTable};
