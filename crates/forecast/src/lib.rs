pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod disaster;
pub mod error;
pub mod feed;
pub mod geojson;
pub mod orchestrator;
pub mod protocol;
pub mod snapshot;

pub use backend::*;
pub use cache::*;
pub use client::*;
pub use config::*;
pub use disaster::*;
pub use error::*;
pub use feed::*;
pub use geojson::*;
pub use orchestrator::*;
pub use protocol::*;
pub use snapshot::*;
