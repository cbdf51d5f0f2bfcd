pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use math::{GeoPoint, Vec3, geo_to_globe, globe_to_geo};
