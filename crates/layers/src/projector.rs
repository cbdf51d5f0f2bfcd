//! Geographic geometry to globe-space render primitives.
//!
//! Projection is a pure function of one geometry, its risk, the style of its
//! disaster kind and the index of its horizon. Anything the projector cannot
//! interpret (unknown geometry types, malformed coordinates) yields no
//! primitives.

use forecast::{Feature, Geometry, GeometryKind};
use foundation::math::{GeoPoint, Vec3, geo_to_globe};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::symbology::StyleEntry;

/// Marker size at zero risk.
pub const BASE_POINT_SIZE: f64 = 0.006;
pub const RISK_SIZE_SCALE: f64 = 0.08;
/// Upper bound of the risk-dependent part of the marker size.
pub const MAX_RISK_SIZE: f64 = 0.03;

/// Altitude of the first horizon's polygon outlines.
pub const OUTLINE_BASE_ALTITUDE: f64 = 0.01;
/// Extra lift per horizon index so outlines of different horizons don't overlap.
pub const OUTLINE_HORIZON_STEP: f64 = 0.002;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderPrimitive {
    Marker {
        #[serde(serialize_with = "serialize_vec3")]
        position: Vec3,
        size: f64,
        color: [f32; 3],
        opacity: f32,
    },
    LineStrip {
        #[serde(serialize_with = "serialize_vertices")]
        vertices: Vec<Vec3>,
        color: [f32; 3],
        opacity: f32,
    },
}

impl RenderPrimitive {
    pub fn color(&self) -> [f32; 3] {
        match self {
            RenderPrimitive::Marker { color, .. } | RenderPrimitive::LineStrip { color, .. } => {
                *color
            }
        }
    }

    /// Rotate about the globe's polar (y) axis.
    pub fn rotated_y(&self, angle: f64) -> Self {
        match self {
            RenderPrimitive::Marker {
                position,
                size,
                color,
                opacity,
            } => RenderPrimitive::Marker {
                position: position.rotate_y(angle),
                size: *size,
                color: *color,
                opacity: *opacity,
            },
            RenderPrimitive::LineStrip {
                vertices,
                color,
                opacity,
            } => RenderPrimitive::LineStrip {
                vertices: vertices.iter().map(|v| v.rotate_y(angle)).collect(),
                color: *color,
                opacity: *opacity,
            },
        }
    }
}

fn serialize_vec3<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
    v.as_array().serialize(s)
}

fn serialize_vertices<S: Serializer>(vs: &[Vec3], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(vs.iter().map(|v| v.as_array()))
}

/// `0.006 + min(0.03, risk * 0.08)` for a risk already in `[0, 1]`.
pub fn point_size(risk: f64) -> f64 {
    BASE_POINT_SIZE + (risk * RISK_SIZE_SCALE).min(MAX_RISK_SIZE)
}

pub fn outline_altitude(horizon_index: usize) -> f64 {
    OUTLINE_BASE_ALTITUDE + horizon_index as f64 * OUTLINE_HORIZON_STEP
}

/// Project one feature. Features without geometry produce nothing.
pub fn project_feature(
    feature: &Feature,
    style: &StyleEntry,
    horizon_index: usize,
) -> Vec<RenderPrimitive> {
    match &feature.geometry {
        Some(geometry) => project(geometry, feature.risk(), style, horizon_index),
        None => Vec::new(),
    }
}

pub fn project(
    geometry: &Geometry,
    risk: f64,
    style: &StyleEntry,
    horizon_index: usize,
) -> Vec<RenderPrimitive> {
    let primitive = match geometry.kind() {
        GeometryKind::Point => project_point(&geometry.coordinates, risk, style),
        GeometryKind::Polygon => project_outline(&geometry.coordinates, style, horizon_index),
        GeometryKind::MultiPolygon => geometry
            .coordinates
            .get(0)
            .and_then(|first| project_outline(first, style, horizon_index)),
        GeometryKind::Other => {
            trace!(kind = %geometry.type_name, "skipping unsupported geometry");
            return Vec::new();
        }
    };

    if primitive.is_none() {
        trace!(kind = %geometry.type_name, "skipping malformed coordinates");
    }
    primitive.into_iter().collect()
}

fn project_point(coords: &Value, risk: f64, style: &StyleEntry) -> Option<RenderPrimitive> {
    let (lon, lat) = lon_lat(coords)?;
    Some(RenderPrimitive::Marker {
        position: geo_to_globe(GeoPoint::new(lat, lon, style.alt_offset)),
        size: point_size(risk.clamp(0.0, 1.0)),
        color: style.color,
        opacity: style.opacity,
    })
}

/// Outer ring of a polygon as a closed line strip.
fn project_outline(
    polygon: &Value,
    style: &StyleEntry,
    horizon_index: usize,
) -> Option<RenderPrimitive> {
    let ring = polygon.get(0)?.as_array()?;
    if ring.len() < 3 {
        return None;
    }
    let altitude = outline_altitude(horizon_index);

    let mut vertices = Vec::with_capacity(ring.len() + 1);
    for position in ring {
        let (lon, lat) = lon_lat(position)?;
        vertices.push(geo_to_globe(GeoPoint::new(lat, lon, altitude)));
    }
    if lon_lat(&ring[0]) != lon_lat(&ring[ring.len() - 1]) {
        vertices.push(vertices[0]);
    }

    Some(RenderPrimitive::LineStrip {
        vertices,
        color: style.color,
        opacity: style.opacity,
    })
}

/// A GeoJSON position `[lon, lat, ...]`. Extra components are ignored.
fn lon_lat(position: &Value) -> Option<(f64, f64)> {
    let components = position.as_array()?;
    if components.len() < 2 {
        return None;
    }
    let lon = components[0].as_f64().filter(|v| v.is_finite())?;
    let lat = components[1].as_f64().filter(|v| v.is_finite())?;
    if !(-90.0..=90.0).contains(&lat) {
        return None;
    }
    Some((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::{RenderPrimitive, outline_altitude, point_size, project, project_feature};
    use crate::symbology::{FIRES_STYLE, FLOODS_STYLE};
    use forecast::{Feature, Geometry};
    use foundation::math::Vec3;
    use serde_json::json;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
        assert_close(a.z, b.z);
    }

    #[test]
    fn size_grows_with_risk_up_to_cap() {
        assert_close(point_size(0.0), 0.006);
        assert_close(point_size(0.25), 0.026);
        assert_close(point_size(0.9), 0.036);
        assert_close(point_size(1.0), 0.036);
    }

    #[test]
    fn point_at_null_island_lies_on_positive_x() {
        let out = project(&Geometry::point(0.0, 0.0), 0.25, &FIRES_STYLE, 0);
        assert_eq!(out.len(), 1);
        let RenderPrimitive::Marker {
            position,
            size,
            color,
            opacity,
        } = out[0]
        else {
            panic!("expected marker, got {:?}", out[0]);
        };
        assert_vec_close(position, Vec3::new(1.02, 0.0, 0.0));
        assert_close(size, 0.026);
        assert_eq!(color, FIRES_STYLE.color);
        assert_eq!(opacity, FIRES_STYLE.opacity);
    }

    #[test]
    fn feature_risk_defaults_and_clamps() {
        let point = Geometry::point(10.0, 10.0);
        let size_of = |f: Feature| match project_feature(&f, &FIRES_STYLE, 0).as_slice() {
            [RenderPrimitive::Marker { size, .. }] => *size,
            other => panic!("unexpected {other:?}"),
        };
        assert_close(size_of(Feature::new(point.clone())), 0.036);
        assert_close(size_of(Feature::new(point.clone()).with_risk(-2.0)), 0.006);
        assert_close(
            size_of(Feature::new(point).with_property("risk", "high")),
            0.036,
        );
    }

    #[test]
    fn polygon_outline_is_closed_at_horizon_altitude() {
        let square = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 0.0]];
        let out = project(&Geometry::polygon(&[square]), 0.5, &FLOODS_STYLE, 2);
        assert_eq!(out.len(), 1);
        let RenderPrimitive::LineStrip { vertices, color, .. } = &out[0] else {
            panic!("expected line strip");
        };
        assert_eq!(vertices.len(), 4);
        assert_eq!(*color, FLOODS_STYLE.color);
        for v in vertices {
            assert_close(v.length(), 1.0 + outline_altitude(2));
        }
        assert_close(outline_altitude(2), 0.014);
        assert_eq!(vertices.first(), vertices.last());
    }

    #[test]
    fn unclosed_ring_gets_closing_vertex() {
        let open = vec![[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]];
        let out = project(&Geometry::polygon(&[open]), 0.5, &FLOODS_STYLE, 0);
        let RenderPrimitive::LineStrip { vertices, .. } = &out[0] else {
            panic!("expected line strip");
        };
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0], vertices[3]);
    }

    #[test]
    fn holes_are_ignored() {
        let outer = vec![[0.0, 0.0], [20.0, 0.0], [20.0, 20.0], [0.0, 0.0]];
        let hole = vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]];
        let out = project(&Geometry::polygon(&[outer, hole]), 0.5, &FLOODS_STYLE, 0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn multipolygon_uses_first_polygon_only() {
        let first = vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]];
        let second = vec![vec![
            [50.0, 50.0],
            [51.0, 50.0],
            [51.0, 51.0],
            [50.0, 51.0],
            [50.0, 50.0],
        ]];
        let multi = project(
            &Geometry::multi_polygon(&[first.clone(), second]),
            0.5,
            &FLOODS_STYLE,
            1,
        );
        let single = project(&Geometry::polygon(&first), 0.5, &FLOODS_STYLE, 1);
        assert_eq!(multi, single);
    }

    #[test]
    fn unsupported_and_malformed_geometry_yield_nothing() {
        let cases = [
            Geometry::new("LineString", json!([[0.0, 0.0], [1.0, 1.0]])),
            Geometry::new("Point", json!([12.0])),
            Geometry::new("Point", json!(["a", "b"])),
            Geometry::new("Point", json!([0.0, 95.0])),
            Geometry::new("Point", json!(null)),
            Geometry::new("Polygon", json!([])),
            Geometry::new("Polygon", json!([[]])),
            Geometry::new("Polygon", json!([[[0.0, 0.0], [1.0, "x"], [2.0, 2.0]]])),
            Geometry::new("MultiPolygon", json!([])),
        ];
        for geometry in &cases {
            assert!(
                project(geometry, 0.5, &FIRES_STYLE, 0).is_empty(),
                "{geometry:?}"
            );
        }
        assert!(project_feature(&Feature::default(), &FIRES_STYLE, 0).is_empty());
    }

    #[test]
    fn serializes_positions_as_arrays() {
        let out = project(&Geometry::point(0.0, 90.0), 0.0, &FIRES_STYLE, 0);
        let value = serde_json::to_value(&out[0]).expect("serialize");
        assert_eq!(value["kind"], "marker");
        let pos = value["position"].as_array().expect("array");
        assert_eq!(pos.len(), 3);
        assert!((pos[1].as_f64().expect("y") - 1.02).abs() < 1e-9);
    }
}
