use foundation::math::{GeoPoint, Vec3, geo_to_globe};
use serde::{Deserialize, Serialize};

use crate::symbology::hex_to_rgb;

pub const SATELLITE_SIZE: f64 = 0.01;
pub const HIGHLIGHT_SIZE: f64 = 0.018;
pub const SATELLITE_COLOR: [f32; 3] = hex_to_rgb(0xffffff);
pub const HIGHLIGHT_COLOR: [f32; 3] = hex_to_rgb(0xffd700);

/// Geodetic position of a tracked satellite, as produced by the propagator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatellitePosition {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

impl SatellitePosition {
    pub fn new(name: impl Into<String>, lat_deg: f64, lon_deg: f64, alt_km: f64) -> Self {
        Self {
            name: name.into(),
            lat_deg,
            lon_deg,
            alt_km,
        }
    }

    pub fn globe_position(&self) -> Vec3 {
        geo_to_globe(GeoPoint::with_altitude_km(
            self.lat_deg,
            self.lon_deg,
            self.alt_km,
        ))
    }

    fn is_valid(&self) -> bool {
        self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && self.alt_km.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteMarker {
    pub name: String,
    pub position: [f64; 3],
    pub size: f64,
    pub color: [f32; 3],
    pub highlighted: bool,
}

/// Markers for every satellite with a usable position.
///
/// `highlighted` names the satellite currently under the pointer, if any.
pub fn satellite_markers(
    positions: &[SatellitePosition],
    highlighted: Option<&str>,
) -> Vec<SatelliteMarker> {
    positions
        .iter()
        .filter(|sat| sat.is_valid())
        .map(|sat| {
            let lit = highlighted == Some(sat.name.as_str());
            SatelliteMarker {
                name: sat.name.clone(),
                position: sat.globe_position().as_array(),
                size: if lit { HIGHLIGHT_SIZE } else { SATELLITE_SIZE },
                color: if lit { HIGHLIGHT_COLOR } else { SATELLITE_COLOR },
                highlighted: lit,
            }
        })
        .collect()
}

/// One-line readout shown while hovering a satellite.
pub fn hover_readout(sat: &SatellitePosition) -> String {
    format!(
        "{}  lat {:.2}\u{b0}  lon {:.2}\u{b0}  alt {:.0} km",
        sat.name, sat.lat_deg, sat.lon_deg, sat.alt_km
    )
}
