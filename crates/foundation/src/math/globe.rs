use super::Vec3;

/// Radius of the rendered globe in scene units.
pub const GLOBE_RADIUS: f64 = 1.0;
/// Mean Earth radius (km), used to scale real altitudes onto the unit globe.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Geographic coordinates in degrees plus an altitude above the unit globe.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Height above the globe surface, in globe radii.
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64, altitude: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            altitude,
        }
    }

    pub fn on_surface(lat_deg: f64, lon_deg: f64) -> Self {
        Self::new(lat_deg, lon_deg, 0.0)
    }

    /// Convert a real altitude in kilometres to globe radii.
    pub fn with_altitude_km(lat_deg: f64, lon_deg: f64, alt_km: f64) -> Self {
        Self::new(lat_deg, lon_deg, alt_km / EARTH_RADIUS_KM)
    }
}

/// Project geographic coordinates onto the scene sphere.
///
/// Latitude is measured from the pole (`phi = 90 - lat`) and longitude is
/// offset by 180 degrees (`theta = lon + 180`). Every layer placed on the globe
/// (satellites, forecast markers, polygon outlines) goes through this function;
/// using a different convention anywhere makes layers drift apart.
pub fn geo_to_globe(geo: GeoPoint) -> Vec3 {
    let r = GLOBE_RADIUS + geo.altitude;
    let phi = (90.0 - geo.lat_deg).to_radians();
    let theta = (geo.lon_deg + 180.0).to_radians();

    let sin_phi = phi.sin();
    Vec3::new(
        -(r * sin_phi * theta.cos()),
        r * phi.cos(),
        r * sin_phi * theta.sin(),
    )
}

/// Inverse of [`geo_to_globe`]. Longitude is normalized to `[-180, 180)`.
///
/// The origin has no defined direction and maps to `(0, 0)` at altitude `-1`.
pub fn globe_to_geo(p: Vec3) -> GeoPoint {
    let r = p.length();
    if r <= 0.0 {
        return GeoPoint::new(0.0, 0.0, -GLOBE_RADIUS);
    }

    let phi = (p.y / r).clamp(-1.0, 1.0).acos();
    let theta = p.z.atan2(-p.x);

    let lat = 90.0 - phi.to_degrees();
    let lon = normalize_lon(theta.to_degrees() - 180.0);
    GeoPoint::new(lat, lon, r - GLOBE_RADIUS)
}

pub fn normalize_lon(lon_deg: f64) -> f64 {
    (lon_deg + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::{GLOBE_RADIUS, GeoPoint, geo_to_globe, globe_to_geo, normalize_lon};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_faces_positive_x() {
        let p = geo_to_globe(GeoPoint::on_surface(0.0, 0.0));
        assert_close(p.x, GLOBE_RADIUS, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn north_pole_is_positive_y() {
        let p = geo_to_globe(GeoPoint::new(90.0, 37.0, 0.5));
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.y, 1.5, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn east_longitude_maps_to_negative_z() {
        let p = geo_to_globe(GeoPoint::on_surface(0.0, 90.0));
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.z, -1.0, 1e-12);
    }

    #[test]
    fn altitude_scales_radius() {
        let p = geo_to_globe(GeoPoint::new(12.0, -45.0, 0.25));
        assert_close(p.length(), 1.25, 1e-12);
    }

    #[test]
    fn round_trip_geo_globe() {
        let geo = GeoPoint::new(-33.9, 151.2, 0.01);
        let rt = globe_to_geo(geo_to_globe(geo));
        assert_close(rt.lat_deg, geo.lat_deg, 1e-9);
        assert_close(rt.lon_deg, geo.lon_deg, 1e-9);
        assert_close(rt.altitude, geo.altitude, 1e-12);
    }

    #[test]
    fn km_altitude_uses_earth_radius() {
        let geo = GeoPoint::with_altitude_km(0.0, 0.0, 6_371.0);
        assert_close(geo.altitude, 1.0, 1e-12);
    }

    #[test]
    fn normalizes_longitude() {
        assert_close(normalize_lon(190.0), -170.0, 1e-12);
        assert_close(normalize_lon(-180.0), -180.0, 1e-12);
        assert_close(normalize_lon(180.0), -180.0, 1e-12);
        assert_close(normalize_lon(-540.0), -180.0, 1e-12);
    }
}
