//! Radius-to-rectangle geometry used for neighborhood searches

use crate::models::{BoundingBox, Coordinate};

/// Kilometers per degree of latitude
pub const KM_PER_DEGREE_LATITUDE: f64 = 111.32;

/// Turns a center and a radius into a lat/lon rectangle
pub struct GeoBoxResolver;

impl GeoBoxResolver {
    /// Bounding box of `radius_km` around `center`.
    ///
    /// Longitude degrees shrink with `cos(latitude)`, so the longitude span
    /// widens towards the poles and becomes arbitrarily wide at them.
    #[must_use]
    pub fn resolve(center: Coordinate, radius_km: f64) -> BoundingBox {
        let lat_delta = (radius_km / KM_PER_DEGREE_LATITUDE).abs();
        let lon_delta =
            (radius_km / (KM_PER_DEGREE_LATITUDE * center.latitude.to_radians().cos())).abs();

        BoundingBox {
            min_lat: center.latitude - lat_delta,
            max_lat: center.latitude + lat_delta,
            min_lon: center.longitude - lon_delta,
            max_lon: center.longitude + lon_delta,
        }
    }
}
