use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    #[error("Longitude values must be between -180 and 180")]
    Longitude,
    #[error("Latitude values must be between -90 and 90")]
    Latitude,
    #[error("south ({south}) must be less than north ({north})")]
    LatitudeOrder { south: f64, north: f64 },
    #[error("west ({west}) must be less than east ({east})")]
    LongitudeOrder { west: f64, east: f64 },
}

/// Geographic box with strict ordering: `south < north` and `west < east`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "BboxHelper")]
pub struct BoundingBox {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

#[derive(Deserialize)]
struct BboxHelper {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl TryFrom<BboxHelper> for BoundingBox {
    type Error = BboxError;

    fn try_from(helper: BboxHelper) -> Result<Self, Self::Error> {
        BoundingBox::new(helper.north, helper.south, helper.east, helper.west)
    }
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, BboxError> {
        if !(-180.0..=180.0).contains(&east) || !(-180.0..=180.0).contains(&west) {
            return Err(BboxError::Longitude);
        }

        if !(-90.0..=90.0).contains(&north) || !(-90.0..=90.0).contains(&south) {
            return Err(BboxError::Latitude);
        }

        Self::ordered(north, south, east, west)
    }

    /// Only checks the ordering of the bounds. For boxes whose bounds are
    /// already limited by a swath's own coverage, which may use a 0..360
    /// longitude convention.
    pub fn ordered(north: f64, south: f64, east: f64, west: f64) -> Result<Self, BboxError> {
        // Negated comparisons so NaN lands here as well
        if !(south < north) {
            return Err(BboxError::LatitudeOrder { south, north });
        }

        if !(west < east) {
            return Err(BboxError::LongitudeOrder { west, east });
        }

        Ok(BoundingBox {
            north,
            south,
            east,
            west,
        })
    }

    /// Builds a box from the (lower-left lon, lower-left lat, upper-right lon,
    /// upper-right lat) ordering used by granule search services.
    pub fn from_corners(
        lower_left_lon: f64,
        lower_left_lat: f64,
        upper_right_lon: f64,
        upper_right_lat: f64,
    ) -> Result<Self, BboxError> {
        Self::new(upper_right_lat, lower_left_lat, upper_right_lon, lower_left_lon)
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// Strict containment, boundaries excluded.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude > self.south
            && latitude < self.north
            && longitude < self.east
            && longitude > self.west
    }
}

/// Coverage of a set of coordinates, boundaries included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Extent {
    /// Min/max of the latitude and longitude samples, ignoring NaN.
    /// Returns `None` when no finite pair exists.
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a f64, &'a f64)>,
    {
        let mut extent: Option<Extent> = None;

        for (&lat, &lon) in coordinates {
            if lat.is_nan() || lon.is_nan() {
                continue;
            }
            let current = extent.get_or_insert(Extent {
                north: lat,
                south: lat,
                east: lon,
                west: lon,
            });
            current.north = current.north.max(lat);
            current.south = current.south.min(lat);
            current.east = current.east.max(lon);
            current.west = current.west.min(lon);
        }

        extent
    }

    /// True when every bound of `bbox` lies strictly inside this extent.
    pub fn strictly_contains(&self, bbox: &BoundingBox) -> bool {
        bbox.north < self.north
            && bbox.south > self.south
            && bbox.east < self.east
            && bbox.west > self.west
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bbox_coords_are_within_ranges() {
        // Test valid coordinates
        let valid_bbox = BoundingBox::new(73.3, 70.9, -58.7, -67.2);
        assert!(valid_bbox.is_ok());

        // Test longitude out of range
        let invalid_lon = BoundingBox::new(10.0, 0.0, 0.0, -200.0);
        assert_eq!(invalid_lon, Err(BboxError::Longitude));

        let invalid_lon2 = BoundingBox::new(10.0, 0.0, 200.0, 0.0);
        assert_eq!(invalid_lon2, Err(BboxError::Longitude));

        // Test latitude out of range
        let invalid_lat = BoundingBox::new(0.0, -100.0, 10.0, 0.0);
        assert_eq!(invalid_lat, Err(BboxError::Latitude));

        let invalid_lat2 = BoundingBox::new(100.0, 0.0, 10.0, 0.0);
        assert_eq!(invalid_lat2, Err(BboxError::Latitude));
    }

    #[test]
    fn test_bbox_requires_strict_ordering() {
        assert!(matches!(
            BoundingBox::new(10.0, 10.0, 5.0, 0.0),
            Err(BboxError::LatitudeOrder { .. })
        ));
        assert!(matches!(
            BoundingBox::new(0.0, 10.0, 5.0, 0.0),
            Err(BboxError::LatitudeOrder { .. })
        ));
        assert!(matches!(
            BoundingBox::new(10.0, 0.0, 5.0, 5.0),
            Err(BboxError::LongitudeOrder { .. })
        ));
        assert!(matches!(
            BoundingBox::new(10.0, 0.0, -5.0, 5.0),
            Err(BboxError::LongitudeOrder { .. })
        ));
        assert!(BoundingBox::new(f64::NAN, 0.0, 5.0, 0.0).is_err());
    }

    #[test]
    fn test_ordered_skips_range_check() {
        let bbox = BoundingBox::ordered(6.5, 2.5, 197.5, 193.5).unwrap();
        assert_eq!(bbox.east(), 197.5);
        assert!(bbox.contains(4.0, 195.0));
        assert_eq!(
            BoundingBox::new(6.5, 2.5, 197.5, 193.5),
            Err(BboxError::Longitude)
        );
        assert!(matches!(
            BoundingBox::ordered(6.5, 2.5, 193.5, 197.5),
            Err(BboxError::LongitudeOrder { .. })
        ));
    }

    #[test]
    fn test_from_corners_matches_cardinal_order() {
        let bbox = BoundingBox::from_corners(-70.0, 40.0, -60.0, 45.0).unwrap();
        assert_eq!(bbox.west(), -70.0);
        assert_eq!(bbox.south(), 40.0);
        assert_eq!(bbox.east(), -60.0);
        assert_eq!(bbox.north(), 45.0);
    }

    #[test]
    fn test_contains_excludes_edges() {
        let bbox = BoundingBox::new(10.0, 0.0, 10.0, 0.0).unwrap();
        assert!(bbox.contains(5.0, 5.0));
        assert!(!bbox.contains(10.0, 5.0));
        assert!(!bbox.contains(5.0, 0.0));
        assert!(!bbox.contains(f64::NAN, 5.0));
    }

    #[test]
    fn test_extent_ignores_nan() {
        let lat = [1.0, f64::NAN, 3.0, -2.0];
        let lon = [10.0, 50.0, -4.0, 7.0];
        let extent = Extent::from_coordinates(lat.iter().zip(lon.iter())).unwrap();
        assert_eq!(extent.north, 3.0);
        assert_eq!(extent.south, -2.0);
        assert_eq!(extent.east, 10.0);
        assert_eq!(extent.west, -4.0);

        let empty: [f64; 1] = [f64::NAN];
        assert!(Extent::from_coordinates(empty.iter().zip(empty.iter())).is_none());
    }

    #[test]
    fn test_extent_strict_containment() {
        let extent = Extent {
            north: 10.0,
            south: 0.0,
            east: 10.0,
            west: 0.0,
        };
        let inside = BoundingBox::new(9.0, 1.0, 9.0, 1.0).unwrap();
        let touching = BoundingBox::new(10.0, 1.0, 9.0, 1.0).unwrap();
        assert!(extent.strictly_contains(&inside));
        assert!(!extent.strictly_contains(&touching));
    }
}
