use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Bounds;
use crate::error::{OutreachError, Result};

/// Geometry of one grid cell before it is persisted. Identical input bounds
/// and grid size always produce an identical zone set, which is what makes
/// seeding idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

/// Coordinates are rounded to 8 decimal places so repeated runs produce
/// byte-identical geometry despite floating-point accumulation.
fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

/// Divides `bounds` into an N x N grid of zones, row-major, named
/// `Grid_{row}_{col}`. Pure function; no state.
pub fn generate_grid(bounds: &Bounds, grid_size: usize) -> Result<Vec<ZoneSpec>> {
    if grid_size == 0 {
        return Err(OutreachError::Configuration(
            "grid size must be at least 1".to_string(),
        ));
    }
    if bounds.north <= bounds.south || bounds.east <= bounds.west {
        return Err(OutreachError::Configuration(format!(
            "degenerate bounds: north={} south={} east={} west={}",
            bounds.north, bounds.south, bounds.east, bounds.west
        )));
    }

    let lat_step = (bounds.north - bounds.south) / grid_size as f64;
    let lon_step = (bounds.east - bounds.west) / grid_size as f64;

    let mut zones = Vec::with_capacity(grid_size * grid_size);
    for row in 0..grid_size {
        for col in 0..grid_size {
            let lat_min = bounds.south + row as f64 * lat_step;
            let lat_max = lat_min + lat_step;
            let lon_min = bounds.west + col as f64 * lon_step;
            let lon_max = lon_min + lon_step;

            zones.push(ZoneSpec {
                name: format!("Grid_{}_{}", row, col),
                lat_min: round8(lat_min),
                lat_max: round8(lat_max),
                lon_min: round8(lon_min),
                lon_max: round8(lon_max),
                center_lat: round8((lat_min + lat_max) / 2.0),
                center_lon: round8((lon_min + lon_max) / 2.0),
            });
        }
    }

    info!("Generated {} grid zones", zones.len());
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> Bounds {
        Bounds {
            north: 30.45,
            south: 30.15,
            east: -97.65,
            west: -97.75,
        }
    }

    #[test]
    fn produces_n_squared_zones() {
        for n in [1, 2, 3, 10] {
            let zones = generate_grid(&austin(), n).unwrap();
            assert_eq!(zones.len(), n * n);
        }
    }

    #[test]
    fn two_by_two_grid_matches_known_geometry() {
        let zones = generate_grid(&austin(), 2).unwrap();
        assert_eq!(zones[0].name, "Grid_0_0");
        assert_eq!(zones[3].name, "Grid_1_1");

        let first = &zones[0];
        assert!((first.lat_max - first.lat_min - 0.15).abs() < 1e-9);
        assert!((first.lon_max - first.lon_min - 0.05).abs() < 1e-9);
        assert!((first.center_lat - 30.225).abs() < 1e-9);
        assert!((first.center_lon - -97.725).abs() < 1e-9);
    }

    #[test]
    fn zones_tile_the_bounds_without_gaps() {
        let bounds = austin();
        let zones = generate_grid(&bounds, 7).unwrap();

        let cell_area: f64 = zones
            .iter()
            .map(|z| (z.lat_max - z.lat_min) * (z.lon_max - z.lon_min))
            .sum();
        let total_area = (bounds.north - bounds.south) * (bounds.east - bounds.west);
        assert!((cell_area - total_area).abs() < 1e-6);

        for zone in &zones {
            assert!(zone.lat_min >= bounds.south - 1e-8);
            assert!(zone.lat_max <= bounds.north + 1e-8);
            assert!(zone.lon_min >= bounds.west - 1e-8);
            assert!(zone.lon_max <= bounds.east + 1e-8);
            assert!(zone.lat_min < zone.lat_max);
            assert!(zone.lon_min < zone.lon_max);
        }
    }

    #[test]
    fn identical_input_yields_identical_zone_set() {
        let a = generate_grid(&austin(), 10).unwrap();
        let b = generate_grid(&austin(), 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_input_fails_with_configuration_error() {
        assert!(generate_grid(&austin(), 0).is_err());

        let flipped = Bounds {
            north: 30.15,
            south: 30.45,
            east: -97.65,
            west: -97.75,
        };
        assert!(generate_grid(&flipped, 2).is_err());

        let flat = Bounds {
            north: 30.45,
            south: 30.15,
            east: -97.75,
            west: -97.75,
        };
        assert!(generate_grid(&flat, 2).is_err());
    }
}
