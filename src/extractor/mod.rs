pub mod synthetic;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RawBusiness, Zone};

pub use synthetic::SyntheticExtractor;

/// What to search: a named location, or one grid zone's geometry.
#[derive(Debug, Clone)]
pub enum AreaSpec {
    Named(String),
    Zone {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
        center_lat: f64,
        center_lon: f64,
    },
}

impl From<&Zone> for AreaSpec {
    fn from(zone: &Zone) -> Self {
        AreaSpec::Zone {
            lat_min: zone.lat_min,
            lat_max: zone.lat_max,
            lon_min: zone.lon_min,
            lon_max: zone.lon_max,
            center_lat: zone.center_lat,
            center_lon: zone.center_lon,
        }
    }
}

/// Discovery seam. An implementation may drive a browser, call an API or
/// synthesize data; the core only cares about the records it returns. An
/// empty area yields an empty list, never an error; errors are reserved for
/// hard failures.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn discover(&self, area: &AreaSpec) -> Result<Vec<RawBusiness>>;
}
