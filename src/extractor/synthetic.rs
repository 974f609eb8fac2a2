use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::models::RawBusiness;

use super::{AreaSpec, Extractor};

const CATEGORIES: &[&str] = &[
    "Restaurant",
    "Cafe",
    "Retail Store",
    "Beauty Salon",
    "Gym",
    "Bookstore",
    "Bakery",
    "Pharmacy",
    "Pet Store",
    "Clothing Store",
    "Electronics Shop",
    "Grocery Store",
];

const NAME_PREFIXES: &[&str] = &[
    "The Golden",
    "Sunrise",
    "Blue Moon",
    "Green Valley",
    "Royal",
    "Premium",
    "Elite",
    "Modern",
    "Classic",
    "Urban",
    "Fusion",
];

const AREAS: &[&str] = &[
    "Downtown",
    "South Congress",
    "North Austin",
    "East Austin",
    "West Lake Hills",
    "Round Rock",
    "Cedar Park",
    "Pflugerville",
];

/// Generates plausible no-website businesses inside the requested area.
/// Used for dry runs and tests in place of a live discovery backend.
pub struct SyntheticExtractor {
    per_zone: usize,
}

impl SyntheticExtractor {
    pub fn new(per_zone: usize) -> Self {
        Self { per_zone }
    }
}

fn pick(options: &'static [&'static str]) -> &'static str {
    options[fastrand::usize(..options.len())]
}

#[async_trait]
impl Extractor for SyntheticExtractor {
    async fn discover(&self, area: &AreaSpec) -> Result<Vec<RawBusiness>> {
        let location = match area {
            AreaSpec::Named(name) => name.clone(),
            AreaSpec::Zone {
                center_lat,
                center_lon,
                ..
            } => format!("({:.4}, {:.4})", center_lat, center_lon),
        };
        info!(
            "Generating {} synthetic businesses for {}",
            self.per_zone, location
        );

        let mut businesses = Vec::with_capacity(self.per_zone);
        for _ in 0..self.per_zone {
            let category = pick(CATEGORIES);
            let prefix = pick(NAME_PREFIXES);
            let neighborhood = pick(AREAS);

            let rating = 3.5 + fastrand::f64() * 1.5;
            let review_count = fastrand::i64(10..510);
            let street_number = fastrand::u32(1..1000);
            let phone = format!("+1{}", fastrand::u64(2_000_000_000..10_000_000_000));

            businesses.push(RawBusiness {
                name: format!("{} {}", prefix, category),
                category: Some(category.to_string()),
                address: format!("{}, {}, Austin, TX", street_number, neighborhood),
                phone: Some(phone),
                email: None,
                has_website: false,
                rating: Some((rating * 10.0).round() / 10.0),
                review_count,
            });
        }

        Ok(businesses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_requested_count_of_no_website_records() {
        let extractor = SyntheticExtractor::new(12);
        let records = extractor
            .discover(&AreaSpec::Named("Austin".to_string()))
            .await
            .unwrap();

        assert_eq!(records.len(), 12);
        for record in &records {
            assert!(!record.has_website);
            assert!(!record.name.is_empty());
            assert!(!record.address.is_empty());
            let rating = record.rating.unwrap();
            assert!((3.5..=5.0).contains(&rating));
            assert!(record.review_count >= 10);
        }
    }

    #[tokio::test]
    async fn zone_area_is_accepted() {
        let extractor = SyntheticExtractor::new(1);
        let area = AreaSpec::Zone {
            lat_min: 30.15,
            lat_max: 30.30,
            lon_min: -97.75,
            lon_max: -97.70,
            center_lat: 30.225,
            center_lon: -97.725,
        };
        assert_eq!(extractor.discover(&area).await.unwrap().len(), 1);
    }
}
