use regex::Regex;
use std::sync::OnceLock;

/// National/franchise chains are never qualifying leads, whatever else the
/// record looks like.
const CHAIN_KEYWORDS: &[&str] = &[
    "mcdonalds",
    "mcdonald's",
    "kfc",
    "subway",
    "dominos",
    "domino's",
    "pizza hut",
    "starbucks",
    "burger king",
    "taco bell",
    "walmart",
    "target",
    "costco",
    "cvs",
    "walgreens",
];

pub fn is_chain_business(name: &str) -> bool {
    let lower = name.to_lowercase();
    CHAIN_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Trims and collapses internal whitespace runs to single spaces.
pub fn sanitize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips spaces, dashes and parentheses so phone comparisons and
/// validation see digits only (plus an optional leading `+`).
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

fn phone_regex() -> &'static Regex {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    PHONE_RE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,13}$").expect("phone regex"))
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_regex().is_match(&normalize_phone(phone))
}

/// Additive priority score, 0..=100. No component is ever negative, so the
/// score is monotone in rating and review count.
pub fn priority_score(
    rating: Option<f64>,
    review_count: i64,
    category: Option<&str>,
    has_website: bool,
    phone: Option<&str>,
) -> i64 {
    let mut score = 0;

    // Rating band (0-20 points)
    let rating = rating.unwrap_or(0.0);
    if rating >= 4.5 {
        score += 20;
    } else if rating >= 4.0 {
        score += 15;
    } else if rating >= 3.5 {
        score += 10;
    } else if rating >= 3.0 {
        score += 5;
    }

    // Review count band (0-15 points)
    if review_count > 100 {
        score += 15;
    } else if review_count > 50 {
        score += 12;
    } else if review_count > 20 {
        score += 10;
    } else if review_count > 10 {
        score += 7;
    } else if review_count > 0 {
        score += 5;
    }

    // Category band (10-15 points)
    let category = category.map(|c| c.to_lowercase()).unwrap_or_default();
    if category.contains("restaurant") || category.contains("cafe") || category.contains("food") {
        score += 15;
    } else if category.contains("retail") || category.contains("shop") || category.contains("store")
    {
        score += 13;
    } else if category.contains("service") || category.contains("repair") {
        score += 12;
    } else {
        score += 10;
    }

    // No-website bonus: always true after qualification filters, kept as an
    // explicit term so the score stays auditable.
    if !has_website {
        score += 30;
    }

    // Reachable-phone bonus
    if phone.map(is_valid_phone).unwrap_or(false) {
        score += 20;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_matching_is_case_insensitive_substring() {
        assert!(is_chain_business("McDonald's Austin"));
        assert!(is_chain_business("STARBUCKS reserve"));
        assert!(!is_chain_business("Maria's Taqueria"));
    }

    #[test]
    fn name_whitespace_is_collapsed() {
        assert_eq!(sanitize_name("  Blue   Moon  Bakery "), "Blue Moon Bakery");
    }

    #[test]
    fn phone_normalization_and_validation() {
        assert_eq!(normalize_phone("+1 (512) 555-0100"), "+15125550100");
        assert!(is_valid_phone("+1 (512) 555-0100"));
        assert!(is_valid_phone("5125550100"));
        assert!(!is_valid_phone("555-0100"));
        assert!(!is_valid_phone("not a phone"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn top_band_record_scores_exactly_100() {
        // rating 4.6 (20) + 120 reviews (15) + cafe (15) + no website (30)
        // + valid phone (20)
        let score = priority_score(Some(4.6), 120, Some("Cafe"), false, Some("+15125550100"));
        assert_eq!(score, 100);
    }

    #[test]
    fn score_is_monotone_in_rating_and_reviews() {
        let ratings = [None, Some(2.9), Some(3.0), Some(3.5), Some(4.0), Some(4.5)];
        let mut prev = -1;
        for r in ratings {
            let s = priority_score(r, 0, None, true, None);
            assert!(s >= prev);
            prev = s;
        }

        let counts = [0, 1, 11, 21, 51, 101];
        let mut prev = -1;
        for c in counts {
            let s = priority_score(None, c, None, true, None);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn no_website_is_worth_exactly_30() {
        let with = priority_score(Some(4.0), 30, Some("Gym"), true, Some("5125550100"));
        let without = priority_score(Some(4.0), 30, Some("Gym"), false, Some("5125550100"));
        assert_eq!(without - with, 30);
    }

    #[test]
    fn score_stays_in_bounds() {
        assert_eq!(priority_score(None, 0, None, true, None), 10);
        for rating in [None, Some(1.0), Some(3.2), Some(5.0)] {
            for count in [0, 5, 500] {
                for cat in [None, Some("Restaurant"), Some("Misc")] {
                    let s = priority_score(rating, count, cat, false, Some("5125550100"));
                    assert!((0..=100).contains(&s));
                }
            }
        }
    }

    #[test]
    fn category_bands() {
        let base = |cat: &str| priority_score(None, 0, Some(cat), true, None);
        assert_eq!(base("Thai Restaurant"), 15);
        assert_eq!(base("Gift Shop"), 13);
        assert_eq!(base("Auto Repair"), 12);
        assert_eq!(base("Art Gallery"), 10);
    }
}
