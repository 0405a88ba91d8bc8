use crate::domain::model::Info;
use serde::Serialize;
use std::cmp::Ordering;

/// 排名結果：最便宜、最快、以及完整比較清單
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResponse {
    pub cheapest: Info,
    pub fastest: Info,
    pub comparison: Vec<Info>,
}

fn by_price_then_duration(a: &Info, b: &Info) -> Ordering {
    a.price
        .total_cmp(&b.price)
        .then_with(|| a.duration.cmp(&b.duration))
}

fn by_duration_then_price(a: &Info, b: &Info) -> Ordering {
    a.duration
        .cmp(&b.duration)
        .then_with(|| a.price.total_cmp(&b.price))
}

/// Ranks merged offers. Empty input gives an all-default response.
///
/// No de-duplication: identical offers from different providers are all
/// kept in `comparison`.
pub fn rank(mut offers: Vec<Info>) -> ComparisonResponse {
    if offers.is_empty() {
        return ComparisonResponse::default();
    }

    offers.sort_by(by_price_then_duration);

    let cheapest = offers[0].clone();
    // min_by 在相等時保留第一個，也就是排序後較前者
    let fastest = offers
        .iter()
        .min_by(|a, b| by_duration_then_price(a, b))
        .cloned()
        .unwrap_or_default();

    ComparisonResponse {
        cheapest,
        fastest,
        comparison: offers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn hm(hours: u64, minutes: u64) -> Duration {
        Duration::from_secs(hours * 3600 + minutes * 60)
    }

    #[test]
    fn test_empty_input_is_zero_valued() {
        let response = rank(Vec::new());
        assert_eq!(response, ComparisonResponse::default());
        assert_eq!(response.cheapest.price, 0.0);
        assert!(response.comparison.is_empty());
    }

    #[test]
    fn test_budget_air_beats_alaska_on_both_counts() {
        let budget = Info::new("BudgetAir", hm(6, 20), 98.96);
        let alaska = Info::new("ALASKA AIRLINES", hm(6, 28), 149.25);

        let response = rank(vec![alaska.clone(), budget.clone()]);

        assert_eq!(response.cheapest, budget);
        assert_eq!(response.fastest, budget);
        assert_eq!(response.comparison, vec![budget, alaska]);
    }

    #[test]
    fn test_cheapest_and_fastest_can_differ() {
        let offers = vec![
            Info::new("JETBLUE AIRWAYS", hm(6, 17), 173.45),
            Info::new("ALASKA AIRLINES", hm(6, 28), 149.25),
            Info::new("BudgetAir", hm(6, 10), 98.97),
            Info::new("BudgetAir", hm(6, 20), 98.96),
        ];

        let response = rank(offers);

        assert_eq!(response.cheapest, Info::new("BudgetAir", hm(6, 20), 98.96));
        assert_eq!(response.fastest, Info::new("BudgetAir", hm(6, 10), 98.97));
        let prices: Vec<f64> = response.comparison.iter().map(|i| i.price).collect();
        assert_eq!(prices, vec![98.96, 98.97, 149.25, 173.45]);
    }

    #[test]
    fn test_equal_price_prefers_shorter_duration() {
        let slow = Info::new("Slow", hm(9, 0), 100.0);
        let quick = Info::new("Quick", hm(5, 0), 100.0);

        let response = rank(vec![slow.clone(), quick.clone()]);
        assert_eq!(response.comparison, vec![quick.clone(), slow]);
        assert_eq!(response.cheapest, quick);
    }

    #[test]
    fn test_fastest_tie_prefers_lower_price() {
        let pricey = Info::new("Pricey", hm(4, 0), 300.0);
        let cheap = Info::new("Cheap", hm(4, 0), 120.0);
        let slow = Info::new("Slow", hm(8, 0), 90.0);

        let response = rank(vec![pricey, slow.clone(), cheap.clone()]);
        assert_eq!(response.fastest, cheap);
        assert_eq!(response.cheapest, slow);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let offer = Info::new("BudgetAir", hm(6, 20), 98.96);
        let response = rank(vec![offer.clone(), offer.clone(), offer]);
        assert_eq!(response.comparison.len(), 3);
    }

    #[test]
    fn test_serializes_with_go_style_durations() {
        let response = rank(vec![Info::new("BudgetAir", hm(6, 20), 98.96)]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cheapest"]["duration"], "6h20m0s");
        assert_eq!(json["comparison"].as_array().unwrap().len(), 1);
    }
}
