//! # Courier Scoring
//!
//! Pure scoring core: per-group metrics, the 0-100 score formula, and the
//! threshold rules that produce recommendation strings. Kept free of I/O so
//! the formula is testable in isolation.

/// Aggregated metrics for one (courier, region) group over the window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourierMetrics {
    pub total_shipments: u32,
    pub delivered_count: u32,
    pub returned_count: u32,
    /// Delivered within the on-time threshold of order creation
    pub on_time_count: u32,
    pub avg_pickup_hours: f64,
    pub avg_delivery_hours: f64,
    pub avg_return_hours: Option<f64>,
    pub avg_cod_remittance_hours: Option<f64>,
    pub cod_shipments: u32,
    pub cod_collected: u32,
}

impl CourierMetrics {
    pub fn delivery_rate(&self) -> f64 {
        ratio(self.delivered_count, self.total_shipments)
    }

    pub fn return_rate(&self) -> f64 {
        ratio(self.returned_count, self.total_shipments)
    }

    /// Share of delivered shipments that arrived within the threshold
    pub fn on_time_rate(&self) -> f64 {
        ratio(self.on_time_count, self.delivered_count)
    }

    /// Share of COD shipments with remittance collected. A courier with no
    /// COD volume is not penalized.
    pub fn cod_collection_rate(&self) -> f64 {
        if self.cod_shipments == 0 {
            1.0
        } else {
            ratio(self.cod_collected, self.cod_shipments)
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

/// Score formula: base 50, clamped to [0, 100].
///
/// `50 + 20*deliveryRate - 15*returnRate + 15*onTimeRate
///     - 10*min(avgPickupHours/24, 1)`
pub fn compute_score(metrics: &CourierMetrics) -> f64 {
    let pickup_penalty = (metrics.avg_pickup_hours / 24.0).min(1.0).max(0.0);
    let score = 50.0 + 20.0 * metrics.delivery_rate() - 15.0 * metrics.return_rate()
        + 15.0 * metrics.on_time_rate()
        - 10.0 * pickup_penalty;
    score.clamp(0.0, 100.0)
}

/// Threshold rules producing operator-facing recommendation strings
pub fn recommendations(metrics: &CourierMetrics) -> Vec<String> {
    let mut out = Vec::new();

    if metrics.delivery_rate() > 0.9 && metrics.return_rate() < 0.1 {
        out.push("Promote to primary carrier".to_string());
    }
    if metrics.avg_pickup_hours > 24.0 {
        out.push("Restrict to non-urgent orders: pickup delays exceed 24 hours".to_string());
    }
    if metrics.return_rate() > 0.3 {
        out.push("High return rate: review carrier handling and address quality".to_string());
    }
    if metrics.delivered_count > 0 && metrics.on_time_rate() < 0.5 {
        out.push("Investigate transit delays: under half of deliveries arrive on time".to_string());
    }
    if metrics.cod_shipments > 0 && metrics.cod_collection_rate() < 0.7 {
        out.push("Follow up on outstanding COD remittances".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn metrics(total: u32, delivered: u32, returned: u32, on_time: u32) -> CourierMetrics {
        CourierMetrics {
            total_shipments: total,
            delivered_count: delivered,
            returned_count: returned,
            on_time_count: on_time,
            ..CourierMetrics::default()
        }
    }

    #[test]
    fn test_perfect_courier_scores_high() {
        let mut m = metrics(100, 100, 0, 100);
        m.avg_pickup_hours = 2.0;
        let score = compute_score(&m);
        // 50 + 20 + 0 + 15 - 10*(2/24)
        assert!((score - 84.166).abs() < 0.01);
    }

    #[test]
    fn test_worst_case_clamps_to_zero_floor() {
        let mut m = metrics(100, 0, 100, 0);
        m.avg_pickup_hours = 96.0;
        // 50 + 0 - 15 + 0 - 10 = 25, still in range
        assert_eq!(compute_score(&m), 25.0);
    }

    #[test]
    fn test_zero_shipments_scores_base_minus_nothing() {
        let m = CourierMetrics::default();
        assert_eq!(compute_score(&m), 50.0);
    }

    #[test]
    fn test_on_time_rate_is_among_delivered() {
        let m = metrics(10, 4, 0, 2);
        assert_eq!(m.on_time_rate(), 0.5);
        assert_eq!(m.delivery_rate(), 0.4);
    }

    #[test]
    fn test_cod_rate_defaults_to_one_without_cod_volume() {
        let m = CourierMetrics::default();
        assert_eq!(m.cod_collection_rate(), 1.0);
    }

    #[test]
    fn test_promote_recommendation_thresholds() {
        let mut m = metrics(100, 95, 2, 90);
        m.avg_pickup_hours = 5.0;
        let recs = recommendations(&m);
        assert!(recs.iter().any(|r| r.contains("Promote to primary")));

        // Delivery rate exactly 0.9 does not qualify
        let borderline = metrics(100, 90, 2, 80);
        let recs = recommendations(&borderline);
        assert!(!recs.iter().any(|r| r.contains("Promote to primary")));
    }

    #[test]
    fn test_slow_pickup_recommendation() {
        let mut m = metrics(50, 40, 5, 30);
        m.avg_pickup_hours = 30.0;
        let recs = recommendations(&m);
        assert!(recs.iter().any(|r| r.contains("non-urgent")));
    }

    #[test]
    fn test_high_return_recommendation() {
        let m = metrics(100, 50, 40, 40);
        let recs = recommendations(&m);
        assert!(recs.iter().any(|r| r.contains("High return rate")));
    }

    proptest! {
        #[test]
        fn prop_score_always_within_bounds(
            total in 0u32..10_000,
            delivered in 0u32..10_000,
            returned in 0u32..10_000,
            on_time in 0u32..10_000,
            pickup_hours in -100.0f64..10_000.0,
        ) {
            let m = CourierMetrics {
                total_shipments: total,
                delivered_count: delivered.min(total),
                returned_count: returned.min(total),
                on_time_count: on_time.min(delivered.min(total)),
                avg_pickup_hours: pickup_hours,
                ..CourierMetrics::default()
            };
            let score = compute_score(&m);
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
