use serde::{Deserialize, Serialize};

/// Tariff table and billing policy fetched from the remote service.
///
/// Every field falls back to its documented default when the remote
/// record omits it, so a missing or partial settings row never blocks
/// billing. The default table must match the one the billing office
/// publishes; changing it silently changes every offline quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Upper bound of tier 1, in cubic meters.
    #[serde(default = "default_tier1_threshold")]
    pub tier1_threshold: f64,
    /// Rate per cubic meter within tier 1.
    #[serde(default = "default_tier1_rate")]
    pub tier1_rate: f64,
    /// Upper bound of tier 2 (absolute, not a band width).
    #[serde(default = "default_tier2_threshold")]
    pub tier2_threshold: f64,
    /// Rate per cubic meter for usage in (tier1, tier2].
    #[serde(default = "default_tier2_rate")]
    pub tier2_rate: f64,
    /// Rate per cubic meter for usage beyond tier 2.
    #[serde(default = "default_tier3_rate")]
    pub tier3_rate: f64,
    /// Fixed monthly charge added to every bill.
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    /// Senior/PWD discount, percent of base + consumption charge.
    #[serde(default = "default_discount_percentage")]
    pub discount_percentage: f64,
    /// Penalty after the due date, percent of the total amount due.
    #[serde(default = "default_penalty_percentage")]
    pub penalty_percentage: f64,
    /// Days between the reading date and the due date.
    #[serde(default = "default_cutoff_days")]
    pub cutoff_days: i64,
}

fn default_tier1_threshold() -> f64 {
    10.0
}
fn default_tier1_rate() -> f64 {
    15.0
}
fn default_tier2_threshold() -> f64 {
    20.0
}
fn default_tier2_rate() -> f64 {
    20.0
}
fn default_tier3_rate() -> f64 {
    25.0
}
fn default_base_rate() -> f64 {
    150.0
}
fn default_discount_percentage() -> f64 {
    20.0
}
fn default_penalty_percentage() -> f64 {
    10.0
}
fn default_cutoff_days() -> i64 {
    14
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            tier1_threshold: default_tier1_threshold(),
            tier1_rate: default_tier1_rate(),
            tier2_threshold: default_tier2_threshold(),
            tier2_rate: default_tier2_rate(),
            tier3_rate: default_tier3_rate(),
            base_rate: default_base_rate(),
            discount_percentage: default_discount_percentage(),
            penalty_percentage: default_penalty_percentage(),
            cutoff_days: default_cutoff_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_remote_record_fills_in_defaults() {
        let s: SystemSettings = serde_json::from_str(r#"{"base_rate": 200.0}"#).unwrap();
        assert_eq!(s.base_rate, 200.0);
        assert_eq!(s.tier1_threshold, 10.0);
        assert_eq!(s.tier3_rate, 25.0);
        assert_eq!(s.cutoff_days, 14);
    }

    #[test]
    fn default_table_matches_published_rates() {
        let s = SystemSettings::default();
        assert_eq!(
            (s.tier1_threshold, s.tier1_rate, s.tier2_threshold, s.tier2_rate, s.tier3_rate),
            (10.0, 15.0, 20.0, 20.0, 25.0)
        );
        assert_eq!(s.base_rate, 150.0);
        assert_eq!(s.discount_percentage, 20.0);
        assert_eq!(s.penalty_percentage, 10.0);
    }
}
