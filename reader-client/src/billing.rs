//! Tiered water-rate billing.
//!
//! Pure functions over [`SystemSettings`]; the same math runs whether a
//! submission goes straight to the server or into the offline queue.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::SystemSettings;

/// Breakdown of one bill before arrears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charges {
    pub base: f64,
    pub consumption_charge: f64,
    /// Base + consumption charge, net of any discount. Arrears are
    /// added by the caller, never here.
    pub total: f64,
}

/// Compute the charge for one billing period.
///
/// Three-tier progressive pricing: usage up to `tier1_threshold` bills
/// at `tier1_rate`, the band up to `tier2_threshold` at `tier2_rate`,
/// and everything beyond at `tier3_rate`, on top of the fixed base
/// rate. A discount takes `discount_percentage` percent off the
/// pre-discount total; it never touches arrears.
pub fn compute_charges(consumption: f64, has_discount: bool, s: &SystemSettings) -> Charges {
    let mut consumption_charge = 0.0;

    if consumption > 0.0 {
        let t1_usage = consumption.min(s.tier1_threshold);
        consumption_charge += t1_usage * s.tier1_rate;

        if consumption > s.tier1_threshold {
            let t2_usage = (consumption - s.tier1_threshold).min(s.tier2_threshold - s.tier1_threshold);
            consumption_charge += t2_usage * s.tier2_rate;

            if consumption > s.tier2_threshold {
                consumption_charge += (consumption - s.tier2_threshold) * s.tier3_rate;
            }
        }
    }

    let gross = s.base_rate + consumption_charge;
    let total = if has_discount {
        gross - gross * (s.discount_percentage / 100.0)
    } else {
        gross
    };

    Charges {
        base: s.base_rate,
        consumption_charge,
        total,
    }
}

/// Surcharge owed if `total_due` (charges plus arrears) is paid after
/// the due date. Quoted on receipts, never added to the stored amount.
pub fn project_penalty(total_due: f64, s: &SystemSettings) -> f64 {
    total_due * (s.penalty_percentage / 100.0)
}

/// Due date for a reading taken on `period_date`.
pub fn due_date(period_date: Date, s: &SystemSettings) -> Date {
    period_date + time::Duration::days(s.cutoff_days)
}
