use serde::{Deserialize, Serialize};
use time::Date;

use crate::billing::Charges;

use super::iso_date;

/// A quote handed to the UI after every confirmed submission, whether
/// the bill reached the server or was queued locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// `RCP-{year}-{bill_id}` for server-confirmed bills,
    /// `OFF-{nnnnnn}` for locally queued ones.
    pub receipt_no: String,
    pub customer_name: String,
    pub zone: String,
    pub meter_number: String,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub consumption: f64,
    pub charges: Charges,
    pub arrears: f64,
    /// Net charges plus arrears; what is owed if paid on time.
    pub total_due: f64,
    /// Projected surcharge if paid after the due date. Display only.
    pub penalty: f64,
    pub penalty_percentage: f64,
    #[serde(with = "iso_date")]
    pub due_date: Date,
    pub reader_name: String,
}

impl Receipt {
    /// Amount owed once the due date has passed.
    pub fn total_after_due(&self) -> f64 {
        self.total_due + self.penalty
    }

    pub fn confirmed_number(year: i32, bill_id: i64) -> String {
        format!("RCP-{year}-{bill_id}")
    }

    /// Offline receipt number: last six digits of the epoch
    /// milliseconds at confirmation time.
    pub fn offline_number(epoch_millis: i128) -> String {
        format!("OFF-{:06}", epoch_millis.rem_euclid(1_000_000))
    }
}
