use serde::{Deserialize, Serialize};
use time::Date;

use super::{iso_date, iso_date_opt};

/// Number of billing records kept per customer in the offline snapshot.
pub const HISTORY_DEPTH: usize = 12;

/// One historical billing record for a customer, newest first in
/// [`Customer::history`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: Option<i64>,
    #[serde(with = "iso_date")]
    pub reading_date: Date,
    pub current_reading: f64,
    pub consumption: f64,
    pub balance: f64,
    #[serde(with = "iso_date_opt", default)]
    pub due_date: Option<Date>,
}

/// A customer as cached for offline reading: base record plus the
/// derived fields the route view and the billing pipeline need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub meter_number: String,
    #[serde(default)]
    pub has_discount: bool,
    /// Most recent billing's current reading, 0 for a new meter.
    pub previous_reading: f64,
    /// Sum of all historical unpaid balances.
    pub arrears: f64,
    /// Up to [`HISTORY_DEPTH`] most recent billings, descending by date.
    #[serde(default)]
    pub history: Vec<BillingRecord>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether a billing record for `day` already exists. The UI uses
    /// this to disable re-submission for the rest of the day.
    pub fn recorded_on(&self, day: Date) -> bool {
        self.history.iter().any(|b| b.reading_date == day)
    }

    /// Replace any same-day history entry with `record` and put it at
    /// the front, keeping the descending order invariant.
    pub fn apply_billing(&mut self, record: BillingRecord) {
        self.history.retain(|b| b.reading_date != record.reading_date);
        self.history.insert(0, record);
        self.history.truncate(HISTORY_DEPTH);
        self.previous_reading = self.history[0].current_reading;
    }
}

/// Customer row as returned by the remote query, with the embedded
/// billing join still unprocessed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCustomer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub meter_number: String,
    #[serde(default)]
    pub has_discount: bool,
    #[serde(default)]
    pub billing: Vec<RawBillingRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBillingRow {
    pub id: Option<i64>,
    #[serde(with = "iso_date")]
    pub reading_date: Date,
    pub current_reading: f64,
    #[serde(default)]
    pub consumption: f64,
    #[serde(default)]
    pub balance: f64,
    #[serde(with = "iso_date_opt", default)]
    pub due_date: Option<Date>,
}

impl Customer {
    /// Derive the cached customer record from a raw remote row:
    /// previous reading from the latest billing, arrears as the sum of
    /// all balances, history truncated to the most recent entries in
    /// descending date order.
    pub fn derive(raw: RawCustomer) -> Self {
        let mut bills = raw.billing;
        bills.sort_by(|a, b| b.reading_date.cmp(&a.reading_date));

        let previous_reading = bills.first().map(|b| b.current_reading).unwrap_or(0.0);
        let arrears: f64 = bills.iter().map(|b| b.balance).sum();

        let history = bills
            .into_iter()
            .take(HISTORY_DEPTH)
            .map(|b| BillingRecord {
                id: b.id,
                reading_date: b.reading_date,
                current_reading: b.current_reading,
                consumption: b.consumption,
                balance: b.balance,
                due_date: b.due_date,
            })
            .collect();

        Customer {
            id: raw.id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            address: raw.address,
            meter_number: raw.meter_number,
            has_discount: raw.has_discount,
            previous_reading,
            arrears,
            history,
        }
    }
}

/// Minimal view of one billing created today, used for route progress.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBill {
    pub customer_id: i64,
    #[serde(default)]
    pub consumption: f64,
}
