use serde::{Deserialize, Serialize};
use time::Date;

use super::iso_date;

/// Full argument set of the remote `generate_bill` procedure.
///
/// Field names serialize with the `p_` prefix the server-side function
/// expects; the queue table stores the same fields in typed columns.
/// `amount` is the net total plus arrears; `penalty` and `tax` are
/// always 0 at submission time (the penalty is quoted, never billed
/// up front).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPayload {
    #[serde(rename = "p_customer_id")]
    pub customer_id: i64,
    #[serde(rename = "p_current_reading")]
    pub current_reading: f64,
    #[serde(rename = "p_previous_reading")]
    pub previous_reading: f64,
    #[serde(rename = "p_month_date", with = "iso_date")]
    pub period_date: Date,
    #[serde(rename = "p_amount")]
    pub amount: f64,
    #[serde(rename = "p_consumption")]
    pub consumption: f64,
    #[serde(rename = "p_due_date", with = "iso_date")]
    pub due_date: Date,
    #[serde(rename = "p_base_charge")]
    pub base_charge: f64,
    #[serde(rename = "p_consumption_charge")]
    pub consumption_charge: f64,
    #[serde(rename = "p_penalty")]
    pub penalty: f64,
    #[serde(rename = "p_tax")]
    pub tax: f64,
    #[serde(rename = "p_arrears")]
    pub arrears: f64,
}

/// A queued, not yet acknowledged submission. `local_id` is assigned by
/// the local store and is meaningless to the server; the row is only
/// ever inserted and deleted, never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub local_id: i64,
    pub payload: BillPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn payload_serializes_with_rpc_parameter_names() {
        let p = BillPayload {
            customer_id: 42,
            current_reading: 120.0,
            previous_reading: 100.0,
            period_date: date!(2024 - 08 - 14),
            amount: 625.0,
            consumption: 20.0,
            due_date: date!(2024 - 08 - 28),
            base_charge: 150.0,
            consumption_charge: 350.0,
            penalty: 0.0,
            tax: 0.0,
            arrears: 125.0,
        };

        let v: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(v["p_customer_id"], 42);
        assert_eq!(v["p_month_date"], "2024-08-14");
        assert_eq!(v["p_due_date"], "2024-08-28");
        assert_eq!(v["p_penalty"], 0.0);
    }
}
