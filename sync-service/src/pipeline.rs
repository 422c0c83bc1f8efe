//! Submission pipeline.
//!
//! One state machine per confirmed reading: validate, compute charges,
//! then either call the remote `generate_bill` procedure or fall back
//! to the durable offline queue. Any remote failure demotes the
//! submission to the queue; a confirmed reading is never discarded.

use reader_client::billing;
use reader_client::db::queue;
use reader_client::domain::{BillPayload, BillingRecord, Customer, Receipt, SystemSettings};
use reader_client::zones;

use crate::client::ReaderClient;
use crate::error::ClientError;
use crate::notify::NoticeKind;

/// What became of one submission attempt.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// The server accepted the bill.
    Accepted { bill_id: i64, receipt: Receipt },
    /// The bill is queued locally and will be reconciled by the next
    /// sync run.
    QueuedOffline { local_id: i64, receipt: Receipt },
}

impl SubmissionOutcome {
    pub fn receipt(&self) -> &Receipt {
        match self {
            SubmissionOutcome::Accepted { receipt, .. } => receipt,
            SubmissionOutcome::QueuedOffline { receipt, .. } => receipt,
        }
    }
}

impl ReaderClient {
    /// Submit a confirmed meter reading for one customer.
    ///
    /// Validation failures reject the input with no state change.
    /// Whether a same-day reading already exists is a UI-level guard,
    /// not checked here.
    pub async fn submit_reading(
        &self,
        customer_id: i64,
        previous_reading: f64,
        has_discount: bool,
        arrears: f64,
        entered_value: f64,
    ) -> Result<SubmissionOutcome, ClientError> {
        if !entered_value.is_finite() {
            return Err(ClientError::Validation("reading is not a number".to_string()));
        }
        if entered_value < previous_reading {
            return Err(ClientError::Validation(format!(
                "reading {entered_value} is below the previous reading {previous_reading}"
            )));
        }

        let now = self.now();
        let today = now.date();

        let (settings, reader_name, route_customer, route_zones) = {
            let session = self.session.lock().await;
            let s = session.as_ref().ok_or(ClientError::NoSession)?;
            let customer = s.open_route.as_ref().and_then(|r| {
                r.customers.iter().find(|c| c.id == customer_id).cloned()
            });
            let zones = s
                .open_route
                .as_ref()
                .map(|r| r.zones.clone())
                .unwrap_or_default();
            (s.settings.clone(), s.profile.full_name(), customer, zones)
        };

        let consumption = entered_value - previous_reading;
        let charges = billing::compute_charges(consumption, has_discount, &settings);
        let total_due = charges.total + arrears;
        let due = billing::due_date(today, &settings);

        let payload = BillPayload {
            customer_id,
            current_reading: entered_value,
            previous_reading,
            period_date: today,
            amount: total_due,
            consumption,
            due_date: due,
            base_charge: charges.base,
            consumption_charge: charges.consumption_charge,
            penalty: 0.0,
            tax: 0.0,
            arrears,
        };

        if !self.connectivity.is_online().await {
            tracing::info!(customer_id, "offline, queueing submission");
            return self
                .enqueue(payload, route_customer.as_ref(), &route_zones, &reader_name, &settings)
                .await;
        }

        match self.remote.generate_bill(&payload).await {
            Ok(bill_id) => {
                tracing::info!(customer_id, bill_id, "bill accepted by server");
                metrics::counter!("readings_submitted_total").increment(1);

                self.record_accepted_billing(&payload, bill_id).await;

                let receipt = build_receipt(
                    Receipt::confirmed_number(today.year(), bill_id),
                    route_customer.as_ref(),
                    &route_zones,
                    &payload,
                    &reader_name,
                    &settings,
                );
                self.notifier.notice(NoticeKind::Success, "Reading synced");
                self.notifier.dashboard_invalidated();
                Ok(SubmissionOutcome::Accepted { bill_id, receipt })
            }
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "remote submission failed, queueing");
                self.notifier
                    .notice(NoticeKind::Warning, "Sync failed - reading saved offline");
                self.enqueue(payload, route_customer.as_ref(), &route_zones, &reader_name, &settings)
                    .await
            }
        }
    }

    /// Optimistically fold the accepted bill into the open route's
    /// in-memory customer history, replacing any same-day entry.
    async fn record_accepted_billing(&self, payload: &BillPayload, bill_id: i64) {
        let mut session = self.session.lock().await;
        let Some(route) = session.as_mut().and_then(|s| s.open_route.as_mut()) else {
            return;
        };
        if let Some(customer) = route.customers.iter_mut().find(|c| c.id == payload.customer_id) {
            customer.apply_billing(BillingRecord {
                id: Some(bill_id),
                reading_date: payload.period_date,
                current_reading: payload.current_reading,
                consumption: payload.consumption,
                balance: payload.amount,
                due_date: Some(payload.due_date),
            });
        }
    }

    async fn enqueue(
        &self,
        payload: BillPayload,
        customer: Option<&Customer>,
        route_zones: &[String],
        reader_name: &str,
        settings: &SystemSettings,
    ) -> Result<SubmissionOutcome, ClientError> {
        let local_id = match queue::insert(&self.store, &payload).await {
            Ok(id) => id,
            Err(e) => {
                // No fallback exists below the durable store.
                self.notifier
                    .notice(NoticeKind::Error, "Local storage failure");
                return Err(ClientError::Storage(e));
            }
        };

        metrics::counter!("readings_queued_total").increment(1);
        tracing::info!(local_id, customer_id = payload.customer_id, "submission queued");

        self.publish_pending_count().await?;

        let epoch_millis = self.now().unix_timestamp_nanos() / 1_000_000;
        let receipt = build_receipt(
            Receipt::offline_number(epoch_millis),
            customer,
            route_zones,
            &payload,
            reader_name,
            settings,
        );
        self.notifier.notice(NoticeKind::Info, "Reading saved offline");
        self.notifier.dashboard_invalidated();
        Ok(SubmissionOutcome::QueuedOffline { local_id, receipt })
    }
}

fn build_receipt(
    receipt_no: String,
    customer: Option<&Customer>,
    route_zones: &[String],
    payload: &BillPayload,
    reader_name: &str,
    settings: &SystemSettings,
) -> Receipt {
    let (customer_name, zone, meter_number) = match customer {
        Some(c) => (
            c.full_name(),
            zones::extract_zone(&c.address, route_zones),
            c.meter_number.clone(),
        ),
        None => ("Customer".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    Receipt {
        receipt_no,
        customer_name,
        zone,
        meter_number,
        previous_reading: payload.previous_reading,
        current_reading: payload.current_reading,
        consumption: payload.consumption,
        charges: billing::Charges {
            base: payload.base_charge,
            consumption_charge: payload.consumption_charge,
            total: payload.amount - payload.arrears,
        },
        arrears: payload.arrears,
        total_due: payload.amount,
        // Projection only; the submitted payload always carries zero.
        penalty: billing::project_penalty(payload.amount, settings),
        penalty_percentage: settings.penalty_percentage,
        due_date: payload.due_date,
        reader_name: reader_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use time::macros::date;

    use reader_client::db::queue;

    use crate::notify::ClientEvent;
    use crate::remote::RemoteError;
    use crate::testing::{self, StubRemote};

    const ADDRESS: &str = "Purok 1, Poblacion, Initao";

    #[tokio::test]
    async fn offline_submission_lands_in_the_queue_with_a_receipt() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), false).await;
        testing::open_test_route(&client, vec![testing::customer(1, ADDRESS)]).await;
        let mut rx = client.subscribe();

        let outcome = client
            .submit_reading(1, 100.0, false, 0.0, 120.0)
            .await
            .unwrap();

        let SubmissionOutcome::QueuedOffline { receipt, .. } = outcome else {
            panic!("offline submission must queue");
        };
        assert!(receipt.receipt_no.starts_with("OFF-"));
        assert_eq!(receipt.zone, "Poblacion");
        // 20 m3: 150 base + 10*15 + 10*20 = 500, no arrears.
        assert_eq!(receipt.total_due, 500.0);
        assert_eq!(receipt.penalty, 50.0);
        assert_eq!(queue::count(&client.store).await.unwrap(), 1);
        assert!(matches!(rx.recv().await, Ok(ClientEvent::PendingCount(1))));
    }

    #[tokio::test]
    async fn accepted_submission_updates_the_route_history() {
        let remote = Arc::new(StubRemote::scripted(vec![Ok(881)]));
        let (client, _) = testing::client(remote, true).await;
        testing::open_test_route(&client, vec![testing::customer(1, ADDRESS)]).await;

        let outcome = client
            .submit_reading(1, 100.0, false, 0.0, 120.0)
            .await
            .unwrap();

        let SubmissionOutcome::Accepted { bill_id, receipt } = outcome else {
            panic!("online submission must be accepted");
        };
        assert_eq!(bill_id, 881);
        assert_eq!(receipt.receipt_no, "RCP-2024-881");

        let session = client.session.lock().await;
        let route = session.as_ref().unwrap().open_route.as_ref().unwrap();
        let c = &route.customers[0];
        assert_eq!(c.previous_reading, 120.0);
        assert!(c.recorded_on(date!(2024 - 08 - 14)));
        assert_eq!(queue::count(&client.store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remote_failure_demotes_the_submission_to_the_queue() {
        let remote = Arc::new(StubRemote::scripted(vec![Err(RemoteError::transport(
            "connection reset",
        ))]));
        let (client, _) = testing::client(remote.clone(), true).await;
        testing::open_test_route(&client, vec![testing::customer(1, ADDRESS)]).await;

        let outcome = client
            .submit_reading(1, 100.0, false, 0.0, 120.0)
            .await
            .unwrap();

        assert!(matches!(outcome, SubmissionOutcome::QueuedOffline { .. }));
        assert_eq!(remote.calls(), 1);
        assert_eq!(queue::count(&client.store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reading_below_previous_is_rejected_before_any_state_change() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), true).await;
        testing::open_test_route(&client, vec![testing::customer(1, ADDRESS)]).await;

        let err = client
            .submit_reading(1, 100.0, false, 0.0, 95.0)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(queue::count(&client.store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn submission_without_a_session_is_rejected() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), true).await;

        let err = client
            .submit_reading(1, 100.0, false, 0.0, 120.0)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NoSession));
    }

    #[tokio::test]
    async fn arrears_ride_on_top_of_the_computed_charges() {
        let remote = Arc::new(StubRemote::scripted(vec![Ok(900)]));
        let (client, _) = testing::client(remote, true).await;
        testing::open_test_route(&client, vec![testing::customer(1, ADDRESS)]).await;

        let outcome = client
            .submit_reading(1, 100.0, false, 125.0, 125.0)
            .await
            .unwrap();

        // 25 m3 worked example: 625 net, plus 125 arrears.
        assert_eq!(outcome.receipt().total_due, 750.0);
        assert_eq!(outcome.receipt().charges.total, 625.0);
        assert_eq!(outcome.receipt().arrears, 125.0);
        assert_eq!(outcome.receipt().due_date, date!(2024 - 08 - 28));
    }
}
