//! Shared test doubles: a scripted remote, fixed clock and store setup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;
use time::{Date, OffsetDateTime};
use tokio::sync::Semaphore;

use reader_client::db::{open_in_memory, queue};
use reader_client::domain::{
    Area, BillPayload, Customer, DailyBill, ReaderProfile, SystemSettings,
};

use crate::client::ReaderClient;
use crate::connectivity::StaticConnectivity;
use crate::remote::{RemoteError, RemoteService};
use crate::session::OpenRoute;
use crate::sync::SyncTuning;

/// Remote stub. `bill_results` scripts `generate_bill` answers in
/// order; when the script runs out, calls succeed with a synthetic id.
pub(crate) struct StubRemote {
    pub settings: Option<SystemSettings>,
    pub areas: Vec<Area>,
    pub customers: Vec<Customer>,
    pub daily_bills: Vec<DailyBill>,
    pub bill_results: Mutex<VecDeque<Result<i64, RemoteError>>>,
    pub bill_calls: AtomicU32,
    /// When set, every `generate_bill` call blocks on a permit first.
    pub gate: Option<Arc<Semaphore>>,
    gate_waiting: AtomicU32,
}

impl StubRemote {
    pub fn accepting() -> Self {
        Self {
            settings: Some(SystemSettings::default()),
            areas: Vec::new(),
            customers: Vec::new(),
            daily_bills: Vec::new(),
            bill_results: Mutex::new(VecDeque::new()),
            bill_calls: AtomicU32::new(0),
            gate: None,
            gate_waiting: AtomicU32::new(0),
        }
    }

    pub fn scripted(results: Vec<Result<i64, RemoteError>>) -> Self {
        let stub = Self::accepting();
        *stub.bill_results.lock().expect("results lock") = results.into();
        stub
    }

    /// Number of `generate_bill` calls made so far.
    pub fn calls(&self) -> u32 {
        self.bill_calls.load(Ordering::SeqCst)
    }

    /// Number of calls that have reached the gate.
    pub fn waiters(&self) -> u32 {
        self.gate_waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteService for StubRemote {
    async fn fetch_settings(&self) -> Result<Option<SystemSettings>, RemoteError> {
        Ok(self.settings.clone())
    }

    async fn fetch_areas(
        &self,
        assigned_reader_id: Option<i64>,
    ) -> Result<Vec<Area>, RemoteError> {
        Ok(self
            .areas
            .iter()
            .filter(|a| assigned_reader_id.is_none() || a.assigned_reader_id == assigned_reader_id)
            .cloned()
            .collect())
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, RemoteError> {
        Ok(self.customers.clone())
    }

    async fn fetch_daily_bills(&self, _on: Date) -> Result<Vec<DailyBill>, RemoteError> {
        Ok(self.daily_bills.clone())
    }

    async fn generate_bill(&self, _payload: &BillPayload) -> Result<i64, RemoteError> {
        if let Some(gate) = &self.gate {
            self.gate_waiting.fetch_add(1, Ordering::SeqCst);
            gate.acquire().await.expect("gate closed").forget();
        }
        let n = self.bill_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.bill_results.lock().expect("results lock").pop_front();
        scripted.unwrap_or(Ok(i64::from(500 + n)))
    }
}

/// All time-dependent behavior in tests runs on this instant.
pub(crate) fn fixed_now() -> OffsetDateTime {
    datetime!(2024-08-14 12:00:00 UTC)
}

/// Zero-delay tuning so drain tests finish instantly.
pub(crate) fn fast_tuning() -> SyncTuning {
    SyncTuning {
        max_attempts: 3,
        settle_delay: Duration::ZERO,
        retry_pause: Duration::ZERO,
    }
}

pub(crate) async fn client(
    remote: Arc<StubRemote>,
    online: bool,
) -> (Arc<ReaderClient>, Arc<StaticConnectivity>) {
    let pool = open_in_memory().await.expect("in-memory store");
    let connectivity = Arc::new(StaticConnectivity::new(online));
    let client = ReaderClient::new(pool, remote, connectivity.clone(), fast_tuning())
        .with_clock(Arc::new(fixed_now));
    (Arc::new(client), connectivity)
}

pub(crate) fn reader() -> ReaderProfile {
    ReaderProfile {
        staff_id: Some(9),
        first_name: "Maria".to_string(),
        last_name: "Santos".to_string(),
        role: "reader".to_string(),
    }
}

pub(crate) fn customer(id: i64, address: &str) -> Customer {
    Customer {
        id,
        first_name: "Juan".to_string(),
        last_name: format!("Cruz-{id}"),
        address: address.to_string(),
        meter_number: format!("MTR-{id:04}"),
        has_discount: false,
        previous_reading: 100.0,
        arrears: 0.0,
        history: Vec::new(),
    }
}

/// Log in and install an open route directly, bypassing the dashboard.
pub(crate) async fn open_test_route(client: &ReaderClient, customers: Vec<Customer>) {
    client.login(reader()).await;
    let mut session = client.session.lock().await;
    let s = session.as_mut().expect("session just opened");
    s.open_route = Some(OpenRoute {
        area_id: 1,
        area_name: "North".to_string(),
        zones: vec!["Poblacion".to_string()],
        customers,
    });
}

pub(crate) fn payload(customer_id: i64) -> BillPayload {
    BillPayload {
        customer_id,
        current_reading: 120.0,
        previous_reading: 100.0,
        period_date: fixed_now().date(),
        amount: 625.0,
        consumption: 20.0,
        due_date: fixed_now().date() + time::Duration::days(14),
        base_charge: 150.0,
        consumption_charge: 350.0,
        penalty: 0.0,
        tax: 0.0,
        arrears: 0.0,
    }
}

/// Put one reading straight into the offline queue.
pub(crate) async fn enqueue_reading(client: &ReaderClient, customer_id: i64) {
    queue::insert(&client.store, &payload(customer_id))
        .await
        .expect("queue insert");
}
