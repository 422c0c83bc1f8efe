//! Dashboard assembly and route opening.
//!
//! The dashboard is a per-zone progress board over the reader's
//! assigned areas. Online it is rebuilt from the remote service and the
//! snapshots are refreshed as a side effect; offline it is assembled
//! from the same-day snapshots plus the offline queue. A reading
//! counts as recorded today whether the server billed it or it is
//! still waiting in the queue, counted once per customer either way.

use std::collections::{HashMap, HashSet};

use time::Date;

use reader_client::db::queue;
use reader_client::domain::{Area, AreaRecord, Customer, SystemSettings};
use reader_client::zones;

use crate::cache::SnapshotLoad;
use crate::client::ReaderClient;
use crate::error::ClientError;
use crate::notify::NoticeKind;
use crate::session::OpenRoute;

const CACHE_EXPIRED_MESSAGE: &str = "Daily cache expired. Go online to refresh.";

/// Reading progress for one zone of one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneProgress {
    pub area_id: i64,
    pub area_name: String,
    pub zone: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct DashboardData {
    pub zones: Vec<ZoneProgress>,
    /// Distinct customers with a reading today, billed or queued.
    pub recorded_today: usize,
    /// Today's total consumption, unsynced readings included.
    pub consumption_today: f64,
    pub pending: u64,
    /// The offline snapshots predate today; progress is unreliable.
    pub cache_expired: bool,
}

/// One customer on an open route, with the flags the reading view needs.
#[derive(Debug, Clone)]
pub struct CustomerStatus {
    pub customer: Customer,
    /// A reading exists for today; the view disables re-entry.
    pub recorded_today: bool,
    /// Today's reading is still in the offline queue.
    pub pending_sync: bool,
}

/// Everything one dashboard rebuild needs, from either source.
/// `recorded` maps each customer with a reading today to its
/// consumption, one entry per customer no matter how many places the
/// reading shows up.
struct Assembly {
    settings: SystemSettings,
    areas: Vec<Area>,
    customers: Vec<Customer>,
    recorded: HashMap<i64, f64>,
    cache_expired: bool,
}

impl ReaderClient {
    /// Rebuild the dashboard for the signed-in reader.
    pub async fn load_dashboard_data(&self) -> Result<DashboardData, ClientError> {
        let now = self.now();
        let today = now.date();

        let (is_admin, staff_id) = {
            let session = self.session.lock().await;
            let s = session.as_ref().ok_or(ClientError::NoSession)?;
            (s.profile.is_admin(), s.profile.staff_id)
        };

        let assembly = if self.connectivity.is_online().await {
            match self.assemble_from_remote(is_admin, staff_id, today).await {
                Ok(a) => a,
                Err(ClientError::Remote(e)) => {
                    tracing::warn!(error = %e, "remote refresh failed, falling back to snapshots");
                    self.notifier
                        .notice(NoticeKind::Warning, "Connection lost. Using cached data.");
                    self.assemble_from_cache(is_admin, staff_id, today).await?
                }
                Err(e) => return Err(e),
            }
        } else {
            self.assemble_from_cache(is_admin, staff_id, today).await?
        };

        {
            let mut session = self.session.lock().await;
            if let Some(s) = session.as_mut() {
                s.settings = assembly.settings.clone();
                s.assigned_areas = assembly.areas.clone();
            }
        }

        let zones = zone_progress(&assembly.areas, &assembly.customers, &assembly.recorded);
        let mut recorded_today = 0;
        let mut consumption_today = 0.0;
        for c in &assembly.customers {
            if let Some(consumption) = assembly.recorded.get(&c.id) {
                recorded_today += 1;
                consumption_today += consumption;
            }
        }

        Ok(DashboardData {
            zones,
            recorded_today,
            consumption_today,
            pending: self.pending_count().await?,
            cache_expired: assembly.cache_expired,
        })
    }

    /// Open one assigned area for reading, filtered to its registered
    /// zones, and remember it as the session's route.
    pub async fn open_area(&self, area_id: i64) -> Result<Vec<CustomerStatus>, ClientError> {
        let now = self.now();
        let today = now.date();

        let area = {
            let session = self.session.lock().await;
            let s = session.as_ref().ok_or(ClientError::NoSession)?;
            s.assigned_areas
                .iter()
                .find(|a| a.id == area_id)
                .cloned()
                .ok_or(ClientError::UnknownArea(area_id))?
        };

        let (customers, server_recorded) = if self.connectivity.is_online().await {
            match self.fetch_route_source(today).await {
                Ok(pair) => pair,
                Err(ClientError::Remote(e)) => {
                    tracing::warn!(error = %e, "route fetch failed, falling back to snapshots");
                    self.notifier
                        .notice(NoticeKind::Warning, "Connection lost. Using cached data.");
                    (self.cached_customers(now).await?, HashSet::new())
                }
                Err(e) => return Err(e),
            }
        } else {
            (self.cached_customers(now).await?, HashSet::new())
        };

        let route_customers = zones::filter_to_zones(customers, &area.barangays);
        let queued = self.queued_today(today).await?;

        let statuses = route_customers
            .iter()
            .map(|c| CustomerStatus {
                recorded_today: server_recorded.contains(&c.id)
                    || c.recorded_on(today)
                    || queued.contains_key(&c.id),
                pending_sync: queued.contains_key(&c.id),
                customer: c.clone(),
            })
            .collect();

        tracing::info!(area_id, area = %area.name, customers = route_customers.len(), "route opened");
        let mut session = self.session.lock().await;
        if let Some(s) = session.as_mut() {
            s.open_route = Some(OpenRoute {
                area_id,
                area_name: area.name,
                zones: area.barangays,
                customers: route_customers,
            });
        }

        Ok(statuses)
    }

    /// Current statuses of the open route, without touching the remote.
    pub async fn route_view(&self) -> Result<Vec<CustomerStatus>, ClientError> {
        let today = self.now().date();
        let queued = self.queued_today(today).await?;

        let session = self.session.lock().await;
        let route = session
            .as_ref()
            .ok_or(ClientError::NoSession)?
            .open_route
            .as_ref()
            .ok_or_else(|| ClientError::Validation("no route is open".to_string()))?;

        Ok(route
            .customers
            .iter()
            .map(|c| CustomerStatus {
                recorded_today: c.recorded_on(today) || queued.contains_key(&c.id),
                pending_sync: queued.contains_key(&c.id),
                customer: c.clone(),
            })
            .collect())
    }

    async fn assemble_from_remote(
        &self,
        is_admin: bool,
        staff_id: Option<i64>,
        today: Date,
    ) -> Result<Assembly, ClientError> {
        let now = self.now();

        let settings = self
            .remote
            .fetch_settings()
            .await?
            .unwrap_or_default();

        let areas = if is_admin {
            self.remote.fetch_areas(None).await?
        } else if staff_id.is_some() {
            self.remote.fetch_areas(staff_id).await?
        } else {
            Vec::new()
        };

        // The tariff sentinel is saved in the same snapshot write as
        // the areas so neither can go stale without the other.
        let mut records = vec![AreaRecord::Settings(settings.clone())];
        records.extend(areas.iter().cloned().map(AreaRecord::Area));
        self.cache.save_areas(&records, now).await?;

        let customers = self.remote.fetch_customers().await?;
        self.cache.save_customers(&customers, now).await?;

        let bills = self.remote.fetch_daily_bills(today).await?;
        let mut recorded: HashMap<i64, f64> = bills
            .into_iter()
            .map(|b| (b.customer_id, b.consumption))
            .collect();
        for (id, consumption) in self.queued_today(today).await? {
            recorded.entry(id).or_insert(consumption);
        }

        Ok(Assembly {
            settings,
            areas,
            customers,
            recorded,
            cache_expired: false,
        })
    }

    async fn assemble_from_cache(
        &self,
        is_admin: bool,
        staff_id: Option<i64>,
        today: Date,
    ) -> Result<Assembly, ClientError> {
        let now = self.now();

        let areas_load = self.cache.load_areas(now).await?;
        let customers_load = self.cache.load_customers(now).await?;
        let cache_expired = areas_load.is_expired() || customers_load.is_expired();
        if cache_expired {
            self.notifier.notice(NoticeKind::Warning, CACHE_EXPIRED_MESSAGE);
        }

        let (settings, mut areas) = match areas_load {
            SnapshotLoad::Fresh(records) => split_area_records(records),
            SnapshotLoad::Expired => (SystemSettings::default(), Vec::new()),
        };
        if !is_admin {
            match staff_id {
                Some(id) => areas.retain(|a| a.assigned_reader_id == Some(id)),
                None => areas.clear(),
            }
        }

        let customers = match customers_load {
            SnapshotLoad::Fresh(c) => c,
            SnapshotLoad::Expired => Vec::new(),
        };

        // History and queue both witness today's readings; the history
        // entry wins when a customer appears in both.
        let mut recorded: HashMap<i64, f64> = HashMap::new();
        for c in &customers {
            if let Some(b) = c.history.iter().find(|b| b.reading_date == today) {
                recorded.insert(c.id, b.consumption);
            }
        }
        for (id, consumption) in self.queued_today(today).await? {
            recorded.entry(id).or_insert(consumption);
        }

        Ok(Assembly {
            settings,
            areas,
            customers,
            recorded,
            cache_expired,
        })
    }

    async fn fetch_route_source(
        &self,
        today: Date,
    ) -> Result<(Vec<Customer>, HashSet<i64>), ClientError> {
        let customers = self.remote.fetch_customers().await?;
        self.cache.save_customers(&customers, self.now()).await?;
        let bills = self.remote.fetch_daily_bills(today).await?;
        Ok((customers, bills.into_iter().map(|b| b.customer_id).collect()))
    }

    async fn cached_customers(&self, now: time::OffsetDateTime) -> Result<Vec<Customer>, ClientError> {
        match self.cache.load_customers(now).await? {
            SnapshotLoad::Fresh(customers) => Ok(customers),
            SnapshotLoad::Expired => {
                self.notifier.notice(NoticeKind::Warning, CACHE_EXPIRED_MESSAGE);
                Ok(Vec::new())
            }
        }
    }

    /// Customers with a reading queued for `today`, with its consumption.
    async fn queued_today(&self, today: Date) -> Result<HashMap<i64, f64>, ClientError> {
        Ok(queue::all(&self.store)
            .await?
            .into_iter()
            .filter(|p| p.payload.period_date == today)
            .map(|p| (p.payload.customer_id, p.payload.consumption))
            .collect())
    }
}

fn split_area_records(records: Vec<AreaRecord>) -> (SystemSettings, Vec<Area>) {
    let mut settings = SystemSettings::default();
    let mut areas = Vec::new();
    for record in records {
        match record {
            AreaRecord::Settings(s) => settings = s,
            AreaRecord::Area(a) => areas.push(a),
        }
    }
    (settings, areas)
}

fn zone_progress(
    areas: &[Area],
    customers: &[Customer],
    recorded: &HashMap<i64, f64>,
) -> Vec<ZoneProgress> {
    let mut progress = Vec::new();
    for area in areas {
        for zone in &area.barangays {
            let mut total = 0;
            let mut completed = 0;
            for c in customers {
                if zones::address_in_zone(&c.address, zone) {
                    total += 1;
                    if recorded.contains_key(&c.id) {
                        completed += 1;
                    }
                }
            }
            progress.push(ZoneProgress {
                area_id: area.id,
                area_name: area.name.clone(),
                zone: zone.clone(),
                completed,
                total,
            });
        }
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use time::macros::date;

    use reader_client::domain::BillingRecord;

    use crate::notify::{ClientEvent, Notice};
    use crate::testing::{self, StubRemote};

    fn area(id: i64, name: &str, reader: Option<i64>, barangays: &[&str]) -> Area {
        Area {
            id,
            name: name.to_string(),
            assigned_reader_id: reader,
            barangays: barangays.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn with_history_today(mut c: Customer) -> Customer {
        c.apply_billing(BillingRecord {
            id: Some(1),
            reading_date: date!(2024 - 08 - 14),
            current_reading: 110.0,
            consumption: 10.0,
            balance: 300.0,
            due_date: None,
        });
        c
    }

    async fn seed_cache(client: &crate::client::ReaderClient, areas: Vec<Area>, customers: Vec<Customer>) {
        let mut records = vec![AreaRecord::Settings(SystemSettings::default())];
        records.extend(areas.into_iter().map(AreaRecord::Area));
        client.cache.save_areas(&records, testing::fixed_now()).await.unwrap();
        client.cache.save_customers(&customers, testing::fixed_now()).await.unwrap();
    }

    #[tokio::test]
    async fn offline_merge_counts_each_customer_once() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), false).await;
        client.login(testing::reader()).await;
        seed_cache(
            &client,
            vec![area(1, "North", Some(9), &["Poblacion"])],
            vec![
                with_history_today(testing::customer(1, "Purok 1, Poblacion, Initao")),
                testing::customer(2, "Purok 2, Poblacion, Initao"),
                testing::customer(3, "Purok 3, Poblacion, Initao"),
            ],
        )
        .await;
        // Customer 1 is both in history and in the queue; customer 2
        // only in the queue.
        testing::enqueue_reading(&client, 1).await;
        testing::enqueue_reading(&client, 2).await;

        let data = client.load_dashboard_data().await.unwrap();

        assert_eq!(data.recorded_today, 2);
        // Customer 1 counts its history consumption (10), not the
        // queued duplicate; customer 2 counts its queued reading (20).
        assert_eq!(data.consumption_today, 30.0);
        assert!(!data.cache_expired);
        assert_eq!(data.pending, 2);
        assert_eq!(
            data.zones,
            vec![ZoneProgress {
                area_id: 1,
                area_name: "North".to_string(),
                zone: "Poblacion".to_string(),
                completed: 2,
                total: 3,
            }]
        );
    }

    #[tokio::test]
    async fn expired_cache_reports_and_warns() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), false).await;
        client.login(testing::reader()).await;
        let mut rx = client.subscribe();

        let data = client.load_dashboard_data().await.unwrap();

        assert!(data.cache_expired);
        assert!(data.zones.is_empty());
        assert_eq!(data.recorded_today, 0);
        match rx.recv().await {
            Ok(ClientEvent::Notice(Notice { kind, message })) => {
                assert_eq!(kind, crate::notify::NoticeKind::Warning);
                assert_eq!(message, CACHE_EXPIRED_MESSAGE);
            }
            other => panic!("expected a cache warning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn online_rebuild_saves_the_tariff_sentinel_with_the_areas() {
        let mut remote = StubRemote::accepting();
        remote.areas = vec![area(1, "North", Some(9), &["Poblacion"])];
        remote.customers = vec![testing::customer(1, "Purok 1, Poblacion, Initao")];
        let (client, _) = testing::client(Arc::new(remote), true).await;
        client.login(testing::reader()).await;

        client.load_dashboard_data().await.unwrap();

        let saved = match client.cache.load_areas(testing::fixed_now()).await.unwrap() {
            crate::cache::SnapshotLoad::Fresh(records) => records,
            crate::cache::SnapshotLoad::Expired => panic!("snapshot just written"),
        };
        assert!(saved.iter().any(|r| matches!(r, AreaRecord::Settings(_))));
        assert!(saved.iter().any(|r| matches!(r, AreaRecord::Area(a) if a.id == 1)));
    }

    #[tokio::test]
    async fn areas_follow_the_reader_assignment_unless_admin() {
        let mut remote = StubRemote::accepting();
        remote.areas = vec![
            area(1, "North", Some(9), &["Poblacion"]),
            area(2, "South", Some(7), &["Tubigan"]),
        ];
        let (client, _) = testing::client(Arc::new(remote), true).await;
        client.login(testing::reader()).await;

        let data = client.load_dashboard_data().await.unwrap();
        assert_eq!(data.zones.len(), 1);
        assert_eq!(data.zones[0].area_id, 1);
    }

    #[tokio::test]
    async fn open_area_filters_to_registered_zones_and_flags_queue_state() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), false).await;
        client.login(testing::reader()).await;
        seed_cache(
            &client,
            vec![area(1, "North", Some(9), &["Poblacion"])],
            vec![
                testing::customer(1, "Purok 1, Poblacion, Initao"),
                testing::customer(2, "Purok 2, Tubigan, Initao"),
            ],
        )
        .await;
        client.load_dashboard_data().await.unwrap();
        testing::enqueue_reading(&client, 1).await;

        let statuses = client.open_area(1).await.unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].customer.id, 1);
        assert!(statuses[0].recorded_today);
        assert!(statuses[0].pending_sync);

        let session = client.session.lock().await;
        let route = session.as_ref().unwrap().open_route.as_ref().unwrap();
        assert_eq!(route.area_name, "North");
        assert_eq!(route.customers.len(), 1);
    }

    #[tokio::test]
    async fn open_area_rejects_an_unassigned_area() {
        let (client, _) = testing::client(Arc::new(StubRemote::accepting()), false).await;
        client.login(testing::reader()).await;

        let err = client.open_area(42).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownArea(42)));
    }
}
