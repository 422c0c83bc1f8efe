//! PostgREST-style HTTP implementation of [`RemoteService`].
//!
//! Query endpoints are plain filtered GETs under `/rest/v1/`; bill
//! creation is a POST to `/rest/v1/rpc/generate_bill`. Error bodies
//! carry a `code`/`message` pair which feeds the transient/structural
//! classification.

use async_trait::async_trait;
use serde::Deserialize;
use time::Date;

use reader_client::domain::{
    Area, BillPayload, Customer, DailyBill, RawCustomer, SystemSettings,
};

use crate::config::RemoteConfig;

use super::{RemoteError, RemoteService};

/// Columns of the embedded billing join, matching what
/// [`Customer::derive`] consumes.
const BILLING_SELECT: &str =
    "billing(id,current_reading,reading_date,billing_period,balance,consumption,due_date)";

pub struct HttpRemoteService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Error body shape the backend uses for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateBillResponse {
    bill_id: i64,
}

impl HttpRemoteService {
    pub fn new(cfg: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(self.rest_url(path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RemoteError::transport(format!("invalid response body: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
        let (code, message) = match parsed {
            Some(b) => (
                b.code.unwrap_or_else(|| status.as_u16().to_string()),
                b.message.unwrap_or(body),
            ),
            None => (status.as_u16().to_string(), body),
        };
        Err(RemoteError::from_code(code, message))
    }
}

fn date_param(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn fetch_settings(&self) -> Result<Option<SystemSettings>, RemoteError> {
        let rows: Vec<SystemSettings> =
            self.get_json("system_settings?select=*&limit=1").await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_areas(&self, assigned_reader_id: Option<i64>) -> Result<Vec<Area>, RemoteError> {
        let path = match assigned_reader_id {
            Some(id) => format!("area_boxes?select=*&assigned_reader_id=eq.{id}"),
            None => "area_boxes?select=*".to_string(),
        };
        self.get_json(&path).await
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, RemoteError> {
        let path = format!("customers?status=eq.active&select=*,{BILLING_SELECT}");
        let raw: Vec<RawCustomer> = self.get_json(&path).await?;
        Ok(raw.into_iter().map(Customer::derive).collect())
    }

    async fn fetch_daily_bills(&self, on: Date) -> Result<Vec<DailyBill>, RemoteError> {
        let path = format!(
            "billing?select=customer_id,consumption&reading_date=eq.{}",
            date_param(on)
        );
        self.get_json(&path).await
    }

    async fn generate_bill(&self, payload: &BillPayload) -> Result<i64, RemoteError> {
        let response = self
            .client
            .post(self.rest_url("rpc/generate_bill"))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        let body: GenerateBillResponse = Self::decode(response).await?;
        Ok(body.bill_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn date_params_are_iso_formatted() {
        assert_eq!(date_param(date!(2024 - 08 - 04)), "2024-08-04");
    }
}
