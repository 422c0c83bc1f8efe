//! Injected connectivity probe.
//!
//! The engine never consults ambient network state; it asks this trait.
//! Production wires [`HttpProbe`]; tests use [`StaticConnectivity`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RemoteConfig;

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probes the remote service's REST root with a short-timeout HEAD
/// request. Any response, including an auth rejection, counts as
/// online; only transport failure counts as offline.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(cfg: &RemoteConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/rest/v1/", cfg.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Connectivity for HttpProbe {
    async fn is_online(&self) -> bool {
        self.client.head(&self.url).send().await.is_ok()
    }
}

/// Fixed, externally togglable connectivity state.
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for StaticConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
