// bouquet/reload.rs
//! Channel-database reload notification, sent after a bouquet write.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[async_trait]
pub trait ServiceListReloader: Send + Sync {
    async fn reload(&self) -> Result<()>;
}

/// OpenWebif `servicelistreload` over HTTP
pub struct HttpReloader {
    client: reqwest::Client,
    url: String,
}

impl HttpReloader {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Reload(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ServiceListReloader for HttpReloader {
    async fn reload(&self) -> Result<()> {
        debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Reload(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Reload(format!("{} returned {}", self.url, status)));
        }
        info!("Service list reload requested");
        Ok(())
    }
}

pub struct NoReload;

#[async_trait]
impl ServiceListReloader for NoReload {
    async fn reload(&self) -> Result<()> {
        debug!("Service list reload disabled");
        Ok(())
    }
}

/// Reloader for a configured url; empty means none
pub fn reloader_for(url: &str) -> Result<Box<dyn ServiceListReloader>> {
    if url.trim().is_empty() {
        Ok(Box::new(NoReload))
    } else {
        Ok(Box::new(HttpReloader::new(url.trim())?))
    }
}
