use crate::client::DaemonClient;
use crate::error::ClientResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub struct HealthApi<'a> {
    client: &'a DaemonClient,
}

impl<'a> HealthApi<'a> {
    pub(crate) fn new(client: &'a DaemonClient) -> Self {
        Self { client }
    }

    pub async fn check(&self) -> ClientResult<HealthResponse> {
        self.client.http.get("/api/health").await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub time: DateTime<Utc>,
}
