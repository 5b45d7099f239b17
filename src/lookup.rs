use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DictionaryError, DictionaryResult};
use crate::model::LookupResponse;

/// Query forwarded to the lookup backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupQuery {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl LookupQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: None,
            page_size: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Anything that answers dictionary lookups.
#[async_trait]
pub trait LookupSource: Send + Sync {
    async fn lookup(&self, query: &LookupQuery) -> DictionaryResult<LookupResponse>;
}

/// HTTP client for `GET {base}/lookup`.
///
/// Pointing `base` at `http://host/api` talks to this crate's own proxy
/// instead of the backend.
#[derive(Clone)]
pub struct LookupClient {
    base_url: String,
    client: Client,
}

impl LookupClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/lookup", self.base_url)
    }
}

#[async_trait]
impl LookupSource for LookupClient {
    async fn lookup(&self, query: &LookupQuery) -> DictionaryResult<LookupResponse> {
        let endpoint = self.endpoint();
        debug!(%endpoint, text = %query.text, page = ?query.page, "Forwarding lookup");
        let response = self
            .client
            .get(&endpoint)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                warn!(%endpoint, error = %err, "Lookup backend unreachable");
                DictionaryError::upstream(err.to_string())
            })?;
        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, %status, "Lookup backend returned an error status");
            return Err(DictionaryError::upstream(format!(
                "backend API returned {status}"
            )));
        }
        response
            .json::<LookupResponse>()
            .await
            .map_err(|err| DictionaryError::upstream(format!("malformed lookup payload: {err}")))
    }
}
