//! `reqwest`-backed upstream client: paginated JSON catalog fetches (§1).
//!
//! The D&D 5e catalog APIs this crate targets page results as
//! `{"count", "next", "previous", "results": [...]}`; this client follows
//! `next` until exhausted and flattens every page's `results` into one
//! `Vec<Entity>`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ApiFilters, UpstreamClient};
use crate::error::Result;
use crate::models::Entity;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Page {
    results: Vec<Value>,
    next: Option<String>,
}

/// Talks to a paginated JSON catalog API over HTTP.
pub struct HttpUpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with valid default config");
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn fetch(&self, entity_type: &str, filters: &ApiFilters) -> Result<Vec<Entity>> {
        let mut url = format!(
            "{}/v2/{}/",
            self.base_url.trim_end_matches('/'),
            entity_type
        );
        let mut query = filters.0.clone();
        let mut entities = Vec::new();

        loop {
            let mut request = self.http.get(&url);
            if !query.is_empty() {
                request = request.query(&query);
            }
            let response = request.send().await?.error_for_status()?;
            let page: Page = response.json().await?;

            entities.extend(page.results.into_iter().filter_map(|v| match v {
                Value::Object(map) => Some(Entity::from_json(map)),
                _ => None,
            }));

            // Query params are only needed on the first request; `next` is
            // already a fully-qualified URL carrying the same filters.
            query.clear();
            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(entities)
    }
}
