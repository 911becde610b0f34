//! HTTP plumbing shared by the Elasticsearch and OpenSearch backends.

use crate::backend::{ClusterInfo, IndexSettings};
use crate::config::BackendConfig;
use crate::error::{SinkError, SinkResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use streamdex_types::Document;
use tracing::{debug, info};

/// Body of `GET /`, shared by both engine families.
#[derive(Debug, Deserialize)]
struct RootResponse {
    cluster_name: Option<String>,
    #[serde(default)]
    version: VersionInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VersionInfo {
    number: Option<String>,
    distribution: Option<String>,
}

pub(crate) struct IndexClient {
    client: Client,
    name: String,
    endpoint: String,
    refresh: bool,
}

impl IndexClient {
    pub(crate) fn new(config: &BackendConfig) -> SinkResult<Self> {
        if config.endpoint.is_empty() {
            return Err(SinkError::Config(format!(
                "backend `{}` has no endpoint",
                config.name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            name: config.name.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            refresh: config.refresh,
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.endpoint.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        if segments.is_empty() {
            url.push('/');
        }
        url
    }

    fn with_refresh(&self, request: RequestBuilder) -> RequestBuilder {
        if self.refresh {
            request.query(&[("refresh", "true")])
        } else {
            request
        }
    }

    /// Writes a whole document at `/{index}/{doc_type}/{id}`.
    pub(crate) async fn write_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &Document,
    ) -> SinkResult<()> {
        let url = self.url(&[index, doc_type, id]);
        debug!("PUT {}", url);
        let response = self
            .with_refresh(self.client.put(&url).json(document))
            .send()
            .await?;
        check(response).await?;
        debug!("Indexed {}/{} on {}", index, id, self.name);
        Ok(())
    }

    /// Deletes `/{index}/{doc_type}/{id}`. A 404 means it is already gone.
    pub(crate) async fn delete_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
    ) -> SinkResult<()> {
        let url = self.url(&[index, doc_type, id]);
        debug!("DELETE {}", url);
        let response = self.with_refresh(self.client.delete(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Document already absent: {}", url);
            return Ok(());
        }
        check(response).await?;
        debug!("Deleted {}/{} on {}", index, id, self.name);
        Ok(())
    }

    pub(crate) async fn index_exists(&self, index: &str) -> SinkResult<bool> {
        let response = self.client.head(self.url(&[index])).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(SinkError::Status {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    pub(crate) async fn create_index(&self, index: &str, settings: &IndexSettings) -> SinkResult<()> {
        self.put_json(&[index], &settings.to_body()).await?;
        info!("Created index {} on {}", index, self.name);
        Ok(())
    }

    /// Reads `GET /`. `default_distribution` names the engine when the
    /// cluster does not report one.
    pub(crate) async fn cluster_info(&self, default_distribution: &str) -> SinkResult<ClusterInfo> {
        let root: RootResponse = serde_json::from_value(self.get_json(&[]).await?)?;
        Ok(ClusterInfo {
            cluster_name: root.cluster_name,
            distribution: root
                .version
                .distribution
                .unwrap_or_else(|| default_distribution.to_string()),
            version: root.version.number,
        })
    }

    async fn put_json<B: Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> SinkResult<()> {
        let url = self.url(segments);
        debug!("PUT {}", url);
        let response = self.client.put(&url).json(body).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn get_json(&self, segments: &[&str]) -> SinkResult<Value> {
        let response = self.client.get(self.url(segments)).send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }
}

async fn check(response: Response) -> SinkResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Status {
        status: status.as_u16(),
        body,
    })
}
