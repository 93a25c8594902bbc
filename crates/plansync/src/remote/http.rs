//! HTTP client for the remote planning platform.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;

use super::{ChunkSource, ItemAction, ItemBatchResult, ItemRecord, ListApi, ListSchema};
use crate::config::RemoteConfig;
use crate::error::{Result, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Authenticated client bound to one workspace and model.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    auth_token: String,
}

impl ApiClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base = format!(
            "{}/workspaces/{}/models/{}",
            config.endpoint.trim_end_matches('/'),
            config.workspace_id,
            config.model_id
        );
        Ok(Self {
            http,
            base,
            auth_token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.auth_token)
            .send()
            .await?;
        check(response).await
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.auth_token)
            .json(body)
            .send()
            .await?;
        check(response).await
    }
}

/// Turn a non-success status into [`SyncError::RemoteRejected`] with the
/// platform's message body attached.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SyncError::RemoteRejected {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.to_string()
        } else {
            message
        },
    })
}

#[derive(Debug, Deserialize)]
struct ChunkList {
    #[serde(default)]
    chunks: Vec<ChunkMeta>,
}

#[derive(Debug, Deserialize)]
struct ChunkMeta {
    #[allow(dead_code)]
    id: String,
}

/// Export chunks served by the platform's file endpoints.
#[derive(Debug, Clone)]
pub struct HttpChunkSource {
    client: ApiClient,
    file_id: String,
}

impl HttpChunkSource {
    pub fn new(client: ApiClient, file_id: impl Into<String>) -> Self {
        Self {
            client,
            file_id: file_id.into(),
        }
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn chunk_count(&self) -> Result<usize> {
        let response = self
            .client
            .get(&format!("files/{}/chunks", self.file_id))
            .await?;
        let list: ChunkList = response.json().await?;
        Ok(list.chunks.len())
    }

    async fn fetch_chunk(&self, ordinal: usize) -> Result<String> {
        let response = self
            .client
            .get(&format!("files/{}/chunks/{}", self.file_id, ordinal))
            .await?;
        Ok(response.text().await?)
    }
}

/// List items served by the platform's list endpoints.
#[derive(Debug, Clone)]
pub struct HttpListApi {
    client: ApiClient,
    list_id: String,
}

impl HttpListApi {
    pub fn new(client: ApiClient, list_id: impl Into<String>) -> Self {
        Self {
            client,
            list_id: list_id.into(),
        }
    }
}

#[async_trait]
impl ListApi for HttpListApi {
    async fn schema(&self) -> Result<ListSchema> {
        let response = self.client.get(&format!("lists/{}", self.list_id)).await?;
        Ok(response.json().await?)
    }

    async fn apply_items(
        &self,
        action: ItemAction,
        items: &[ItemRecord],
    ) -> Result<ItemBatchResult> {
        let body = serde_json::json!({
            "items": items.iter().map(|i| &i.fields).collect::<Vec<_>>(),
        });
        let response = self
            .client
            .post_json(
                &format!("lists/{}/items?action={}", self.list_id, action.as_str()),
                &body,
            )
            .await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&RemoteConfig {
            endpoint: "https://api.example.com/2/0/".to_string(),
            workspace_id: "ws-1".to_string(),
            model_id: "model-1".to_string(),
            auth_token: "token".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let client = client();
        assert_eq!(
            client.url("files/f1/chunks/0"),
            "https://api.example.com/2/0/workspaces/ws-1/models/model-1/files/f1/chunks/0"
        );
    }

    #[test]
    fn test_chunk_list_parses() {
        let list: ChunkList =
            serde_json::from_str(r#"{"chunks":[{"id":"0"},{"id":"1"},{"id":"2"}]}"#).unwrap();
        assert_eq!(list.chunks.len(), 3);
    }

    #[test]
    fn test_batch_result_parses_failures() {
        let result: ItemBatchResult = serde_json::from_str(
            r#"{"added":3,"ignored":1,"failures":[{"requestIndex":2,"failureType":"DUPLICATE"}]}"#,
        )
        .unwrap();
        assert_eq!(result.added, 3);
        assert_eq!(result.failures[0].request_index, 2);
        assert_eq!(result.failures[0].failure_type, "DUPLICATE");
    }
}
