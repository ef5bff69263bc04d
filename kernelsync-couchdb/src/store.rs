use std::{fmt, time::Duration};
use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use kernelsync_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{
        AllDocs, ConfigEntry, Membership, RawDocument, SecurityObject, ServerInfo, WriteResult,
    },
    error::{SyncError, SyncResult},
};

const USER_AGENT: &str = concat!("kernelsync/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct CouchDbStore {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl fmt::Debug for CouchDbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchDbStore")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl CouchDbStore {
    pub fn new(http: Client, base_url: Url, username: String, password: String) -> Self {
        Self { http, base_url, username, password }
    }

    pub fn builder(url: &str) -> CouchDbStoreBuilder {
        CouchDbStoreBuilder::new(url)
    }

    /// Joins percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Initialization(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> SyncResult<RequestBuilder> {
        Ok(self
            .http
            .request(method, self.url(segments)?)
            .basic_auth(&self.username, Some(&self.password)))
    }

    /// Sends the request and turns any non-success status into an error.
    async fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, %body, "request rejected");

        Err(SyncError::from_status(status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(transport_error)
    }
}

fn transport_error(err: reqwest::Error) -> SyncError {
    if err.is_decode() {
        return SyncError::Serialization(err.to_string());
    }

    SyncError::Transport {
        message: err.to_string(),
        connect: err.is_connect(),
    }
}

#[async_trait]
impl StoreBackend for CouchDbStore {
    #[instrument(skip(self))]
    async fn server_info(&self) -> SyncResult<ServerInfo> {
        self.send_json(self.request(Method::GET, &[])?).await
    }

    #[instrument(skip(self))]
    async fn database_exists(&self, db: &str) -> SyncResult<bool> {
        let response = self
            .request(Method::HEAD, &[db])?
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            // HEAD responses carry no body
            status => Err(SyncError::from_status(status.as_u16(), String::new())),
        }
    }

    #[instrument(skip(self))]
    async fn create_database(&self, db: &str) -> SyncResult<()> {
        self.send(self.request(Method::PUT, &[db])?).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn all_docs(&self, db: &str) -> SyncResult<AllDocs> {
        self.send_json(self.request(Method::GET, &[db, "_all_docs"])?)
            .await
    }

    #[instrument(skip(self))]
    async fn get_document(&self, db: &str, id: &str) -> SyncResult<RawDocument> {
        self.send_json(self.request(Method::GET, &[db, id])?)
            .await
    }

    #[instrument(skip(self, document), fields(id = document.id()))]
    async fn put_document(&self, db: &str, document: &RawDocument) -> SyncResult<WriteResult> {
        let id = document.require_id()?;

        self.send_json(self.request(Method::PUT, &[db, id])?.json(document))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, db: &str, id: &str, rev: &str) -> SyncResult<WriteResult> {
        self.send_json(
            self.request(Method::DELETE, &[db, id])?
                .query(&[("rev", rev)]),
        )
        .await
    }

    #[instrument(skip(self, security))]
    async fn put_security(&self, db: &str, security: &SecurityObject) -> SyncResult<()> {
        self.send(
            self.request(Method::PUT, &[db, "_security"])?
                .json(security),
        )
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn membership(&self) -> SyncResult<Membership> {
        self.send_json(self.request(Method::GET, &["_membership"])?)
            .await
    }

    #[instrument(skip(self, entry), fields(path = %entry.path()))]
    async fn put_config(&self, node: &str, entry: &ConfigEntry) -> SyncResult<String> {
        // the server expects the value as a JSON string literal
        let body = serde_json::to_string(&entry.value)?;

        let previous: Value = self
            .send_json(
                self.request(
                    Method::PUT,
                    &["_node", node, "_config", entry.section.as_str(), entry.key.as_str()],
                )?
                .header(CONTENT_TYPE, "application/json")
                .body(body),
            )
            .await?;

        Ok(previous.as_str().unwrap_or_default().to_string())
    }
}

/// Builder for [`CouchDbStore`].
///
/// Credentials default to empty; a request timeout is only applied when set.
pub struct CouchDbStoreBuilder {
    url: String,
    username: String,
    password: String,
    timeout: Option<Duration>,
}

impl CouchDbStoreBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            username: String::new(),
            password: String::new(),
            timeout: None,
        }
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for CouchDbStoreBuilder {
    type Backend = CouchDbStore;

    async fn build(self) -> SyncResult<Self::Backend> {
        let base_url = Url::parse(&self.url)
            .map_err(|e| SyncError::Initialization(format!("invalid url {}: {e}", self.url)))?;

        let mut http = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(CouchDbStore::new(
            http.build()
                .map_err(|e| SyncError::Initialization(e.to_string()))?,
            base_url,
            self.username,
            self.password,
        ))
    }
}
