//! Salesforce REST query + Bulk API 2.0 ingest client.

use super::session::{soap_login, Session, SessionSource};
use super::types::{CreateJobRequest, JobInfo, JobStateUpdate, QueryResponse};
use super::{BulkIngestApi, RecordEnumerator};
use crate::config::SalesforceConfig;
use crate::error::{BulkDeleteError, Result};
use crate::models::RecordId;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// HTTP client for one org.
///
/// The session is established lazily on first use and shared by every
/// concurrent caller; at most one login request is made.
pub struct SalesforceClient {
    http: Client,
    api_version: String,
    source: SessionSource,
    session: OnceCell<Session>,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("api_version", &self.api_version)
            .field("source", &self.source)
            .field("connected", &self.session.initialized())
            .finish()
    }
}

impl SalesforceClient {
    /// Create a client from configuration and an explicit session source
    pub fn new(config: &SalesforceConfig, source: SessionSource) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BulkDeleteError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_version: config.api_version.clone(),
            source,
            session: OnceCell::new(),
        })
    }

    /// Create a client around an already issued session
    pub fn with_session(config: &SalesforceConfig, session: Session) -> Result<Self> {
        Self::new(config, SessionSource::Static(session))
    }

    /// The active session, logging in first if needed
    pub async fn session(&self) -> Result<&Session> {
        self.session
            .get_or_try_init(|| async {
                match &self.source {
                    SessionSource::Static(session) => Ok(session.clone()),
                    SessionSource::SoapLogin {
                        credentials,
                        login_url,
                    } => soap_login(&self.http, login_url, &self.api_version, credentials).await,
                }
            })
            .await
    }

    fn data_url(&self, session: &Session, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            session.instance_url, self.api_version, path
        )
    }

    fn ingest_url(&self, session: &Session, job_id: Option<&str>) -> String {
        match job_id {
            Some(job_id) => self.data_url(session, &format!("jobs/ingest/{job_id}")),
            None => self.data_url(session, "jobs/ingest"),
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| BulkDeleteError::transport(operation, e.to_string()))?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "Remote API response");

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BulkDeleteError::http(operation, status.as_u16(), body))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.send(operation, request)
            .await?
            .json()
            .await
            .map_err(|e| BulkDeleteError::transport(operation, format!("invalid response body: {e}")))
    }

    async fn patch_state(&self, operation: &str, job_id: &str, update: JobStateUpdate) -> Result<JobInfo> {
        let session = self.session().await?;
        let request = self
            .http
            .patch(self.ingest_url(session, Some(job_id)))
            .bearer_auth(&session.access_token)
            .json(&update);
        self.send_json(operation, request).await
    }
}

#[async_trait]
impl RecordEnumerator for SalesforceClient {
    #[instrument(skip(self))]
    async fn fetch_all_ids(&self, query: &str) -> Result<Vec<RecordId>> {
        let session = self.session().await?;

        let first = self
            .http
            .get(self.data_url(session, "query"))
            .query(&[("q", query)])
            .bearer_auth(&session.access_token);
        let mut page: QueryResponse = self.send_json("query", first).await?;

        let mut ids = Vec::with_capacity(page.total_size as usize);
        loop {
            ids.extend(page.records.into_iter().filter_map(|record| record.id));

            if page.done {
                break;
            }
            let next = page.next_records_url.take().ok_or_else(|| {
                BulkDeleteError::enumeration("query page not done but has no nextRecordsUrl")
            })?;

            debug!(fetched = ids.len(), next = %next, "Fetching next query page");
            let request = self
                .http
                .get(format!("{}{}", session.instance_url, next))
                .bearer_auth(&session.access_token);
            page = self.send_json("query_more", request).await?;
        }

        Ok(ids)
    }
}

#[async_trait]
impl BulkIngestApi for SalesforceClient {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo> {
        let session = self.session().await?;
        let http_request = self
            .http
            .post(self.ingest_url(session, None))
            .bearer_auth(&session.access_token)
            .json(request);
        self.send_json("create_job", http_request).await
    }

    async fn upload_job_data(&self, job_id: &str, csv: String) -> Result<()> {
        let session = self.session().await?;
        let request = self
            .http
            .put(format!("{}/batches", self.ingest_url(session, Some(job_id))))
            .bearer_auth(&session.access_token)
            .header(CONTENT_TYPE, "text/csv")
            .body(csv);
        self.send("upload_job_data", request).await?;
        Ok(())
    }

    async fn close_job(&self, job_id: &str) -> Result<JobInfo> {
        self.patch_state("close_job", job_id, JobStateUpdate::upload_complete())
            .await
    }

    async fn get_job_status(&self, job_id: &str) -> Result<JobInfo> {
        let session = self.session().await?;
        let request = self
            .http
            .get(self.ingest_url(session, Some(job_id)))
            .bearer_auth(&session.access_token);
        self.send_json("get_job_status", request).await
    }

    async fn abort_job(&self, job_id: &str) -> Result<JobInfo> {
        self.patch_state("abort_job", job_id, JobStateUpdate::aborted())
            .await
    }
}
