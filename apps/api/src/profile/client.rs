//! HTTP client for the profile API.
//!
//! Produces remote save/delete operations already bound to one user, so the
//! controllers never look up who is calling.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::forms::errors::{FieldErrorSet, SubmissionResult};
use crate::forms::normalize::{FormData, FormValue};
use crate::forms::remote::{RemoteError, RemoteOperation};
use crate::forms::submission::FormSubmissionController;
use crate::panel::{DeletedRecord, EntityPanelController};
use crate::profile::schemas::ProfileSchemas;
use crate::profile::ProfileResource;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ProfileClient {
    http: Client,
    base_url: String,
    user_id: Uuid,
}

impl ProfileClient {
    pub fn new(base_url: impl Into<String>, user_id: Uuid) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, user_id, DEFAULT_TIMEOUT)
    }

    /// Requests that take longer than `timeout` fail as [`RemoteError::Timeout`].
    pub fn with_timeout(
        base_url: impl Into<String>,
        user_id: Uuid,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/profile/{}", self.base_url, path)
    }

    /// The user's records for `R`, in display order.
    pub async fn list<R: ProfileResource>(&self) -> Result<Vec<R>, RemoteError> {
        let response = self
            .http
            .get(self.url(R::PATH))
            .query(&[("user_id", self.user_id)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Contract(format!(
                "listing {} returned {status}",
                R::PATH
            )));
        }
        Ok(response.json::<Vec<R>>().await?)
    }

    pub fn save_operation<R: ProfileResource>(&self) -> HttpOperation<R> {
        HttpOperation::new(self.http.clone(), self.url(R::PATH), self.user_id)
    }

    pub fn delete_operation<R: ProfileResource>(&self) -> HttpOperation<DeletedRecord> {
        HttpOperation::new(
            self.http.clone(),
            format!("{}/delete", self.url(R::PATH)),
            self.user_id,
        )
    }

    /// Loads `R`'s records and builds a panel whose save and delete
    /// controllers validate with the shared schemas before posting.
    pub async fn open_panel<R: ProfileResource>(
        &self,
        schemas: &ProfileSchemas,
    ) -> Result<EntityPanelController<R>, RemoteError> {
        let records = self.list::<R>().await?;
        debug!("Loaded {} {} record(s)", records.len(), R::PATH);

        let save = FormSubmissionController::<R>::new(Arc::new(self.save_operation::<R>()))
            .with_schema(R::schema(schemas));
        let delete = FormSubmissionController::<DeletedRecord>::new(Arc::new(self.delete_operation::<R>()))
            .with_schema(schemas.delete.clone());
        Ok(EntityPanelController::new(records, save, delete))
    }
}

/// A multipart POST whose JSON answer is a [`SubmissionResult`].
pub struct HttpOperation<T> {
    http: Client,
    url: String,
    user_id: Uuid,
    _output: PhantomData<fn() -> T>,
}

impl<T> HttpOperation<T> {
    fn new(http: Client, url: String, user_id: Uuid) -> Self {
        Self {
            http,
            url,
            user_id,
            _output: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> RemoteOperation<T> for HttpOperation<T> {
    async fn call(&self, form: &FormData) -> Result<SubmissionResult<T>, RemoteError> {
        let body = to_multipart(form)?;
        let response = self
            .http
            .post(&self.url)
            .query(&[("user_id", self.user_id)])
            .multipart(body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        decode_response(status, &bytes)
    }
}

fn to_multipart(form: &FormData) -> Result<Form, RemoteError> {
    let mut multipart = Form::new();
    for (name, value) in form.iter() {
        let part = match value {
            FormValue::Text(text) => Part::text(text.clone()),
            FormValue::File(blob) => {
                let mut part = Part::bytes(blob.bytes.to_vec());
                if let Some(filename) = &blob.filename {
                    part = part.file_name(filename.clone());
                }
                if let Some(content_type) = &blob.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        RemoteError::Contract(format!("invalid content type for '{name}': {e}"))
                    })?;
                }
                part
            }
        };
        multipart = multipart.part(name.to_string(), part);
    }
    Ok(multipart)
}

/// Interprets a response body. Server error envelopes become whole-form
/// errors; anything else unparseable is a contract violation.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<SubmissionResult<T>, RemoteError> {
    if let Ok(result) = serde_json::from_slice::<SubmissionResult<T>>(body) {
        return Ok(result);
    }
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        debug!("Server answered {status}: {}", envelope.error.message);
        return Ok(SubmissionResult::error(FieldErrorSet::form(
            envelope.error.message,
        )));
    }
    Err(RemoteError::Contract(format!(
        "unexpected {status} response body"
    )))
}
