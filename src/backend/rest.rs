// src/backend/rest.rs
//
// HTTP client for a PostgREST-style hosted backend (table rows under
// `/rest/v1/<table>`, files under `/storage/v1/object/<bucket>`).

use super::realtime;
use super::{AnnotationBackend, ChangeCallback, FileStorage, Subscription};
use crate::annotation::{AnnotationId, PageId};
use crate::app_config::BackendConfig;
use crate::error::ProofError;
use crate::wire::{AnnotationPatch, CommentRecord};
use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};

pub struct RestBackend {
    config: BackendConfig,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.bucket,
            name
        )
    }

    fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.bucket,
            name
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", self.config.anon_key))
    }

    /// Requests that mutate rows ask for the affected rows back, so an empty
    /// answer means the id matched nothing.
    async fn send_for_rows(
        &self,
        request: Request,
        what: &str,
    ) -> Result<Vec<CommentRecord>, ProofError> {
        let resp = request.send().await?;
        let resp = check_status(resp, what).await?;
        Ok(resp.json::<Vec<CommentRecord>>().await?)
    }
}

async fn check_status(resp: Response, what: &str) -> Result<Response, ProofError> {
    if resp.ok() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    log::warn!("{} failed with HTTP {}: {}", what, status, body);
    Err(ProofError::PersistenceFailure(format!(
        "{} failed with HTTP {}",
        what, status
    )))
}

#[async_trait(?Send)]
impl AnnotationBackend for RestBackend {
    async fn list_annotations(&self, page_id: &PageId) -> Result<Vec<CommentRecord>, ProofError> {
        let request = self
            .authorize(Request::get(&self.table_url()))
            .query([
                ("select", "*".to_string()),
                ("page_id", format!("eq.{}", page_id)),
                ("order", "created_at.asc".to_string()),
            ])
            .build()?;
        let rows = self.send_for_rows(request, "listing annotations").await?;
        log::debug!("Fetched {} annotation rows for page {}", rows.len(), page_id);
        Ok(rows)
    }

    async fn create_annotation(&self, record: &CommentRecord) -> Result<CommentRecord, ProofError> {
        let request = self
            .authorize(Request::post(&self.table_url()))
            .header("Prefer", "return=representation")
            .json(record)?;
        self.send_for_rows(request, "creating annotation")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ProofError::PersistenceFailure("backend returned no created row".to_string())
            })
    }

    async fn update_annotation(
        &self,
        id: &AnnotationId,
        patch: &AnnotationPatch,
    ) -> Result<(), ProofError> {
        let request = self
            .authorize(Request::patch(&self.table_url()))
            .query([("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(patch)?;
        let rows = self.send_for_rows(request, "updating annotation").await?;
        if rows.is_empty() {
            return Err(ProofError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_annotation(&self, id: &AnnotationId) -> Result<(), ProofError> {
        let request = self
            .authorize(Request::delete(&self.table_url()))
            .query([("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .build()?;
        let rows = self.send_for_rows(request, "deleting annotation").await?;
        if rows.is_empty() {
            return Err(ProofError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn subscribe(&self, page_id: &PageId, on_change: ChangeCallback) -> Subscription {
        if !self.config.realtime {
            return Subscription::inert();
        }
        match realtime::subscribe(&self.config, page_id, on_change) {
            Ok(subscription) => subscription,
            Err(e) => {
                log::warn!("Live updates unavailable for page {}: {}", page_id, e);
                Subscription::inert()
            }
        }
    }
}

#[async_trait(?Send)]
impl FileStorage for RestBackend {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProofError> {
        let body = js_sys::Uint8Array::from(bytes.as_slice());
        let request = self
            .authorize(Request::post(&self.object_url(name)))
            .header("x-upsert", "true")
            .body(body)?;
        let resp = request.send().await?;
        check_status(resp, "uploading attachment").await?;
        log::info!("Uploaded attachment {} ({} bytes)", name, bytes.len());
        Ok(self.public_url(name))
    }
}
