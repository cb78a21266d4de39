// src/report.rs
//
// Data behind the exported annotation report. Layout of any printed form is
// left to whatever consumes the JSON.

use crate::annotation::{AnnotationKind, PageId, Scope, StrokeTool};
use crate::app_config::PageInfo;
use crate::error::ProofError;
use crate::geometry::NormPoint;
use crate::store::AnnotationStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: String,
    /// On-image marker number, when the annotation has one.
    pub number: Option<usize>,
    pub kind: AnnotationKind,
    pub scope: Scope,
    pub tool: Option<StrokeTool>,
    pub position: Option<NormPoint>,
    pub status: Status,
    pub text: String,
    pub attachment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationReport {
    pub page_id: PageId,
    pub page_label: String,
    pub version: u32,
    pub open: usize,
    pub resolved: usize,
    pub rows: Vec<ReportRow>,
}

impl AnnotationReport {
    pub fn build(page: &PageInfo, store: &AnnotationStore) -> Self {
        let numbers = store.marker_numbers();
        let rows: Vec<ReportRow> = store
            .annotations()
            .iter()
            .map(|a| ReportRow {
                id: a.id.to_string(),
                number: numbers.get(&a.id).copied(),
                kind: a.kind(),
                scope: a.scope(),
                tool: a.anchor.tool(),
                position: a.anchor.position(),
                status: if a.resolved {
                    Status::Resolved
                } else {
                    Status::Open
                },
                text: a.text.clone().unwrap_or_default(),
                attachment: a.attachment.clone(),
                created_at: a.created_at.clone(),
            })
            .collect();
        let resolved = rows.iter().filter(|r| r.status == Status::Resolved).count();
        Self {
            page_id: page.id.clone(),
            page_label: page.label.clone(),
            version: page.version,
            open: rows.len() - resolved,
            resolved,
            rows,
        }
    }

    pub fn to_json(&self) -> Result<String, ProofError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn file_name(&self) -> String {
        let slug: String = self
            .page_label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        format!("{}-v{}-annotations.json", slug.trim_matches('-'), self.version)
    }
}
