// src/app_config.rs
use crate::annotation::PageId;
use crate::error::ProofError;
use serde::{Deserialize, Serialize};

/// Contents of `public/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Hosted backend. Without one the viewer runs offline against an
    /// in-memory store.
    #[serde(default)]
    pub backend: Option<BackendConfig>,
    pub pages: Vec<PageInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_true")]
    pub realtime: bool,
}

/// One proofable page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: PageId,
    pub label: String,
    pub image_url: String,
    /// Intrinsic pixel size, used until the image reports its natural size.
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_title() -> String {
    "Proof Viewer".to_string()
}

fn default_table() -> String {
    "comments".to_string()
}

fn default_bucket() -> String {
    "attachments".to_string()
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ProofError> {
        let config: AppConfig =
            serde_json::from_str(text).map_err(|e| ProofError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProofError> {
        if self.pages.is_empty() {
            return Err(ProofError::Config("no pages configured".to_string()));
        }
        for (i, page) in self.pages.iter().enumerate() {
            if self.pages[..i].iter().any(|p| p.id == page.id) {
                return Err(ProofError::Config(format!("duplicate page id {}", page.id)));
            }
        }
        if let Some(backend) = &self.backend {
            if backend.url.trim().is_empty() || backend.anon_key.trim().is_empty() {
                return Err(ProofError::Config(
                    "backend needs both url and anon_key".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn get_page(&self, id: &PageId) -> Option<&PageInfo> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }
}

impl PageInfo {
    pub fn display_label(&self) -> String {
        format!("{} (v{})", self.label, self.version)
    }
}
