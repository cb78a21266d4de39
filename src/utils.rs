// src/utils.rs
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

const DEPLOY_PREFIX: &str = "/proof-viewer";

/// Get the base URL for the application
/// This handles both local development and sub-path deployment
pub fn get_base_url() -> String {
    let pathname = gloo_utils::window().location().pathname().ok();
    base_for_path(pathname.as_deref())
}

fn base_for_path(pathname: Option<&str>) -> String {
    match pathname {
        Some(path) if path.starts_with(&format!("{}/", DEPLOY_PREFIX)) => DEPLOY_PREFIX.to_string(),
        _ => String::new(),
    }
}

/// Build a resource URL with the correct base path. Absolute http(s) URLs are
/// returned unchanged.
pub fn resource_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    join_base(&get_base_url(), path)
}

fn join_base(base: &str, path: &str) -> String {
    let clean_path = path.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", clean_path)
    } else {
        format!("{}/{}", base, clean_path)
    }
}

/// Storage object name for an uploaded attachment: namespaced by page and
/// made unique with the upload time.
pub fn upload_name(page_id: &str, millis: u64, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}/{}-{}", page_id, millis, safe)
}

/// Offer `text` to the user as a file download.
pub fn download_text(file_name: &str, mime: &str, text: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = gloo_utils::document()
        .create_element("a")?
        .dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_for_path() {
        assert_eq!(base_for_path(Some("/proof-viewer/index.html")), "/proof-viewer");
        assert_eq!(base_for_path(Some("/index.html")), "");
        assert_eq!(base_for_path(None), "");
    }

    #[test]
    fn test_join_base() {
        assert_eq!(join_base("", "/public/config.json"), "/public/config.json");
        assert_eq!(join_base("/proof-viewer", "public/config.json"), "/proof-viewer/public/config.json");
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(
            upload_name("cover-v1", 1700000000000, "ref shot (1).png"),
            "cover-v1/1700000000000-ref_shot__1_.png"
        );
    }
}
