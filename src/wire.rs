// src/wire.rs
//
// Row format of the backend `comments` table. Field names and encodings are
// shared with other clients of the same table and must not change:
// - general notes store `is_general = true` and null coordinates
// - strokes store null coordinates and `drawing_data`, a `|`-joined list of
//   `M x y L x y ...` sub-paths in normalized page space

use crate::annotation::{Anchor, Annotation, AnnotationId, NewAnnotation, PageId, StrokePath, StrokeTool};
use crate::error::ProofError;
use crate::geometry::NormPoint;
use serde::{Deserialize, Deserializer, Serialize};

pub const SEGMENT_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    pub page_id: PageId,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolved: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_general: bool,
    #[serde(default)]
    pub drawing_data: Option<String>,
    #[serde(default)]
    pub drawing_tool: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    /// Older rows carry the attachment here instead.
    #[serde(default, skip_serializing)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update body for `update_annotation`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(rename = "content", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl AnnotationPatch {
    pub fn resolved(value: bool) -> Self {
        Self {
            resolved: Some(value),
            ..Self::default()
        }
    }
}

/// Serialize stroke segments into the `drawing_data` column format.
pub fn encode_segments(segments: &[StrokePath]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join(&SEGMENT_DELIMITER.to_string())
}

fn encode_segment(segment: &StrokePath) -> String {
    segment
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{} {} {}", cmd, p.x(), p.y())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `drawing_data`. Blank sub-paths are skipped; anything else malformed
/// rejects the whole value.
pub fn decode_segments(data: &str) -> Result<Vec<StrokePath>, ProofError> {
    data.split(SEGMENT_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect()
}

fn decode_segment(sub_path: &str) -> Result<StrokePath, ProofError> {
    let mut tokens = sub_path.split_whitespace();
    let mut path = StrokePath::new();
    while let Some(cmd) = tokens.next() {
        match (cmd, path.is_empty()) {
            ("M", true) | ("L", false) => {}
            _ => {
                return Err(ProofError::InvalidRecord(format!(
                    "unexpected path command {:?} in {:?}",
                    cmd, sub_path
                )))
            }
        }
        let x = parse_coord(tokens.next(), sub_path)?;
        let y = parse_coord(tokens.next(), sub_path)?;
        let point = NormPoint::new(x, y)
            .map_err(|e| ProofError::InvalidRecord(format!("{} in {:?}", e, sub_path)))?;
        path.push(point);
    }
    Ok(path)
}

fn parse_coord(token: Option<&str>, sub_path: &str) -> Result<f64, ProofError> {
    token
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| ProofError::InvalidRecord(format!("bad coordinate in {:?}", sub_path)))
}

impl From<&NewAnnotation> for CommentRecord {
    fn from(new: &NewAnnotation) -> Self {
        let (x, y) = match new.anchor.position() {
            Some(p) => (Some(p.x()), Some(p.y())),
            None => (None, None),
        };
        let (drawing_data, drawing_tool) = match &new.anchor {
            Anchor::Stroke { tool, segments } => (
                Some(encode_segments(segments)),
                Some(tool.as_str().to_string()),
            ),
            _ => (None, None),
        };
        CommentRecord {
            id: None,
            content: new.text.clone().unwrap_or_default(),
            page_id: new.page_id.clone(),
            x,
            y,
            resolved: false,
            is_general: matches!(new.anchor, Anchor::Page),
            drawing_data,
            drawing_tool,
            attachment_url: new.attachment.clone(),
            image_url: None,
            created_at: None,
        }
    }
}

impl From<&Annotation> for CommentRecord {
    fn from(annotation: &Annotation) -> Self {
        let new = NewAnnotation {
            page_id: annotation.page_id.clone(),
            anchor: annotation.anchor.clone(),
            text: annotation.text.clone(),
            attachment: annotation.attachment.clone(),
        };
        CommentRecord {
            id: Some(annotation.id.clone()),
            resolved: annotation.resolved,
            created_at: Some(annotation.created_at.clone()),
            ..CommentRecord::from(&new)
        }
    }
}

impl TryFrom<CommentRecord> for Annotation {
    type Error = ProofError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .ok_or_else(|| ProofError::InvalidRecord("row has no id".to_string()))?;
        let drawing = record
            .drawing_data
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let anchor = if record.is_general {
            if drawing.is_some() {
                log::warn!(
                    "Row {} is a whole-page note; ignoring its drawing_data",
                    id
                );
            }
            Anchor::Page
        } else if let Some(data) = drawing {
            let segments = decode_segments(data)?;
            if segments.is_empty() {
                return Err(ProofError::InvalidRecord(format!("row {} has an empty path", id)));
            }
            let tool = record
                .drawing_tool
                .as_deref()
                .and_then(StrokeTool::parse)
                .unwrap_or(StrokeTool::Pen);
            Anchor::Stroke { tool, segments }
        } else {
            match (record.x, record.y) {
                (Some(x), Some(y)) if x >= 0.0 && y >= 0.0 => Anchor::Pin(
                    NormPoint::new(x, y)
                        .map_err(|e| ProofError::InvalidRecord(format!("row {}: {}", id, e)))?,
                ),
                // null or negative sentinel
                _ => Anchor::Page,
            }
        };

        let text = Some(record.content).filter(|t| !t.trim().is_empty());
        let attachment = record.attachment_url.or(record.image_url);

        Ok(Annotation {
            id,
            page_id: record.page_id,
            anchor,
            text,
            attachment,
            resolved: record.resolved,
            created_at: record.created_at.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, Scope};
    use serde_json::json;

    fn pt(x: f64, y: f64) -> NormPoint {
        NormPoint::new(x, y).unwrap()
    }

    fn two_segments() -> Vec<StrokePath> {
        vec![
            StrokePath::from_points(vec![pt(0.1, 0.1), pt(0.2, 0.25), pt(0.3, 0.5)]),
            StrokePath::from_points(vec![pt(0.5, 0.5), pt(0.75, 0.5)]),
        ]
    }

    #[test]
    fn test_encode_segments() {
        assert_eq!(
            encode_segments(&two_segments()),
            "M 0.1 0.1 L 0.2 0.25 L 0.3 0.5|M 0.5 0.5 L 0.75 0.5"
        );
    }

    #[test]
    fn test_decode_segments() {
        let segs = decode_segments("M 0.1 0.1 L 0.2 0.25 L 0.3 0.5| M 0.5 0.5 L 0.75 0.5 |").unwrap();
        assert_eq!(segs, two_segments());
    }

    #[test]
    fn test_decode_rejects_malformed_paths() {
        assert!(decode_segments("L 0.1 0.1").is_err());
        assert!(decode_segments("M 0.1").is_err());
        assert!(decode_segments("M 0.1 0.1 M 0.2 0.2").is_err());
        assert!(decode_segments("M 0.1 1.4").is_err());
    }

    #[test]
    fn test_highlighter_record_fields() {
        let new = NewAnnotation {
            page_id: PageId::from("p-1"),
            anchor: Anchor::Stroke {
                tool: StrokeTool::Highlighter,
                segments: two_segments(),
            },
            text: None,
            attachment: None,
        };
        let value = serde_json::to_value(CommentRecord::from(&new)).unwrap();
        assert_eq!(value["drawing_tool"], "highlighter");
        assert_eq!(value["x"], serde_json::Value::Null);
        assert_eq!(value["is_general"], false);
        assert_eq!(value["content"], "");
        let data = value["drawing_data"].as_str().unwrap();
        assert_eq!(data.split('|').count(), 2);
        assert!(data.split('|').all(|s| s.starts_with("M ") && s.contains(" L ")));
        assert!(value.get("id").is_none());
        assert!(value.get("created_at").is_none());
        assert!(value.get("image_url").is_none());
    }

    #[test]
    fn test_general_record_uses_sentinel() {
        let new = NewAnnotation {
            page_id: PageId::from("p-1"),
            anchor: Anchor::Page,
            text: Some("colours are off".into()),
            attachment: Some("https://cdn/x.png".into()),
        };
        let value = serde_json::to_value(CommentRecord::from(&new)).unwrap();
        assert_eq!(value["is_general"], true);
        assert_eq!(value["x"], serde_json::Value::Null);
        assert_eq!(value["y"], serde_json::Value::Null);
        assert_eq!(value["attachment_url"], "https://cdn/x.png");
    }

    #[test]
    fn test_decode_pin_row() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": 17,
            "content": "fix logo",
            "page_id": 3,
            "x": 0.25,
            "y": 0.5,
            "resolved": null,
            "is_general": false,
            "drawing_data": null,
            "drawing_tool": null,
            "created_at": "2024-05-01T10:00:00+00:00",
            "extra_column": "ignored"
        }))
        .unwrap();
        let ann = Annotation::try_from(record).unwrap();
        assert_eq!(ann.id, AnnotationId::from("17"));
        assert_eq!(ann.page_id, PageId::from("3"));
        assert_eq!(ann.kind(), AnnotationKind::Pin);
        assert_eq!(ann.scope(), Scope::Pointed);
        assert_eq!(ann.anchor.position(), Some(pt(0.25, 0.5)));
        assert!(ann.anchor.segments().is_empty());
        assert!(!ann.resolved);
        assert_eq!(ann.text.as_deref(), Some("fix logo"));
    }

    #[test]
    fn test_decode_negative_sentinel_is_general() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": "a",
            "content": "whole page",
            "page_id": "p",
            "x": -1,
            "y": -1,
            "image_url": "https://cdn/old.png"
        }))
        .unwrap();
        let ann = Annotation::try_from(record).unwrap();
        assert_eq!(ann.scope(), Scope::General);
        assert!(ann.anchor.position().is_none());
        assert_eq!(ann.attachment.as_deref(), Some("https://cdn/old.png"));
    }

    #[test]
    fn test_decode_stroke_row_defaults_to_pen() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": "s1",
            "content": "",
            "page_id": "p",
            "x": null,
            "y": null,
            "drawing_data": "M 0 0 L 1 1"
        }))
        .unwrap();
        let ann = Annotation::try_from(record).unwrap();
        assert_eq!(ann.kind(), AnnotationKind::Stroke);
        assert_eq!(ann.anchor.tool(), Some(StrokeTool::Pen));
        assert!(ann.anchor.position().is_none());
        assert!(ann.text.is_none());
    }

    #[test]
    fn test_decode_rejects_out_of_range_pin() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": "bad",
            "page_id": "p",
            "x": 1.5,
            "y": 0.2
        }))
        .unwrap();
        assert!(matches!(
            Annotation::try_from(record),
            Err(ProofError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_patch_body() {
        let body = serde_json::to_string(&AnnotationPatch::resolved(true)).unwrap();
        assert_eq!(body, r#"{"resolved":true}"#);
    }

    #[test]
    fn test_general_row_with_ink_is_a_page_note() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": 12,
            "content": "whole spread too dark",
            "page_id": "inside-1",
            "is_general": true,
            "drawing_data": "M 0.1 0.1 L 0.2 0.2",
            "drawing_tool": "pen"
        }))
        .unwrap();
        let ann = Annotation::try_from(record).unwrap();
        assert_eq!(ann.anchor, Anchor::Page);
        assert_eq!(ann.scope(), Scope::General);
        assert_eq!(ann.text.as_deref(), Some("whole spread too dark"));
    }
}
