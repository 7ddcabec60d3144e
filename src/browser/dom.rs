//! DOM summary payload types and conversion from raw driver output.

use crate::types::{DomSummary, HeadingInfo, ImageInfo};

/// Raw DOM summary as returned by the driver's in-page extraction.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDomSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub headings: Vec<RawHeading>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub links: u64,
    #[serde(default)]
    pub buttons: u64,
    #[serde(default)]
    pub total_elements: u64,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawHeading {
    pub level: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawImage {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub has_alt: bool,
}

/// Converts raw driver DOM data into the service's DomSummary type.
pub(crate) fn convert_raw_dom(raw: RawDomSummary) -> DomSummary {
    DomSummary {
        title: raw.title,
        headings: raw
            .headings
            .into_iter()
            .map(|heading| HeadingInfo {
                level: heading.level,
                text: heading.text,
            })
            .collect(),
        images: raw
            .images
            .into_iter()
            .map(|image| ImageInfo {
                src: image.src,
                alt: image.alt,
                has_alt: image.has_alt,
            })
            .collect(),
        links: raw.links,
        buttons: raw.buttons,
        total_elements: raw.total_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_dom_summary_deserializes_correctly() {
        let json = r#"{
            "title": "Example Page",
            "headings": [
                {"level": "H1", "text": "Welcome"},
                {"level": "H2", "text": "Details"}
            ],
            "images": [
                {"src": "https://example.com/a.png", "alt": "Logo", "hasAlt": true},
                {"src": "https://example.com/b.png", "alt": "", "hasAlt": false}
            ],
            "links": 12,
            "buttons": 3,
            "totalElements": 240
        }"#;

        let raw: RawDomSummary = serde_json::from_str(json).unwrap();
        assert_eq!(raw.title, "Example Page");
        assert_eq!(raw.headings.len(), 2);
        assert_eq!(raw.headings[0].level, "H1");
        assert_eq!(raw.images[1].alt, "");
        assert!(!raw.images[1].has_alt);
        assert_eq!(raw.links, 12);
        assert_eq!(raw.buttons, 3);
        assert_eq!(raw.total_elements, 240);
    }

    #[test]
    fn raw_dom_summary_tolerates_missing_fields() {
        let raw: RawDomSummary = serde_json::from_str(r#"{"title": "Sparse"}"#).unwrap();
        assert_eq!(raw.title, "Sparse");
        assert!(raw.headings.is_empty());
        assert!(raw.images.is_empty());
        assert_eq!(raw.total_elements, 0);
    }

    #[test]
    fn convert_preserves_document_order() {
        let raw = RawDomSummary {
            title: "Ordered".into(),
            headings: vec![
                RawHeading {
                    level: "H2".into(),
                    text: "Second level first".into(),
                },
                RawHeading {
                    level: "H1".into(),
                    text: "Main".into(),
                },
            ],
            images: vec![RawImage {
                src: "x.png".into(),
                alt: String::new(),
                has_alt: false,
            }],
            links: 1,
            buttons: 0,
            total_elements: 9,
        };

        let summary = convert_raw_dom(raw);
        assert_eq!(summary.headings[0].level, "H2");
        assert_eq!(summary.headings[1].level, "H1");
        assert_eq!(summary.images[0].has_alt, false);
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn conversion_is_deterministic() {
        let json = r#"{
            "title": "Static",
            "headings": [{"level": "H1", "text": "Once"}],
            "images": [],
            "links": 4,
            "buttons": 2,
            "totalElements": 50
        }"#;

        let first = convert_raw_dom(serde_json::from_str(json).unwrap());
        let second = convert_raw_dom(serde_json::from_str(json).unwrap());
        assert_eq!(first, second);
    }
}
