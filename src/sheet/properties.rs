//! Document properties (`docProps/core.xml` and parts of `docProps/app.xml`).

use chrono::{DateTime, Utc};

/// Core and extended document properties.
///
/// All fields are optional; a workbook with no properties set writes no
/// `core.xml` part at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    /// Author
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub category: Option<String>,
    pub content_status: Option<String>,
    pub revision: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Stored in `app.xml`
    pub company: Option<String>,
    /// Stored in `app.xml`
    pub manager: Option<String>,
}

impl DocumentProperties {
    /// True when none of the `core.xml` properties are set.
    pub fn is_core_empty(&self) -> bool {
        self.title.is_none()
            && self.subject.is_none()
            && self.creator.is_none()
            && self.keywords.is_none()
            && self.description.is_none()
            && self.last_modified_by.is_none()
            && self.category.is_none()
            && self.content_status.is_none()
            && self.revision.is_none()
            && self.created.is_none()
            && self.modified.is_none()
    }
}

/// Parse a W3CDTF timestamp as found in `dcterms:created`.
pub(crate) fn parse_w3cdtf(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// Format a timestamp as W3CDTF with second precision.
pub(crate) fn format_w3cdtf(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_w3cdtf_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let text = format_w3cdtf(&dt);
        assert_eq!(text, "2024-03-05T14:30:00Z");
        assert_eq!(parse_w3cdtf(&text), Some(dt));
        assert_eq!(parse_w3cdtf("2024-03-05T14:30:00").unwrap().day(), 5);
        assert!(parse_w3cdtf("yesterday").is_none());
    }

    #[test]
    fn test_core_empty() {
        let mut props = DocumentProperties::default();
        assert!(props.is_core_empty());
        props.company = Some("Acme".into());
        assert!(props.is_core_empty());
        props.title = Some("Report".into());
        assert!(!props.is_core_empty());
    }
}
