//! Types shared between the lookup and download services and the HTTP API.

use serde::{Deserialize, Serialize};

/// Information associated with a DOI, most notably the available open access manuscripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiInfo {
    /// Candidate manuscripts, in the order reported by the metadata source.
    ///
    /// The first manuscript is presented as the primary one.
    #[serde(default)]
    pub manuscripts: Vec<Manuscript>,
}

impl DoiInfo {
    /// Returns the manuscript located at exactly `location`, if any.
    pub fn find_location(&self, location: &str) -> Option<&Manuscript> {
        self.manuscripts.iter().find(|m| m.location == location)
    }
}

/// An open access manuscript that can be selected by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manuscript {
    /// Location URI of the manuscript (e.g. a pdf).
    pub location: String,
    /// Free form description of this manuscript.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Readable label for the repository where the manuscript can be found.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repository_institution: String,
    /// The MIME type of the manuscript file.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    /// The API where the manuscript was found.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// The file name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Manuscript {
    /// Creates a manuscript with only a location.
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manuscript_serialization() {
        let info = DoiInfo {
            manuscripts: vec![Manuscript {
                location: "http://example.org/first.pdf".into(),
                repository_institution: "Example University".into(),
                mime_type: "application/pdf".into(),
                source: "Unpaywall".into(),
                name: "first.pdf".into(),
                ..Default::default()
            }],
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "manuscripts": [{
                    "location": "http://example.org/first.pdf",
                    "repositoryInstitution": "Example University",
                    "type": "application/pdf",
                    "source": "Unpaywall",
                    "name": "first.pdf",
                }]
            })
        );

        let parsed: DoiInfo = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_find_location() {
        let info = DoiInfo {
            manuscripts: vec![Manuscript::at("http://a"), Manuscript::at("http://b")],
        };

        assert!(info.find_location("http://b").is_some());
        assert!(info.find_location("http://c").is_none());
        assert!(info.find_location("http://B").is_none());
    }
}
