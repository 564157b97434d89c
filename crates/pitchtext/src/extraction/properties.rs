//! Document properties from `docProps/core.xml`.

use crate::extraction::container::PartSource;
use crate::types::Metadata;

/// Dublin Core fields shared by all OOXML packages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub last_modified_by: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created: Option<String>,
    /// Last modification timestamp (ISO 8601)
    pub modified: Option<String>,
}

impl CoreProperties {
    /// Parse `docProps/core.xml`. Unreadable XML yields empty properties.
    pub fn parse(xml: &str) -> Self {
        let doc = match roxmltree::Document::parse(xml) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!("Ignoring unreadable core properties: {}", e);
                return Self::default();
            }
        };
        let root = doc.root_element();
        let text = |name: &str| {
            root.children()
                .find(|n| n.is_element() && n.tag_name().name() == name)
                .and_then(|n| n.text())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        Self {
            title: text("title"),
            subject: text("subject"),
            creator: text("creator"),
            keywords: text("keywords"),
            last_modified_by: text("lastModifiedBy"),
            created: text("created"),
            modified: text("modified"),
        }
    }

    /// Read the package's core properties, if it has any.
    pub fn load(source: &mut impl PartSource) -> Self {
        source
            .read_text("docProps/core.xml")
            .map(|xml| Self::parse(&xml))
            .unwrap_or_default()
    }

    /// Copy the properties into result metadata.
    pub fn apply_to(self, metadata: &mut Metadata) {
        metadata.title = self.title;
        metadata.subject = self.subject;
        metadata.authors = self.creator.map(|c| vec![c]);
        metadata.keywords = self.keywords.map(|k| {
            k.split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        });
        metadata.modified_by = self.last_modified_by;
        metadata.created_at = self.created;
        metadata.modified_at = self.modified;
    }
}
