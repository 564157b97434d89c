//! Cell comments from `xl/commentsN.xml` parts.

use crate::error::{PitchtextError, Result};
use crate::extraction::normalize::normalize_whitespace;

/// One cell-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellComment {
    /// A1-style reference of the annotated cell
    pub reference: String,
    pub author: Option<String>,
    /// Whitespace-normalized comment text
    pub text: String,
}

/// Parse a comments part. Comments with no text are skipped.
pub fn parse_comments(xml: &str) -> Result<Vec<CellComment>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| PitchtextError::parsing_with_source("Failed to parse comments", e))?;

    let authors: Vec<String> = doc
        .descendants()
        .find(|n| n.has_tag_name("authors"))
        .map(|list| {
            list.children()
                .filter(|n| n.has_tag_name("author"))
                .map(|n| n.text().unwrap_or_default().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let comments = doc
        .descendants()
        .filter(|n| n.has_tag_name("comment"))
        .filter_map(|comment| {
            let raw: String = comment
                .descendants()
                .filter(|n| n.has_tag_name("t"))
                .filter_map(|n| n.text())
                .collect();
            let text = normalize_whitespace(&raw);
            if text.is_empty() {
                return None;
            }
            let author = comment
                .attribute("authorId")
                .and_then(|id| id.parse::<usize>().ok())
                .and_then(|id| authors.get(id))
                .filter(|name| !name.is_empty())
                .cloned();
            Some(CellComment {
                reference: comment.attribute("ref").unwrap_or_default().to_string(),
                author,
                text,
            })
        })
        .collect();
    Ok(comments)
}

/// Render one sheet's comments as a labeled block, or an empty string if there are none.
pub fn render_comment_block(sheet_name: &str, comments: &[CellComment]) -> String {
    if comments.is_empty() {
        return String::new();
    }
    let mut block = format!("【Comments in {}】\n", sheet_name);
    for comment in comments {
        block.push_str(&format!(
            "Cell {} (by {}): {}\n",
            comment.reference,
            comment.author.as_deref().unwrap_or("unknown"),
            comment.text
        ));
    }
    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS: &str = r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
      <authors><author>Dana</author><author></author></authors>
      <commentList>
        <comment ref="B2" authorId="0"><text><r><t>Check the</t></r><r><t xml:space="preserve">
        churn figure</t></r></text></comment>
        <comment ref="C5" authorId="1"><text><t>Source?</t></text></comment>
        <comment ref="D1" authorId="0"><text><t>   </t></text></comment>
      </commentList></comments>"#;

    #[test]
    fn test_parse_comments() {
        let comments = parse_comments(COMMENTS).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].reference, "B2");
        assert_eq!(comments[0].author.as_deref(), Some("Dana"));
        assert_eq!(comments[0].text, "Check the churn figure");
        assert_eq!(comments[1].author, None);
    }

    #[test]
    fn test_render_comment_block() {
        let comments = parse_comments(COMMENTS).unwrap();
        assert_eq!(
            render_comment_block("Metrics", &comments),
            "【Comments in Metrics】\nCell B2 (by Dana): Check the churn figure\nCell C5 (by unknown): Source?\n\n"
        );
        assert_eq!(render_comment_block("Metrics", &[]), "");
    }

    #[test]
    fn test_malformed_comments_error() {
        assert!(parse_comments("<comments><authors>").is_err());
    }
}
