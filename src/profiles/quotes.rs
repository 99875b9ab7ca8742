use serde::{Deserialize, Serialize};

use super::{extract_each, required, RecordError};
use crate::document::{Document, Element};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
    /// Tag names joined with ", ".
    pub tags: String,
}

/// One [`Quote`] per `div.quote` block that has both text and author.
pub fn extract(document: &Document) -> Vec<Quote> {
    let quotes = extract_each(document, "div.quote", "quote", parse_quote);
    log::info!("Scraped {} quotes", quotes.len());
    quotes
}

fn parse_quote(block: Element<'_>) -> Result<Quote, RecordError> {
    let quote = required(&block, "span.text", "quote text")?.full_text();
    let author = required(&block, "small.author", "author")?.full_text();

    let tags = block
        .select("a.tag")
        .map_err(|_| RecordError::Missing("tags"))?
        .iter()
        .map(|tag| tag.full_text())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Quote { quote, author, tags })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_block() {
        let doc = Document::parse_str(
            r#"<div class="quote">
                <span class="text">“Be yourself.”</span>
                <span>by <small class="author">Oscar Wilde</small></span>
                <div class="tags">
                    <a class="tag" href="/tag/a">attributed</a>
                    <a class="tag" href="/tag/b">be-yourself</a>
                </div>
            </div>"#,
        )
        .unwrap();

        let quotes = extract(&doc);
        assert_eq!(
            quotes,
            vec![Quote {
                quote: "“Be yourself.”".to_string(),
                author: "Oscar Wilde".to_string(),
                tags: "attributed, be-yourself".to_string(),
            }]
        );
    }

    #[test]
    fn test_quote_without_tags_has_empty_tags() {
        let doc = Document::parse_str(
            r#"<div class="quote"><span class="text">Quiet.</span><small class="author">Anon</small></div>"#,
        )
        .unwrap();
        assert_eq!(extract(&doc)[0].tags, "");
    }

    #[test]
    fn test_missing_author_is_an_error() {
        let doc = Document::parse_str(r#"<div class="quote"><span class="text">Lonely.</span></div>"#).unwrap();
        let block = doc.select("div.quote").unwrap()[0];
        assert_eq!(parse_quote(block), Err(RecordError::Missing("author")));
        assert!(extract(&doc).is_empty());
    }
}
