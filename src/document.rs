use ego_tree::NodeRef;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Result, ScrapeError};

/// A parsed HTML page.
///
/// Parsing is delegated to html5ever through the `scraper` crate, so
/// unclosed tags, stray entities and similar irregularities are recovered
/// the same way a browser would recover them.
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse raw response bytes. Invalid UTF-8 sequences are replaced
    /// rather than rejected; only input with no content at all fails.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(bytes);
        Self::parse_str(&text)
    }

    pub fn parse_str(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(ScrapeError::Parse("input contains no markup".to_string()));
        }

        Ok(Self {
            html: Html::parse_document(html),
        })
    }

    pub fn root(&self) -> Element<'_> {
        Element {
            inner: self.html.root_element(),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).map(Element::from).collect())
    }

    /// Number of elements matching `selector`; zero for an invalid selector.
    pub fn count(&self, selector: &str) -> usize {
        match compile(selector) {
            Ok(selector) => self.html.select(&selector).count(),
            Err(_) => 0,
        }
    }

    /// Occurrences of every class name across the whole document.
    pub fn class_frequencies(&self) -> ClassFrequency {
        let mut counts: IndexMap<String, usize> = IndexMap::new();

        for element in self.html.root_element().descendants().filter_map(ElementRef::wrap) {
            for class in Element::from(element).classes() {
                *counts.entry(class.to_string()).or_insert(0) += 1;
            }
        }

        ClassFrequency { counts }
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Borrowed view of one element in a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }
}

impl<'a> Element<'a> {
    pub fn tag(&self) -> &'a str {
        self.inner.value().name()
    }

    /// Class names exactly as written in the `class` attribute, in order
    /// and with duplicates kept.
    pub fn classes(&self) -> Vec<&'a str> {
        self.inner
            .value()
            .attr("class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    pub fn children(&self) -> Vec<Element<'a>> {
        self.inner.children().filter_map(ElementRef::wrap).map(Element::from).collect()
    }

    /// The element's own direct text, joined and trimmed.
    pub fn text(&self) -> String {
        self.all_text(false)
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every text node, trimmed, in document order. With `recursive` the
    /// whole subtree is walked, otherwise only direct children. Empty
    /// strings are kept; callers decide what to filter.
    pub fn all_text(&self, recursive: bool) -> Vec<String> {
        let trimmed = |node: NodeRef<'a, Node>| match node.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            _ => None,
        };

        if recursive {
            self.inner.descendants().skip(1).filter_map(trimmed).collect()
        } else {
            self.inner.children().filter_map(trimmed).collect()
        }
    }

    /// Concatenated text of the whole subtree, trimmed.
    pub fn full_text(&self) -> String {
        self.inner.text().collect::<String>().trim().to_string()
    }

    /// Number of descendant elements; text nodes are not counted.
    pub fn descendant_count(&self) -> usize {
        self.inner
            .descendants()
            .skip(1)
            .filter(|node| node.value().is_element())
            .count()
    }

    /// Matching descendants of this element.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let selector = compile(selector)?;
        Ok(self.inner.select(&selector).map(Element::from).collect())
    }

    /// First matching descendant, if any. Invalid selectors match nothing.
    pub fn find(&self, selector: &str) -> Option<Element<'a>> {
        let selector = compile(selector).ok()?;
        self.inner.select(&selector).next().map(Element::from)
    }

    /// Serialized outer HTML.
    pub fn html(&self) -> String {
        self.inner.html()
    }
}

/// Class name occurrence counts, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ClassFrequency {
    counts: IndexMap<String, usize>,
}

impl ClassFrequency {
    pub fn get(&self, class: &str) -> usize {
        self.counts.get(class).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent classes, highest count first. Ties keep the
    /// order in which the classes were first seen.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.counts.iter().map(|(class, count)| (class.as_str(), *count)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <div class="item featured item">
                <h2>Title</h2>
                <p>Own <b>bold</b> tail</p>
            </div>
            <div class="item"><span>x</span></div>
            <ul><li class="tag">one</li><li class="tag">two</li></ul>
        </body></html>
    "#;

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(Document::parse(b"").is_err());
        assert!(Document::parse(b"  \n\t ").unwrap_err().is_parse());
    }

    #[test]
    fn test_malformed_html_is_recovered() {
        let doc = Document::parse(b"<div class='a'><p>unclosed &amp; <span>text").unwrap();
        let divs = doc.select("div.a").unwrap();
        assert_eq!(divs.len(), 1);
        assert_eq!(divs[0].full_text(), "unclosed & text");
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let doc = Document::parse(b"<p class=\"x\">caf\xe9</p>").unwrap();
        assert_eq!(doc.count("p.x"), 1);
    }

    #[test]
    fn test_classes_keep_order_and_duplicates() {
        let doc = Document::parse_str(PAGE).unwrap();
        let first = doc.select(".item").unwrap()[0];
        assert_eq!(first.tag(), "div");
        assert_eq!(first.classes(), vec!["item", "featured", "item"]);
        assert!(first.has_class("featured"));
    }

    #[test]
    fn test_class_frequencies() {
        let doc = Document::parse_str(PAGE).unwrap();
        let freq = doc.class_frequencies();
        assert_eq!(freq.get("item"), 3);
        assert_eq!(freq.get("tag"), 2);
        assert_eq!(freq.get("missing"), 0);
        assert_eq!(freq.most_common(2), vec![("item", 3), ("tag", 2)]);
    }

    #[test]
    fn test_most_common_ties_keep_first_seen_order() {
        let doc = Document::parse_str(
            r#"<p class="b"></p><p class="a"></p><p class="c"></p><p class="a"></p><p class="b"></p>"#,
        )
        .unwrap();
        let freq = doc.class_frequencies();
        assert_eq!(freq.most_common(3), vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_all_text_direct_and_recursive() {
        let doc = Document::parse_str(PAGE).unwrap();
        let p = doc.select("p").unwrap()[0];
        assert_eq!(p.all_text(false), vec!["Own", "tail"]);
        assert_eq!(p.all_text(true), vec!["Own", "bold", "tail"]);
        assert_eq!(p.text(), "Own tail");
    }

    #[test]
    fn test_children_and_child_selector() {
        let doc = Document::parse_str(
            r#"<article><h3><a href="/b" title="A Book">A Bo...</a></h3><p>x</p></article>"#,
        )
        .unwrap();
        let article = doc.select("article").unwrap()[0];
        let tags: Vec<_> = article.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["h3", "p"]);
        let link = article.find("h3 > a").unwrap();
        assert_eq!(link.attr("title"), Some("A Book"));
    }

    #[test]
    fn test_descendant_count_counts_elements_only() {
        let doc = Document::parse_str(PAGE).unwrap();
        let items = doc.select(".item").unwrap();
        // h2, p, b
        assert_eq!(items[0].descendant_count(), 3);
        assert_eq!(items[1].descendant_count(), 1);

        let doc = Document::parse_str(r#"<p class="price"><span>$</span>5</p>"#).unwrap();
        assert_eq!(doc.select(".price").unwrap()[0].descendant_count(), 1);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse_str(PAGE).unwrap();
        assert!(matches!(doc.select("div[").unwrap_err(), ScrapeError::Selector { .. }));
        assert_eq!(doc.count("div["), 0);
    }
}
