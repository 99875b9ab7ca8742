use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Structural selectors that usually mark one record on listing pages,
/// in priority order.
pub const PATTERN_SELECTORS: &[&str] = &[
    "article",
    "div.item",
    "div.card",
    "div.product",
    "div.post",
    "li",
    ".listing",
    ".entry",
];

/// A selector hypothesised to match one repeated record container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCandidate {
    pub selector: String,
    pub match_count: usize,
    pub sample_snippet: String,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    FrequencyHeuristic,
    PatternHeuristic,
}

#[derive(Debug, Clone)]
pub struct DetectorOptions {
    /// How many of the most frequent classes are considered.
    pub top_classes: usize,
    pub min_matches: usize,
    /// The first match must have strictly more descendant elements than this.
    pub min_descendants: usize,
    pub max_candidates: usize,
    pub snippet_chars: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            top_classes: 20,
            min_matches: 3,
            min_descendants: 2,
            max_candidates: 5,
            snippet_chars: 200,
        }
    }
}

/// Ranks selectors likely to identify repeating record containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerDetector {
    options: DetectorOptions,
}

impl ContainerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DetectorOptions) -> Self {
        Self { options }
    }

    /// Ranked candidates for `document`; pattern matches first, then
    /// frequent classes by descending count.
    pub fn detect(&self, document: &Document) -> Vec<ContainerCandidate> {
        let patterns = self.pattern_candidates(document);
        let frequent = self.frequency_candidates(document);

        log::debug!(
            "Container detection: {} pattern and {} frequency candidate(s)",
            patterns.len(),
            frequent.len()
        );

        merge_candidates(patterns, frequent, self.options.max_candidates)
    }

    /// Best-effort detection on raw bytes. A page that cannot be parsed
    /// simply has no candidates.
    pub fn detect_html(&self, bytes: &[u8]) -> Vec<ContainerCandidate> {
        match Document::parse(bytes) {
            Ok(document) => self.detect(&document),
            Err(e) => {
                log::warn!("Container detection skipped: {}", e);
                Vec::new()
            }
        }
    }

    /// Candidates from the fixed list of structural selectors.
    pub fn pattern_candidates(&self, document: &Document) -> Vec<ContainerCandidate> {
        PATTERN_SELECTORS
            .iter()
            .filter_map(|selector| self.candidate(document, selector, CandidateSource::PatternHeuristic))
            .collect()
    }

    /// Candidates from the most frequent classes whose first match is
    /// structurally rich enough to be a record.
    pub fn frequency_candidates(&self, document: &Document) -> Vec<ContainerCandidate> {
        let frequencies = document.class_frequencies();
        let mut candidates = Vec::new();

        for (class, count) in frequencies.most_common(self.options.top_classes) {
            if count < self.options.min_matches {
                continue;
            }

            let selector = format!(".{}", class);
            let matches = match document.select(&selector) {
                Ok(matches) => matches,
                Err(e) => {
                    log::debug!("Skipping class '{}': {}", class, e);
                    continue;
                }
            };

            let Some(first) = matches.first() else {
                continue;
            };

            if first.descendant_count() <= self.options.min_descendants {
                continue;
            }

            if matches.len() < self.options.min_matches {
                continue;
            }

            candidates.push(ContainerCandidate {
                selector,
                match_count: matches.len(),
                sample_snippet: snippet(&first.html(), self.options.snippet_chars),
                source: CandidateSource::FrequencyHeuristic,
            });
        }

        candidates.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        candidates
    }

    fn candidate(
        &self,
        document: &Document,
        selector: &str,
        source: CandidateSource,
    ) -> Option<ContainerCandidate> {
        let matches = document.select(selector).ok()?;
        if matches.len() < self.options.min_matches {
            return None;
        }

        Some(ContainerCandidate {
            selector: selector.to_string(),
            match_count: matches.len(),
            sample_snippet: snippet(&matches[0].html(), self.options.snippet_chars),
            source,
        })
    }
}

/// Fixed-priority merge: every pattern candidate precedes every frequency
/// candidate, then the list is cut to `limit`.
pub fn merge_candidates(
    patterns: Vec<ContainerCandidate>,
    frequent: Vec<ContainerCandidate>,
    limit: usize,
) -> Vec<ContainerCandidate> {
    patterns.into_iter().chain(frequent).take(limit).collect()
}

/// Detect with default options.
pub fn detect(document: &Document) -> Vec<ContainerCandidate> {
    ContainerDetector::new().detect(document)
}

fn snippet(html: &str, max_chars: usize) -> String {
    html.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &str = r#"<div class="item"><h2>Title</h2><p>Longer description text</p></div><div class="item"><h2>Other</h2><p>Another description</p></div><div class="item"><h2>Third</h2><p>Yet more text</p></div>"#;

    fn doc(html: &str) -> Document {
        Document::parse_str(html).unwrap()
    }

    #[test]
    fn test_detects_repeated_items() {
        let candidates = detect(&doc(ITEMS));

        // .item itself holds only h2 + p, too shallow for the frequency
        // heuristic; the structural pattern still surfaces it.
        assert_eq!(candidates.len(), 1);
        let item = &candidates[0];
        assert_eq!(item.selector, "div.item");
        assert_eq!(item.match_count, 3);
        assert_eq!(item.source, CandidateSource::PatternHeuristic);
        assert!(item.sample_snippet.starts_with(r#"<div class="item"><h2>Title</h2>"#));
    }

    #[test]
    fn test_no_classes_no_candidates() {
        let candidates = detect(&doc("<div><p>one</p><p>two</p><p>three</p></div>"));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_shallow_classes_are_rejected() {
        let html = r#"<span class="price">1</span><span class="price">2</span><span class="price">3</span>"#;
        assert!(detect(&doc(html)).is_empty());
    }

    #[test]
    fn test_mixed_text_with_one_element_is_rejected() {
        // one element plus two text nodes per match
        let html = r#"<p class="price"><span>$</span>5</p><p class="price"><span>$</span>6</p><p class="price"><span>$</span>7</p>"#;
        let detector = ContainerDetector::new();
        assert!(detector.frequency_candidates(&doc(html)).is_empty());
        assert!(detect(&doc(html)).is_empty());
    }

    #[test]
    fn test_only_top_classes_are_considered() {
        let mut html = String::new();
        for i in 0..20 {
            for _ in 0..4 {
                html.push_str(&format!(r#"<span class="c{i}">x</span>"#));
            }
        }
        for _ in 0..3 {
            html.push_str(r#"<section class="rich"><h2>x</h2><p>y</p><span>z</span></section>"#);
        }

        let page = doc(&html);
        assert!(detect(&page).is_empty());

        let wider = ContainerDetector::with_options(DetectorOptions {
            top_classes: 21,
            ..Default::default()
        });
        let candidates = wider.detect(&page);
        let selectors: Vec<_> = candidates.iter().map(|c| c.selector.as_str()).collect();
        assert_eq!(selectors, vec![".rich"]);
    }

    #[test]
    fn test_below_min_matches_rejected() {
        let html = r#"<div class="card"><h2>a</h2><p>b</p></div><div class="card"><h2>c</h2><p>d</p></div>"#;
        assert!(detect(&doc(html)).is_empty());
    }

    #[test]
    fn test_patterns_precede_frequency_candidates() {
        let mut html = String::new();
        for i in 0..8 {
            html.push_str(&format!(r#"<section class="row"><h2>Row {i}</h2><p>Body {i}</p><span>z</span></section>"#));
        }
        html.push_str("<ul><li>a</li><li>b</li><li>c</li></ul>");

        let candidates = detect(&doc(&html));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].selector, "li");
        assert_eq!(candidates[0].match_count, 3);
        assert_eq!(candidates[0].source, CandidateSource::PatternHeuristic);
        assert_eq!(candidates[1].selector, ".row");
        assert_eq!(candidates[1].match_count, 8);
    }

    #[test]
    fn test_frequency_candidates_sorted_by_count() {
        let mut html = String::new();
        for _ in 0..3 {
            html.push_str(r#"<section class="few"><h2>x</h2><p>y</p><span>z</span></section>"#);
        }
        for _ in 0..6 {
            html.push_str(r#"<section class="many"><h2>x</h2><p>y</p><span>z</span></section>"#);
        }

        let detector = ContainerDetector::new();
        let candidates = detector.frequency_candidates(&doc(&html));
        let selectors: Vec<_> = candidates.iter().map(|c| c.selector.as_str()).collect();
        assert_eq!(selectors, vec![".many", ".few"]);
    }

    #[test]
    fn test_output_truncated_to_five() {
        let mut html = String::new();
        for class in ["a", "b", "c", "d", "e", "f", "g"] {
            for _ in 0..3 {
                html.push_str(&format!(r#"<section class="{class}"><h2>x</h2><p>y</p><span>z</span></section>"#));
            }
        }
        html.push_str("<ul><li>1</li><li>2</li><li>3</li></ul>");

        let candidates = detect(&doc(&html));
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].source, CandidateSource::PatternHeuristic);
        assert!(candidates[1..].iter().all(|c| c.source == CandidateSource::FrequencyHeuristic));
    }

    #[test]
    fn test_unselectable_class_is_skipped() {
        let mut html = String::new();
        for _ in 0..3 {
            html.push_str(r#"<section class="md:flex ok"><h2>x</h2><p>y</p><span>z</span></section>"#);
        }

        let candidates = detect(&doc(&html));
        let selectors: Vec<_> = candidates.iter().map(|c| c.selector.as_str()).collect();
        assert_eq!(selectors, vec![".ok"]);
    }

    #[test]
    fn test_detect_html_swallows_parse_failure() {
        let detector = ContainerDetector::new();
        assert!(detector.detect_html(b"   ").is_empty());
        assert_eq!(detector.detect_html(ITEMS.as_bytes()).len(), 1);
    }

    #[test]
    fn test_snippet_is_bounded() {
        let long = format!(
            r#"<div class="item"><h2>{}</h2><p>x</p></div>"#,
            "é".repeat(500)
        )
        .repeat(3);
        let candidates = detect(&doc(&long));
        assert!(candidates.iter().all(|c| c.sample_snippet.chars().count() <= 200));
    }
}
