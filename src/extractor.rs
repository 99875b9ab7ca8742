use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Element};

/// One record pulled from a container: `field_1..field_k` in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: IndexMap<String, String>,
}

impl ExtractedRecord {
    fn from_values(values: Vec<String>) -> Self {
        let fields = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| (format!("field_{}", i + 1), value))
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Texts shorter than this many characters are dropped.
    pub min_text_len: usize,
    pub max_fields: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            min_text_len: 3,
            max_fields: 10,
        }
    }
}

/// Best-effort positional field extraction from chosen containers.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    options: ExtractorOptions,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// Records from at most `max_items` elements matching `selector`.
    /// Containers without any qualifying text produce no record.
    pub fn extract(&self, document: &Document, selector: &str, max_items: usize) -> Vec<ExtractedRecord> {
        let containers = match document.select(selector) {
            Ok(containers) => containers,
            Err(e) => {
                log::warn!("No records extracted: {}", e);
                return Vec::new();
            }
        };

        let records: Vec<ExtractedRecord> = containers
            .into_iter()
            .take(max_items.max(1))
            .filter_map(|container| self.extract_record(container))
            .collect();

        log::info!("Extracted {} record(s) using '{}'", records.len(), selector);
        records
    }

    pub fn extract_record(&self, container: Element<'_>) -> Option<ExtractedRecord> {
        let values: Vec<String> = container
            .all_text(true)
            .into_iter()
            .filter(|text| text.chars().count() >= self.options.min_text_len)
            .take(self.options.max_fields)
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(ExtractedRecord::from_values(values))
        }
    }
}

/// Extract with default options.
pub fn extract(document: &Document, selector: &str, max_items: usize) -> Vec<ExtractedRecord> {
    FieldExtractor::new().extract(document, selector, max_items)
}
