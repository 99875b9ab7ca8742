//! Hardcoded extraction rules for known page layouts.
//!
//! Each profile turns a parsed page into typed records. A record whose
//! required pieces are missing is logged and skipped; the rest of the
//! page is still extracted.

pub mod books;
pub mod quotes;

pub use books::Book;
pub use quotes::Quote;

use thiserror::Error;

use crate::document::{Document, Element};

/// Why a single record could not be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: '{value}'")]
    Invalid { field: &'static str, value: String },
}

/// First descendant matching `selector`, or a `Missing` error naming `field`.
pub(crate) fn required<'a>(
    container: &Element<'a>,
    selector: &str,
    field: &'static str,
) -> Result<Element<'a>, RecordError> {
    container.find(selector).ok_or(RecordError::Missing(field))
}

/// Apply `parse` to every container matching `selector`, skipping the ones
/// that fail.
pub(crate) fn extract_each<'a, T>(
    document: &'a Document,
    selector: &str,
    kind: &str,
    parse: impl Fn(Element<'a>) -> Result<T, RecordError>,
) -> Vec<T> {
    let containers = match document.select(selector) {
        Ok(containers) => containers,
        Err(e) => {
            log::error!("Bad {} container selector: {}", kind, e);
            return Vec::new();
        }
    };

    containers
        .into_iter()
        .filter_map(|container| match parse(container) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Error parsing {}: {}", kind, e);
                None
            }
        })
        .collect()
}
