use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{extract_each, required, RecordError};
use crate::document::{Document, Element};

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*(\d+(?:\.\d+)?)\s*$").expect("price pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub price: f64,
    /// Star rating word as the catalogue writes it ("One" .. "Five").
    pub rating: String,
    pub availability: String,
    pub page: usize,
}

/// Books listed on catalogue page number `page`.
pub fn extract(document: &Document, page: usize) -> Vec<Book> {
    extract_each(document, "article.product_pod", "book", |card| parse_book(card, page))
}

fn parse_book(card: Element<'_>, page: usize) -> Result<Book, RecordError> {
    let title = required(&card, "h3 a", "title link")?
        .attr("title")
        .ok_or(RecordError::Missing("title"))?
        .to_string();

    let price = parse_price(&required(&card, "p.price_color", "price")?.full_text())?;

    let rating = required(&card, "p.star-rating", "rating")?
        .classes()
        .get(1)
        .map(|word| word.to_string())
        .ok_or(RecordError::Missing("rating"))?;

    let availability = required(&card, "p.instock.availability", "availability")?.full_text();

    Ok(Book {
        title,
        price,
        rating,
        availability,
        page,
    })
}

/// `"£51.77"` → `51.77`. A currency prefix (and any mojibake in it) is
/// ignored; the rest must be a single plain decimal number, so grouped or
/// multi-part amounts such as `"£1,299.99"` are rejected.
pub fn parse_price(text: &str) -> Result<f64, RecordError> {
    let invalid = || RecordError::Invalid {
        field: "price",
        value: text.to_string(),
    };

    PRICE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(invalid)?
        .as_str()
        .parse()
        .map_err(|_| invalid())
}
