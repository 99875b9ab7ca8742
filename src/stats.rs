use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::profiles::{Book, Quote};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStats {
    pub total: usize,
    pub average_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    /// Rating word → number of books, most common first.
    pub rating_distribution: Vec<(String, usize)>,
}

impl BookStats {
    pub fn from_books(books: &[Book]) -> Option<Self> {
        if books.is_empty() {
            return None;
        }

        let prices = books.iter().map(|b| b.price);
        let total_price: f64 = prices.clone().sum();

        let mut ratings: IndexMap<&str, usize> = IndexMap::new();
        for book in books {
            *ratings.entry(book.rating.as_str()).or_insert(0) += 1;
        }
        let mut rating_distribution: Vec<(String, usize)> =
            ratings.into_iter().map(|(r, n)| (r.to_string(), n)).collect();
        rating_distribution.sort_by(|a, b| b.1.cmp(&a.1));

        Some(Self {
            total: books.len(),
            average_price: total_price / books.len() as f64,
            max_price: prices.clone().fold(f64::MIN, f64::max),
            min_price: prices.fold(f64::MAX, f64::min),
            rating_distribution,
        })
    }
}

impl fmt::Display for BookStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total books: {}", self.total)?;
        writeln!(f, "Average price: £{:.2}", self.average_price)?;
        writeln!(f, "Most expensive: £{:.2}", self.max_price)?;
        writeln!(f, "Cheapest: £{:.2}", self.min_price)?;
        write!(f, "Rating distribution:")?;
        for (rating, count) in &self.rating_distribution {
            write!(f, "\n  {}: {} books", rating, count)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteStats {
    pub total: usize,
    pub unique_authors: usize,
    pub unique_tags: usize,
}

impl QuoteStats {
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let authors: HashSet<&str> = quotes.iter().map(|q| q.author.as_str()).collect();
        let tags: HashSet<&str> = quotes
            .iter()
            .flat_map(|q| q.tags.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            total: quotes.len(),
            unique_authors: authors.len(),
            unique_tags: tags.len(),
        }
    }
}

impl fmt::Display for QuoteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total quotes: {}", self.total)?;
        writeln!(f, "Unique authors: {}", self.unique_authors)?;
        write!(f, "Total tags: {}", self.unique_tags)
    }
}
