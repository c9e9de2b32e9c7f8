//! Display projection of a [`SearchResult`].
//!
//! Borrowing only: nothing here can change the result it looks at. The
//! Markdown itself is drawn by the UI; this module decides what is shown and
//! which citations survive.
use crate::SearchResult;

pub const CITATIONS_HEADING: &str = "Sources & Locations";

/// A place link taken from grounding metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Citation<'a> {
    pub title: &'a str,
    pub uri: &'a str,
}

impl<'a> Citation<'a> {
    /// Visible text; falls back to the URI for untitled places.
    pub fn label(&self) -> &'a str {
        if self.title.trim().is_empty() {
            self.uri
        } else {
            self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation<'a> {
    pub markdown: &'a str,
    pub citations: Vec<Citation<'a>>,
}

impl Presentation<'_> {
    pub fn has_citations(&self) -> bool {
        !self.citations.is_empty()
    }
}

pub fn present(result: &SearchResult) -> Presentation<'_> {
    Presentation {
        markdown: &result.text,
        citations: citations(result),
    }
}

/// Map citations in response order; chunks without `maps` are skipped.
pub fn citations(result: &SearchResult) -> Vec<Citation<'_>> {
    result
        .grounding_metadata
        .iter()
        .flat_map(|meta| meta.grounding_chunks.iter())
        .filter_map(|chunk| chunk.maps.as_ref())
        .map(|maps| Citation {
            title: &maps.title,
            uri: &maps.uri,
        })
        .collect()
}
