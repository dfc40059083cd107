//! In-memory query engine: the reference implementation of the search
//! contract, run without a backend.
//!
//! Pipeline: text match, filter, sort, facets, paginate. Facets and totals
//! cover the whole filtered set; only `records` is paginated.

use crate::error::Result;
use crate::query::filter::FilterInput;
use crate::query::fuzzy::FuzzyMatcher;
use crate::types::{Document, SearchOptions, SearchResult, Total};

mod facets;
pub mod predicate;
mod sorting;

pub use predicate::{compile as compile_predicate, Predicate};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pub(crate) matcher: FuzzyMatcher,
    pub(crate) page_size: usize,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        QueryExecutor::new(FuzzyMatcher::new(Vec::new(), 4, 8), DEFAULT_PAGE_SIZE)
    }
}

impl QueryExecutor {
    pub fn new(matcher: FuzzyMatcher, page_size: usize) -> Self {
        QueryExecutor {
            matcher,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Run `query` over `documents`, which must be in store order; ties in
    /// every later stage keep that order.
    pub fn execute<'a, I>(&self, documents: I, query: &str, options: SearchOptions) -> Result<SearchResult>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let predicate = match &options.filters {
            Some(filter) => Some(compile_predicate(filter)?),
            None => None,
        };

        let mut hits = self.text_match(documents, query);
        if let Some(predicate) = &predicate {
            hits.retain(|doc| predicate(*doc));
        }
        self.apply_sort(&mut hits, &options.sort);

        let facets = self.aggregate_facets(&hits, &options.facets);
        let total = Total::new(hits.len(), self.page_size);

        let start = options.page.saturating_mul(self.page_size);
        let records: Vec<Document> = hits
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();

        tracing::debug!(
            "[MEMORY] query={:?} page={} records={} total={}",
            query,
            options.page,
            records.len(),
            total.records
        );

        Ok(SearchResult {
            query: query.to_string(),
            page: options.page,
            total,
            sort: options.sort,
            records,
            facets,
            filters: options.filters.map(FilterInput::from),
        })
    }

    /// An empty (or punctuation-only) query matches everything in store
    /// order. Otherwise hits are ranked by typo count, best first, with ties
    /// kept in store order.
    fn text_match<'a, I>(&self, documents: I, query: &str) -> Vec<&'a Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let words = FuzzyMatcher::query_words(query);
        if words.is_empty() {
            return documents.into_iter().collect();
        }

        let mut scored: Vec<(usize, &'a Document)> = documents
            .into_iter()
            .filter_map(|doc| self.matcher.score(doc, &words).map(|score| (score, doc)))
            .collect();
        scored.sort_by_key(|(score, _)| *score);
        scored.into_iter().map(|(_, doc)| doc).collect()
    }
}
