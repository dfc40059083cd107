pub mod dialect;
pub mod executor;
pub mod filter;
pub mod fuzzy;
pub mod sort;

pub use dialect::{AlgoliaDialect, CompiledFilter, Dialect, FilterCompiler, MeiliDialect, TypesenseDialect};
pub use executor::QueryExecutor;
pub use filter::{Combinator, Comparison, Filter, FilterInput};
pub use fuzzy::FuzzyMatcher;
pub use sort::{normalize_facets, normalize_sort};
