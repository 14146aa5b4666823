//! Table query translation.
//!
//! ```text
//! query text ──parse──▶ QuerySpecification ──edit──▶ QuerySpecification
//!                                                        │
//!                        TableAndColumnMapper ◀──────────┤
//!                                                        ▼
//!                                               TranslatedQuery (SQL + binds)
//! ```
//!
//! - [`parser`] - sqlparser output narrowed to the supported subset
//! - [`ast`] - the query model and its text rendering
//! - [`mapper`] - table identities and column resolution
//! - [`translator`] - physical SQL and bind parameters
//! - [`edit`] - filters, facets, sorting and pagination from a request
//! - [`orchestrator`] - the whole pass for one [`QueryRequest`]

pub mod ast;
pub mod edit;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod parser;
pub mod provider;
pub mod request;
pub mod select;
pub mod translator;

pub use ast::QuerySpecification;
pub use error::{TranslationError, TranslationResult};
pub use mapper::{ResolvedColumn, TableAndColumnMapper, TableInfo};
pub use orchestrator::QueryOrchestrator;
pub use parser::parse_query;
pub use provider::{
    index_description, InMemorySchemaProvider, IndexDescription, SchemaProvider, SqlContext,
    TableIndexDescription, ViewIndexDescription,
};
pub use request::{
    FacetSelection, FilterOperator, QueryFilter, QueryRequest, SortItem, NULL_VALUE_KEYWORD,
};
pub use select::{SelectColumn, SelectColumnKind};
pub use translator::{translate, translate_count, CountQuery, TranslatedQuery, TranslationOptions};
