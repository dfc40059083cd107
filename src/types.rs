use crate::error::{Result, UnsearchError};
use crate::query::filter::{Filter, FilterInput};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Document identifier. Opaque to comparisons; adapters may encode it on the wire.
pub type DocumentId = String;

/// A document: an open mapping of field name to JSON value with a mandatory
/// string `id`.
///
/// The `id` lives inside the field map so filters, sorts and facets can
/// address it like any other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Build a document from an id and the remaining fields. An `id` key in
    /// `fields` is overwritten.
    pub fn new(id: impl Into<DocumentId>, mut fields: Map<String, Value>) -> Self {
        fields.insert("id".to_string(), Value::String(id.into()));
        Document { fields }
    }

    /// Parse a [`Document`] from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`UnsearchError::InvalidDocument`] if the value is not a JSON
    /// object, or [`UnsearchError::MissingField`] if it has no string `id`.
    pub fn from_json(json: Value) -> Result<Self> {
        match json {
            Value::Object(map) => Self::try_from(map),
            _ => Err(UnsearchError::InvalidDocument(
                "Expected JSON object".to_string(),
            )),
        }
    }

    pub fn id(&self) -> &str {
        self.fields.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    /// Look up a field. Absent fields and explicit `null` both read as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Return a copy with the id passed through `f`, used by adapters whose
    /// backend restricts identifier characters.
    pub fn map_id(mut self, f: impl FnOnce(&str) -> String) -> Self {
        let id = f(self.id());
        self.fields.insert("id".to_string(), Value::String(id));
        self
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = UnsearchError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        match fields.get("id") {
            Some(Value::String(_)) => Ok(Document { fields }),
            Some(other) => Err(UnsearchError::InvalidDocument(format!(
                "Document id must be a string, got {}",
                other
            ))),
            None => Err(UnsearchError::MissingField("id".to_string())),
        }
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        doc.fields
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One resolved sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        SortField {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortField {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Canonical options handed to an adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub page: usize,
    pub sort: Vec<SortField>,
    pub facets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filter>,
}

/// Page number as callers send it: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoftPage {
    Number(i64),
    Text(String),
}

impl From<usize> for SoftPage {
    fn from(page: usize) -> Self {
        SoftPage::Number(page as i64)
    }
}

impl From<&str> for SoftPage {
    fn from(page: &str) -> Self {
        SoftPage::Text(page.to_string())
    }
}

/// A sort key as callers send it: a bare field name or `{field, direction?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    Name(String),
    Field {
        field: String,
        #[serde(default)]
        direction: Option<SortDirection>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoftSort {
    One(String),
    Many(Vec<SortKey>),
}

impl From<&str> for SoftSort {
    fn from(field: &str) -> Self {
        SoftSort::One(field.to_string())
    }
}

impl From<Vec<&str>> for SoftSort {
    fn from(fields: Vec<&str>) -> Self {
        SoftSort::Many(
            fields
                .into_iter()
                .map(|f| SortKey::Name(f.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<SortField>> for SoftSort {
    fn from(fields: Vec<SortField>) -> Self {
        SoftSort::Many(
            fields
                .into_iter()
                .map(|f| SortKey::Field {
                    field: f.field,
                    direction: Some(f.direction),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoftFacets {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SoftFacets {
    fn from(field: &str) -> Self {
        SoftFacets::One(field.to_string())
    }
}

impl From<Vec<&str>> for SoftFacets {
    fn from(fields: Vec<&str>) -> Self {
        SoftFacets::Many(fields.into_iter().map(String::from).collect())
    }
}

/// Loosely-typed, caller-facing search options. Normalized into
/// [`SearchOptions`] by [`Index::search`](crate::Index::search).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftSearchOptions {
    #[serde(default)]
    pub page: Option<SoftPage>,
    #[serde(default)]
    pub sort: Option<SoftSort>,
    #[serde(default)]
    pub facets: Option<SoftFacets>,
    #[serde(default)]
    pub filters: Option<FilterInput>,
}

impl SoftSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: impl Into<SoftPage>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<SoftSort>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn facets(mut self, facets: impl Into<SoftFacets>) -> Self {
        self.facets = Some(facets.into());
        self
    }

    pub fn filters(mut self, filters: impl Into<FilterInput>) -> Self {
        self.filters = Some(filters.into());
        self
    }
}

/// Value → count distribution for one facet field.
pub type FacetStats = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Total {
    pub pages: usize,
    pub records: usize,
}

impl Total {
    pub fn new(records: usize, page_size: usize) -> Self {
        Total {
            pages: records.div_ceil(page_size.max(1)),
            records,
        }
    }
}

/// Canonical search response shared by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub page: usize,
    pub total: Total,
    pub sort: Vec<SortField>,
    pub records: Vec<Document>,
    pub facets: BTreeMap<String, FacetStats>,
    /// The filters as the caller passed them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterInput>,
}

impl SearchResult {
    /// A result with no records that still echoes the request.
    pub fn empty(query: &str, options: SearchOptions) -> Self {
        SearchResult {
            query: query.to_string(),
            page: options.page,
            total: Total::default(),
            sort: options.sort,
            records: Vec::new(),
            facets: BTreeMap::new(),
            filters: options.filters.map(FilterInput::from),
        }
    }
}
