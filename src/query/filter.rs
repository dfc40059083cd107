//! Filter AST shared by every adapter.
//!
//! A [`Filter`] is a tree of field comparisons joined by `and` / `or` / `not`.
//! On the wire it keeps the `op`-tagged shape callers already use:
//!
//! ```json
//! {"op": "and", "conditions": [
//!     {"op": ">=", "field": "price", "value": 10},
//!     {"op": "between", "field": "year", "values": [2000, 2010]}
//! ]}
//! ```
//!
//! Callers may also write the per-field mapping form
//! (`{"price": {"gte": 10}, "or": [...]}`); [`FilterInput::resolve`] turns
//! either shape into one canonical tree.

use crate::error::{Result, UnsearchError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Neq => "!=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }

    /// The comparison matching exactly the present values this one rejects.
    pub fn complement(&self) -> Comparison {
        match self {
            Comparison::Eq => Comparison::Neq,
            Comparison::Neq => Comparison::Eq,
            Comparison::Lt => Comparison::Gte,
            Comparison::Lte => Comparison::Gt,
            Comparison::Gt => Comparison::Lte,
            Comparison::Gte => Comparison::Lt,
        }
    }

    fn from_symbol(op: &str) -> Option<Comparison> {
        match op {
            "=" => Some(Comparison::Eq),
            "!=" => Some(Comparison::Neq),
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Lte),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Gte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// De Morgan dual.
    pub fn flip(&self) -> Combinator {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }
}

/// A composable filter tree.
///
/// `and` over zero conditions matches everything and `or` over zero
/// conditions matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub enum Filter {
    Field {
        field: String,
        op: Comparison,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Between {
        field: String,
        min: Value,
        max: Value,
    },
    Condition {
        op: Combinator,
        conditions: Vec<Filter>,
    },
    Not {
        condition: Box<Filter>,
    },
}

pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Eq, value)
}

pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Neq, value)
}

pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Lt, value)
}

pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Lte, value)
}

pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Gt, value)
}

pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(field, Comparison::Gte, value)
}

pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Filter {
    Filter::Field {
        field: field.into(),
        op,
        value: value.into(),
    }
}

/// Set membership (`in`).
pub fn one_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Filter {
    Filter::In {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// Inclusive range `[min, max]`.
pub fn between(field: impl Into<String>, min: impl Into<Value>, max: impl Into<Value>) -> Filter {
    Filter::Between {
        field: field.into(),
        min: min.into(),
        max: max.into(),
    }
}

pub fn and(conditions: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::Condition {
        op: Combinator::And,
        conditions: conditions.into_iter().collect(),
    }
}

pub fn or(conditions: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::Condition {
        op: Combinator::Or,
        conditions: conditions.into_iter().collect(),
    }
}

pub fn not(condition: Filter) -> Filter {
    Filter::Not {
        condition: Box::new(condition),
    }
}

impl Filter {
    /// Check that every operator carries the values it needs.
    ///
    /// # Errors
    ///
    /// [`UnsearchError::Config`] for a `null` comparison value, an empty `in`
    /// list, a `null` range bound, or a composite (array/object) literal.
    pub fn validate(&self) -> Result<()> {
        match self {
            Filter::Field { field, op, value } => check_literal(field, op.symbol(), value),
            Filter::In { field, values } => {
                if values.is_empty() {
                    return Err(UnsearchError::Config(format!(
                        "Operator 'in' on field '{}' requires at least one value",
                        field
                    )));
                }
                values.iter().try_for_each(|v| check_literal(field, "in", v))
            }
            Filter::Between { field, min, max } => {
                check_literal(field, "between", min)?;
                check_literal(field, "between", max)
            }
            Filter::Condition { conditions, .. } => conditions.iter().try_for_each(Filter::validate),
            Filter::Not { condition } => condition.validate(),
        }
    }
}

fn check_literal(field: &str, op: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Err(UnsearchError::Config(format!(
            "Operator '{}' on field '{}' requires a value",
            op, field
        ))),
        Value::Array(_) | Value::Object(_) => Err(UnsearchError::Config(format!(
            "Operator '{}' on field '{}' only accepts string, number or boolean values",
            op, field
        ))),
        _ => Ok(()),
    }
}

/// Flat wire shape of a [`Filter`] node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFilter {
    op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Box<Filter>>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = UnsearchError;

    fn try_from(raw: RawFilter) -> Result<Self> {
        let missing = |what: &str| {
            UnsearchError::Config(format!("Filter with op '{}' is missing '{}'", raw.op, what))
        };

        if let Some(op) = Comparison::from_symbol(&raw.op) {
            let field = raw.field.clone().ok_or_else(|| missing("field"))?;
            let value = raw.value.clone().ok_or_else(|| missing("value"))?;
            return Ok(Filter::Field { field, op, value });
        }

        match raw.op.as_str() {
            "in" => Ok(Filter::In {
                field: raw.field.clone().ok_or_else(|| missing("field"))?,
                values: raw.values.clone().ok_or_else(|| missing("values"))?,
            }),
            "between" => {
                let field = raw.field.clone().ok_or_else(|| missing("field"))?;
                match raw.values.clone().ok_or_else(|| missing("values"))?.as_slice() {
                    [min, max] => Ok(Filter::Between {
                        field,
                        min: min.clone(),
                        max: max.clone(),
                    }),
                    other => Err(UnsearchError::Config(format!(
                        "Operator 'between' on field '{}' takes exactly two values, got {}",
                        field,
                        other.len()
                    ))),
                }
            }
            "and" | "or" => Ok(Filter::Condition {
                op: if raw.op == "and" {
                    Combinator::And
                } else {
                    Combinator::Or
                },
                conditions: raw.conditions.clone().ok_or_else(|| missing("conditions"))?,
            }),
            "not" => Ok(Filter::Not {
                condition: raw.condition.clone().ok_or_else(|| missing("condition"))?,
            }),
            other => Err(UnsearchError::Config(format!("Unknown filter op '{}'", other))),
        }
    }
}

impl From<Filter> for RawFilter {
    fn from(filter: Filter) -> Self {
        let raw = RawFilter {
            op: String::new(),
            field: None,
            value: None,
            values: None,
            conditions: None,
            condition: None,
        };
        match filter {
            Filter::Field { field, op, value } => RawFilter {
                op: op.symbol().to_string(),
                field: Some(field),
                value: Some(value),
                ..raw
            },
            Filter::In { field, values } => RawFilter {
                op: "in".to_string(),
                field: Some(field),
                values: Some(values),
                ..raw
            },
            Filter::Between { field, min, max } => RawFilter {
                op: "between".to_string(),
                field: Some(field),
                values: Some(vec![min, max]),
                ..raw
            },
            Filter::Condition { op, conditions } => RawFilter {
                op: match op {
                    Combinator::And => "and",
                    Combinator::Or => "or",
                }
                .to_string(),
                conditions: Some(conditions),
                ..raw
            },
            Filter::Not { condition } => RawFilter {
                op: "not".to_string(),
                condition: Some(condition),
                ..raw
            },
        }
    }
}

/// Filters as callers may pass them: a tree, a list (implicit AND), or the
/// per-field mapping form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterInput {
    Tree(Filter),
    List(Vec<FilterInput>),
    Mapping(Map<String, Value>),
}

impl From<Filter> for FilterInput {
    fn from(filter: Filter) -> Self {
        FilterInput::Tree(filter)
    }
}

impl From<Vec<Filter>> for FilterInput {
    fn from(filters: Vec<Filter>) -> Self {
        FilterInput::List(filters.into_iter().map(FilterInput::Tree).collect())
    }
}

impl From<Map<String, Value>> for FilterInput {
    fn from(mapping: Map<String, Value>) -> Self {
        FilterInput::Mapping(mapping)
    }
}

impl FilterInput {
    /// Parse any JSON value accepted as filter input.
    pub fn from_json(json: Value) -> Result<Self> {
        match json {
            Value::Object(ref map) if map.contains_key("op") => {
                Ok(FilterInput::Tree(serde_json::from_value(json).map_err(|e| {
                    UnsearchError::Config(format!("Malformed filter: {}", e))
                })?))
            }
            Value::Object(map) => Ok(FilterInput::Mapping(map)),
            Value::Array(items) => Ok(FilterInput::List(
                items
                    .into_iter()
                    .map(FilterInput::from_json)
                    .collect::<Result<_>>()?,
            )),
            other => Err(UnsearchError::Config(format!(
                "Expected a filter object or list, got {}",
                other
            ))),
        }
    }

    /// Resolve into one canonical, validated tree.
    ///
    /// A single-element list resolves to its element; longer lists become an
    /// `and`.
    pub fn resolve(&self) -> Result<Filter> {
        let filter = match self {
            FilterInput::Tree(filter) => filter.clone(),
            FilterInput::List(items) => {
                let mut resolved = items
                    .iter()
                    .map(FilterInput::resolve)
                    .collect::<Result<Vec<_>>>()?;
                if resolved.len() == 1 {
                    resolved.remove(0)
                } else {
                    and(resolved)
                }
            }
            FilterInput::Mapping(map) => resolve_mapping(map)?,
        };
        filter.validate()?;
        Ok(filter)
    }
}

fn resolve_mapping(map: &Map<String, Value>) -> Result<Filter> {
    let mut clauses = Vec::with_capacity(map.len());

    for (key, spec) in map {
        match key.as_str() {
            "and" | "or" => {
                let items = spec.as_array().ok_or_else(|| {
                    UnsearchError::Config(format!("'{}' expects a list of filters", key))
                })?;
                let conditions = items
                    .iter()
                    .map(|item| FilterInput::from_json(item.clone())?.resolve())
                    .collect::<Result<Vec<_>>>()?;
                clauses.push(if key == "and" {
                    and(conditions)
                } else {
                    or(conditions)
                });
            }
            "not" => clauses.push(not(FilterInput::from_json(spec.clone())?.resolve()?)),
            field => clauses.extend(resolve_match_spec(field, spec)?),
        }
    }

    if clauses.len() == 1 {
        Ok(clauses.remove(0))
    } else {
        Ok(and(clauses))
    }
}

fn resolve_match_spec(field: &str, spec: &Value) -> Result<Vec<Filter>> {
    let spec = spec.as_object().ok_or_else(|| {
        UnsearchError::Config(format!(
            "Field '{}' expects a match spec such as {{\"eq\": ...}}",
            field
        ))
    })?;
    if spec.is_empty() {
        return Err(UnsearchError::Config(format!(
            "Match spec for field '{}' has no operator",
            field
        )));
    }

    spec.iter()
        .map(|(op, value)| {
            if value.is_null() {
                return Err(UnsearchError::Config(format!(
                    "Operator '{}' on field '{}' requires a value",
                    op, field
                )));
            }
            let comparison = match op.as_str() {
                "eq" => Comparison::Eq,
                "neq" => Comparison::Neq,
                "lt" => Comparison::Lt,
                "lte" => Comparison::Lte,
                "gt" => Comparison::Gt,
                "gte" => Comparison::Gte,
                "in" => {
                    let values = value.as_array().ok_or_else(|| {
                        UnsearchError::Config(format!(
                            "Operator 'in' on field '{}' expects a list",
                            field
                        ))
                    })?;
                    return Ok(one_of(field, values.iter().cloned()));
                }
                "between" => {
                    return match value.as_array().map(Vec::as_slice) {
                        Some([min, max]) => Ok(between(field, min.clone(), max.clone())),
                        _ => Err(UnsearchError::Config(format!(
                            "Operator 'between' on field '{}' expects [min, max]",
                            field
                        ))),
                    };
                }
                other => {
                    return Err(UnsearchError::Config(format!(
                        "Unknown operator '{}' for field '{}'",
                        other, field
                    )))
                }
            };
            Ok(compare(field, comparison, value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_produce_op_tagged_json() {
        assert_eq!(
            serde_json::to_value(eq("author", "josh")).unwrap(),
            json!({"op": "=", "field": "author", "value": "josh"})
        );
        assert_eq!(
            serde_json::to_value(not(lt("price", 10))).unwrap(),
            json!({"op": "not", "condition": {"op": "<", "field": "price", "value": 10}})
        );
        assert_eq!(
            serde_json::to_value(between("price", 10, 30)).unwrap(),
            json!({"op": "between", "field": "price", "values": [10, 30]})
        );
        assert_eq!(
            serde_json::to_value(or([eq("author", "josh"), lt("price", 10)])).unwrap(),
            json!({"op": "or", "conditions": [
                {"op": "=", "field": "author", "value": "josh"},
                {"op": "<", "field": "price", "value": 10}
            ]})
        );
    }

    #[test]
    fn test_tree_json_parses_back() {
        let filter = and([gte("price", 10), one_of("tag", ["a", "b"]), not(neq("x", true))]);
        let json = serde_json::to_value(&filter).unwrap();
        let parsed: Filter = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, filter);
    }

    #[test]
    fn test_between_requires_two_values() {
        let err = serde_json::from_value::<Filter>(
            json!({"op": "between", "field": "price", "values": [1]}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_validate_rejects_missing_values() {
        assert!(matches!(
            eq("price", Value::Null).validate(),
            Err(UnsearchError::Config(_))
        ));
        assert!(matches!(
            one_of::<Value>("price", []).validate(),
            Err(UnsearchError::Config(_))
        ));
        assert!(matches!(
            and([between("price", 1, Value::Null)]).validate(),
            Err(UnsearchError::Config(_))
        ));
        assert!(matches!(
            eq("price", json!([1, 2])).validate(),
            Err(UnsearchError::Config(_))
        ));
        assert!(and([]).validate().is_ok());
    }

    #[test]
    fn test_mapping_form_resolves_every_operator() {
        let input = FilterInput::from_json(json!({
            "title": {"eq": "Svelte"},
            "priority": {"gte": 1, "lt": 10},
            "tags": {"in": ["a", "b"]},
            "year": {"between": [2000, 2010]}
        }))
        .unwrap();

        assert_eq!(
            input.resolve().unwrap(),
            and([
                eq("title", "Svelte"),
                gte("priority", 1),
                lt("priority", 10),
                one_of("tags", ["a", "b"]),
                between("year", 2000, 2010),
            ])
        );
    }

    #[test]
    fn test_mapping_form_combinators() {
        let input = FilterInput::from_json(json!({
            "or": [{"title": {"eq": "Svelte"}}, {"not": {"priority": {"eq": 1}}}]
        }))
        .unwrap();

        assert_eq!(
            input.resolve().unwrap(),
            or([eq("title", "Svelte"), not(eq("priority", 1))])
        );
    }

    #[test]
    fn test_mapping_form_errors_are_config_errors() {
        for bad in [
            json!({"title": {}}),
            json!({"title": {"like": "x"}}),
            json!({"title": {"eq": null}}),
            json!({"title": "Svelte"}),
            json!({"price": {"between": [1]}}),
            json!({"price": {"in": 3}}),
            json!({"price": {"in": []}}),
        ] {
            let result = FilterInput::from_json(bad.clone()).and_then(|i| i.resolve());
            assert!(
                matches!(result, Err(UnsearchError::Config(_))),
                "expected config error for {}",
                bad
            );
        }
    }

    #[test]
    fn test_list_input_is_implicit_and() {
        let single = FilterInput::from(vec![eq("a", 1)]);
        assert_eq!(single.resolve().unwrap(), eq("a", 1));

        let many = FilterInput::from(vec![eq("a", 1), eq("b", 2)]);
        assert_eq!(many.resolve().unwrap(), and([eq("a", 1), eq("b", 2)]));
    }

    #[test]
    fn test_untagged_input_prefers_tree() {
        let input: FilterInput =
            serde_json::from_value(json!({"op": "=", "field": "a", "value": 1})).unwrap();
        assert_eq!(input, FilterInput::Tree(eq("a", 1)));

        let input: FilterInput = serde_json::from_value(json!({"a": {"eq": 1}})).unwrap();
        assert!(matches!(input, FilterInput::Mapping(_)));
    }
}
