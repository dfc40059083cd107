//! Native evaluation of a [`Filter`] against in-memory documents.
//!
//! Field lookup is "key or absent". An absent (or `null`) field fails every
//! comparison; `!=` is the negation of `=`, so it holds for absent fields,
//! matching how the hosted engines treat documents lacking the field.
//! A multi-value field satisfies a comparison when any element does.

use crate::error::Result;
use crate::query::filter::{Combinator, Comparison, Filter};
use crate::types::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// A compiled filter.
pub type Predicate = Box<dyn Fn(&Document) -> bool + Send + Sync>;

/// Validate `filter` and turn it into a closure tree.
pub fn compile(filter: &Filter) -> Result<Predicate> {
    filter.validate()?;
    Ok(build(filter))
}

fn build(filter: &Filter) -> Predicate {
    match filter.clone() {
        Filter::Field { field, op, value } => match op {
            Comparison::Neq => Box::new(move |doc: &Document| !any_element(doc.get(&field), |v| values_equal(v, &value))),
            Comparison::Eq => Box::new(move |doc: &Document| any_element(doc.get(&field), |v| values_equal(v, &value))),
            op => Box::new(move |doc: &Document| {
                any_element(doc.get(&field), |v| match compare_values(v, &value) {
                    Some(ord) => ordering_satisfies(op, ord),
                    None => false,
                })
            }),
        },
        Filter::In { field, values } => Box::new(move |doc: &Document| {
            any_element(doc.get(&field), |v| values.iter().any(|candidate| values_equal(v, candidate)))
        }),
        Filter::Between { field, min, max } => Box::new(move |doc: &Document| {
            any_element(doc.get(&field), |v| {
                matches!(compare_values(v, &min), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare_values(v, &max), Some(Ordering::Less | Ordering::Equal))
            })
        }),
        Filter::Condition { op, conditions } => {
            let children: Vec<Predicate> = conditions.iter().map(build).collect();
            match op {
                Combinator::And => Box::new(move |doc: &Document| children.iter().all(|p| p(doc))),
                Combinator::Or => Box::new(move |doc: &Document| children.iter().any(|p| p(doc))),
            }
        }
        Filter::Not { condition } => {
            let inner = build(&condition);
            Box::new(move |doc: &Document| !inner(doc))
        }
    }
}

fn any_element(value: Option<&Value>, test: impl Fn(&Value) -> bool) -> bool {
    match value {
        None => false,
        Some(Value::Array(items)) => items.iter().any(|item| !item.is_null() && test(item)),
        Some(v) => test(v),
    }
}

fn ordering_satisfies(op: Comparison, ord: Ordering) -> bool {
    match op {
        Comparison::Eq => ord == Ordering::Equal,
        Comparison::Neq => ord != Ordering::Equal,
        Comparison::Lt => ord == Ordering::Less,
        Comparison::Lte => ord != Ordering::Greater,
        Comparison::Gt => ord == Ordering::Greater,
        Comparison::Gte => ord != Ordering::Less,
    }
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Native ordering between two scalars of the same kind; `None` across kinds.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
