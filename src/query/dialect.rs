//! Filter-string compilation for hosted search engines.
//!
//! Each engine speaks its own filter syntax. A [`Dialect`] supplies only the
//! tokens and the shape of a single clause; [`FilterCompiler`] owns the
//! recursion, bracketing, joining, negation and constant folding so every
//! engine handles precedence identically.

use super::filter::{Combinator, Comparison, Filter};
use crate::error::{Result, UnsearchError};
use serde_json::Value;

/// Result of compiling a filter tree.
///
/// Empty combinators fold to constants: `and()` is [`MatchAll`] and `or()`
/// is [`MatchNone`]. No engine has literal true/false tokens, so adapters
/// omit the filter parameter for `MatchAll` and skip the request for
/// `MatchNone`.
///
/// [`MatchAll`]: CompiledFilter::MatchAll
/// [`MatchNone`]: CompiledFilter::MatchNone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledFilter {
    MatchAll,
    MatchNone,
    Expr(String),
}

impl CompiledFilter {
    pub fn expression(&self) -> Option<&str> {
        match self {
            CompiledFilter::Expr(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, CompiledFilter::MatchNone)
    }
}

/// How a dialect expresses negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negation {
    /// Token negates any parenthesized sub-expression: `NOT (a AND b)`.
    Group(&'static str),
    /// Token negates single clauses only; groups are pushed inward with
    /// De Morgan's laws.
    Clause(&'static str),
    /// No negation token; clauses switch to their complementary comparator
    /// and groups are pushed inward.
    Complement,
}

pub trait Dialect {
    const NAME: &'static str;
    const AND: &'static str;
    const OR: &'static str;
    const NEGATION: Negation;

    /// Render a string literal.
    fn quote(&self, field: &str, text: &str) -> Result<String>;

    /// Render `field <op> value` where `value` is already formatted.
    fn compare(&self, field: &str, op: Comparison, value: &str) -> String;

    fn between(&self, field: &str, min: &str, max: &str) -> String;

    /// Reject a non-constant tree the engine cannot evaluate even though it
    /// renders. Runs after compilation succeeds.
    fn check(&self, _filter: &Filter) -> Result<()> {
        Ok(())
    }

    /// Set membership. Defaults to an OR-chain of equalities.
    fn one_of(&self, field: &str, values: &[String]) -> String {
        self.chain(field, Comparison::Eq, Self::OR, values)
    }

    /// Negated set membership. Defaults to an AND-chain of inequalities.
    fn none_of(&self, field: &str, values: &[String]) -> String {
        self.chain(field, Comparison::Neq, Self::AND, values)
    }

    fn chain(&self, field: &str, op: Comparison, joiner: &str, values: &[String]) -> String {
        let clauses: Vec<String> = values.iter().map(|v| self.compare(field, op, v)).collect();
        if clauses.len() == 1 {
            clauses.into_iter().collect()
        } else {
            bracket(&clauses.join(&format!(" {} ", joiner)))
        }
    }
}

/// Format a literal for `dialect`. Every operator goes through here so quoting
/// is identical across operators.
pub fn format_value<D: Dialect>(dialect: &D, field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => dialect.quote(field, s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(UnsearchError::Config(format!(
            "Filter on field '{}' requires a value",
            field
        ))),
        Value::Array(_) | Value::Object(_) => Err(UnsearchError::Config(format!(
            "{} filters on field '{}' only accept string, number or boolean values",
            D::NAME,
            field
        ))),
    }
}

pub fn bracket(expr: &str) -> String {
    format!("({})", expr)
}

pub struct FilterCompiler<D: Dialect> {
    dialect: D,
}

impl<D: Dialect + Default> Default for FilterCompiler<D> {
    fn default() -> Self {
        FilterCompiler::new(D::default())
    }
}

impl<D: Dialect> FilterCompiler<D> {
    const MAX_FILTER_DEPTH: usize = 32;

    pub fn new(dialect: D) -> Self {
        FilterCompiler { dialect }
    }

    pub fn compile(&self, filter: Option<&Filter>) -> Result<CompiledFilter> {
        let compiled = match filter {
            None => CompiledFilter::MatchAll,
            Some(filter) => {
                let compiled = self.node(filter, false, 0)?;
                if let CompiledFilter::Expr(_) = compiled {
                    self.dialect.check(filter)?;
                }
                compiled
            }
        };
        tracing::debug!("[FILTER] {} compiled {:?}", D::NAME, compiled);
        Ok(compiled)
    }

    fn node(&self, filter: &Filter, negated: bool, depth: usize) -> Result<CompiledFilter> {
        if depth > Self::MAX_FILTER_DEPTH {
            return Err(UnsearchError::Config(format!(
                "Filter nesting exceeds {} levels",
                Self::MAX_FILTER_DEPTH
            )));
        }

        match filter {
            Filter::Not { condition } => self.node(condition, !negated, depth + 1),

            Filter::Condition { op, conditions } => {
                if let (true, Negation::Group(token)) = (negated, D::NEGATION) {
                    let inner = self.node(filter, false, depth)?;
                    return Ok(negate_group(inner, token));
                }
                let op = if negated { op.flip() } else { *op };
                let parts = conditions
                    .iter()
                    .map(|c| self.node(c, negated, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.combine(op, parts))
            }

            Filter::Field { field, op, value } => {
                let value = format_value(&self.dialect, field, value)?;
                let d = &self.dialect;
                let expr = match (negated, op, D::NEGATION) {
                    (false, op, _) => d.compare(field, *op, &value),
                    (true, Comparison::Neq, _) => d.compare(field, Comparison::Eq, &value),
                    (true, op, Negation::Complement) => d.compare(field, op.complement(), &value),
                    (true, op, Negation::Group(token)) => {
                        format!("{} {}", token, bracket(&d.compare(field, *op, &value)))
                    }
                    (true, op, Negation::Clause(token)) => {
                        format!("{} {}", token, d.compare(field, *op, &value))
                    }
                };
                Ok(CompiledFilter::Expr(expr))
            }

            Filter::In { field, values } => {
                if values.is_empty() {
                    return Err(UnsearchError::Config(format!(
                        "Operator 'in' on field '{}' requires at least one value",
                        field
                    )));
                }
                let values = values
                    .iter()
                    .map(|v| format_value(&self.dialect, field, v))
                    .collect::<Result<Vec<_>>>()?;
                let d = &self.dialect;
                let expr = match (negated, D::NEGATION) {
                    (false, _) => d.one_of(field, &values),
                    (true, Negation::Group(token)) => {
                        format!("{} {}", token, bracket(&d.one_of(field, &values)))
                    }
                    (true, _) => d.none_of(field, &values),
                };
                Ok(CompiledFilter::Expr(expr))
            }

            Filter::Between { field, min, max } => {
                let min = format_value(&self.dialect, field, min)?;
                let max = format_value(&self.dialect, field, max)?;
                let d = &self.dialect;
                let compiled = match (negated, D::NEGATION) {
                    (false, _) => CompiledFilter::Expr(d.between(field, &min, &max)),
                    (true, Negation::Group(token)) => CompiledFilter::Expr(format!(
                        "{} {}",
                        token,
                        bracket(&d.between(field, &min, &max))
                    )),
                    (true, Negation::Clause(token)) => {
                        CompiledFilter::Expr(format!("{} {}", token, d.between(field, &min, &max)))
                    }
                    (true, Negation::Complement) => self.combine(
                        Combinator::Or,
                        vec![
                            CompiledFilter::Expr(d.compare(field, Comparison::Lt, &min)),
                            CompiledFilter::Expr(d.compare(field, Comparison::Gt, &max)),
                        ],
                    ),
                };
                Ok(compiled)
            }
        }
    }

    fn combine(&self, op: Combinator, parts: Vec<CompiledFilter>) -> CompiledFilter {
        let (token, absorbing, identity) = match op {
            Combinator::And => (D::AND, CompiledFilter::MatchNone, CompiledFilter::MatchAll),
            Combinator::Or => (D::OR, CompiledFilter::MatchAll, CompiledFilter::MatchNone),
        };

        let mut clauses = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                CompiledFilter::Expr(expr) => clauses.push(bracket(&expr)),
                constant if constant == absorbing => return absorbing,
                _ => {}
            }
        }

        if clauses.is_empty() {
            identity
        } else {
            CompiledFilter::Expr(clauses.join(&format!(" {} ", token)))
        }
    }
}

fn negate_group(compiled: CompiledFilter, token: &str) -> CompiledFilter {
    match compiled {
        CompiledFilter::MatchAll => CompiledFilter::MatchNone,
        CompiledFilter::MatchNone => CompiledFilter::MatchAll,
        CompiledFilter::Expr(expr) => CompiledFilter::Expr(format!("{} {}", token, bracket(&expr))),
    }
}

/// Algolia `filters` syntax: `category:Book AND price > 10`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgoliaDialect;

impl Dialect for AlgoliaDialect {
    const NAME: &'static str = "algolia";
    const AND: &'static str = "AND";
    const OR: &'static str = "OR";
    const NEGATION: Negation = Negation::Clause("NOT");

    fn quote(&self, _field: &str, text: &str) -> Result<String> {
        let reserved = matches!(text, "AND" | "OR" | "NOT" | "TO");
        if text.is_empty()
            || reserved
            || text
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ':' | '"' | '\'' | '(' | ')' | '%'))
        {
            Ok(format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")))
        } else {
            Ok(text.to_string())
        }
    }

    fn compare(&self, field: &str, op: Comparison, value: &str) -> String {
        match op {
            Comparison::Eq => format!("{}:{}", field, value),
            Comparison::Neq => format!("NOT {}:{}", field, value),
            _ => format!("{} {} {}", field, op.symbol(), value),
        }
    }

    fn between(&self, field: &str, min: &str, max: &str) -> String {
        format!("{}:{} TO {}", field, min, max)
    }

    /// Algolia only evaluates an AND of clauses, where a clause is a single
    /// filter or an OR of filters of one kind (facet or numeric).
    fn check(&self, filter: &Filter) -> Result<()> {
        algolia_shape(filter, false).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    Facet,
    Numeric,
}

/// Structure of a compiled Algolia sub-expression after negation is pushed
/// to the clauses and empty combinators are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlgoliaShape {
    Constant(bool),
    Clause(FilterKind),
    Disjunction(FilterKind),
    Conjunction,
}

fn algolia_shape(filter: &Filter, negated: bool) -> Result<AlgoliaShape> {
    match filter {
        Filter::Not { condition } => algolia_shape(condition, !negated),
        Filter::Field { op, .. } => Ok(AlgoliaShape::Clause(match op {
            Comparison::Eq | Comparison::Neq => FilterKind::Facet,
            _ => FilterKind::Numeric,
        })),
        Filter::Between { .. } => Ok(AlgoliaShape::Clause(FilterKind::Numeric)),
        Filter::In { values, .. } => Ok(match (values.len(), negated) {
            (0 | 1, _) => AlgoliaShape::Clause(FilterKind::Facet),
            (_, false) => AlgoliaShape::Disjunction(FilterKind::Facet),
            (_, true) => AlgoliaShape::Conjunction,
        }),
        Filter::Condition { op, conditions } => {
            let op = if negated { op.flip() } else { *op };
            let (absorbing, identity) = match op {
                Combinator::And => (false, true),
                Combinator::Or => (true, false),
            };
            let mut parts = Vec::with_capacity(conditions.len());
            for condition in conditions {
                match algolia_shape(condition, negated)? {
                    AlgoliaShape::Constant(c) if c == absorbing => {
                        return Ok(AlgoliaShape::Constant(absorbing))
                    }
                    AlgoliaShape::Constant(_) => {}
                    shape => parts.push(shape),
                }
            }
            match (parts.len(), op) {
                (0, _) => Ok(AlgoliaShape::Constant(identity)),
                (1, _) => Ok(parts[0]),
                (_, Combinator::And) => Ok(AlgoliaShape::Conjunction),
                (_, Combinator::Or) => disjunction(&parts),
            }
        }
    }
}

fn disjunction(parts: &[AlgoliaShape]) -> Result<AlgoliaShape> {
    let mut kind = None;
    for part in parts {
        let part_kind = match part {
            AlgoliaShape::Clause(k) | AlgoliaShape::Disjunction(k) => *k,
            _ => {
                return Err(UnsearchError::Config(
                    "algolia filters cannot nest AND inside OR".to_string(),
                ))
            }
        };
        match kind {
            Some(k) if k != part_kind => {
                return Err(UnsearchError::Config(
                    "algolia filters cannot mix facet and numeric filters inside OR".to_string(),
                ))
            }
            _ => kind = Some(part_kind),
        }
    }
    Ok(AlgoliaShape::Disjunction(kind.unwrap_or(FilterKind::Facet)))
}

/// MeiliSearch `filter` syntax: `genre = 'horror' AND year 2000 TO 2010`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeiliDialect;

impl Dialect for MeiliDialect {
    const NAME: &'static str = "meilisearch";
    const AND: &'static str = "AND";
    const OR: &'static str = "OR";
    const NEGATION: Negation = Negation::Group("NOT");

    fn quote(&self, _field: &str, text: &str) -> Result<String> {
        Ok(format!(
            "'{}'",
            text.replace('\\', "\\\\").replace('\'', "\\'")
        ))
    }

    fn compare(&self, field: &str, op: Comparison, value: &str) -> String {
        format!("{} {} {}", field, op.symbol(), value)
    }

    fn between(&self, field: &str, min: &str, max: &str) -> String {
        format!("{} {} TO {}", field, min, max)
    }

    fn one_of(&self, field: &str, values: &[String]) -> String {
        format!("{} IN [{}]", field, values.join(", "))
    }

    fn none_of(&self, field: &str, values: &[String]) -> String {
        format!("{} NOT IN [{}]", field, values.join(", "))
    }
}

/// Typesense `filter_by` syntax: `category:=shoes && price:[10..20]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypesenseDialect;

impl Dialect for TypesenseDialect {
    const NAME: &'static str = "typesense";
    const AND: &'static str = "&&";
    const OR: &'static str = "||";
    const NEGATION: Negation = Negation::Complement;

    fn quote(&self, field: &str, text: &str) -> Result<String> {
        if text.contains('`') {
            return Err(UnsearchError::Config(format!(
                "typesense filters cannot express a backtick in the value for field '{}'",
                field
            )));
        }
        if text.is_empty()
            || text.chars().any(|c| {
                c.is_whitespace() || matches!(c, ',' | '&' | '|' | '(' | ')' | '[' | ']' | ':')
            })
        {
            Ok(format!("`{}`", text))
        } else {
            Ok(text.to_string())
        }
    }

    fn compare(&self, field: &str, op: Comparison, value: &str) -> String {
        format!("{}:{}{}", field, op.symbol(), value)
    }

    fn between(&self, field: &str, min: &str, max: &str) -> String {
        format!("{}:[{}..{}]", field, min, max)
    }

    fn one_of(&self, field: &str, values: &[String]) -> String {
        format!("{}:=[{}]", field, values.join(","))
    }

    fn none_of(&self, field: &str, values: &[String]) -> String {
        format!("{}:!=[{}]", field, values.join(","))
    }
}
