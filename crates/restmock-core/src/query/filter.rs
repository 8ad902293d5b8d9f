//! Filter document evaluation.

use crate::store::Item;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors from filter parsing.
///
/// Callers catch these and fall back to the unfiltered list; the mock is
/// permissive rather than strict about its query language.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// Filter document is not a JSON object.
    #[error("filter document must be a JSON object")]
    NotAnObject,
    /// Operator key is not part of the filter language.
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    /// `$in`/`$nin` operand is not an array.
    #[error("operator '{0}' expects an array operand")]
    OperandNotArray(&'static str),
}

/// Comparison operator of the filter language.
///
/// One pure comparison function per tag; no closures are built per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
    Nin,
}

impl FilterOp {
    /// Parse a `$`-prefixed operator key.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "$gt" => Some(FilterOp::Gt),
            "$gte" => Some(FilterOp::Gte),
            "$lt" => Some(FilterOp::Lt),
            "$lte" => Some(FilterOp::Lte),
            "$ne" => Some(FilterOp::Ne),
            "$in" => Some(FilterOp::In),
            "$nin" => Some(FilterOp::Nin),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::Ne => "$ne",
            FilterOp::In => "$in",
            FilterOp::Nin => "$nin",
        }
    }

    /// Whether `actual` satisfies this operator against `expected`.
    ///
    /// `$in`/`$nin` operands are validated as arrays at parse time; a
    /// non-array operand satisfies nothing here.
    pub fn matches(self, actual: &Value, expected: &Value) -> bool {
        match self {
            FilterOp::Eq => actual == expected,
            FilterOp::Ne => actual != expected,
            FilterOp::Gt => ordered(actual, expected, |o| o == Ordering::Greater),
            FilterOp::Gte => ordered(actual, expected, |o| o != Ordering::Less),
            FilterOp::Lt => ordered(actual, expected, |o| o == Ordering::Less),
            FilterOp::Lte => ordered(actual, expected, |o| o != Ordering::Greater),
            FilterOp::In => expected.as_array().is_some_and(|arr| arr.contains(actual)),
            FilterOp::Nin => expected.as_array().is_some_and(|arr| !arr.contains(actual)),
        }
    }
}

fn ordered(actual: &Value, expected: &Value, pred: impl Fn(Ordering) -> bool) -> bool {
    compare_values(actual, expected).is_some_and(pred)
}

/// Partial ordering over JSON scalars.
///
/// Numbers compare numerically, strings lexicographically, bools
/// false-before-true. Any other pairing has no ordering and satisfies no
/// ordering operator.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// One field's parsed condition: every check must hold.
struct Condition {
    field: String,
    checks: Vec<(FilterOp, Value)>,
}

fn parse_filter(filter: &Value) -> Result<Vec<Condition>, FilterError> {
    let doc = filter.as_object().ok_or(FilterError::NotAnObject)?;

    let mut conditions = Vec::with_capacity(doc.len());
    for (field, condition) in doc {
        let checks = match condition {
            // an object with $-prefixed keys is an operator document;
            // anything else is an equality literal
            Value::Object(ops) if ops.keys().any(|key| key.starts_with('$')) => {
                let mut checks = Vec::with_capacity(ops.len());
                for (key, operand) in ops {
                    let op = FilterOp::parse(key)
                        .ok_or_else(|| FilterError::UnknownOperator(key.clone()))?;
                    if matches!(op, FilterOp::In | FilterOp::Nin) && !operand.is_array() {
                        return Err(FilterError::OperandNotArray(op.name()));
                    }
                    checks.push((op, operand.clone()));
                }
                checks
            }
            literal => vec![(FilterOp::Eq, literal.clone())],
        };
        conditions.push(Condition {
            field: field.clone(),
            checks,
        });
    }
    Ok(conditions)
}

fn satisfies(item: &Item, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| {
        let Some(actual) = item.get(&condition.field) else {
            // absence never satisfies a comparison, $ne/$nin included
            return false;
        };
        condition
            .checks
            .iter()
            .all(|(op, expected)| op.matches(actual, expected))
    })
}

/// Filter items against a filter document.
///
/// Field conditions AND together; operators on one field also AND. An item
/// lacking a filtered field satisfies no condition. The empty document keeps
/// every item.
pub fn evaluate(items: &[Item], filter: &Value) -> Result<Vec<Item>, FilterError> {
    let conditions = parse_filter(filter)?;
    Ok(items
        .iter()
        .filter(|item| satisfies(item, &conditions))
        .cloned()
        .collect())
}
