//! Typed row filters.
//!
//! Predicates replace free-form `WHERE` fragments: relation filters
//! (`additional_where`), rootline filters and record store lookups all use
//! this one vocabulary.

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::value::{Scalar, Value};

/// A boolean condition over the fields of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Eq { field: String, value: Scalar },
    Ne { field: String, value: Scalar },
    In { field: String, values: Vec<Scalar> },
    Gt { field: String, value: Scalar },
    Lt { field: String, value: Scalar },
    All { predicates: Vec<Predicate> },
    Any { predicates: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Predicate::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        Predicate::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of two predicates, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All { mut predicates } => {
                predicates.push(other);
                Predicate::All { predicates }
            }
            first => Predicate::All {
                predicates: vec![first, other],
            },
        }
    }

    /// Evaluate the predicate against a record.
    ///
    /// A missing field is `NULL`: it matches `ne` and nothing else. List
    /// fields match `eq`/`in` when any element matches.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq { field, value } => any_scalar(record, field, |s| s.loosely_eq(value)),
            Predicate::Ne { field, value } => {
                !any_scalar(record, field, |s| s.loosely_eq(value))
            }
            Predicate::In { field, values } => {
                any_scalar(record, field, |s| values.iter().any(|v| s.loosely_eq(v)))
            }
            Predicate::Gt { field, value } => {
                any_scalar(record, field, |s| s.compare(value).is_gt())
            }
            Predicate::Lt { field, value } => {
                any_scalar(record, field, |s| s.compare(value).is_lt())
            }
            Predicate::All { predicates } => predicates.iter().all(|p| p.matches(record)),
            Predicate::Any { predicates } => predicates.iter().any(|p| p.matches(record)),
            Predicate::Not { predicate } => !predicate.matches(record),
        }
    }
}

fn any_scalar(record: &Record, field: &str, test: impl Fn(&Scalar) -> bool) -> bool {
    match record.value_of(field) {
        Value::Null => false,
        Value::Scalar(s) => test(&s),
        Value::List(items) => items.iter().any(test),
    }
}
