//! Attribute predicates and sort keys
//!
//! Predicates are a small comparison/boolean tree evaluated against a
//! record's attribute map. They are built by callers (or by the find-or-
//! create resolvers) and passed through the facade to the store unmodified.
//!
//! ## Missing attributes
//!
//! A comparison against an attribute the record does not carry is false,
//! except `Ne`, which is true (the record's value is "not equal" to
//! anything). Ordering comparisons between values of different types never
//! match.

use crate::value::{AttributeMap, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Filter tree over record attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Attribute equals value
    Eq(String, Value),
    /// Attribute does not equal value (true when the attribute is missing)
    Ne(String, Value),
    /// Attribute is strictly less than value
    Lt(String, Value),
    /// Attribute is less than or equal to value
    Le(String, Value),
    /// Attribute is strictly greater than value
    Gt(String, Value),
    /// Attribute is greater than or equal to value
    Ge(String, Value),
    /// Every sub-predicate matches (empty = matches all)
    And(Vec<Predicate>),
    /// At least one sub-predicate matches (empty = matches none)
    Or(Vec<Predicate>),
    /// Sub-predicate does not match
    Not(Box<Predicate>),
}

impl Predicate {
    /// Equality predicate on a single attribute.
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(attribute.into(), value.into())
    }

    /// Conjunctive equality over every entry of an attribute map.
    ///
    /// An empty map yields `And(vec![])`, which matches everything; callers
    /// that treat an empty map as a usage error must reject it before
    /// building the predicate.
    pub fn matching_all(attributes: &AttributeMap) -> Self {
        Predicate::And(
            attributes
                .iter()
                .map(|(name, value)| Predicate::Eq(name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Evaluate this predicate against a record's attributes.
    pub fn matches(&self, attributes: &AttributeMap) -> bool {
        match self {
            Predicate::Eq(name, value) => attributes.get(name) == Some(value),
            Predicate::Ne(name, value) => attributes.get(name) != Some(value),
            Predicate::Lt(name, value) => cmp_attr(attributes, name, value)
                .is_some_and(|ord| ord == Ordering::Less),
            Predicate::Le(name, value) => {
                cmp_attr(attributes, name, value).is_some_and(|ord| ord != Ordering::Greater)
            }
            Predicate::Gt(name, value) => cmp_attr(attributes, name, value)
                .is_some_and(|ord| ord == Ordering::Greater),
            Predicate::Ge(name, value) => {
                cmp_attr(attributes, name, value).is_some_and(|ord| ord != Ordering::Less)
            }
            Predicate::And(children) => children.iter().all(|child| child.matches(attributes)),
            Predicate::Or(children) => children.iter().any(|child| child.matches(attributes)),
            Predicate::Not(child) => !child.matches(attributes),
        }
    }
}

fn cmp_attr(attributes: &AttributeMap, name: &str, value: &Value) -> Option<Ordering> {
    attributes
        .get(name)
        .and_then(|actual| actual.partial_cmp_same_type(value))
}

/// One key of a sort specification.
///
/// Records are compared key by key using [`Value::total_cmp`]; a record
/// missing the attribute sorts as `Null` (first ascending). Sorts applying
/// these keys must be stable so equal records keep their store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Attribute to sort by
    pub attribute: String,
    /// Ascending (`true`) or descending (`false`)
    pub ascending: bool,
}

impl SortKey {
    /// Ascending sort on an attribute.
    pub fn asc(attribute: impl Into<String>) -> Self {
        SortKey {
            attribute: attribute.into(),
            ascending: true,
        }
    }

    /// Descending sort on an attribute.
    pub fn desc(attribute: impl Into<String>) -> Self {
        SortKey {
            attribute: attribute.into(),
            ascending: false,
        }
    }

    /// Compare two attribute maps under a sort-key sequence.
    ///
    /// Keys are applied in order; the first non-equal comparison decides.
    pub fn compare(keys: &[SortKey], a: &AttributeMap, b: &AttributeMap) -> Ordering {
        for key in keys {
            let left = a.get(&key.attribute).unwrap_or(&Value::Null);
            let right = b.get(&key.attribute).unwrap_or(&Value::Null);
            let ord = left.total_cmp(right);
            let ord = if key.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
