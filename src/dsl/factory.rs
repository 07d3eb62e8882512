use std::collections::HashSet;
use std::sync::Arc;

use super::{NestedItem, PhraseItem, QueryItem, RangeItem, TermItem};

/// Engine-side field metadata the item model serializes against.
///
/// Shared read-only between the factory and every leaf it builds, so a leaf
/// can pick its match form at serialization time, after field scoping has
/// settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Field searched when no scope applies
    pub default_field: String,
    /// Fields matched exactly rather than through analysis
    pub unanalyzed_fields: HashSet<String>,
    /// Fields declared as nested objects in the engine mapping
    pub nested_fields: HashSet<String>,
}

/// Builds query items. Purely functional over [`FieldMetadata`].
#[derive(Debug, Clone)]
pub struct ItemFactory {
    meta: Arc<FieldMetadata>,
}

impl ItemFactory {
    pub fn new(meta: FieldMetadata) -> Self {
        Self {
            meta: Arc::new(meta),
        }
    }

    /// Single-token leaf
    pub fn term(&self, value: impl Into<String>) -> QueryItem {
        QueryItem::Term(TermItem {
            meta: self.meta.clone(),
            fields: Vec::new(),
            value: value.into(),
            boost: None,
            fuzziness: None,
        })
    }

    /// Quoted-sequence leaf
    pub fn phrase(&self, phrase: impl Into<String>) -> QueryItem {
        QueryItem::Phrase(PhraseItem {
            meta: self.meta.clone(),
            fields: Vec::new(),
            phrase: phrase.into(),
            boost: None,
            slop: None,
        })
    }

    /// Bounded-interval leaf; at most one bound per side
    pub fn range(
        &self,
        gte: Option<String>,
        gt: Option<String>,
        lte: Option<String>,
        lt: Option<String>,
    ) -> QueryItem {
        QueryItem::Range(RangeItem {
            meta: self.meta.clone(),
            fields: Vec::new(),
            gte,
            gt,
            lte,
            lt,
            boost: None,
        })
    }

    /// Conjunction composite
    pub fn must(&self, items: Vec<QueryItem>) -> QueryItem {
        QueryItem::Must(items)
    }

    /// Disjunction composite
    pub fn should(&self, items: Vec<QueryItem>) -> QueryItem {
        QueryItem::Should(items)
    }

    /// Negation composite
    pub fn must_not(&self, items: Vec<QueryItem>) -> QueryItem {
        QueryItem::MustNot(items)
    }

    /// Nested-object wrapper around an already-built subtree
    pub fn nested(&self, path: impl Into<String>, query: QueryItem) -> QueryItem {
        QueryItem::Nested(NestedItem {
            path: path.into(),
            query: Box::new(query),
        })
    }

    /// Whether the mapping declares `name` as a nested-object field
    pub fn is_declared_nested(&self, name: &str) -> bool {
        self.meta.nested_fields.contains(name)
    }
}
