//! Elasticsearch query item model
//!
//! The compiler lowers every AST node into one [`QueryItem`]; the root item
//! serializes into the `query` body of an Elasticsearch search request via
//! [`QueryItem::to_value`] (or the [`serde::Serialize`] impl).
//!
//! Leaves pick between an exact-match form (`term`) and an analyzed-match
//! form (`match` / `match_phrase`) at serialization time, based on the field
//! metadata captured by the [`ItemFactory`] — the choice cannot be made
//! earlier because field scoping settles only once the enclosing
//! `SearchField` nodes have been unwound.

mod factory;

pub use factory::{FieldMetadata, ItemFactory};

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// One fragment of the compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryItem {
    /// Single-token match
    Term(TermItem),

    /// Quoted-sequence match
    Phrase(PhraseItem),

    /// Bounded-interval match
    Range(RangeItem),

    /// Conjunction: serializes to bool/must
    Must(Vec<QueryItem>),

    /// Disjunction: serializes to bool/should
    Should(Vec<QueryItem>),

    /// Negation: serializes to bool/must_not
    MustNot(Vec<QueryItem>),

    /// Nested-object wrapper: serializes to nested/path/query
    Nested(NestedItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermItem {
    pub(crate) meta: Arc<FieldMetadata>,
    /// Scoping segments, outermost first; empty means the default field
    pub fields: Vec<String>,
    pub value: String,
    pub boost: Option<f32>,
    pub fuzziness: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseItem {
    pub(crate) meta: Arc<FieldMetadata>,
    pub fields: Vec<String>,
    pub phrase: String,
    pub boost: Option<f32>,
    pub slop: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeItem {
    pub(crate) meta: Arc<FieldMetadata>,
    pub fields: Vec<String>,
    pub gte: Option<String>,
    pub gt: Option<String>,
    pub lte: Option<String>,
    pub lt: Option<String>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedItem {
    pub path: String,
    pub query: Box<QueryItem>,
}

impl TermItem {
    pub fn effective_field(&self) -> String {
        effective_field(&self.fields, &self.meta)
    }

    fn to_value(&self) -> Value {
        let field = self.effective_field();

        // A bare `*` asks for field presence, not a token match.
        if self.value == "*" {
            let mut body = Map::new();
            body.insert("field".to_string(), Value::String(field));
            if let Some(boost) = self.boost {
                body.insert("boost".to_string(), json!(boost));
            }
            return json!({ "exists": body });
        }

        let exact = is_unanalyzed(&self.fields, &field, &self.meta);
        let mut body = Map::new();
        body.insert(
            if exact { "value" } else { "query" }.to_string(),
            Value::String(self.value.clone()),
        );
        if let Some(boost) = self.boost {
            body.insert("boost".to_string(), json!(boost));
        }
        if let Some(fuzziness) = self.fuzziness {
            body.insert("fuzziness".to_string(), json!(fuzziness));
        }
        match_fragment(if exact { "term" } else { "match" }, field, body)
    }
}

impl PhraseItem {
    pub fn effective_field(&self) -> String {
        effective_field(&self.fields, &self.meta)
    }

    fn to_value(&self) -> Value {
        let field = self.effective_field();
        let exact = is_unanalyzed(&self.fields, &field, &self.meta);
        let mut body = Map::new();
        body.insert(
            if exact { "value" } else { "query" }.to_string(),
            Value::String(self.phrase.clone()),
        );
        if let Some(boost) = self.boost {
            body.insert("boost".to_string(), json!(boost));
        }
        if let Some(slop) = self.slop {
            body.insert("slop".to_string(), json!(slop));
        }
        match_fragment(if exact { "term" } else { "match_phrase" }, field, body)
    }
}

impl RangeItem {
    pub fn effective_field(&self) -> String {
        effective_field(&self.fields, &self.meta)
    }

    fn to_value(&self) -> Value {
        let mut body = Map::new();
        for (key, bound) in [
            ("gte", &self.gte),
            ("gt", &self.gt),
            ("lte", &self.lte),
            ("lt", &self.lt),
        ] {
            if let Some(value) = bound {
                body.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(boost) = self.boost {
            body.insert("boost".to_string(), json!(boost));
        }
        match_fragment("range", self.effective_field(), body)
    }
}

/// `{"<op>": {"<field>": {…body…}}}`
fn match_fragment(op: &str, field: String, body: Map<String, Value>) -> Value {
    let mut per_field = Map::new();
    per_field.insert(field, Value::Object(body));
    let mut outer = Map::new();
    outer.insert(op.to_string(), Value::Object(per_field));
    Value::Object(outer)
}

fn effective_field(fields: &[String], meta: &FieldMetadata) -> String {
    if fields.is_empty() {
        meta.default_field.clone()
    } else {
        fields.join(".")
    }
}

/// Exact-match fields may be configured either by their innermost segment
/// ("nationality") or by the full dotted path ("illustrators.nationality").
fn is_unanalyzed(fields: &[String], dotted: &str, meta: &FieldMetadata) -> bool {
    meta.unanalyzed_fields.contains(dotted)
        || fields
            .last()
            .is_some_and(|inner| meta.unanalyzed_fields.contains(inner))
}

impl QueryItem {
    /// Get the item kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            QueryItem::Term(_) => "term",
            QueryItem::Phrase(_) => "phrase",
            QueryItem::Range(_) => "range",
            QueryItem::Must(_) => "must",
            QueryItem::Should(_) => "should",
            QueryItem::MustNot(_) => "must_not",
            QueryItem::Nested(_) => "nested",
        }
    }

    /// Serialize into the engine's wire format.
    pub fn to_value(&self) -> Value {
        match self {
            QueryItem::Term(term) => term.to_value(),
            QueryItem::Phrase(phrase) => phrase.to_value(),
            QueryItem::Range(range) => range.to_value(),
            QueryItem::Must(items) => bool_value("must", items),
            QueryItem::Should(items) => bool_value("should", items),
            QueryItem::MustNot(items) => bool_value("must_not", items),
            QueryItem::Nested(nested) => json!({
                "nested": { "path": nested.path, "query": nested.query.to_value() }
            }),
        }
    }

    /// Attach a boost multiplier. Boolean composites pass through unchanged:
    /// the engine only honors boost on leaf fragments.
    pub fn with_boost(self, force: f32) -> Self {
        match self {
            QueryItem::Term(mut term) => {
                term.boost = Some(force);
                QueryItem::Term(term)
            }
            QueryItem::Phrase(mut phrase) => {
                phrase.boost = Some(force);
                QueryItem::Phrase(phrase)
            }
            QueryItem::Range(mut range) => {
                range.boost = Some(force);
                QueryItem::Range(range)
            }
            other => {
                tracing::debug!(item = other.kind(), force, "dropping boost on composite item");
                other
            }
        }
    }

    /// Attach an edit-distance tolerance. Only a term can be fuzzy.
    pub fn with_fuzziness(self, degree: f32) -> Self {
        match self {
            QueryItem::Term(mut term) => {
                term.fuzziness = Some(degree);
                QueryItem::Term(term)
            }
            other => {
                tracing::debug!(item = other.kind(), degree, "dropping fuzziness on non-term item");
                other
            }
        }
    }

    /// Attach a word-distance tolerance. Only a phrase has slop.
    pub fn with_slop(self, degree: f32) -> Self {
        match self {
            QueryItem::Phrase(mut phrase) => {
                phrase.slop = Some(degree);
                QueryItem::Phrase(phrase)
            }
            other => {
                tracing::debug!(item = other.kind(), degree, "dropping slop on non-phrase item");
                other
            }
        }
    }

    /// Push a field-scope segment onto every leaf in the subtree, innermost
    /// segments staying rightmost. Consumes and rebuilds the items, so no
    /// already-shared item is ever mutated.
    pub fn scoped(self, name: &str) -> Self {
        match self {
            QueryItem::Term(mut term) => {
                term.fields.insert(0, name.to_string());
                QueryItem::Term(term)
            }
            QueryItem::Phrase(mut phrase) => {
                phrase.fields.insert(0, name.to_string());
                QueryItem::Phrase(phrase)
            }
            QueryItem::Range(mut range) => {
                range.fields.insert(0, name.to_string());
                QueryItem::Range(range)
            }
            QueryItem::Must(items) => {
                QueryItem::Must(items.into_iter().map(|item| item.scoped(name)).collect())
            }
            QueryItem::Should(items) => {
                QueryItem::Should(items.into_iter().map(|item| item.scoped(name)).collect())
            }
            QueryItem::MustNot(items) => {
                QueryItem::MustNot(items.into_iter().map(|item| item.scoped(name)).collect())
            }
            QueryItem::Nested(nested) => QueryItem::Nested(NestedItem {
                path: nested.path,
                query: Box::new(nested.query.scoped(name)),
            }),
        }
    }
}

fn bool_value(occur: &str, items: &[QueryItem]) -> Value {
    let clauses: Vec<Value> = items.iter().map(QueryItem::to_value).collect();
    let mut body = Map::new();
    body.insert(occur.to_string(), Value::Array(clauses));
    let mut outer = Map::new();
    outer.insert("bool".to_string(), Value::Object(body));
    Value::Object(outer)
}

impl Serialize for QueryItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
