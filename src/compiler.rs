//! The tree compiler
//!
//! A depth-first visitor over the Lucene AST: one dispatch case per node
//! kind, one [`QueryItem`] per node. Boolean composition flattens same-kind
//! chains, rejects unparenthesized AND/OR mixes, and resolves operator-less
//! juxtaposition through the default operator. Field scoping, including the
//! nested-object pattern (`parent:(child:value)`), is applied on the way
//! back up the recursion.

use crate::ast::{QueryNode, RangeNode};
use crate::dsl::{FieldMetadata, ItemFactory, QueryItem};
use crate::error::{CompileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Characters of context kept on each side of the operator in an
/// ambiguity excerpt.
const EXCERPT_DELTA: usize = 8;

/// Boolean kind that operator-less juxtaposition resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultOperator {
    /// "a b" behaves like "a AND b"
    Must,
    /// "a b" behaves like "a OR b"
    #[default]
    Should,
}

impl DefaultOperator {
    fn opposite(self) -> Self {
        match self {
            DefaultOperator::Must => DefaultOperator::Should,
            DefaultOperator::Should => DefaultOperator::Must,
        }
    }
}

/// Construction-time configuration for [`QueryCompiler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Resolves operator-less juxtaposition ("a b")
    #[serde(default)]
    pub default_operator: DefaultOperator,

    /// Field searched when no scope applies
    #[serde(default = "default_field")]
    pub default_field: String,

    /// Fields the engine matches exactly rather than through analysis
    #[serde(default)]
    pub unanalyzed_fields: HashSet<String>,

    /// Fields the engine mapping declares as nested objects. Informational:
    /// nested wrapping is decided structurally, this set only feeds a
    /// diagnostic when structure and mapping disagree.
    #[serde(default)]
    pub nested_fields: HashSet<String>,
}

fn default_field() -> String {
    "text".to_string()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            default_operator: DefaultOperator::default(),
            default_field: default_field(),
            unanalyzed_fields: HashSet::new(),
            nested_fields: HashSet::new(),
        }
    }
}

/// Compiles a parsed Lucene query tree into an Elasticsearch query item.
///
/// Holds immutable configuration only; every per-call value is threaded
/// through the recursion, so one instance can serve concurrent compilations
/// from multiple threads without locking.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    default_operator: DefaultOperator,
    factory: ItemFactory,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

impl QueryCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        let factory = ItemFactory::new(FieldMetadata {
            default_field: options.default_field,
            unanalyzed_fields: options.unanalyzed_fields,
            nested_fields: options.nested_fields,
        });
        Self {
            default_operator: options.default_operator,
            factory,
        }
    }

    /// Compile a query tree into its root item.
    ///
    /// Fails on an unparenthesized AND/OR mix; there is no partial result.
    pub fn compile(&self, root: &QueryNode) -> Result<QueryItem> {
        tracing::debug!(query = %root, "compiling query tree");
        self.visit(root, &[])
    }

    fn visit<'a>(&self, node: &'a QueryNode, ancestors: &[&'a QueryNode]) -> Result<QueryItem> {
        tracing::trace!(kind = node.kind(), depth = ancestors.len(), "visit");
        match node {
            QueryNode::Word(value) => Ok(self.factory.term(value.clone())),
            QueryNode::Phrase(value) => Ok(self.factory.phrase(value.clone())),
            QueryNode::Range(range) => Ok(self.range_item(range)),
            QueryNode::And(children) => {
                self.boolean(DefaultOperator::Must, node, children, ancestors)
            }
            QueryNode::Or(children) => {
                self.boolean(DefaultOperator::Should, node, children, ancestors)
            }
            QueryNode::Unknown(children) => {
                self.boolean(self.default_operator, node, children, ancestors)
            }
            // Negation chains are never collapsed: NOT NOT a is not a.
            QueryNode::Not(expr) | QueryNode::Prohibit(expr) => {
                let inner = self.visit(expr, &chain(ancestors, node))?;
                Ok(self.factory.must_not(vec![inner]))
            }
            QueryNode::Plus(expr) => {
                let inner = self.visit(expr, &chain(ancestors, node))?;
                Ok(self.factory.must(vec![inner]))
            }
            QueryNode::Boost { expr, force } => {
                Ok(self.visit(expr, &chain(ancestors, node))?.with_boost(*force))
            }
            QueryNode::Fuzzy { term, degree } => {
                Ok(self.visit(term, &chain(ancestors, node))?.with_fuzziness(*degree))
            }
            QueryNode::Proximity { term, degree } => {
                Ok(self.visit(term, &chain(ancestors, node))?.with_slop(*degree))
            }
            // Groups exist only to force a precedence boundary; field scoping
            // for a FieldGroup is applied by the enclosing SearchField.
            QueryNode::Group(expr) | QueryNode::FieldGroup(expr) => {
                self.visit(expr, &chain(ancestors, node))
            }
            QueryNode::SearchField { name, expr } => {
                self.search_field(name, expr, node, ancestors)
            }
        }
    }

    /// Shared path for And / Or / resolved Unknown: flatten, validate,
    /// compose n-ary.
    fn boolean<'a>(
        &self,
        kind: DefaultOperator,
        node: &'a QueryNode,
        children: &'a [QueryNode],
        ancestors: &[&'a QueryNode],
    ) -> Result<QueryItem> {
        let flat = self.flatten(children, kind);
        for child in &flat {
            if self.resolved_kind(child) == Some(kind.opposite()) {
                let excerpt = operator_extract(child, EXCERPT_DELTA);
                tracing::debug!(excerpt = %excerpt, "rejecting unparenthesized AND/OR mix");
                return Err(CompileError::AmbiguousBooleanMix { excerpt });
            }
        }
        let path = chain(ancestors, node);
        let items = flat
            .iter()
            .map(|child| self.visit(child, &path))
            .collect::<Result<Vec<_>>>()?;
        Ok(match kind {
            DefaultOperator::Must => self.factory.must(items),
            DefaultOperator::Should => self.factory.should(items),
        })
    }

    /// Splice children of the same resolved boolean kind into the current
    /// child list, recursively, so `A AND (B AND C)` composes as one 3-ary
    /// conjunction. Resolution means an Unknown child under the matching
    /// default operator flattens too.
    fn flatten<'a>(&self, children: &'a [QueryNode], kind: DefaultOperator) -> Vec<&'a QueryNode> {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                QueryNode::And(inner) | QueryNode::Or(inner) | QueryNode::Unknown(inner)
                    if self.resolved_kind(child) == Some(kind) =>
                {
                    flat.extend(self.flatten(inner, kind));
                }
                _ => flat.push(child),
            }
        }
        flat
    }

    /// The boolean kind a node composes as, with Unknown adopting the
    /// default operator. Non-boolean nodes have none.
    fn resolved_kind(&self, node: &QueryNode) -> Option<DefaultOperator> {
        match node {
            QueryNode::And(_) => Some(DefaultOperator::Must),
            QueryNode::Or(_) => Some(DefaultOperator::Should),
            QueryNode::Unknown(_) => Some(self.default_operator),
            _ => None,
        }
    }

    fn search_field<'a>(
        &self,
        name: &str,
        expr: &'a QueryNode,
        node: &'a QueryNode,
        ancestors: &[&'a QueryNode],
    ) -> Result<QueryItem> {
        let inner = self.visit(expr, &chain(ancestors, node))?;
        if contains_search_field(expr) {
            // A scope over another scope is the nested-object access
            // pattern: the subtree must match within one sub-document.
            if !self.factory.is_declared_nested(name) {
                tracing::debug!(
                    field = name,
                    "field scopes a nested subtree but is not declared in nested_fields"
                );
            }
            Ok(self.factory.nested(name, inner.scoped(name)))
        } else {
            Ok(inner.scoped(name))
        }
    }

    fn range_item(&self, range: &RangeNode) -> QueryItem {
        let (mut gte, mut gt, mut lte, mut lt) = (None, None, None, None);
        if range.low != "*" {
            if range.include_low {
                gte = Some(range.low.clone());
            } else {
                gt = Some(range.low.clone());
            }
        }
        if range.high != "*" {
            if range.include_high {
                lte = Some(range.high.clone());
            } else {
                lt = Some(range.high.clone());
            }
        }
        self.factory.range(gte, gt, lte, lt)
    }
}

fn chain<'a>(ancestors: &[&'a QueryNode], node: &'a QueryNode) -> Vec<&'a QueryNode> {
    let mut path = ancestors.to_vec();
    path.push(node);
    path
}

fn contains_search_field(node: &QueryNode) -> bool {
    match node {
        QueryNode::SearchField { .. } => true,
        QueryNode::Word(_) | QueryNode::Phrase(_) | QueryNode::Range(_) => false,
        QueryNode::And(children) | QueryNode::Or(children) | QueryNode::Unknown(children) => {
            children.iter().any(contains_search_field)
        }
        QueryNode::Not(expr)
        | QueryNode::Prohibit(expr)
        | QueryNode::Plus(expr)
        | QueryNode::Group(expr)
        | QueryNode::FieldGroup(expr) => contains_search_field(expr),
        QueryNode::Boost { expr, .. } => contains_search_field(expr),
        QueryNode::Fuzzy { term, .. } | QueryNode::Proximity { term, .. } => {
            contains_search_field(term)
        }
    }
}

/// A short extract of query text around a boolean node's operator, to help
/// the author locate the boundary to parenthesize. `delta` is the number of
/// characters kept on each side of the operator.
fn operator_extract(node: &QueryNode, delta: usize) -> String {
    let children = match node {
        QueryNode::And(c) | QueryNode::Or(c) | QueryNode::Unknown(c) if c.len() >= 2 => c,
        _ => return node.to_string(),
    };
    let node_chars: Vec<char> = node.to_string().chars().collect();
    let first: Vec<char> = children[0].to_string().chars().collect();
    let second: Vec<char> = children[1].to_string().chars().collect();
    let operator_len = node_chars
        .len()
        .saturating_sub(first.len() + second.len());
    let position = find_chars(&node_chars, &second).unwrap_or(node_chars.len());
    let start = position.saturating_sub(operator_len + delta);
    let end = (position + delta).min(node_chars.len());
    node_chars[start..end].iter().collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
