//! Lucene query tree to Elasticsearch Query DSL compiler
//!
//! This crate takes an already-parsed Lucene-syntax query tree
//! ([`ast::QueryNode`]) and compiles it into an equivalent Elasticsearch
//! boolean query document, preserving boolean semantics under operator
//! mixing, flattening and default-operator resolution, and threading field
//! scopes (including nested-object paths like `illustrators:(name:Giles)`)
//! through arbitrarily deep subtrees.
//!
//! Syntactically ambiguous queries — an AND and an OR at the same level with
//! no parentheses — are rejected rather than silently resolved.
//!
//! # Example
//!
//! ```
//! use refract::{CompilerOptions, QueryCompiler, QueryNode};
//!
//! let compiler = QueryCompiler::new(CompilerOptions::default());
//!
//! // title:Phoenix AND n_pages:[500 TO *]
//! let tree = QueryNode::field("title", QueryNode::word("Phoenix"))
//!     .and(QueryNode::field("n_pages", QueryNode::range("500", "*", true, true)));
//!
//! let item = compiler.compile(&tree).expect("unambiguous query");
//! let body = item.to_value();
//! assert_eq!(body["bool"]["must"][0]["match"]["title"]["query"], "Phoenix");
//! assert_eq!(body["bool"]["must"][1]["range"]["n_pages"]["gte"], "500");
//! ```
//!
//! The compiler holds configuration only, so a single instance can be shared
//! across threads and reused for any number of independent compilations.

pub mod ast;
pub mod compiler;
pub mod dsl;
pub mod error;

pub use ast::QueryNode;
pub use compiler::{CompilerOptions, DefaultOperator, QueryCompiler};
pub use dsl::{ItemFactory, QueryItem};
pub use error::{CompileError, Result};
