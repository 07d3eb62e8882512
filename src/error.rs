use thiserror::Error;

/// Errors raised while compiling a query tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// An AND-like and an OR-like operator met at the same nesting level
    /// without parentheses. The source grammar gives the pair no precedence,
    /// so picking one silently would change result semantics; the query
    /// author has to group explicitly.
    #[error("AND and OR on the same level near \"{excerpt}\": use parentheses to group operators")]
    AmbiguousBooleanMix { excerpt: String },
}

pub type Result<T> = std::result::Result<T, CompileError>;
