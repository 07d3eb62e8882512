use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed Lucene query tree node.
///
/// Produced by a query parser and consumed read-only by the compiler.
/// The set of kinds is closed: every variant has a dispatch case in the
/// compiler, checked at compile time by the exhaustive match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    /// Single token: "spam" or the `*` existence token
    Word(String),

    /// Quoted sequence: "\"monty python\"" (stored without the quotes)
    Phrase(String),

    /// Bounded interval: "[1 TO 10]" or "{1 TO 10}"
    Range(RangeNode),

    /// Boolean AND: a AND b
    And(Vec<QueryNode>),

    /// Boolean OR: a OR b
    Or(Vec<QueryNode>),

    /// Operator-less juxtaposition: "a b", resolved by the default operator
    Unknown(Vec<QueryNode>),

    /// Boolean NOT: NOT a
    Not(Box<QueryNode>),

    /// Prohibit prefix: -a
    Prohibit(Box<QueryNode>),

    /// Required prefix: +a
    Plus(Box<QueryNode>),

    /// Boosted subtree: term^2.5
    Boost { expr: Box<QueryNode>, force: f32 },

    /// Fuzzy term: term~2
    Fuzzy { term: Box<QueryNode>, degree: f32 },

    /// Proximity phrase: "a b"~4
    Proximity { term: Box<QueryNode>, degree: f32 },

    /// Parenthesized group: (a OR b)
    Group(Box<QueryNode>),

    /// Parenthesized group under a field scope: field:(a OR b)
    FieldGroup(Box<QueryNode>),

    /// Field scope: field:expr
    SearchField { name: String, expr: Box<QueryNode> },
}

/// Payload of a range node. A `*` bound leaves that side open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeNode {
    pub low: String,
    pub high: String,
    pub include_low: bool,
    pub include_high: bool,
}

impl QueryNode {
    /// Create a word node
    pub fn word(value: impl Into<String>) -> Self {
        QueryNode::Word(value.into())
    }

    /// Create a phrase node (pass the content without quotes)
    pub fn phrase(value: impl Into<String>) -> Self {
        QueryNode::Phrase(value.into())
    }

    /// Create a range node
    pub fn range(
        low: impl Into<String>,
        high: impl Into<String>,
        include_low: bool,
        include_high: bool,
    ) -> Self {
        QueryNode::Range(RangeNode {
            low: low.into(),
            high: high.into(),
            include_low,
            include_high,
        })
    }

    /// Create a field scope: `field(name, expr)` is "name:expr"
    pub fn field(name: impl Into<String>, expr: QueryNode) -> Self {
        QueryNode::SearchField {
            name: name.into(),
            expr: Box::new(expr),
        }
    }

    /// Combine with AND
    pub fn and(self, other: QueryNode) -> Self {
        match self {
            QueryNode::And(mut nodes) => {
                nodes.push(other);
                QueryNode::And(nodes)
            }
            _ => QueryNode::And(vec![self, other]),
        }
    }

    /// Combine with OR
    pub fn or(self, other: QueryNode) -> Self {
        match self {
            QueryNode::Or(mut nodes) => {
                nodes.push(other);
                QueryNode::Or(nodes)
            }
            _ => QueryNode::Or(vec![self, other]),
        }
    }

    /// Juxtapose without an explicit operator
    pub fn followed_by(self, other: QueryNode) -> Self {
        match self {
            QueryNode::Unknown(mut nodes) => {
                nodes.push(other);
                QueryNode::Unknown(nodes)
            }
            _ => QueryNode::Unknown(vec![self, other]),
        }
    }

    /// Negate with NOT
    pub fn negate(self) -> Self {
        QueryNode::Not(Box::new(self))
    }

    /// Prohibit prefix (-)
    pub fn prohibit(self) -> Self {
        QueryNode::Prohibit(Box::new(self))
    }

    /// Required prefix (+)
    pub fn require(self) -> Self {
        QueryNode::Plus(Box::new(self))
    }

    /// Apply a boost factor
    pub fn boost(self, force: f32) -> Self {
        QueryNode::Boost {
            expr: Box::new(self),
            force,
        }
    }

    /// Apply a fuzziness degree
    pub fn fuzzy(self, degree: f32) -> Self {
        QueryNode::Fuzzy {
            term: Box::new(self),
            degree,
        }
    }

    /// Apply a proximity (slop) degree
    pub fn proximity(self, degree: f32) -> Self {
        QueryNode::Proximity {
            term: Box::new(self),
            degree,
        }
    }

    /// Wrap in parentheses
    pub fn group(self) -> Self {
        QueryNode::Group(Box::new(self))
    }

    /// Wrap in parentheses under a field scope
    pub fn field_group(self) -> Self {
        QueryNode::FieldGroup(Box::new(self))
    }

    /// Get the node kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            QueryNode::Word(_) => "word",
            QueryNode::Phrase(_) => "phrase",
            QueryNode::Range(_) => "range",
            QueryNode::And(_) => "and",
            QueryNode::Or(_) => "or",
            QueryNode::Unknown(_) => "unknown",
            QueryNode::Not(_) => "not",
            QueryNode::Prohibit(_) => "prohibit",
            QueryNode::Plus(_) => "plus",
            QueryNode::Boost { .. } => "boost",
            QueryNode::Fuzzy { .. } => "fuzzy",
            QueryNode::Proximity { .. } => "proximity",
            QueryNode::Group(_) => "group",
            QueryNode::FieldGroup(_) => "field_group",
            QueryNode::SearchField { .. } => "search_field",
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[QueryNode], sep: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", node)?;
    }
    Ok(())
}

/// Renders the subtree back to Lucene syntax. Diagnostics (the ambiguity
/// excerpt) are computed from this rendering.
impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Word(value) => f.write_str(value),
            QueryNode::Phrase(value) => write!(f, "\"{}\"", value),
            QueryNode::Range(r) => write!(
                f,
                "{}{} TO {}{}",
                if r.include_low { '[' } else { '{' },
                r.low,
                r.high,
                if r.include_high { ']' } else { '}' },
            ),
            QueryNode::And(nodes) => write_joined(f, nodes, " AND "),
            QueryNode::Or(nodes) => write_joined(f, nodes, " OR "),
            QueryNode::Unknown(nodes) => write_joined(f, nodes, " "),
            QueryNode::Not(expr) => write!(f, "NOT {}", expr),
            QueryNode::Prohibit(expr) => write!(f, "-{}", expr),
            QueryNode::Plus(expr) => write!(f, "+{}", expr),
            QueryNode::Boost { expr, force } => write!(f, "{}^{}", expr, force),
            QueryNode::Fuzzy { term, degree } => write!(f, "{}~{}", term, degree),
            QueryNode::Proximity { term, degree } => write!(f, "{}~{}", term, degree),
            QueryNode::Group(expr) | QueryNode::FieldGroup(expr) => write!(f, "({})", expr),
            QueryNode::SearchField { name, expr } => write!(f, "{}:{}", name, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_builder() {
        let q = QueryNode::word("spam");
        assert_eq!(q, QueryNode::Word("spam".to_string()));
    }

    #[test]
    fn test_and_combinator_flattens() {
        let q = QueryNode::word("a")
            .and(QueryNode::word("b"))
            .and(QueryNode::word("c"));
        match q {
            QueryNode::And(nodes) => assert_eq!(nodes.len(), 3),
            _ => panic!("Expected And"),
        }
    }

    #[test]
    fn test_field_scope_builder() {
        let q = QueryNode::field("title", QueryNode::word("Phoenix"));
        match q {
            QueryNode::SearchField { name, expr } => {
                assert_eq!(name, "title");
                assert_eq!(*expr, QueryNode::Word("Phoenix".to_string()));
            }
            _ => panic!("Expected SearchField"),
        }
    }

    #[test]
    fn test_display_roundtrips_operators() {
        let q = QueryNode::word("spam").or(QueryNode::word("ham"));
        assert_eq!(q.to_string(), "spam OR ham");

        let q = QueryNode::word("spam").and(QueryNode::word("ham").negate());
        assert_eq!(q.to_string(), "spam AND NOT ham");

        let q = QueryNode::word("spam").followed_by(QueryNode::word("ham"));
        assert_eq!(q.to_string(), "spam ham");
    }

    #[test]
    fn test_display_field_and_group() {
        let q = QueryNode::field(
            "title",
            QueryNode::word("a").or(QueryNode::word("b")).field_group(),
        );
        assert_eq!(q.to_string(), "title:(a OR b)");
    }

    #[test]
    fn test_display_modifiers() {
        assert_eq!(QueryNode::word("spam").boost(2.5).to_string(), "spam^2.5");
        assert_eq!(QueryNode::word("spam").fuzzy(1.0).to_string(), "spam~1");
        assert_eq!(
            QueryNode::phrase("monty python").proximity(4.0).to_string(),
            "\"monty python\"~4"
        );
    }

    #[test]
    fn test_display_range() {
        assert_eq!(
            QueryNode::range("1", "10", true, true).to_string(),
            "[1 TO 10]"
        );
        assert_eq!(
            QueryNode::range("1", "10", false, false).to_string(),
            "{1 TO 10}"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let q = QueryNode::field("title", QueryNode::word("Phoenix")).and(
            QueryNode::range("2000", "2010", true, false),
        );
        let json = serde_json::to_string(&q).unwrap();
        let back: QueryNode = serde_json::from_str(&json).unwrap();
        assert_eq!(q, back);
    }
}
