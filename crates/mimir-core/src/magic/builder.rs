//! Builds clause trees from nested match declarations.
//!
//! Siblings are alternatives; children refine their parent. For
//!
//! ```text
//! <match A>
//!   <match B/>
//! </match>
//! <match C/>
//! ```
//!
//! the resulting clause is `(A AND B) OR C`, folded left starting from
//! [`Clause::AlwaysFalse`].

use super::{ByteTest, Clause};

/// A decoded `<match>` element and its nested alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecl {
    /// The element's own comparison
    pub test: ByteTest,
    /// Nested `<match>` elements, in document order
    pub children: Vec<MatchDecl>,
}

impl MatchDecl {
    /// A match without nested alternatives
    pub fn leaf(test: ByteTest) -> Self {
        Self {
            test,
            children: Vec::new(),
        }
    }
}

/// Builds the clause for a list of sibling matches.
///
/// Returns `None` when `matches` is empty.
pub fn build_clause(matches: &[MatchDecl]) -> Option<Clause> {
    if matches.is_empty() {
        return None;
    }

    let clause = matches.iter().fold(Clause::AlwaysFalse, |acc, decl| {
        let leaf = Clause::Match(decl.test.clone());
        let current = match build_clause(&decl.children) {
            Some(nested) => Clause::and(leaf, nested),
            None => leaf,
        };
        Clause::or(acc, current)
    });

    Some(clause)
}
