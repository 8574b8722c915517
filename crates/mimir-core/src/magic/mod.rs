//! Magic rules: prioritized boolean clauses over byte tests.
//!
//! A [`Magic`] owns one [`Clause`] tree. Leaves are [`ByteTest`]s; inner nodes
//! combine them with AND/OR. Trees are built once by [`build_clause`] while the
//! configuration is loaded and are never mutated afterwards, so they can be
//! shared freely between detector threads.

mod builder;

pub use builder::{build_clause, MatchDecl};
pub use byte_test::{parse_offset, ByteTest, Endianness, ValueKind};

/// Priority given to a magic declaration without a `priority` attribute
pub const DEFAULT_PRIORITY: i32 = 50;

/// Boolean expression over byte tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Never matches; the identity for OR-folding
    AlwaysFalse,
    /// Leaf comparison
    Match(ByteTest),
    /// Both sides must match
    And(Box<Clause>, Box<Clause>),
    /// Either side must match
    Or(Box<Clause>, Box<Clause>),
}

impl Clause {
    /// Combines two clauses with AND
    pub fn and(left: Clause, right: Clause) -> Self {
        Clause::And(Box::new(left), Box::new(right))
    }

    /// Combines two clauses with OR
    pub fn or(left: Clause, right: Clause) -> Self {
        Clause::Or(Box::new(left), Box::new(right))
    }

    /// Evaluates the clause against the leading bytes of a document
    pub fn eval(&self, data: &[u8]) -> bool {
        match self {
            Clause::AlwaysFalse => false,
            Clause::Match(test) => test.matches(data),
            Clause::And(left, right) => left.eval(data) && right.eval(data),
            Clause::Or(left, right) => left.eval(data) || right.eval(data),
        }
    }

    /// Number of leading bytes needed to evaluate every leaf fully
    pub fn extent(&self) -> usize {
        match self {
            Clause::AlwaysFalse => 0,
            Clause::Match(test) => test.extent(),
            Clause::And(left, right) | Clause::Or(left, right) => {
                left.extent().max(right.extent())
            }
        }
    }
}

/// A prioritized byte signature attached to one content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magic {
    priority: i32,
    clause: Clause,
}

impl Magic {
    /// Creates a rule from a priority and its clause
    pub fn new(priority: i32, clause: Clause) -> Self {
        Self { priority, clause }
    }

    /// Rules with a higher priority are evaluated first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The rule's clause tree
    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// Returns true if the clause matches `data`
    pub fn matches(&self, data: &[u8]) -> bool {
        self.clause.eval(data)
    }
}
