//! Diagnostic codes with category prefixes for structured identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
///
/// The categories follow the mapper's error model: structural conditions in
/// the input netlist, evaluation failures in the truth-table simulator, and
/// invariant reports surfaced alongside an aborting internal error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Structural netlist conditions (cycles, unknown cells), prefixed with `S`.
    Structural,
    /// Truth-table evaluation failures, prefixed with `E`.
    Evaluation,
    /// Invariant violations, prefixed with `I`.
    Invariant,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Structural => 'S',
            Category::Evaluation => 'E',
            Category::Invariant => 'I',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier, displayed as e.g. `S101` or `E203`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Well-known diagnostic codes emitted by the mapper.
pub mod codes {
    use super::{Category, DiagnosticCode};

    /// The combinational subgraph contains a cycle; a partial topological
    /// order is used and signals on the cycle stay unmapped.
    pub const COMBINATIONAL_CYCLE: DiagnosticCode = DiagnosticCode {
        category: Category::Structural,
        number: 101,
    };

    /// A cell of unknown type was skipped while building the mapping graph.
    pub const UNKNOWN_CELL: DiagnosticCode = DiagnosticCode {
        category: Category::Structural,
        number: 102,
    };

    /// A node could not be emitted because its cone failed to reduce to a
    /// truth table.
    pub const UNMAPPED_NODE: DiagnosticCode = DiagnosticCode {
        category: Category::Evaluation,
        number: 201,
    };
}
