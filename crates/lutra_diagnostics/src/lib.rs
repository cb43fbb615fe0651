//! Structured diagnostics for the Lutra mapper.
//!
//! The mapper never prints directly: every user-visible condition is emitted
//! as a [`Diagnostic`] into a [`DiagnosticSink`] owned by the caller.
//! Recoverable conditions (combinational cycles, unknown cells, nodes left
//! unmapped) are warnings; invariant violations are not diagnostics at all
//! but `InternalError`s that abort the run.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
