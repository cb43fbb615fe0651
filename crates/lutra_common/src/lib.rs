//! Shared foundational types for the Lutra LUT mapper.
//!
//! This crate provides the types every other Lutra crate builds on: interned
//! identifiers, 4-state logic values, packed truth-table vectors, and the
//! common result type for internal errors.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod truth_vec;
pub mod result;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use result::{InternalError, LutraResult};
pub use truth_vec::TruthVec;
