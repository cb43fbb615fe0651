//! Bit-level structural netlist IR for the Lutra mapper.
//!
//! The mapper consumes a gate-level netlist in which every signal is a
//! single bit (multi-bit buses are expanded before mapping; a [`Port`]
//! carries one [`SignalId`] per bit). Cells connect to signals through
//! named, directed [`Connection`]s.
//!
//! Alongside the netlist itself, this crate provides the two collaborator
//! interfaces the mapper core consumes: the signal canonicalizer
//! [`SigMap`] and the primitive-library oracle [`CellLibrary`].

#![warn(missing_docs)]

pub mod arena;
pub mod cell;
pub mod ids;
pub mod library;
pub mod module;
pub mod port;
pub mod sigmap;
pub mod signal;

pub use arena::{Arena, ArenaId};
pub use cell::{Cell, CellKind, Connection};
pub use ids::{CellId, PortId, SignalId};
pub use library::{CellLibrary, StdCellLibrary};
pub use module::Module;
pub use port::{Port, PortDirection};
pub use sigmap::SigMap;
pub use signal::Signal;
