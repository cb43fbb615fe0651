//! Cell definitions for gate-level primitives.
//!
//! A [`Cell`] is a single primitive instance connected to signals through
//! named, directed [`Connection`]s. The mapper classifies cells through the
//! [`CellLibrary`](crate::library::CellLibrary) oracle rather than by
//! matching on [`CellKind`] directly, so alternative libraries can widen or
//! narrow the combinational subset.

use crate::ids::{CellId, SignalId};
use crate::port::PortDirection;
use lutra_common::{Ident, Logic, TruthVec};
use serde::{Deserialize, Serialize};

/// The kind of a cell.
///
/// Pre-mapping netlists use the gate primitives (`And` through `Mux`) plus
/// the sequential and I/O boundary primitives. Post-mapping netlists use
/// `Lut` and `DualLut`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    // --- Combinational gate primitives (single output) ---
    /// AND of all inputs.
    And,
    /// OR of all inputs.
    Or,
    /// XOR of all inputs.
    Xor,
    /// NAND of all inputs.
    Nand,
    /// NOR of all inputs.
    Nor,
    /// XNOR of all inputs.
    Xnor,
    /// Inverter.
    Not,
    /// Non-inverting buffer.
    Buf,
    /// 2:1 multiplexer: output is `B` when `S` is high, `A` otherwise.
    Mux,

    // --- Boundary primitives ---
    /// D flip-flop (ports `D`, `C`, `Q`).
    Dff,
    /// Level-sensitive latch (ports `D`, `E`, `Q`).
    Latch,
    /// Input buffer from a pad (ports `I`, `O`).
    InBuf,
    /// Output buffer to a pad (ports `I`, `O`).
    OutBuf,
    /// Constant driver.
    Const {
        /// The driven value.
        value: Logic,
    },
    /// An unknown primitive; opaque to the mapper and the simulator.
    BlackBox {
        /// The foreign cell type name.
        kind: Ident,
    },

    // --- Technology-mapped primitives ---
    /// A K-input lookup table (ports `I0..I{K-1}`, `Z`).
    Lut {
        /// Number of input pins.
        width: u32,
        /// The `2^width`-bit configuration word.
        init: TruthVec,
    },
    /// A dual-output lookup table (ports `I0..I5`, `Z`, `Z5`).
    ///
    /// The 64-bit configuration word is split in two halves: bits 0..32
    /// program both the secondary output `Z5` and the primary output `Z`
    /// with `I5 = 0`; bits 32..64 program `Z` with `I5 = 1`.
    DualLut {
        /// The 64-bit configuration word.
        init: TruthVec,
    },
}

/// A directed, named connection between a cell port and a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The cell port name (e.g. `A`, `S`, `I3`).
    pub port: Ident,
    /// Whether the cell reads or drives the signal.
    pub direction: PortDirection,
    /// The connected signal.
    pub signal: SignalId,
}

/// A cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The cell's ID within its module.
    pub id: CellId,
    /// The instance name.
    pub name: Ident,
    /// What the cell is.
    pub kind: CellKind,
    /// Port connections.
    pub connections: Vec<Connection>,
}

impl Cell {
    /// Iterates the signals of all input-direction connections, in
    /// connection order.
    pub fn input_signals(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.connections
            .iter()
            .filter(|c| c.direction == PortDirection::Input)
            .map(|c| c.signal)
    }

    /// Returns the signal of the first output-direction connection.
    pub fn output_signal(&self) -> Option<SignalId> {
        self.connections
            .iter()
            .find(|c| c.direction == PortDirection::Output)
            .map(|c| c.signal)
    }

    /// Returns the signal connected to the named input port, if any.
    pub fn input_by_port(&self, port: Ident) -> Option<SignalId> {
        self.connections
            .iter()
            .find(|c| c.direction == PortDirection::Input && c.port == port)
            .map(|c| c.signal)
    }
}
