//! The primitive-library oracle.
//!
//! The mapper's only knowledge of the target technology at the front end is
//! this interface: which cell kinds are combinational gates it may absorb
//! into LUTs, and which single-input cells are transparent buffers it may
//! walk through when hunting for a mappable driver. Everything else is a
//! boundary.

use crate::cell::CellKind;

/// Classification oracle for cell kinds.
pub trait CellLibrary {
    /// Returns `true` if the cell kind is known to the library at all.
    ///
    /// Unknown cells are skipped when building the mapping graph and
    /// reported as structural warnings.
    fn is_known(&self, kind: &CellKind) -> bool;

    /// Returns `true` for single-output combinational gates the mapper may
    /// cover with LUTs.
    fn is_combinational(&self, kind: &CellKind) -> bool;

    /// Returns `true` for single-input cells that merely forward or invert
    /// their input (buffers, inverters, I/O buffers). The merger walks
    /// through these when locating the nearest combinational driver of a
    /// primary output.
    fn is_transparent(&self, kind: &CellKind) -> bool;
}

/// The standard library classification for the built-in [`CellKind`]s.
#[derive(Debug, Default)]
pub struct StdCellLibrary;

impl CellLibrary for StdCellLibrary {
    fn is_known(&self, kind: &CellKind) -> bool {
        !matches!(kind, CellKind::BlackBox { .. })
    }

    fn is_combinational(&self, kind: &CellKind) -> bool {
        matches!(
            kind,
            CellKind::And
                | CellKind::Or
                | CellKind::Xor
                | CellKind::Nand
                | CellKind::Nor
                | CellKind::Xnor
                | CellKind::Not
                | CellKind::Buf
                | CellKind::Mux
        )
    }

    fn is_transparent(&self, kind: &CellKind) -> bool {
        matches!(
            kind,
            CellKind::Buf | CellKind::Not | CellKind::InBuf | CellKind::OutBuf
        )
    }
}
