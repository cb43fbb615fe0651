//! Module ports and connection directions.

use crate::ids::{PortId, SignalId};
use lutra_common::Ident;
use serde::{Deserialize, Serialize};

/// The direction of a port or cell connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the module or cell.
    Input,
    /// Data flows out of the module or cell.
    Output,
}

/// A module-level port.
///
/// A port of width `n` carries `n` signal bits, least significant first.
/// The bits of input ports are the mapper's primary inputs; the bits of
/// output ports are its primary outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// The port's ID within its module.
    pub id: PortId,
    /// The port's name.
    pub name: Ident,
    /// The port's direction.
    pub direction: PortDirection,
    /// The signal bits the port carries, LSB first.
    pub bits: Vec<SignalId>,
}
