//! Single-bit signal definitions.

use crate::ids::SignalId;
use lutra_common::Ident;
use serde::{Deserialize, Serialize};

/// A single-bit net.
///
/// The mapper operates entirely at bit granularity: a multi-bit wire in the
/// source design becomes one `Signal` per bit before mapping. Two signals
/// that alias the same net are merged by the [`SigMap`](crate::sigmap::SigMap)
/// canonicalizer, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The signal's ID within its module.
    pub id: SignalId,
    /// The signal's name.
    pub name: Ident,
}
