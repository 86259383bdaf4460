// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The datapoint-type (DPT) catalogue is an external collaborator: this
//! crate only needs to know a DPT's bit length in order to size a
//! com-object's value. The actual catalogue (encodings, scaling, units) is
//! the host's responsibility.

/// A KNX datapoint-type identifier, e.g. `9.001` (temperature) is
/// `DptId { main: 9, sub: 1 }`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Deserialize, serde::Serialize))]
pub struct DptId {
    pub main: u16,
    pub sub: u16,
}

impl DptId {
    pub const fn new(main: u16, sub: u16) -> Self {
        DptId { main, sub }
    }
}

/// Maps a [`DptId`] to its bit length. Implemented by the host, typically
/// backed by the full DPT catalogue from the KNX specification.
pub trait DptTable {
    /// Returns the bit length of `id`, or `None` if the identifier is
    /// unknown to this table.
    fn bit_length(&self, id: DptId) -> Option<u16>;
}

/// A tiny illustrative table covering a handful of common DPTs, used only by
/// this crate's own tests. Hosts should supply their own, complete,
/// [`DptTable`] implementation.
#[cfg(test)]
pub(crate) struct ExampleDptTable;

#[cfg(test)]
impl DptTable for ExampleDptTable {
    fn bit_length(&self, id: DptId) -> Option<u16> {
        match (id.main, id.sub) {
            (1, _) => Some(1),   // boolean
            (5, _) => Some(8),   // 8-bit unsigned
            (6, _) => Some(8),   // 8-bit signed
            (9, _) => Some(16),  // 16-bit float
            (13, _) => Some(32), // 32-bit signed
            (14, _) => Some(32), // 32-bit float
            (16, _) => Some(112), // 14-byte string
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_table_knows_common_dpts() {
        let table = ExampleDptTable;
        assert_eq!(table.bit_length(DptId::new(1, 1)), Some(1));
        assert_eq!(table.bit_length(DptId::new(9, 1)), Some(16));
        assert_eq!(table.bit_length(DptId::new(255, 1)), None);
    }
}
