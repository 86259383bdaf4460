// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ordered index table: a permutation of com-object indices, sorted
//! ascending by group address, used to binary-search inbound target
//! addresses down to a com-object index.
//!
//! The original implementation's de-duplication and min-search loops are
//! arithmetically inconsistent (inverted `isCom` test, `foundMin` reset to
//! 0xFF instead of 0xFFFF). This version instead does the obvious thing: sort
//! the indices of communication-flagged objects by address, and reject the
//! attachment outright if two of them share an address.

use heapless::Vec as HVec;

use crate::comobject::{ComObject, Indicator};
use crate::error::LinkError;

/// Upper bound on how many com-objects a single link can have attached.
/// Chosen generously for a field device; hosts needing more should raise it.
pub const MAX_COM_OBJECTS: usize = 256;

/// Sorted permutation of communication-flagged com-object indices.
pub struct OrderedIndexTable {
    table: HVec<usize, MAX_COM_OBJECTS>,
}

impl OrderedIndexTable {
    /// Builds the table from `objects`, including only those with the `C`
    /// (communication) indicator bit set.
    ///
    /// Returns [`LinkError::DuplicateGroupAddress`] if two C-flagged objects
    /// share a group address.
    pub fn build(objects: &[ComObject]) -> Result<Self, LinkError> {
        let mut table: HVec<usize, MAX_COM_OBJECTS> = HVec::new();
        for (i, obj) in objects.iter().enumerate() {
            if obj.indicator().contains(Indicator::COMMUNICATION) {
                table.push(i).ok();
            }
        }
        table.sort_unstable_by_key(|&i| objects[i].address());

        for pair in table.windows(2) {
            if objects[pair[0]].address() == objects[pair[1]].address() {
                return Err(LinkError::DuplicateGroupAddress);
            }
        }

        Ok(OrderedIndexTable { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the com-object index at sorted position `pos`.
    pub fn nth(&self, pos: usize) -> usize {
        self.table[pos]
    }

    /// Binary-searches for `addr`, returning the attached com-object's index
    /// into the original object list if found.
    pub fn find(&self, addr: u16, objects: &[ComObject]) -> Option<usize> {
        self.table
            .binary_search_by_key(&addr, |&i| objects[i].address())
            .ok()
            .map(|pos| self.table[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpt::{DptId, ExampleDptTable};

    fn objs(addrs: &[u16]) -> Vec<ComObject> {
        addrs
            .iter()
            .map(|&a| ComObject::new(a, DptId::new(1, 1), Indicator::COMMUNICATION, &ExampleDptTable).unwrap())
            .collect()
    }

    #[test]
    fn sorted_ascending() {
        let objects = objs(&[0x55, 0x11, 0x99, 0x22]);
        let table = OrderedIndexTable::build(&objects).unwrap();
        for i in 0..table.len() - 1 {
            assert!(objects[table.nth(i)].address() <= objects[table.nth(i + 1)].address());
        }
    }

    #[test]
    fn excludes_non_communication_objects() {
        let mut objects = objs(&[0x11, 0x22]);
        let plain = ComObject::new(0x33, DptId::new(1, 1), Indicator::empty(), &ExampleDptTable).unwrap();
        objects.push(plain);
        let table = OrderedIndexTable::build(&objects).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(0x33, &objects), None);
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let objects = objs(&[0x11, 0x22, 0x11]);
        assert_eq!(OrderedIndexTable::build(&objects), Err(LinkError::DuplicateGroupAddress));
    }

    #[test]
    fn binary_search_matches_ten_objects() {
        let addrs = [0x11, 0x22, 0x33, 0x40, 0x55, 0x60, 0x77, 0x80, 0x99, 0xAA];
        let objects = objs(&addrs);
        let table = OrderedIndexTable::build(&objects).unwrap();

        let idx = table.find(0x77, &objects).unwrap();
        assert_eq!(objects[idx].address(), 0x77);
        assert_eq!(table.find(0x78, &objects), None);
    }
}
