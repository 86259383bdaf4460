// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The com-object model: a bus-facing endpoint bound to a group address,
//! with capability flags and a typed, variable-width value.

use bitflags::bitflags;
use heapless::Vec as HVec;

use crate::dpt::{DptId, DptTable};
use crate::error::ComObjectError;
use crate::telegram::Telegram;

/// Maximum number of bytes a long payload (length > 2) can carry.
pub const MAX_LONG_VALUE_LEN: usize = 14;
/// Priority used on every outbound telegram produced on behalf of a
/// com-object.
pub const PRIORITY_NORMAL: u8 = 12;

bitflags! {
    /// Indicator bits, laid out as `xx xx C R W T U I` (bits 5..0).
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Indicator: u8 {
        /// Communication: the object may be attached to the bus at all.
        const COMMUNICATION = 0x20;
        /// Read: respond to inbound READ telegrams.
        const READ = 0x10;
        /// Write: accept inbound WRITE telegrams.
        const WRITE = 0x08;
        /// Transmit: send a WRITE telegram when the local value changes.
        const TRANSMIT = 0x04;
        /// Update: accept inbound RESPONSE telegrams.
        const UPDATE = 0x02;
        /// Init-read: the value is unknown until a read-back completes.
        const INIT_READ = 0x01;
    }
}

/// The current value of a com-object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Used for objects of length 1 or 2 (a single byte, sourced from
    /// different telegram fields depending on which).
    Short(u8),
    /// Used for objects of length > 2: `length - 1` owned bytes.
    Long(HVec<u8, MAX_LONG_VALUE_LEN>),
}

/// A single application endpoint bound to a KNX group address.
///
/// Everything but the current value and validity flag is fixed at
/// construction time.
#[derive(Clone, Debug)]
pub struct ComObject {
    address: u16,
    dpt: DptId,
    indicator: Indicator,
    length: u8,
    value: Value,
    valid: bool,
}

impl ComObject {
    /// Builds a com-object for `address`, sized from `dpt` via `table`.
    ///
    /// Returns `None` if `dpt` is not present in `table`, or if the
    /// resulting length would fall outside `1..=15`.
    pub fn new(address: u16, dpt: DptId, indicator: Indicator, table: &dyn DptTable) -> Option<Self> {
        let bits = table.bit_length(dpt)?;
        let length = (bits / 8) as u16 + 1;
        if length == 0 || length > 15 {
            return None;
        }
        let length = length as u8;
        let value = if length <= 2 {
            Value::Short(0)
        } else {
            let mut v = HVec::new();
            v.resize(length as usize - 1, 0).ok()?;
            Value::Long(v)
        };
        let valid = !indicator.contains(Indicator::INIT_READ);
        Some(ComObject {
            address,
            dpt,
            indicator,
            length,
            value,
            valid,
        })
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn dpt(&self) -> DptId {
        self.dpt
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn priority(&self) -> u8 {
        PRIORITY_NORMAL
    }

    /// Updates this object's value from an inbound telegram. Fails if the
    /// telegram's payload length doesn't match this object's length.
    pub fn update_from_telegram(&mut self, t: &Telegram) -> Result<(), ComObjectError> {
        if t.payload_length() != self.length {
            return Err(ComObjectError::LengthMismatch);
        }
        match self.length {
            1 => self.value = Value::Short(t.first_payload_byte()),
            2 => {
                let mut b = [0u8; 1];
                t.long_payload(&mut b);
                self.value = Value::Short(b[0]);
            }
            len => {
                let mut buf = [0u8; MAX_LONG_VALUE_LEN];
                let n = len as usize - 1;
                t.long_payload(&mut buf[..n]);
                let mut v = HVec::new();
                v.extend_from_slice(&buf[..n]).ok();
                self.value = Value::Long(v);
            }
        }
        self.valid = true;
        Ok(())
    }

    /// Updates a short (length ≤ 2) object's value directly.
    pub fn update_from_integer(&mut self, v: u8) -> Result<(), ComObjectError> {
        if self.length > 2 {
            return Err(ComObjectError::WrongRepresentation);
        }
        self.value = Value::Short(v);
        self.valid = true;
        Ok(())
    }

    /// Updates a long (length > 2) object's value from an owned slice of
    /// exactly `length - 1` bytes.
    pub fn update_from_bytes(&mut self, v: &[u8]) -> Result<(), ComObjectError> {
        if self.length <= 2 || v.len() != self.length as usize - 1 {
            return Err(ComObjectError::WrongRepresentation);
        }
        let mut hv = HVec::new();
        hv.extend_from_slice(v).ok();
        self.value = Value::Long(hv);
        self.valid = true;
        Ok(())
    }

    /// Writes this object's priority, target address and payload length
    /// into `dest`.
    pub fn copy_attributes_to(&self, dest: &mut Telegram) {
        dest.change_priority(self.priority());
        dest.set_target_address(self.address);
        dest.set_payload_length(self.length);
    }

    /// Writes this object's current value into `dest`, mirroring the
    /// layout rules of [`Self::update_from_telegram`].
    pub fn copy_value_to(&self, dest: &mut Telegram) {
        match (&self.value, self.length) {
            (Value::Short(b), 1) => dest.set_first_payload_byte(*b),
            (Value::Short(b), _) => dest.set_long_payload(&[*b]),
            (Value::Long(v), _) => dest.set_long_payload(v),
        }
    }
}
