// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-memory KNX telegram: a fixed 23-byte frame with named offsets,
//! bitfield accessors, and the XOR-complement checksum used on the wire.

/// Maximum size in bytes of a KNX telegram, including the checksum byte.
pub const TELEGRAM_MAX_SIZE: usize = 23;
/// Maximum payload size, including the byte shared with the command field.
pub const PAYLOAD_MAX_SIZE: usize = 16;
/// Number of header bytes preceding the command field.
pub const HEADER_SIZE: usize = 6;
/// Offset of the first long-payload byte.
pub const PAYLOAD_OFFSET: usize = 8;

const CONTROL_FIELD_DEFAULT: u8 = 0xBC;
const CONTROL_FIELD_PRIORITY_MASK: u8 = 0x0C;
const ROUTING_FIELD_DEFAULT: u8 = 0xE1;
const ROUTING_PAYLOAD_LENGTH_MASK: u8 = 0x0F;
const COMMAND_LOW_COMMAND_MASK: u8 = 0xC0;
const COMMAND_HIGH_COMMAND_MASK: u8 = 0x03;
const COMMAND_LOW_DATA_MASK: u8 = 0x3F;

const IDX_CONTROL: usize = 0;
const IDX_SOURCE_HIGH: usize = 1;
const IDX_SOURCE_LOW: usize = 2;
const IDX_TARGET_HIGH: usize = 3;
const IDX_TARGET_LOW: usize = 4;
const IDX_ROUTING: usize = 5;
const IDX_COMMAND_HIGH: usize = 6;
const IDX_COMMAND_LOW: usize = 7;

/// The 4-bit command carried by a telegram's command field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Read = 0,
    Response = 1,
    Write = 2,
    /// Any other 4-bit pattern. KNX reserves the rest for memory/device
    /// management services this crate does not implement.
    Other(u8),
}

impl Command {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Command::Read,
            1 => Command::Response,
            2 => Command::Write,
            other => Command::Other(other),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Command::Read => 0,
            Command::Response => 1,
            Command::Write => 2,
            Command::Other(bits) => bits,
        }
    }
}

/// A fixed-size, copy-on-write-nothing KNX telegram buffer.
///
/// All accessors operate on named byte offsets; nothing here allocates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Telegram {
    bytes: [u8; TELEGRAM_MAX_SIZE],
}

impl Default for Telegram {
    fn default() -> Self {
        let mut t = Telegram { bytes: [0; TELEGRAM_MAX_SIZE] };
        t.clear();
        t
    }
}

impl Telegram {
    /// Builds a telegram with default control/routing bytes and everything
    /// else zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the telegram to its power-on appearance: control=0xBC,
    /// routing=0xE1, everything else zero.
    pub fn clear(&mut self) {
        self.bytes = [0; TELEGRAM_MAX_SIZE];
        self.bytes[IDX_CONTROL] = CONTROL_FIELD_DEFAULT;
        self.bytes[IDX_ROUTING] = ROUTING_FIELD_DEFAULT;
    }

    /// Zeroes the long-payload region (bytes 8..23), leaving the header and
    /// command fields untouched.
    pub fn clear_long_payload(&mut self) {
        for b in &mut self.bytes[PAYLOAD_OFFSET..] {
            *b = 0;
        }
    }

    /// Clears only the inline 6-bit data carried by the command-low byte.
    pub fn clear_first_payload_byte(&mut self) {
        self.bytes[IDX_COMMAND_LOW] &= !COMMAND_LOW_DATA_MASK;
    }

    pub fn source_address(&self) -> u16 {
        u16::from_be_bytes([self.bytes[IDX_SOURCE_HIGH], self.bytes[IDX_SOURCE_LOW]])
    }

    pub fn set_source_address(&mut self, addr: u16) {
        let [hi, lo] = addr.to_be_bytes();
        self.bytes[IDX_SOURCE_HIGH] = hi;
        self.bytes[IDX_SOURCE_LOW] = lo;
    }

    pub fn target_address(&self) -> u16 {
        u16::from_be_bytes([self.bytes[IDX_TARGET_HIGH], self.bytes[IDX_TARGET_LOW]])
    }

    pub fn set_target_address(&mut self, addr: u16) {
        let [hi, lo] = addr.to_be_bytes();
        self.bytes[IDX_TARGET_HIGH] = hi;
        self.bytes[IDX_TARGET_LOW] = lo;
    }

    pub fn command(&self) -> Command {
        let low = (self.bytes[IDX_COMMAND_LOW] & COMMAND_LOW_COMMAND_MASK) >> 6;
        let high = (self.bytes[IDX_COMMAND_HIGH] & COMMAND_HIGH_COMMAND_MASK) << 2;
        Command::from_bits(low + high)
    }

    pub fn set_command(&mut self, command: Command) {
        let bits = command.to_bits();
        self.bytes[IDX_COMMAND_HIGH] &= !COMMAND_HIGH_COMMAND_MASK;
        self.bytes[IDX_COMMAND_HIGH] |= bits >> 2;
        self.bytes[IDX_COMMAND_LOW] &= !COMMAND_LOW_COMMAND_MASK;
        self.bytes[IDX_COMMAND_LOW] |= bits << 6;
    }

    pub fn payload_length(&self) -> u8 {
        self.bytes[IDX_ROUTING] & ROUTING_PAYLOAD_LENGTH_MASK
    }

    pub fn set_payload_length(&mut self, length: u8) {
        self.bytes[IDX_ROUTING] &= !ROUTING_PAYLOAD_LENGTH_MASK;
        self.bytes[IDX_ROUTING] |= length & ROUTING_PAYLOAD_LENGTH_MASK;
    }

    pub fn first_payload_byte(&self) -> u8 {
        self.bytes[IDX_COMMAND_LOW] & COMMAND_LOW_DATA_MASK
    }

    pub fn set_first_payload_byte(&mut self, data: u8) {
        self.bytes[IDX_COMMAND_LOW] &= !COMMAND_LOW_DATA_MASK;
        self.bytes[IDX_COMMAND_LOW] |= data & COMMAND_LOW_DATA_MASK;
    }

    /// Copies up to `PAYLOAD_MAX_SIZE - 2` (14) long-payload bytes into
    /// `dest`, starting at offset 8.
    pub fn long_payload(&self, dest: &mut [u8]) {
        let n = dest.len().min(PAYLOAD_MAX_SIZE - 2);
        dest[..n].copy_from_slice(&self.bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + n]);
    }

    /// Writes `origin` into the long-payload region, clamped to 14 bytes.
    pub fn set_long_payload(&mut self, origin: &[u8]) {
        let n = origin.len().min(PAYLOAD_MAX_SIZE - 2);
        self.bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + n].copy_from_slice(&origin[..n]);
    }

    /// Total length of the telegram on the wire, including the checksum byte.
    pub fn telegram_length(&self) -> usize {
        PAYLOAD_OFFSET + self.payload_length() as usize
    }

    fn checksum_index(&self) -> usize {
        HEADER_SIZE + self.payload_length() as usize + 1
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.checksum_index()]
    }

    /// Recomputes the XOR-complement checksum over everything preceding the
    /// checksum byte, without writing it back.
    pub fn calculate_checksum(&self) -> u8 {
        let idx = self.checksum_index();
        let xor_sum = self.bytes[..idx].iter().fold(0u8, |acc, &b| acc ^ b);
        !xor_sum
    }

    pub fn is_checksum_correct(&self) -> bool {
        self.checksum() == self.calculate_checksum()
    }

    /// Recomputes and writes the checksum byte. Idempotent.
    pub fn update_checksum(&mut self) {
        let idx = self.checksum_index();
        let sum = self.calculate_checksum();
        self.bytes[idx] = sum;
    }

    /// Copies `self.telegram_length()` bytes into `dest`.
    pub fn copy_to(&self, dest: &mut Telegram) {
        let len = self.telegram_length();
        dest.bytes[..len].copy_from_slice(&self.bytes[..len]);
    }

    pub fn read_raw_byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    pub fn write_raw_byte(&mut self, index: usize, data: u8) {
        self.bytes[index] = data;
    }

    /// Sets the priority bits (bits 2..3) of the control field, leaving the
    /// rest of the control field untouched.
    pub fn change_priority(&mut self, priority: u8) {
        self.bytes[IDX_CONTROL] &= !CONTROL_FIELD_PRIORITY_MASK;
        self.bytes[IDX_CONTROL] |= priority & CONTROL_FIELD_PRIORITY_MASK;
    }

    /// Raw bytes up to `telegram_length()`, for handing to a serial port.
    pub fn as_wire_bytes(&self) -> &[u8] {
        &self.bytes[..self.telegram_length()]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn checksum_always_verifies_after_update(
            target in any::<u16>(),
            source in any::<u16>(),
            len in 0u8..=14,
            payload in prop::collection::vec(any::<u8>(), 14),
        ) {
            let mut t = Telegram::new();
            t.set_source_address(source);
            t.set_target_address(target);
            t.set_payload_length(len);
            t.set_long_payload(&payload);
            t.update_checksum();
            prop_assert!(t.is_checksum_correct());
        }

        #[test]
        fn target_address_round_trips(addr in any::<u16>()) {
            let mut t = Telegram::new();
            t.set_target_address(addr);
            prop_assert_eq!(t.target_address(), addr);
        }

        #[test]
        fn source_address_round_trips(addr in any::<u16>()) {
            let mut t = Telegram::new();
            t.set_source_address(addr);
            prop_assert_eq!(t.source_address(), addr);
        }
    }
}
