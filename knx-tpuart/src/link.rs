// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The TP-UART link: owns the serial port and runs the receive and transmit
//! state machines described by the TP-UART host protocol. Nothing here
//! blocks except [`TpUartLink::reset`], which is meant to be called once
//! at bring-up.

use crate::comobject::ComObject;
use crate::clock::Clock;
use crate::diag::{DiagEvent, DiagLog};
use crate::error::{AckOutcome, LinkError, LinkEvent};
use crate::index::OrderedIndexTable;
use crate::telegram::{Telegram, TELEGRAM_MAX_SIZE};

/// Depth of the link's own diagnostic log, covering reset outcomes.
const LINK_DIAG_CAPACITY: usize = 16;

const RESET_REQ: u8 = 0x01;
const RESET_INDICATION: u8 = 0x03;
const STATE_REQ: u8 = 0x02;
const ACTIVATE_BUSMON: u8 = 0x05;
const SET_ADDR_REQ: u8 = 0x28;

const DATA_START_CONTINUE_REQ: u8 = 0x80;
const DATA_END_REQ: u8 = 0x40;
const RX_ACK_ADDRESSED: u8 = 0x11;
const RX_ACK_NOT_ADDRESSED: u8 = 0x10;
const DATA_CONFIRM_SUCCESS: u8 = 0x8B;
const DATA_CONFIRM_FAILED: u8 = 0x0B;

const CTRL_FIELD_MASK: u8 = 0xD3;
const CTRL_FIELD_VALUE: u8 = 0x90;
const STATE_INDICATION_MASK: u8 = 0x07;

/// How many byte cycles a single `RESET_REQ` is given to answer before the
/// next attempt, and how many attempts [`TpUartLink::reset`] makes in total.
const RESET_ATTEMPT_TIMEOUT_MILLIS: u64 = 1000;
const RESET_ATTEMPTS: u32 = 10;
/// Gap since the last received byte, past which a reception in progress is
/// abandoned.
const INTER_BYTE_TIMEOUT_MICROS: u64 = 2000;
/// How long to wait for a confirm byte after the last byte of a send.
const ACK_TIMEOUT_MILLIS: u64 = 500;

/// The serial port is an external collaborator: a small non-blocking byte
/// pipe to the physical TP-UART transceiver. Neither direction is ever
/// assumed to have a result worth inspecting; a device that can't talk to
/// its own bus coupler has no useful way to report that over the same bus.
pub trait SerialPort {
    fn open(&mut self);
    fn close(&mut self);
    /// Writes `bytes` to the port. Expected to buffer internally; callers
    /// only ever write a handful of bytes at a time.
    fn write(&mut self, bytes: &[u8]);
    /// Returns the next available byte, or `None` if none is waiting.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Transceiver operating mode, fixed for the life of a [`TpUartLink`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Normal,
    BusMonitor,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum RxState {
    Reset,
    Stopped,
    Init,
    IdleWaitingForCtrlField,
    ReceptionStarted,
    ReceptionAddressed,
    ReceptionNotAddressed,
    ReceptionLengthInvalid,
}

impl RxState {
    fn is_mid_reception(self) -> bool {
        matches!(
            self,
            RxState::ReceptionStarted
                | RxState::ReceptionAddressed
                | RxState::ReceptionNotAddressed
                | RxState::ReceptionLengthInvalid
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TxState {
    Reset,
    Stopped,
    Init,
    Idle,
    SendingOngoing,
    WaitingAck,
}

/// Owns the serial port and the receive/transmit state machines for one
/// KNX bus peer.
pub struct TpUartLink<S: SerialPort> {
    serial: S,
    physical_addr: u16,
    mode: Mode,

    rx_state: RxState,
    tx_state: TxState,

    assembling: Telegram,
    received: Telegram,
    read_bytes_nb: usize,
    rx_last_byte_micros: u64,
    addressed_index: Option<usize>,
    last_state_indication: Option<u8>,

    tx_buffer: Telegram,
    tx_index: usize,
    tx_remaining: usize,
    tx_sent_time_millis: u64,

    index_table: OrderedIndexTable,
    diag: DiagLog<LINK_DIAG_CAPACITY>,
}

impl<S: SerialPort> TpUartLink<S> {
    pub fn new(serial: S, physical_addr: u16, mode: Mode) -> Self {
        TpUartLink {
            serial,
            physical_addr,
            mode,
            rx_state: RxState::Reset,
            tx_state: TxState::Reset,
            assembling: Telegram::new(),
            received: Telegram::new(),
            read_bytes_nb: 0,
            rx_last_byte_micros: 0,
            addressed_index: None,
            last_state_indication: None,
            tx_buffer: Telegram::new(),
            tx_index: 0,
            tx_remaining: 0,
            tx_sent_time_millis: 0,
            index_table: OrderedIndexTable::build(&[]).expect("empty object list never has duplicate addresses"),
            diag: DiagLog::new(),
        }
    }

    /// The last [`LINK_DIAG_CAPACITY`] notable link-level occurrences, oldest
    /// first. Currently only records [`reset`](Self::reset) outcomes; RX/TX
    /// events surface through [`run_rx`](Self::run_rx)'s callback instead,
    /// since the device coordinator keeps its own, broader diagnostic log.
    pub fn diag(&self) -> &DiagLog<LINK_DIAG_CAPACITY> {
        &self.diag
    }

    /// Closes and reopens the port, then issues `RESET_REQ` up to
    /// [`RESET_ATTEMPTS`] times, each given [`RESET_ATTEMPT_TIMEOUT_MILLIS`]
    /// to answer with `RESET_INDICATION`. The only blocking call in this
    /// crate.
    pub fn reset(&mut self, clock: &dyn Clock) -> Result<(), LinkError> {
        if self.rx_state != RxState::Reset || self.tx_state != TxState::Reset {
            self.serial.close();
        }
        self.rx_state = RxState::Reset;
        self.tx_state = TxState::Reset;
        self.serial.open();

        for _ in 0..RESET_ATTEMPTS {
            self.serial.write(&[RESET_REQ]);
            let start = clock.now_millis();
            loop {
                if clock.now_millis().saturating_sub(start) >= RESET_ATTEMPT_TIMEOUT_MILLIS {
                    break;
                }
                if let Some(byte) = self.serial.read_byte() {
                    if byte == RESET_INDICATION {
                        self.rx_state = RxState::Init;
                        self.tx_state = TxState::Init;
                        self.diag.record(clock.now_micros(), DiagEvent::ResetOutcome { ok: true });
                        return Ok(());
                    }
                }
            }
        }

        self.serial.close();
        self.diag.record(clock.now_micros(), DiagEvent::ResetOutcome { ok: false });
        Err(LinkError::ResetTimedOut)
    }

    /// Builds the address lookup table from `objects`' `C`-flagged entries.
    /// Must be called with both state machines in `INIT`.
    pub fn attach(&mut self, objects: &[ComObject]) -> Result<(), LinkError> {
        if self.rx_state != RxState::Init || self.tx_state != TxState::Init {
            return Err(LinkError::NotInInitState);
        }
        self.index_table = OrderedIndexTable::build(objects)?;
        Ok(())
    }

    /// Issues the mode-appropriate bring-up sequence and moves both state
    /// machines to their idle states.
    pub fn init(&mut self) -> Result<(), LinkError> {
        if self.rx_state != RxState::Init || self.tx_state != TxState::Init {
            return Err(LinkError::NotInInitState);
        }
        match self.mode {
            Mode::BusMonitor => self.serial.write(&[ACTIVATE_BUSMON]),
            Mode::Normal => {
                let [hi, lo] = self.physical_addr.to_be_bytes();
                self.serial.write(&[SET_ADDR_REQ, hi, lo]);
                self.serial.write(&[STATE_REQ]);
            }
        }
        self.rx_state = RxState::IdleWaitingForCtrlField;
        self.tx_state = TxState::Idle;
        Ok(())
    }

    /// Queues `telegram` for transmission. The telegram is copied by value
    /// into this link's own stable TX buffer; the caller's copy may be
    /// reused immediately. Rewrites the source address to this link's own
    /// physical address if it doesn't already match.
    pub fn send_telegram(&mut self, telegram: &Telegram) -> Result<(), LinkError> {
        if self.tx_state != TxState::Idle {
            return Err(LinkError::TxNotIdle);
        }
        let mut t = *telegram;
        if t.source_address() != self.physical_addr {
            t.set_source_address(self.physical_addr);
            t.update_checksum();
        }
        self.tx_buffer = t;
        self.tx_remaining = t.telegram_length();
        self.tx_index = 0;
        self.tx_state = TxState::SendingOngoing;
        Ok(())
    }

    /// Returns the attached com-object index bound to `addr`, if any.
    pub fn is_addressed_assigned(&self, addr: u16, objects: &[ComObject]) -> Option<usize> {
        self.index_table.find(addr, objects)
    }

    /// The most recently completed, checksum-valid inbound telegram. Only
    /// meaningful right after a [`LinkEvent::ReceivedEibTelegram`].
    pub fn received_telegram(&self) -> &Telegram {
        &self.received
    }

    /// The com-object index the most recent reception was addressed to.
    pub fn addressed_index(&self) -> Option<usize> {
        self.addressed_index
    }

    pub fn last_state_indication(&self) -> Option<u8> {
        self.last_state_indication
    }

    pub fn tx_idle(&self) -> bool {
        self.tx_state == TxState::Idle
    }

    /// Runs one tick of the receive state machine: finalizes a reception
    /// abandoned by an inter-byte timeout, then consumes at most one
    /// available byte. Reports zero or more events through `on_event`
    /// (a timeout finalization and a freshly read byte can each produce
    /// one in the same tick) and returns at most one ack outcome, since
    /// only byte classification produces those.
    pub fn run_rx(&mut self, clock: &dyn Clock, objects: &[ComObject], mut on_event: impl FnMut(LinkEvent)) -> Option<AckOutcome> {
        let mut ack = None;

        if self.rx_state.is_mid_reception() {
            let elapsed = clock.now_micros().saturating_sub(self.rx_last_byte_micros);
            if elapsed > INTER_BYTE_TIMEOUT_MICROS {
                if self.rx_state == RxState::ReceptionAddressed {
                    if self.assembling.is_checksum_correct() {
                        self.assembling.copy_to(&mut self.received);
                        on_event(LinkEvent::ReceivedEibTelegram);
                    } else {
                        on_event(LinkEvent::ReceptionError);
                    }
                } else {
                    on_event(LinkEvent::ReceptionError);
                }
                self.rx_state = RxState::IdleWaitingForCtrlField;
            }
        }

        if let Some(byte) = self.serial.read_byte() {
            self.rx_last_byte_micros = clock.now_micros();

            match self.rx_state {
                RxState::IdleWaitingForCtrlField => {
                    if byte & CTRL_FIELD_MASK == CTRL_FIELD_VALUE {
                        self.assembling.clear();
                        self.assembling.write_raw_byte(0, byte);
                        self.read_bytes_nb = 1;
                        self.rx_state = RxState::ReceptionStarted;
                    } else if byte == DATA_CONFIRM_SUCCESS {
                        if self.tx_state == TxState::WaitingAck {
                            self.tx_state = TxState::Idle;
                            ack = Some(AckOutcome::Ack);
                        }
                    } else if byte == DATA_CONFIRM_FAILED {
                        if self.tx_state == TxState::WaitingAck {
                            self.tx_state = TxState::Idle;
                            ack = Some(AckOutcome::Nack);
                        }
                    } else if byte == RESET_INDICATION {
                        if matches!(self.tx_state, TxState::SendingOngoing | TxState::WaitingAck) {
                            ack = Some(AckOutcome::ResetResponse);
                        }
                        self.tx_state = TxState::Stopped;
                        self.rx_state = RxState::Stopped;
                        on_event(LinkEvent::Reset);
                        return ack;
                    } else if byte & STATE_INDICATION_MASK == STATE_INDICATION_MASK {
                        self.last_state_indication = Some(byte);
                        on_event(LinkEvent::StateIndication);
                    }
                }
                RxState::ReceptionStarted => {
                    self.assembling.write_raw_byte(self.read_bytes_nb, byte);
                    self.read_bytes_nb += 1;
                    if self.read_bytes_nb == 3 {
                        if self.assembling.source_address() == self.physical_addr {
                            self.rx_state = RxState::ReceptionNotAddressed;
                        }
                    } else if self.read_bytes_nb == 6 {
                        match self.index_table.find(self.assembling.target_address(), objects) {
                            Some(idx) => {
                                self.addressed_index = Some(idx);
                                self.rx_state = RxState::ReceptionAddressed;
                                self.serial.write(&[RX_ACK_ADDRESSED]);
                            }
                            None => {
                                self.addressed_index = None;
                                self.rx_state = RxState::ReceptionNotAddressed;
                                self.serial.write(&[RX_ACK_NOT_ADDRESSED]);
                            }
                        }
                    }
                }
                RxState::ReceptionAddressed => {
                    if self.read_bytes_nb >= TELEGRAM_MAX_SIZE {
                        self.rx_state = RxState::ReceptionLengthInvalid;
                    } else {
                        self.assembling.write_raw_byte(self.read_bytes_nb, byte);
                        self.read_bytes_nb += 1;
                    }
                }
                RxState::ReceptionNotAddressed | RxState::ReceptionLengthInvalid => {
                    // Bytes are still consumed off the wire so the inter-byte
                    // clock stays accurate, but nothing is kept.
                }
                RxState::Reset | RxState::Stopped | RxState::Init => {}
            }
        }

        ack
    }

    /// Runs one tick of the transmit state machine: times out a stalled ack
    /// wait, then sends the next queued byte if RX isn't in the middle of
    /// resolving an inbound address (the bus is half-duplex from the
    /// transceiver's perspective during that window).
    pub fn run_tx(&mut self, clock: &dyn Clock) -> Option<AckOutcome> {
        if self.tx_state == TxState::WaitingAck {
            if clock.now_millis().saturating_sub(self.tx_sent_time_millis) > ACK_TIMEOUT_MILLIS {
                self.tx_state = TxState::Idle;
                return Some(AckOutcome::NoAnswerTimeout);
            }
        }

        if self.tx_state == TxState::SendingOngoing && self.rx_state != RxState::ReceptionStarted {
            let data = self.tx_buffer.read_raw_byte(self.tx_index);
            if self.tx_remaining == 1 {
                self.serial.write(&[DATA_END_REQ | self.tx_index as u8, data]);
                self.tx_sent_time_millis = clock.now_millis();
                self.tx_state = TxState::WaitingAck;
            } else {
                self.serial.write(&[DATA_START_CONTINUE_REQ | self.tx_index as u8, data]);
                self.tx_index += 1;
                self.tx_remaining -= 1;
            }
        }

        None
    }
}

#[cfg(test)]
impl<S: SerialPort> TpUartLink<S> {
    /// Test-only escape hatch so callers outside this module can feed bytes
    /// into / inspect the owned serial port directly.
    pub(crate) fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::comobject::Indicator;
    use crate::dpt::{DptId, ExampleDptTable};
    use heapless::Vec as HVec;

    #[derive(Default)]
    struct MockSerial {
        inbound: HVec<u8, 256>,
        outbound: HVec<u8, 256>,
        opens: u32,
        closes: u32,
    }

    impl MockSerial {
        fn feed(&mut self, bytes: &[u8]) {
            // Push in order, oldest first, so `read_byte` drains FIFO.
            for &b in bytes {
                self.inbound.push(b).ok();
            }
        }
    }

    impl SerialPort for MockSerial {
        fn open(&mut self) {
            self.opens += 1;
        }
        fn close(&mut self) {
            self.closes += 1;
        }
        fn write(&mut self, bytes: &[u8]) {
            self.outbound.extend_from_slice(bytes).ok();
        }
        fn read_byte(&mut self) -> Option<u8> {
            if self.inbound.is_empty() {
                None
            } else {
                Some(self.inbound.remove(0))
            }
        }
    }

    fn link(serial: MockSerial) -> TpUartLink<MockSerial> {
        TpUartLink::new(serial, 0x1105, Mode::Normal)
    }

    #[test]
    fn reset_succeeds_on_first_indication() {
        let mut serial = MockSerial::default();
        serial.feed(&[RESET_INDICATION]);
        let mut l = link(serial);
        let clock = FakeClock::new();
        assert!(l.reset(&clock).is_ok());
        assert_eq!(l.rx_state, RxState::Init);
        assert_eq!(l.tx_state, TxState::Init);
    }

    #[test]
    fn reset_times_out_after_all_attempts() {
        let serial = MockSerial::default();
        let mut l = link(serial);
        let clock = FakeClock::new();
        clock.set_auto_tick_millis(50);
        assert_eq!(l.reset(&clock), Err(LinkError::ResetTimedOut));
    }

    #[test]
    fn reset_outcome_is_recorded_to_diag() {
        let mut serial = MockSerial::default();
        serial.feed(&[RESET_INDICATION]);
        let mut l = link(serial);
        let clock = FakeClock::new();
        l.reset(&clock).unwrap();
        let recorded: Vec<_> = l.diag().iter().map(|r| r.event).collect();
        assert_eq!(recorded, vec![crate::diag::DiagEvent::ResetOutcome { ok: true }]);
    }

    #[test]
    fn init_requires_init_state() {
        let mut l = link(MockSerial::default());
        assert_eq!(l.init(), Err(LinkError::NotInInitState));
    }

    fn ready_link() -> (TpUartLink<MockSerial>, FakeClock) {
        let mut serial = MockSerial::default();
        serial.feed(&[RESET_INDICATION]);
        let mut l = link(serial);
        let clock = FakeClock::new();
        l.reset(&clock).unwrap();
        l.init().unwrap();
        (l, clock)
    }

    fn objects_with(addr: u16) -> Vec<ComObject> {
        vec![ComObject::new(addr, DptId::new(1, 1), Indicator::COMMUNICATION, &ExampleDptTable).unwrap()]
    }

    #[test]
    fn receives_telegram_addressed_to_attached_object() {
        let (mut l, clock) = ready_link();
        let objects = objects_with(0x0008);
        l.attach(&objects).unwrap();

        let mut t = Telegram::new();
        t.set_source_address(0x1104);
        t.set_target_address(0x0008);
        t.set_payload_length(1);
        t.set_first_payload_byte(1);
        t.update_checksum();

        for i in 0..t.telegram_length() {
            l.serial.feed(&[t.read_raw_byte(i)]);
        }

        let mut events = Vec::new();
        for _ in 0..t.telegram_length() {
            l.run_rx(&clock, &objects, |e| events.push(e));
        }
        // advance past the inter-byte timeout to finalize the reception.
        clock.advance_micros(2001);
        l.run_rx(&clock, &objects, |e| events.push(e));

        assert_eq!(events, vec![LinkEvent::ReceivedEibTelegram]);
        assert_eq!(l.received_telegram().target_address(), 0x0008);
        assert_eq!(l.addressed_index(), Some(0));
    }

    #[test]
    fn reception_not_addressed_produces_no_event() {
        let (mut l, clock) = ready_link();
        let objects = objects_with(0x0008);
        l.attach(&objects).unwrap();

        let mut t = Telegram::new();
        t.set_source_address(0x1104);
        t.set_target_address(0x0099);
        t.set_payload_length(1);
        t.update_checksum();

        for i in 0..t.telegram_length() {
            l.serial.feed(&[t.read_raw_byte(i)]);
        }
        let mut events = Vec::new();
        for _ in 0..t.telegram_length() {
            l.run_rx(&clock, &objects, |e| events.push(e));
        }
        clock.advance_micros(2001);
        l.run_rx(&clock, &objects, |e| events.push(e));

        assert!(events.is_empty());
    }

    #[test]
    fn send_telegram_rejects_when_not_idle() {
        let (mut l, _clock) = ready_link();
        let t = Telegram::new();
        l.send_telegram(&t).unwrap();
        assert_eq!(l.send_telegram(&t), Err(LinkError::TxNotIdle));
    }

    #[test]
    fn send_telegram_sets_own_source_address() {
        let (mut l, _clock) = ready_link();
        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(1);
        l.send_telegram(&t).unwrap();
        assert_eq!(l.tx_buffer.source_address(), 0x1105);
        assert!(l.tx_buffer.is_checksum_correct());
    }

    #[test]
    fn run_tx_drives_bytes_then_waits_for_ack() {
        let (mut l, clock) = ready_link();
        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(1);
        t.set_first_payload_byte(9);
        l.send_telegram(&t).unwrap();

        let len = l.tx_buffer.telegram_length();
        for _ in 0..len - 1 {
            assert!(l.run_tx(&clock).is_none());
            assert_eq!(l.tx_state, TxState::SendingOngoing);
        }
        assert!(l.run_tx(&clock).is_none());
        assert_eq!(l.tx_state, TxState::WaitingAck);
    }

    #[test]
    fn run_tx_times_out_waiting_for_ack() {
        let (mut l, clock) = ready_link();
        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(0);
        l.send_telegram(&t).unwrap();
        l.run_tx(&clock);
        assert_eq!(l.tx_state, TxState::WaitingAck);

        clock.advance_millis(ACK_TIMEOUT_MILLIS + 1);
        assert_eq!(l.run_tx(&clock), Some(AckOutcome::NoAnswerTimeout));
        assert_eq!(l.tx_state, TxState::Idle);
    }

    #[test]
    fn ack_byte_resolves_waiting_ack() {
        let (mut l, clock) = ready_link();
        let objects: Vec<ComObject> = Vec::new();
        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(0);
        l.send_telegram(&t).unwrap();
        l.run_tx(&clock);
        assert_eq!(l.tx_state, TxState::WaitingAck);

        l.serial.feed(&[DATA_CONFIRM_SUCCESS]);
        let ack = l.run_rx(&clock, &objects, |_| {});
        assert_eq!(ack, Some(AckOutcome::Ack));
        assert_eq!(l.tx_state, TxState::Idle);
    }

    #[test]
    fn reset_indication_mid_send_reports_reset_event_and_ack() {
        let (mut l, clock) = ready_link();
        let objects: Vec<ComObject> = Vec::new();
        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(0);
        l.send_telegram(&t).unwrap();
        l.run_tx(&clock);
        assert_eq!(l.tx_state, TxState::WaitingAck);

        l.serial.feed(&[RESET_INDICATION]);
        let mut events = Vec::new();
        let ack = l.run_rx(&clock, &objects, |e| events.push(e));
        assert_eq!(ack, Some(AckOutcome::ResetResponse));
        assert_eq!(events, vec![LinkEvent::Reset]);
        assert_eq!(l.tx_state, TxState::Stopped);
        assert_eq!(l.rx_state, RxState::Stopped);
    }

    #[test]
    fn state_indication_byte_is_surfaced() {
        let (mut l, clock) = ready_link();
        let objects: Vec<ComObject> = Vec::new();
        l.serial.feed(&[0x97]);
        let mut events = Vec::new();
        l.run_rx(&clock, &objects, |e| events.push(e));
        assert_eq!(events, vec![LinkEvent::StateIndication]);
        assert_eq!(l.last_state_indication(), Some(0x97));
    }

    #[test]
    fn bad_checksum_reports_reception_error() {
        let (mut l, clock) = ready_link();
        let objects = objects_with(0x0008);
        l.attach(&objects).unwrap();

        let mut t = Telegram::new();
        t.set_target_address(0x0008);
        t.set_payload_length(1);
        t.update_checksum();
        // corrupt a payload byte after the checksum has already been taken.
        t.write_raw_byte(8, t.read_raw_byte(8) ^ 0xFF);

        for i in 0..t.telegram_length() {
            l.serial.feed(&[t.read_raw_byte(i)]);
        }
        let mut events = Vec::new();
        for _ in 0..t.telegram_length() {
            l.run_rx(&clock, &objects, |e| events.push(e));
        }
        clock.advance_micros(2001);
        l.run_rx(&clock, &objects, |e| events.push(e));

        assert_eq!(events, vec![LinkEvent::ReceptionError]);
    }

    #[test]
    fn attach_requires_init_state() {
        let mut l = link(MockSerial::default());
        let objects = objects_with(0x0008);
        assert_eq!(l.attach(&objects), Err(LinkError::NotInInitState));
    }

    #[test]
    fn attach_rejects_duplicate_group_addresses() {
        let (mut l, _clock) = ready_link();
        let mut objects = objects_with(0x0008);
        objects.push(ComObject::new(0x0008, DptId::new(1, 1), Indicator::COMMUNICATION, &ExampleDptTable).unwrap());
        assert_eq!(l.attach(&objects), Err(LinkError::DuplicateGroupAddress));
    }
}
