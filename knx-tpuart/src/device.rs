// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device coordinator: glues a [`TpUartLink`] to a fixed set of
//! [`ComObject`]s, a pending-action queue, and the application's own
//! update sink. Owns no thread or task of its own; the host calls
//! [`DeviceCoordinator::task`] on every pass of its own cooperative loop.

use heapless::Vec as HVec;

use crate::clock::Clock;
use crate::comobject::{ComObject, Indicator, Value};
use crate::diag::{DiagEvent, DiagLog};
use crate::error::{LinkError, LinkEvent};
use crate::index::MAX_COM_OBJECTS;
use crate::link::{SerialPort, TpUartLink};
use crate::queue::{Action, ActionKind, ActionRingBuffer, ActionValue};
use crate::telegram::{Command, Telegram};

/// Depth of the device coordinator's diagnostic log, covering everything
/// above the link's own reset-outcome log: RX/TX events, ack outcomes,
/// deliveries, dispatches, and queue overflows.
const DEVICE_DIAG_CAPACITY: usize = 32;

/// Minimum spacing between two init read-back requests, so a device with
/// many `INIT_READ` objects doesn't flood the bus at bring-up.
const INIT_READ_CADENCE_MILLIS: u64 = 500;
/// Minimum spacing between two `run_rx` ticks.
const RX_CADENCE_MICROS: u64 = 200;
/// Minimum spacing between two `run_tx` ticks.
const TX_CADENCE_MICROS: u64 = 800;

/// Notified whenever a com-object's value changes because of something
/// that arrived over the bus (a `WRITE` or a `RESPONSE`).
pub trait ComObjectSink {
    fn on_update(&mut self, index: usize);
}

/// A sink that does nothing, for hosts that only care about polling values.
impl ComObjectSink for () {
    fn on_update(&mut self, _index: usize) {}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceState {
    Init,
    Idle,
    TxOngoing,
}

/// Owns the link, the com-object table, and the pending-action queue for
/// one KNX bus peer.
pub struct DeviceCoordinator<S: SerialPort, A: ComObjectSink> {
    link: TpUartLink<S>,
    com_objects: HVec<ComObject, MAX_COM_OBJECTS>,
    queue: ActionRingBuffer,
    sink: A,
    ready: bool,

    last_rx_micros: Option<u64>,
    last_tx_micros: Option<u64>,
    last_init_read_millis: Option<u64>,
    /// Next com-object index due an init read-back. Only ever advances past
    /// already-valid objects; objects without the `I` indicator start valid
    /// (see `ComObject::new`), so this walks past them without singling them
    /// out.
    init_index: usize,
    /// Set once `init_index` has walked off the end of the table.
    init_complete: bool,
    /// Timestamp of the most recent `task()` tick, reused to stamp
    /// diagnostic entries recorded outside of `task()` (e.g. from `read`/
    /// `write_short`, which have no clock of their own).
    last_seen_micros: u64,
    diag: DiagLog<DEVICE_DIAG_CAPACITY>,
}

impl<S: SerialPort, A: ComObjectSink> DeviceCoordinator<S, A> {
    pub fn new(link: TpUartLink<S>, com_objects: HVec<ComObject, MAX_COM_OBJECTS>, sink: A) -> Self {
        DeviceCoordinator {
            link,
            com_objects,
            queue: ActionRingBuffer::new(),
            sink,
            ready: false,
            last_rx_micros: None,
            last_tx_micros: None,
            last_init_read_millis: None,
            init_index: 0,
            init_complete: false,
            last_seen_micros: 0,
            diag: DiagLog::new(),
        }
    }

    /// Resets and brings up the link, then attaches the com-object table.
    /// Blocks for as long as [`TpUartLink::reset`] does; meant to be called
    /// once at startup and again whenever a [`LinkEvent::Reset`] has torn
    /// the device back down.
    pub fn begin(&mut self, clock: &dyn Clock) -> Result<(), LinkError> {
        self.diag.record(clock.now_micros(), DiagEvent::Rebuilding);
        self.link.reset(clock)?;
        self.link.attach(&self.com_objects)?;
        self.link.init()?;
        self.ready = true;
        Ok(())
    }

    /// The last [`DEVICE_DIAG_CAPACITY`] notable occurrences at this layer,
    /// oldest first: link events, ack outcomes, deliveries, dispatches, and
    /// queue overflows. See [`TpUartLink::diag`] for reset-outcome history.
    pub fn diag(&self) -> &DiagLog<DEVICE_DIAG_CAPACITY> {
        &self.diag
    }

    pub fn state(&self) -> DeviceState {
        if !self.ready {
            DeviceState::Init
        } else if self.link.tx_idle() {
            DeviceState::Idle
        } else {
            DeviceState::TxOngoing
        }
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.com_objects.get(index).map(|o| o.value())
    }

    pub fn valid(&self, index: usize) -> Option<bool> {
        self.com_objects.get(index).map(|o| o.valid())
    }

    /// Queues a `READ` request for com-object `index`.
    pub fn read(&mut self, index: usize) {
        if index < self.com_objects.len() {
            self.enqueue(Action::read(index));
        }
    }

    /// Sets a length ≤ 2 com-object's value locally, and queues an outbound
    /// `WRITE` if its `T` (transmit) bit is set. A bad index or a value that
    /// doesn't fit the object's length is silently ignored, matching
    /// [`read`](Self::read): delivery/application is always async and this
    /// call always succeeds from the caller's point of view.
    pub fn write_short(&mut self, index: usize, value: u8) {
        let Some(obj) = self.com_objects.get_mut(index) else { return };
        if obj.update_from_integer(value).is_err() {
            return;
        }
        if obj.indicator().contains(Indicator::TRANSMIT) {
            self.enqueue(Action::write_short(index, value));
        }
    }

    /// Sets a length > 2 com-object's value locally, and queues an outbound
    /// `WRITE` if its `T` (transmit) bit is set. Same no-op-on-error contract
    /// as [`write_short`](Self::write_short).
    pub fn write_long(&mut self, index: usize, value: &[u8]) {
        let Some(obj) = self.com_objects.get_mut(index) else { return };
        if obj.update_from_bytes(value).is_err() {
            return;
        }
        if obj.indicator().contains(Indicator::TRANSMIT) {
            self.enqueue(Action::write_long(index, value));
        }
    }

    /// Appends to the action queue, recording a diagnostic entry if doing so
    /// drops the oldest pending action.
    fn enqueue(&mut self, action: Action) {
        if self.queue.is_full() {
            self.diag.record(self.last_seen_micros, DiagEvent::QueueOverflow);
        }
        self.queue.append(action);
    }

    /// One non-blocking pass of the device's cooperative loop: pumps the
    /// link's RX/TX state machines at their respective cadences, scans for
    /// the next `INIT_READ` object due a read-back, and dispatches one
    /// pending queued action if the link is ready to send.
    pub fn task(&mut self, clock: &dyn Clock) {
        let now_micros = clock.now_micros();
        let now_millis = clock.now_millis();
        self.last_seen_micros = now_micros;

        let rx_due = self.last_rx_micros.map_or(true, |last| now_micros.saturating_sub(last) >= RX_CADENCE_MICROS);
        if rx_due {
            self.last_rx_micros = Some(now_micros);
            self.pump_rx(clock);
        }

        let tx_due = self.last_tx_micros.map_or(true, |last| now_micros.saturating_sub(last) >= TX_CADENCE_MICROS);
        if tx_due {
            self.last_tx_micros = Some(now_micros);
            if let Some(outcome) = self.link.run_tx(clock) {
                self.diag.record(now_micros, DiagEvent::Ack(outcome));
            }
        }

        let init_read_due =
            self.last_init_read_millis.map_or(true, |last| now_millis.saturating_sub(last) >= INIT_READ_CADENCE_MILLIS);
        if self.ready && !self.init_complete && init_read_due {
            self.last_init_read_millis = Some(now_millis);
            self.request_next_init_read();
        }

        if self.ready && self.link.tx_idle() {
            self.dispatch_one();
        }
    }

    fn pump_rx(&mut self, clock: &dyn Clock) {
        let mut events: HVec<LinkEvent, 2> = HVec::new();
        let ack = self.link.run_rx(clock, &self.com_objects, |e| {
            events.push(e).ok();
        });
        let now_micros = clock.now_micros();
        if let Some(outcome) = ack {
            self.diag.record(now_micros, DiagEvent::Ack(outcome));
        }
        for event in events {
            self.diag.record(now_micros, DiagEvent::Link(event));
            self.handle_link_event(clock, event);
        }
    }

    fn handle_link_event(&mut self, clock: &dyn Clock, event: LinkEvent) {
        match event {
            LinkEvent::ReceivedEibTelegram => {
                let telegram = *self.link.received_telegram();
                let idx = self.link.addressed_index();
                self.handle_incoming(&telegram, idx);
            }
            LinkEvent::ReceptionError | LinkEvent::StateIndication => {}
            LinkEvent::Reset => {
                // An unsolicited RESET_INDICATION tore the link back down;
                // retry reset/attach/init until the link comes back rather
                // than leaving the device stuck waiting for the host to
                // notice and call `begin` again.
                self.ready = false;
                while self.begin(clock).is_err() {}
            }
        }
    }

    fn handle_incoming(&mut self, telegram: &Telegram, idx: Option<usize>) {
        let Some(idx) = idx else { return };
        let Some(obj) = self.com_objects.get_mut(idx) else { return };

        match telegram.command() {
            Command::Write => {
                if obj.indicator().contains(Indicator::WRITE) && obj.update_from_telegram(telegram).is_ok() {
                    self.diag.record(self.last_seen_micros, DiagEvent::Delivered { index: idx });
                    self.sink.on_update(idx);
                }
            }
            Command::Response => {
                if obj.indicator().contains(Indicator::UPDATE) && obj.update_from_telegram(telegram).is_ok() {
                    self.diag.record(self.last_seen_micros, DiagEvent::Delivered { index: idx });
                    self.sink.on_update(idx);
                }
            }
            Command::Read => {
                if obj.indicator().contains(Indicator::READ) {
                    self.enqueue(Action::response(idx));
                }
            }
            Command::Other(_) => {}
        }
    }

    fn request_next_init_read(&mut self) {
        let n = self.com_objects.len();
        while self.init_index < n && self.com_objects[self.init_index].valid() {
            self.init_index += 1;
        }
        if self.init_index == n {
            self.init_complete = true;
        } else {
            self.enqueue(Action::read(self.init_index));
        }
    }

    fn dispatch_one(&mut self) {
        let Some(action) = self.queue.pop() else { return };
        let Some(obj) = self.com_objects.get(action.index) else { return };

        let mut t = Telegram::new();
        obj.copy_attributes_to(&mut t);

        match action.kind {
            ActionKind::Read => {
                t.set_command(Command::Read);
            }
            ActionKind::Response => {
                t.set_command(Command::Response);
                obj.copy_value_to(&mut t);
            }
            ActionKind::Write => {
                t.set_command(Command::Write);
                match &action.value {
                    ActionValue::None => {}
                    ActionValue::Short(v) => {
                        if obj.length() == 1 {
                            t.set_first_payload_byte(*v);
                        } else {
                            t.set_long_payload(&[*v]);
                        }
                    }
                    ActionValue::Long(v) => t.set_long_payload(v),
                }
            }
        }
        t.update_checksum();
        if self.link.send_telegram(&t).is_ok() {
            self.diag.record(self.last_seen_micros, DiagEvent::Dispatched { index: action.index });
        }
    }
}
