//! Demo: two `knx-tpuart` devices sharing an in-memory bus. A "switch"
//! writes a boolean com-object with its `T` bit set; a "lamp" on a
//! different physical address, holding a com-object at the same group
//! address with its `W` bit set, picks the change up.
//!
//! This stands in for real hardware: each simulated serial port is backed
//! by a shared append-only byte log, so every device sees every byte any
//! device writes, the way an open-collector KNX bus does. There is no
//! simulated transceiver chip acking application sends, so the switch's
//! send will time out waiting for a confirm byte; the lamp still sees the
//! telegram itself, since that part of the wire doesn't depend on acks.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use heapless::Vec as HVec;
use knx_tpuart::{ComObject, ComObjectSink, Clock, DeviceCoordinator, DptId, DptTable, Indicator, Mode, SerialPort, TpUartLink, Value};

// These mirror the host-interface byte values the link layer itself
// speaks; a simulated transceiver has to know them just as a real one
// would.
const RESET_REQ: u8 = 0x01;
const RESET_INDICATION: u8 = 0x03;

struct Bus {
    log: RefCell<Vec<u8>>,
}

impl Bus {
    fn new() -> Rc<Self> {
        Rc::new(Bus { log: RefCell::new(Vec::new()) })
    }
}

struct BusPort {
    bus: Rc<Bus>,
    cursor: usize,
    pending: VecDeque<u8>,
}

impl BusPort {
    fn new(bus: Rc<Bus>) -> Self {
        BusPort { bus, cursor: 0, pending: VecDeque::new() }
    }
}

impl SerialPort for BusPort {
    fn open(&mut self) {}
    fn close(&mut self) {}

    fn write(&mut self, bytes: &[u8]) {
        match bytes {
            [RESET_REQ] => self.pending.push_back(RESET_INDICATION),
            // DATA_START_CONTINUE_REQ|idx or DATA_END_REQ|idx followed by
            // the actual telegram byte: only the telegram byte is wire
            // traffic, the framing byte is host<->transceiver-local.
            [ctrl, data] if ctrl & 0xC0 != 0 => self.bus.log.borrow_mut().push(*data),
            // SET_ADDR_REQ, STATE_REQ, ACTIVATE_BUSMON, RX_ACK_*: all
            // local chatter between a device and its own transceiver.
            _ => {}
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if let Some(b) = self.pending.pop_front() {
            return Some(b);
        }
        let log = self.bus.log.borrow();
        if self.cursor < log.len() {
            let b = log[self.cursor];
            self.cursor += 1;
            Some(b)
        } else {
            None
        }
    }
}

/// A clock advanced explicitly by the demo loop, standing in for a real
/// monotonic timer.
struct SimClock {
    micros: Cell<u64>,
}

impl SimClock {
    fn new() -> Self {
        SimClock { micros: Cell::new(0) }
    }

    fn advance(&self, d: u64) {
        self.micros.set(self.micros.get() + d);
    }
}

impl Clock for SimClock {
    fn now_millis(&self) -> u64 {
        self.micros.get() / 1000
    }

    fn now_micros(&self) -> u64 {
        self.micros.get()
    }
}

struct BoolDptTable;

impl DptTable for BoolDptTable {
    fn bit_length(&self, id: DptId) -> Option<u16> {
        match (id.main, id.sub) {
            (1, _) => Some(1),
            _ => None,
        }
    }
}

struct PrintingSink {
    name: &'static str,
}

impl ComObjectSink for PrintingSink {
    fn on_update(&mut self, index: usize) {
        println!("[{}] com-object {index} updated", self.name);
    }
}

fn main() {
    let bus = Bus::new();
    const GROUP_SWITCH_STATE: u16 = knx_tpuart::address::group_address(1, 2, 3);

    let mut switch_objects: HVec<ComObject, 8> = HVec::new();
    switch_objects
        .push(ComObject::new(GROUP_SWITCH_STATE, DptId::new(1, 1), Indicator::COMMUNICATION | Indicator::TRANSMIT, &BoolDptTable).unwrap())
        .ok();
    let switch_link = TpUartLink::new(BusPort::new(bus.clone()), 0x1101, Mode::Normal);
    let mut switch = DeviceCoordinator::new(switch_link, switch_objects, PrintingSink { name: "switch" });

    let mut lamp_objects: HVec<ComObject, 8> = HVec::new();
    lamp_objects
        .push(ComObject::new(GROUP_SWITCH_STATE, DptId::new(1, 1), Indicator::COMMUNICATION | Indicator::WRITE, &BoolDptTable).unwrap())
        .ok();
    let lamp_link = TpUartLink::new(BusPort::new(bus.clone()), 0x1102, Mode::Normal);
    let mut lamp = DeviceCoordinator::new(lamp_link, lamp_objects, PrintingSink { name: "lamp" });

    let clock = SimClock::new();
    switch.begin(&clock).expect("switch bring-up");
    lamp.begin(&clock).expect("lamp bring-up");

    println!("both devices ready; switch turns the lamp on");
    switch.write_short(0, 1);

    for _ in 0..4000 {
        clock.advance(250);
        switch.task(&clock);
        lamp.task(&clock);

        if lamp.value(0) == Some(&Value::Short(1)) {
            println!("lamp observed state={:?} at t={}us", lamp.value(0), clock.now_micros());
            break;
        }
    }

    if lamp.value(0) != Some(&Value::Short(1)) {
        println!("lamp never saw the write within the simulated window");
    }
}
