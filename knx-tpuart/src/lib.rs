// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A TP-UART link layer and cooperative device state machine for a single
//! KNX/EIB bus peer.
//!
//! [`link::TpUartLink`] owns a serial port and runs the receive/transmit
//! byte protocol described by Siemens' TP-UART host interface.
//! [`device::DeviceCoordinator`] sits on top of it, mapping inbound
//! telegrams to a fixed table of [`comobject::ComObject`]s and queuing
//! outbound ones through [`queue::ActionRingBuffer`]. Nothing in this
//! crate allocates or spawns a thread; a host drives it by calling
//! [`device::DeviceCoordinator::task`] on every pass of its own loop.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod address;
pub mod clock;
pub mod comobject;
#[cfg(feature = "config")]
pub mod config;
pub mod device;
pub mod diag;
pub mod dpt;
pub mod error;
pub mod index;
pub mod link;
pub mod queue;
pub mod telegram;

pub use clock::Clock;
pub use comobject::{ComObject, Indicator, Value};
pub use device::{ComObjectSink, DeviceCoordinator, DeviceState};
pub use dpt::{DptId, DptTable};
pub use error::{AckOutcome, ComObjectError, LinkError, LinkEvent};
pub use link::{Mode, SerialPort, TpUartLink};
pub use telegram::{Command, Telegram};
