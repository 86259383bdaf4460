// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-visible status codes for the link and device layers. These are
//! plain numerically-coded enums, not exception types: steady-state errors
//! are delivered through the event/ack sinks rather than by unwinding.

use num_derive::FromPrimitive;

/// Errors returned by [`crate::link::TpUartLink`] bring-up operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum LinkError {
    /// `init`/`attach` called outside of `RX=INIT, TX=INIT`.
    NotInInitState = 1,
    /// Reserved wire-level code for a bring-up with no event consumer
    /// bound. `run_rx` takes its event callback per call, so this crate's
    /// own API can never produce it.
    NullEventSink = 2,
    /// Reserved wire-level code for a bring-up with no ack consumer bound.
    /// `run_tx`/`run_rx` return ack outcomes directly, so this crate's own
    /// API can never produce it.
    NullAckSink = 3,
    /// `send_telegram` called while TX isn't idle.
    TxNotIdle = 4,
    /// The transceiver did not answer `RESET_REQ` within the attempt budget.
    ResetTimedOut = 5,
    /// Attaching a com-object list with two C-flagged objects sharing a
    /// group address.
    DuplicateGroupAddress = 6,
}

/// Outcome of a transmitted telegram, returned from [`crate::link::TpUartLink::run_tx`]
/// and [`crate::link::TpUartLink::run_rx`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum AckOutcome {
    /// `DATA_CONFIRM_SUCCESS` (0x8B) received while waiting for an ack.
    Ack = 0,
    /// `DATA_CONFIRM_FAILED` (0x0B) received while waiting for an ack.
    Nack = 1,
    /// No confirm byte arrived within the 500 ms ack window.
    NoAnswerTimeout = 2,
    /// A `RESET_INDICATION` arrived while a send was in flight.
    ResetResponse = 3,
}

/// A notable event reported through [`crate::link::TpUartLink::run_rx`]'s
/// callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum LinkEvent {
    /// A complete, checksum-valid telegram addressed to an attached
    /// com-object has been assembled.
    ReceivedEibTelegram = 0,
    /// A reception was abandoned: bad checksum, or a mid-reception state
    /// other than `RECEPTION_ADDRESSED` timed out.
    ReceptionError = 1,
    /// A `STATE_INDICATION` byte arrived.
    StateIndication = 2,
    /// The transceiver reported a reset; the device should re-run
    /// `reset`/`init`.
    Reset = 3,
}

/// Errors from com-object value updates.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum ComObjectError {
    /// The telegram's payload length does not match this object's length.
    LengthMismatch = 1,
    /// `update_from_integer`/`update_from_bytes` called on an object whose
    /// length doesn't support that representation.
    WrongRepresentation = 2,
}
