//! The operation table a hardware backend supplies.
//!
//! Every entry point is optional. A missing entry point means the backend does
//! not offer that capability; it is never an error by itself. `H` is the
//! backend-owned state stored inside the handle.

use std::any::Any;
use std::time::Duration;

use crate::error::{ErrorTable, Result};

/// Performs the physical handshake, with backend specific options.
pub type OpenFn<H> = fn(&mut H, Option<&dyn Any>) -> Result<()>;

/// Tears the session down. Must tolerate a handle that was never opened.
pub type CloseFn<H> = fn(&mut H) -> Result<()>;

/// Sends `tx` and receives the answer into `rx` in one step.
pub type TransceiveFn<H> = fn(&mut H, &[u8], &mut [u8]) -> Result<usize>;

/// Sends bytes; `complete` ends the bus transaction.
pub type TransmitFn<H> = fn(&mut H, &[u8], bool) -> Result<usize>;

/// Receives up to `rx.len()` bytes; `complete` ends the bus transaction.
pub type ReceiveFn<H> = fn(&mut H, &mut [u8], bool) -> Result<usize>;

/// Waits until `byte` shows up on the bus and returns how many bytes were
/// consumed while doing so.
pub type PollFn<H> = fn(&mut H, u8, Duration, bool) -> Result<usize>;

pub type ResetFn<H> = fn(&mut H) -> Result<()>;

/// The I/O capability of a backend, decided once when its table is built.
pub enum Io<H> {
    /// One atomic send+receive primitive.
    Transceive(TransceiveFn<H>),

    /// Independent primitives, composed by the generic layer.
    Split {
        transmit: TransmitFn<H>,
        receive: ReceiveFn<H>,
    },

    /// No I/O at all: every transceive fails with `NoTransceive`.
    Unsupported,
}

impl<H> Io<H> {
    /// Picks the capability from whichever entry points a backend has.
    /// A unified transceive wins over a split pair, and half a pair is
    /// as good as nothing.
    pub const fn from_parts(
        transceive: Option<TransceiveFn<H>>,
        transmit: Option<TransmitFn<H>>,
        receive: Option<ReceiveFn<H>>,
    ) -> Self {
        match (transceive, transmit, receive) {
            (Some(transceive), _, _) => Self::Transceive(transceive),
            (None, Some(transmit), Some(receive)) => Self::Split { transmit, receive },
            _ => Self::Unsupported,
        }
    }
}

impl<H> Clone for Io<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Io<H> {}

/// Capability descriptor of one backend.
pub struct Ops<H> {
    pub name: Option<&'static str>,
    pub open: Option<OpenFn<H>>,
    pub close: Option<CloseFn<H>>,
    pub io: Io<H>,
    pub hw_reset: Option<ResetFn<H>>,
    pub poll: Option<PollFn<H>>,
    pub errors: ErrorTable,
}

impl<H> Ops<H> {
    /// A table offering nothing, to be filled with struct update syntax.
    pub const EMPTY: Self = Self {
        name: None,
        open: None,
        close: None,
        io: Io::Unsupported,
        hw_reset: None,
        poll: None,
        errors: ErrorTable::EMPTY,
    };

    /// Length of the backend's error table.
    pub const fn errors_count(&self) -> usize {
        self.errors.len()
    }
}
