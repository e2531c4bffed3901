use std::any::Any;
use std::time::Duration;

use crate::error::{Error, ErrorCode, ErrorState, GenericError, Result};
use crate::ops::{Io, Ops};
use crate::sysdeps;

/// Name reported for a backend that does not advertise one.
pub const UNKNOWN_HW_NAME: &str = "unknown hw";

/// Name reported for a null handle.
pub const NULL_HANDLE_NAME: &str = "NULL EseInterface";

/// A handle bound to one hardware backend.
///
/// The operation table is fixed at construction. The handle keeps no
/// open/closed state of its own; backends guard their lifecycle themselves.
/// Every I/O call takes `&mut self`, so one channel is never driven from two
/// places at once.
///
/// `open`, `transceive`, `reset` and `poll` start from a clear latch, so a
/// latched error after one of them returns belongs to that call. `close`
/// only adds to the latch.
pub struct Interface<H: 'static> {
    ops: &'static Ops<H>,
    error: ErrorState,
    hw: H,
}

impl<H: 'static> Interface<H> {
    /// Binds a backend's table and state into a new handle.
    pub fn new(ops: &'static Ops<H>, hw: H) -> Self {
        Self {
            ops,
            error: ErrorState::default(),
            hw,
        }
    }

    pub fn ops(&self) -> &'static Ops<H> {
        self.ops
    }

    /// Backend-owned state.
    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Returns the advertised name of the backend.
    pub fn name(&self) -> &'static str {
        self.ops.name.unwrap_or(UNKNOWN_HW_NAME)
    }

    /// Opens a session. A backend without `open` needs none.
    pub fn open(&mut self, hw_opts: Option<&dyn Any>) -> Result<()> {
        debug!("Opening {}", self.name());
        self.error.clear();

        match self.ops.open {
            Some(open) => {
                let result = open(&mut self.hw, hw_opts);
                self.latch(result)
            }
            None => Ok(()),
        }
    }

    /// Closes the session. Failures only end up in the error latch.
    pub fn close(&mut self) {
        debug!("Closing {}", self.name());

        if let Some(close) = self.ops.close {
            if let Err(e) = close(&mut self.hw) {
                warn!("Failed to close {}: {}", self.name(), e);
                self.error.set(e);
            }
        }
    }

    /// Sends `tx` and receives the answer into `rx`, returning the number of
    /// bytes received. Zero bytes is a valid answer.
    pub fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        sysdeps::dump("TX", tx);
        self.error.clear();

        let result = match self.ops.io {
            Io::Transceive(transceive) => transceive(&mut self.hw, tx, rx),
            Io::Split { transmit, receive } => match transmit(&mut self.hw, tx, true) {
                Ok(_) => receive(&mut self.hw, rx, true),
                Err(e) => Err(e),
            },
            Io::Unsupported => Err(GenericError::NoTransceive.into()),
        };

        let received = self.latch(result)?;
        sysdeps::dump("RX", &rx[..received.min(rx.len())]);

        Ok(received)
    }

    /// Resets the chip through the backend.
    pub fn reset(&mut self) -> Result<()> {
        self.error.clear();

        let result = match self.ops.hw_reset {
            Some(hw_reset) => hw_reset(&mut self.hw),
            None => Err(GenericError::Unsupported.into()),
        };

        self.latch(result)
    }

    /// Polls the bus for `byte`, returning the number of bytes consumed.
    pub fn poll(&mut self, byte: u8, timeout: Duration, complete: bool) -> Result<usize> {
        self.error.clear();

        let result = match self.ops.poll {
            Some(poll) => poll(&mut self.hw, byte, timeout, complete),
            None => Err(GenericError::Unsupported.into()),
        };

        self.latch(result)
    }

    /// Latches `error`, replacing any previous one.
    pub fn set_error(&mut self, error: impl Into<Error>) {
        self.error.set(error.into());
    }

    /// Latches the error behind a raw integer code.
    ///
    /// A code with no message in either table means the backend and the
    /// caller disagree on the table layout. The process is aborted rather than
    /// carrying a latch that points at nothing.
    pub fn set_error_code(&mut self, code: i32) {
        match ErrorCode::from_raw(code).and_then(|c| c.resolve(&self.ops.errors)) {
            Some(e) => self.error.set(e),
            None => {
                error!(
                    "Error code {} is out of range for {} ({} backend errors)",
                    code,
                    self.name(),
                    self.ops.errors_count(),
                );
                std::process::abort();
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error.clear();
    }

    pub fn is_error(&self) -> bool {
        self.error.is_err()
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<Error> {
        self.error.get()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.code()
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error.message()
    }

    fn latch<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            debug!("{} reported error {}: {}", self.name(), e.code(), e);
            self.error.set(*e);
        }

        result
    }
}
