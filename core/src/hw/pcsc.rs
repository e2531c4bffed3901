//! PC/SC backend: a secure element behind a smart card reader.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## What is PC/SC?
//! PC/SC (Personal Computer/Smart Card) is an abstraction layer for communicating with Smart Cards.
//! Windows and macOS supports PC/SC by themselves, Linux also supports by installing pcsc-lite
//! shared library. Refer the documentation of pcsc-rust for details:
//! <https://github.com/bluetech/pcsc-rust>
//!
//! ## Usage
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ese::hw::pcsc::{self, PcscOptions};
//!
//! let mut ese = pcsc::new(None);
//! let opts = PcscOptions {
//!     wait: Some(Duration::from_secs(10)),
//!     ..Default::default()
//! };
//!
//! ese.open(Some(&opts)).unwrap();
//!
//! let mut rx = [0u8; pcsc::MAX_BUFFER_SIZE];
//! let len = ese.transceive(&[0x00, 0xA4, 0x04, 0x00, 0x00], &mut rx).unwrap();
//!
//! ese.close();
//! ```

use std::any::Any;
use std::ffi::{CStr, CString};
use std::thread::sleep;
use std::time::{Duration, Instant};

use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode};

use crate::error::{BackendError, ErrorTable, Result};
use crate::interface::Interface;
use crate::ops::{Io, Ops};
use crate::session::Session;

pub use pcsc::MAX_BUFFER_SIZE;

pub const NAME: &str = "pcsc";

pub const ERRORS: ErrorTable = ErrorTable::new(&[
    "Could not establish a PC/SC context.",
    "Reader not found on PC/SC service.",
    "PC/SC backend is not initialised.",
    "Could not connect to the card.",
    "No card is connected.",
    "Error occurred while communicating with the card.",
    "Receive buffer is too small for the response.",
]);

pub const CONTEXT_FAILED: BackendError = ERRORS.error(0);
pub const READER_NOT_FOUND: BackendError = ERRORS.error(1);
pub const NOT_INITIALISED: BackendError = ERRORS.error(2);
pub const CONNECT_FAILED: BackendError = ERRORS.error(3);
pub const NOT_CONNECTED: BackendError = ERRORS.error(4);
pub const TRANSMIT_FAILED: BackendError = ERRORS.error(5);
pub const BUFFER_TOO_SMALL: BackendError = ERRORS.error(6);

pub static OPS: Ops<Pcsc> = Ops {
    name: Some(NAME),
    open: Some(open),
    close: Some(close),
    io: Io::from_parts(Some(transceive), None, None),
    ..Ops::EMPTY
};

/// Options accepted by `open`.
#[derive(Clone, Debug)]
pub struct PcscOptions {
    pub share_mode: ShareMode,
    pub protocols: Protocols,

    /// How long to wait for a card to be presented. `None` fails at once.
    pub wait: Option<Duration>,
}

impl Default for PcscOptions {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            protocols: Protocols::ANY,
            wait: None,
        }
    }
}

/// State of the PC/SC backend.
#[derive(Default)]
pub struct Pcsc {
    ctx: Option<Context>,
    reader: Option<CString>,
    card: Option<Card>,
}

impl Pcsc {
    /// Creates a PC/SC context in user scope and binds it to `reader`, or to
    /// the first reader found when none is given.
    pub fn init(&mut self, reader: Option<&CStr>) -> Result<()> {
        let ctx = Context::establish(Scope::User).map_err(|e| {
            warn!("Failed to establish PC/SC context: {}", e);
            CONTEXT_FAILED
        })?;

        let reader = match reader {
            Some(reader) => reader.to_owned(),
            None => {
                let mut buf = [0u8; 2048];

                ctx.list_readers(&mut buf)
                    .map_err(|e| {
                        warn!("Failed to list readers: {}", e);
                        READER_NOT_FOUND
                    })?
                    .next()
                    .ok_or(READER_NOT_FOUND)?
                    .to_owned()
            }
        };

        debug!("Using device: {}", reader.to_str().unwrap_or_default());

        self.ctx = Some(ctx);
        self.reader = Some(reader);

        Ok(())
    }

    /// Name of the bound reader.
    pub fn reader(&self) -> Option<&CStr> {
        self.reader.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.card.is_some()
    }
}

/// Builds a PC/SC handle. A failed `init` is left in the error latch, and
/// `open` will then fail as well.
pub fn new(reader: Option<&CStr>) -> Interface<Pcsc> {
    let mut ese = Interface::new(&OPS, Pcsc::default());

    if let Err(e) = ese.hw_mut().init(reader) {
        ese.set_error(e);
    }

    ese
}

/// Registry factory, binding the first reader found.
pub fn boxed() -> Box<dyn Session> {
    Box::new(new(None))
}

fn open(hw: &mut Pcsc, hw_opts: Option<&dyn Any>) -> Result<()> {
    let opts = hw_opts
        .and_then(|opts| opts.downcast_ref::<PcscOptions>())
        .cloned()
        .unwrap_or_default();

    let (ctx, reader) = match (&hw.ctx, &hw.reader) {
        (Some(ctx), Some(reader)) => (ctx, reader),
        _ => return Err(NOT_INITIALISED.into()),
    };

    let deadline = opts.wait.map(|wait| Instant::now() + wait);

    // Waits for touching card, polling for each seconds.
    loop {
        match ctx.connect(reader, opts.share_mode, opts.protocols) {
            Ok(card) => {
                debug!("Connected to the card");
                hw.card = Some(card);

                return Ok(());
            }
            Err(pcsc::Error::NoSmartcard)
                if deadline.map_or(false, |deadline| Instant::now() < deadline) =>
            {
                info!("Still waiting for the card...");
                sleep(Duration::from_secs(1));
            }
            Err(e) => {
                warn!("Failed to connect to the card: {}", e);
                return Err(CONNECT_FAILED.into());
            }
        }
    }
}

fn close(hw: &mut Pcsc) -> Result<()> {
    let mut result = Ok(());

    if let Some(card) = hw.card.take() {
        if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
            warn!("Failed to disconnect the card: {}", e);
            result = Err(TRANSMIT_FAILED.into());
        }
    }

    hw.reader = None;
    if let Some(ctx) = hw.ctx.take() {
        if let Err((_, e)) = ctx.release() {
            warn!("Failed to release PC/SC context: {}", e);
            result = Err(CONTEXT_FAILED.into());
        }
    }

    result
}

fn transceive(hw: &mut Pcsc, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
    let card = hw.card.as_ref().ok_or(NOT_CONNECTED)?;

    card.transmit(tx, rx)
        .map(|received| received.len())
        .map_err(|e| match e {
            pcsc::Error::InsufficientBuffer => BUFFER_TOO_SMALL.into(),
            e => {
                warn!("Failed to transmit: {}", e);
                TRANSMIT_FAILED.into()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::{Error, ErrorCode};

    #[test]
    fn test_uninitialised_handle() {
        let mut ese = Interface::new(&OPS, Pcsc::default());
        let mut rx = [0u8; 8];

        assert_eq!("pcsc", ese.name());
        assert_eq!(Err(Error::Backend(NOT_INITIALISED)), ese.open(None));
        assert_eq!(
            Err(Error::Backend(NOT_CONNECTED)),
            ese.transceive(&[0x00, 0xA4, 0x04, 0x00], &mut rx),
        );
        assert_eq!(Some(ErrorCode::Backend(4)), ese.error_code());
    }

    #[test]
    fn test_close_without_init_is_safe() {
        let mut ese = Interface::new(&OPS, Pcsc::default());

        ese.close();
        ese.close();

        assert!(!ese.is_error());
        assert!(!ese.hw().is_connected());
    }
}
