//! A fake secure element that answers every request with the request itself.
//!
//! It offers the split transmit/receive capability, so it exercises the
//! composed path of the dispatcher, plus `poll` and `hw_reset`. Useful for
//! tests and for checking wiring without hardware.

use std::any::Any;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{BackendError, ErrorTable, GenericError, Result};
use crate::interface::Interface;
use crate::ops::{Io, Ops};
use crate::session::Session;

pub const NAME: &str = "echo";

/// Bytes the echo buffer holds when built through the registry.
pub const DEFAULT_CAPACITY: usize = 4096;

pub const ERRORS: ErrorTable = ErrorTable::new(&[
    "Echo device is not initialised.",
    "Echo device is not open.",
    "Echo buffer overflow.",
]);

pub const NOT_INITIALISED: BackendError = ERRORS.error(0);
pub const NOT_OPEN: BackendError = ERRORS.error(1);
pub const OVERFLOW: BackendError = ERRORS.error(2);

pub static OPS: Ops<Echo> = Ops {
    name: Some(NAME),
    open: Some(open),
    close: Some(close),
    io: Io::from_parts(None, Some(transmit), Some(receive)),
    hw_reset: Some(reset),
    poll: Some(poll),
    errors: ERRORS,
};

/// State of the echo device.
#[derive(Debug, Default)]
pub struct Echo {
    buffer: Option<VecDeque<u8>>,
    capacity: usize,
    opened: bool,
}

impl Echo {
    /// Allocates the echo buffer. Released again by `close`.
    pub fn init(&mut self, capacity: usize) {
        self.buffer = Some(VecDeque::with_capacity(capacity));
        self.capacity = capacity;
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Number of bytes transmitted but not yet received.
    pub fn pending(&self) -> usize {
        self.buffer.as_ref().map_or(0, VecDeque::len)
    }

    fn buffer(&mut self) -> Result<&mut VecDeque<u8>> {
        match (self.opened, self.buffer.as_mut()) {
            (true, Some(buffer)) => Ok(buffer),
            _ => Err(NOT_OPEN.into()),
        }
    }
}

/// Builds an initialised echo handle.
pub fn new(capacity: usize) -> Interface<Echo> {
    let mut hw = Echo::default();
    hw.init(capacity);

    Interface::new(&OPS, hw)
}

/// Registry factory.
pub fn boxed() -> Box<dyn Session> {
    Box::new(new(DEFAULT_CAPACITY))
}

fn open(echo: &mut Echo, _: Option<&dyn Any>) -> Result<()> {
    if echo.buffer.is_none() {
        return Err(NOT_INITIALISED.into());
    }

    echo.opened = true;
    debug!("Echo device opened ({} bytes)", echo.capacity);

    Ok(())
}

fn close(echo: &mut Echo) -> Result<()> {
    echo.opened = false;
    echo.buffer = None;

    Ok(())
}

fn transmit(echo: &mut Echo, tx: &[u8], _complete: bool) -> Result<usize> {
    let capacity = echo.capacity;
    let buffer = echo.buffer()?;

    if buffer.len() + tx.len() > capacity {
        return Err(OVERFLOW.into());
    }

    buffer.extend(tx);
    trace!("Echo holds {} bytes", buffer.len());

    Ok(tx.len())
}

fn receive(echo: &mut Echo, rx: &mut [u8], complete: bool) -> Result<usize> {
    let buffer = echo.buffer()?;
    let len = rx.len().min(buffer.len());

    for (dst, src) in rx.iter_mut().zip(buffer.drain(..len)) {
        *dst = src;
    }

    // Whatever did not fit is lost once the transaction ends.
    if complete {
        buffer.clear();
    }

    Ok(len)
}

fn poll(echo: &mut Echo, byte: u8, _timeout: Duration, _complete: bool) -> Result<usize> {
    let buffer = echo.buffer()?;
    let mut consumed = 0;

    while let Some(next) = buffer.pop_front() {
        consumed += 1;
        if next == byte {
            return Ok(consumed);
        }
    }

    Err(GenericError::PollTimedOut.into())
}

fn reset(echo: &mut Echo) -> Result<()> {
    echo.buffer()?.clear();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::{Error, ErrorCode};

    #[test]
    fn test_echo_round_trip() {
        let mut ese = new(16);
        let mut rx = [0u8; 16];

        assert_eq!(Ok(()), ese.open(None));
        assert_eq!(Ok(3), ese.transceive(&[0x00, 0xA4, 0x04], &mut rx));
        assert_eq!(&[0x00, 0xA4, 0x04], &rx[..3]);
        assert_eq!(0, ese.hw().pending());
        assert!(!ese.is_error());
    }

    #[test]
    fn test_transceive_before_open_fails() {
        let mut ese = new(16);
        let mut rx = [0u8; 16];

        assert_eq!(Err(Error::Backend(NOT_OPEN)), ese.transceive(b"hi", &mut rx));
        assert_eq!(Some(ErrorCode::Backend(1)), ese.error_code());
        assert_eq!(Some("Echo device is not open."), ese.error_message());
    }

    #[test]
    fn test_overflow_skips_receive() {
        let mut ese = new(4);
        let mut rx = [0u8; 8];
        ese.open(None).unwrap();

        assert_eq!(Err(Error::Backend(OVERFLOW)), ese.transceive(b"hello", &mut rx));
        assert_eq!(Some(ErrorCode::Backend(2)), ese.error_code());
        assert_eq!([0u8; 8], rx);
    }

    #[test]
    fn test_short_receive_buffer_truncates() {
        let mut ese = new(16);
        let mut rx = [0u8; 2];
        ese.open(None).unwrap();

        assert_eq!(Ok(2), ese.transceive(b"abcd", &mut rx));
        assert_eq!(b"ab", &rx);
        assert_eq!(0, ese.hw().pending());
    }

    #[test]
    fn test_poll() {
        let mut ese = new(16);
        let mut rx = [0u8; 2];
        ese.open(None).unwrap();

        // Leave bytes pending by transmitting directly.
        transmit(ese.hw_mut(), &[0x00, 0xA5, 0x01], false).unwrap();

        assert_eq!(Ok(2), ese.poll(0xA5, Duration::from_millis(1), false));
        assert_eq!(1, ese.hw().pending());
        assert_eq!(
            Err(Error::Generic(GenericError::PollTimedOut)),
            ese.poll(0xA5, Duration::from_millis(1), false),
        );
        assert_eq!(Some(-2), ese.error_code().map(ErrorCode::raw));
        assert_eq!(Ok(0), ese.transceive(&[], &mut rx));
        assert!(!ese.is_error());
    }

    #[test]
    fn test_reset_drops_pending() {
        let mut ese = new(16);
        ese.open(None).unwrap();
        transmit(ese.hw_mut(), b"xyz", false).unwrap();

        assert_eq!(Ok(()), ese.reset());
        assert_eq!(0, ese.hw().pending());
    }

    #[test]
    fn test_close_releases_and_is_idempotent() {
        let mut ese = new(16);

        ese.close();
        assert!(!ese.is_error());

        let mut ese = new(16);
        ese.open(None).unwrap();
        ese.close();
        ese.close();

        assert!(!ese.hw().is_open());
        assert!(!ese.is_error());
        assert_eq!(Err(Error::Backend(NOT_INITIALISED)), ese.open(None));
    }
}
