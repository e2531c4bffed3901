//! Type-erased handles and the registry that builds them.

use std::any::Any;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{Error, ErrorCode, Result};
use crate::interface::Interface;

/// An interface handle with its backend erased.
///
/// Implemented by every [`Interface`], so callers that only learn the backend
/// at runtime can drive it the same way.
pub trait Session {
    fn name(&self) -> &'static str;

    fn open(&mut self, hw_opts: Option<&dyn Any>) -> Result<()>;

    fn close(&mut self);

    fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize>;

    fn reset(&mut self) -> Result<()>;

    fn poll(&mut self, byte: u8, timeout: Duration, complete: bool) -> Result<usize>;

    fn set_error(&mut self, error: Error);

    fn set_error_code(&mut self, code: i32);

    fn error(&self) -> Option<Error>;

    fn is_error(&self) -> bool {
        self.error().is_some()
    }

    fn error_code(&self) -> Option<ErrorCode> {
        self.error().map(|e| e.code())
    }

    fn error_message(&self) -> Option<&'static str> {
        self.error().map(|e| e.message())
    }
}

impl<H: 'static> Session for Interface<H> {
    fn name(&self) -> &'static str {
        Interface::name(self)
    }

    fn open(&mut self, hw_opts: Option<&dyn Any>) -> Result<()> {
        Interface::open(self, hw_opts)
    }

    fn close(&mut self) {
        Interface::close(self)
    }

    fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        Interface::transceive(self, tx, rx)
    }

    fn reset(&mut self) -> Result<()> {
        Interface::reset(self)
    }

    fn poll(&mut self, byte: u8, timeout: Duration, complete: bool) -> Result<usize> {
        Interface::poll(self, byte, timeout, complete)
    }

    fn set_error(&mut self, error: Error) {
        Interface::set_error(self, error)
    }

    fn set_error_code(&mut self, code: i32) {
        Interface::set_error_code(self, code)
    }

    fn error(&self) -> Option<Error> {
        Interface::error(self)
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn open(&mut self, hw_opts: Option<&dyn Any>) -> Result<()> {
        (**self).open(hw_opts)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        (**self).transceive(tx, rx)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn poll(&mut self, byte: u8, timeout: Duration, complete: bool) -> Result<usize> {
        (**self).poll(byte, timeout, complete)
    }

    fn set_error(&mut self, error: Error) {
        (**self).set_error(error)
    }

    fn set_error_code(&mut self, code: i32) {
        (**self).set_error_code(code)
    }

    fn error(&self) -> Option<Error> {
        (**self).error()
    }
}

/// Builds a fresh handle, already initialised for its hardware.
pub type Factory = fn() -> Box<dyn Session>;

/// Backend factories by name.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<&'static str, Factory>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a registry holding every backend compiled into this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(crate::hw::echo::NAME, crate::hw::echo::boxed);

        #[cfg(feature = "pcsc")]
        registry.register(crate::hw::pcsc::NAME, crate::hw::pcsc::boxed);

        registry
    }

    /// Registers `factory` under `name`, replacing a previous registration.
    pub fn register(&mut self, name: &'static str, factory: Factory) -> &mut Self {
        self.factories.insert(name, factory);
        self
    }

    /// Builds a handle for the backend registered as `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Session>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Names of the registered backends, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ops::{Io, Ops};

    fn transceive(_: &mut (), tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        rx[..tx.len()].copy_from_slice(tx);
        Ok(tx.len())
    }

    static LOOPBACK: Ops<()> = Ops {
        name: Some("loopback"),
        io: Io::from_parts(Some(transceive), None, None),
        ..Ops::EMPTY
    };

    fn loopback() -> Box<dyn Session> {
        Box::new(Interface::new(&LOOPBACK, ()))
    }

    #[test]
    fn test_registry_with_fake() {
        let mut registry = Registry::new();
        registry.register("loopback", loopback);

        let mut ese = registry.create("loopback").unwrap();
        let mut rx = [0u8; 8];

        assert_eq!("loopback", ese.name());
        assert_eq!(Ok(()), ese.open(None));
        assert_eq!(Ok(2), ese.transceive(&[0xCA, 0xFE], &mut rx));
        assert!(!ese.is_error());
        ese.close();

        assert!(registry.create("missing").is_none());
    }

    #[test]
    fn test_builtins() {
        let registry = Registry::with_builtins();

        assert!(registry.names().any(|name| name == "echo"));
        assert!(registry.create("echo").is_some());
    }
}
