//! A crate to talk to secure element chips through pluggable hardware backends.
//!
//! A backend describes what it can do with an [`Ops`] table. An [`Interface`]
//! binds one table to the backend's state and an error latch, and dispatches
//! every `transceive` either to the backend's own primitive or to a
//! transmit-then-receive pair.
//!
//! ```rust
//! use ese::hw::echo;
//!
//! let mut ese = echo::new(64);
//! ese.open(None).unwrap();
//!
//! let mut rx = [0u8; 8];
//! let len = ese.transceive(&[0x00, 0xA4, 0x04, 0x00], &mut rx).unwrap();
//! assert_eq!(&[0x00, 0xA4, 0x04, 0x00], &rx[..len]);
//!
//! ese.close();
//! ```

#[macro_use]
mod sysdeps;

pub mod apdu;
pub mod card;
pub mod error;
pub mod hw;
pub mod interface;
pub mod ops;
pub mod session;

pub use card::Card;
pub use error::{BackendError, Error, ErrorCode, ErrorTable, GenericError, Result};
pub use interface::{Interface, NULL_HANDLE_NAME, UNKNOWN_HW_NAME};
pub use ops::{Io, Ops};
pub use session::{Factory, Registry, Session};
