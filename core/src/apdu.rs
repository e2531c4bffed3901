//! Minimal ISO/IEC 7816-4 APDU encoding, enough to drive a secure element
//! through [`crate::Card`].

mod command;
mod response;

pub use command::Command;
pub use response::Response;

pub const CLA_DEFAULT: u8 = 0x00;

pub(crate) const INS_SELECT: u8 = 0xA4;
pub(crate) const INS_GET_RESPONSE: u8 = 0xC0;

/// A status word other than success, returned by the card.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("The card returned an error ({sw1:#04X}, {sw2:#04X}).")]
pub struct Error {
    pub sw1: u8,
    pub sw2: u8,
}

impl From<(u8, u8)> for Error {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self { sw1, sw2 }
    }
}
