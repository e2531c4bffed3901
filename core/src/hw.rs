//! Hardware backends shipped with the crate.

pub mod echo;

#[cfg(feature = "pcsc")]
pub mod pcsc;
