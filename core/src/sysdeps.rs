//! Platform glue shared by the generic layer and the backends.
//!
//! Logging goes through `tracing` when the `tracing` feature is on.
//! Otherwise the macros below swallow their arguments, so constrained builds
//! carry no logging code at all.
//!
//! The macros are textually scoped: `lib.rs` declares this module first with
//! `#[macro_use]`, and callers invoke them without importing anything.

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($t: tt)*) => { ::tracing::debug!($($t)*) };
}

#[cfg(feature = "tracing")]
macro_rules! error {
    ($($t: tt)*) => { ::tracing::error!($($t)*) };
}

#[cfg(feature = "tracing")]
macro_rules! info {
    ($($t: tt)*) => { ::tracing::info!($($t)*) };
}

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($t: tt)*) => { ::tracing::trace!($($t)*) };
}

#[cfg(feature = "tracing")]
macro_rules! warn {
    ($($t: tt)*) => { ::tracing::warn!($($t)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! error {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($t: tt)*) => {};
}

/// Dumps a buffer at trace level, prefixed with its direction.
#[allow(unused_variables)]
pub(crate) fn dump(prefix: &str, buf: &[u8]) {
    trace!("{}: {}", prefix, hex::encode(buf));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unused_variables)]
    fn test_log_macros_take_format_arguments() {
        let code = -2;

        debug!("debug {}", code);
        error!("error {}", code);
        info!("info {}", code);
        trace!("trace {}", code);
        warn!("warn {}", code);
        dump("TX", &[0x00, 0xA4]);
    }
}
