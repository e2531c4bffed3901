#![allow(clippy::missing_safety_doc)]

use std::cell::Cell;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr::null_mut;
use std::slice;

use ese::{Error, GenericError, Registry, Session};

thread_local! {
    /// Failure of the last call on this thread that had no handle to latch
    /// it into.
    static LAST_ERROR: Cell<Option<Error>> = const { Cell::new(None) };
}

const NULL_NAME: &[u8] = b"NULL EseInterface\0";
const INVALID_HANDLE_MESSAGE: &[u8] = b"Invalid EseInterface handle.\0";
const NO_MESSAGE: &[u8] = b"\0";

fn set_last_error(error: impl Into<Error>) {
    LAST_ERROR.with(|last| last.set(Some(error.into())));
}

fn static_str(bytes: &'static [u8]) -> *const c_char {
    bytes.as_ptr() as *const c_char
}

/// Reads a caller buffer; a null pointer reads as an empty one.
unsafe fn bytes<'a>(ptr: *const u8, len: u32) -> &'a [u8] {
    match ptr.is_null() {
        true => &[],
        _ => slice::from_raw_parts(ptr, len as usize),
    }
}

unsafe fn bytes_mut<'a>(ptr: *mut u8, len: u32) -> &'a mut [u8] {
    match ptr.is_null() {
        true => &mut [],
        _ => slice::from_raw_parts_mut(ptr, len as usize),
    }
}

/// A handle as seen from C.
/// Strings handed out by the accessors stay valid until the next call on
/// the same handle.
pub struct EseInterface {
    session: Box<dyn Session>,
    name: CString,
    message: CString,
}

impl EseInterface {
    fn new(session: Box<dyn Session>) -> Self {
        Self {
            name: CString::new(session.name()).unwrap_or_default(),
            message: CString::default(),
            session,
        }
    }
}

/// Creates a handle bound to the backend registered as `backend`, for
/// example `"echo"`.
///
/// Returns null if there is no such backend; `ese_last_error()` then reports
/// `Unsupported` (-4), as nothing implements that name. A null `backend`
/// reports `InvalidHandle` (-3) instead.
#[no_mangle]
pub unsafe extern "C" fn ese_new(backend: *const c_char) -> *mut EseInterface {
    if backend.is_null() {
        set_last_error(GenericError::InvalidHandle);
        return null_mut();
    }

    let name = CStr::from_ptr(backend).to_string_lossy();
    match Registry::with_builtins().create(&name) {
        Some(session) => Box::into_raw(Box::new(EseInterface::new(session))),
        None => {
            set_last_error(GenericError::Unsupported);
            null_mut()
        }
    }
}

/// Frees the handle. Close it first if it was opened.
#[no_mangle]
pub unsafe extern "C" fn ese_free(ese: *mut EseInterface) {
    if !ese.is_null() {
        let _ = Box::from_raw(ese);
    }
}

/// Returns the backend name, `"NULL EseInterface"` for a null handle.
#[no_mangle]
pub unsafe extern "C" fn ese_name(ese: *const EseInterface) -> *const c_char {
    match ese.as_ref() {
        Some(ese) => ese.name.as_ptr(),
        None => static_str(NULL_NAME),
    }
}

/// Opens the session. Returns 0 on success and -1 on failure.
/// Backend options cannot cross the C boundary; `hw_opts` is ignored.
#[no_mangle]
pub unsafe extern "C" fn ese_open(ese: *mut EseInterface, _hw_opts: *const c_void) -> c_int {
    let Some(ese) = ese.as_mut() else {
        set_last_error(GenericError::InvalidHandle);
        return -1;
    };

    match ese.session.open(None) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Closes the session. Safe on a null or never opened handle.
#[no_mangle]
pub unsafe extern "C" fn ese_close(ese: *mut EseInterface) {
    if let Some(ese) = ese.as_mut() {
        ese.session.close();
    }
}

/// Sends `tx_len` bytes and receives at most `rx_max` bytes into `rx`.
/// Returns the number of bytes received, or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn ese_transceive(
    ese: *mut EseInterface,
    tx: *const u8,
    tx_len: u32,
    rx: *mut u8,
    rx_max: u32,
) -> c_int {
    let Some(ese) = ese.as_mut() else {
        set_last_error(GenericError::InvalidHandle);
        return -1;
    };

    match ese
        .session
        .transceive(bytes(tx, tx_len), bytes_mut(rx, rx_max))
    {
        Ok(received) => c_int::try_from(received).unwrap_or(c_int::MAX),
        Err(_) => -1,
    }
}

/// Whether the handle has an error latched. A null handle always has one.
#[no_mangle]
pub unsafe extern "C" fn ese_error(ese: *const EseInterface) -> bool {
    match ese.as_ref() {
        Some(ese) => ese.session.is_error(),
        None => true,
    }
}

/// Raw code of the latched error: negative for generic errors, an index in
/// the backend's table otherwise. 0 if nothing is latched.
#[no_mangle]
pub unsafe extern "C" fn ese_error_code(ese: *const EseInterface) -> c_int {
    match ese.as_ref() {
        Some(ese) => ese.session.error_code().map_or(0, |code| code.raw()),
        None => GenericError::InvalidHandle.raw(),
    }
}

/// Message of the latched error, an empty string if nothing is latched.
#[no_mangle]
pub unsafe extern "C" fn ese_error_message(ese: *mut EseInterface) -> *const c_char {
    let Some(ese) = ese.as_mut() else {
        return static_str(INVALID_HANDLE_MESSAGE);
    };

    match ese.session.error_message() {
        Some(message) => {
            ese.message = CString::new(message).unwrap_or_default();
            ese.message.as_ptr()
        }
        None => static_str(NO_MESSAGE),
    }
}

/// Latches the error behind `code`. No-op on a null handle.
/// Aborts the process if neither table has a message for `code`.
#[no_mangle]
pub unsafe extern "C" fn ese_set_error(ese: *mut EseInterface, code: c_int) {
    if let Some(ese) = ese.as_mut() {
        ese.session.set_error_code(code);
    }
}

/// Raw code of the last failure on this thread that happened without a
/// usable handle, 0 if there was none.
#[no_mangle]
pub extern "C" fn ese_last_error() -> c_int {
    LAST_ERROR.with(|last| last.get().map_or(0, |e| e.code().raw()))
}
