//! C API for the on-device decoder.
//!
//! `trie` exposes the compiled prefix-boost automaton, `text` the word
//! normalizer. Helpers and macros shared by both live here.

use std::ffi::{c_char, CStr};
use std::path::Path;

pub mod text;
pub mod trie;


pub use text::*;
pub use trie::*;

/// Allocate a value on the heap and return a raw pointer suitable for FFI.
/// The caller is responsible for eventually passing the pointer to [`owned_drop`].
pub(crate) fn owned_new<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Free a heap-allocated value previously created by [`owned_new`].
/// No-op if `ptr` is null.
///
/// # Safety
/// `ptr` must have been produced by [`owned_new`] and not freed already.
pub(crate) unsafe fn owned_drop<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Returns `None` if the pointer is null or not valid UTF-8.
pub(crate) unsafe fn cptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Validate FFI arguments and bind them as safe values, returning `$on_err`
/// from the calling function if any check fails.
///
/// | Syntax | What it does |
/// |--------|--------------|
/// | `str: $name = $ptr` | Null-check a `*const c_char` and bind it as `&str`. |
/// | `ref: $name = $ptr` | Null-check a `*const T` and bind it as `&T`. |
/// | `chr: $name = $code` | Convert a `u32` code point and bind it as `char`. |
macro_rules! ffi_guard {
    ($on_err:expr ; ) => {};

    ($on_err:expr ; str: $name:ident = $ptr:expr , $($rest:tt)*) => {
        let Some($name) = (unsafe { $crate::ffi::cptr_to_str($ptr) }) else {
            return $on_err;
        };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };

    ($on_err:expr ; ref: $name:ident = $ptr:expr , $($rest:tt)*) => {
        if $ptr.is_null() {
            return $on_err;
        }
        let $name = unsafe { &*$ptr };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };

    ($on_err:expr ; chr: $name:ident = $code:expr , $($rest:tt)*) => {
        let Some($name) = char::from_u32($code) else {
            return $on_err;
        };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };
}

/// Define an `extern "C"` function that frees a heap-allocated resource.
macro_rules! ffi_close {
    ($fn_name:ident, $T:ty) => {
        #[no_mangle]
        pub extern "C" fn $fn_name(ptr: *mut $T) {
            unsafe { $crate::ffi::owned_drop(ptr) };
        }
    };
}

pub(crate) use ffi_close;
pub(crate) use ffi_guard;

#[no_mangle]
pub extern "C" fn pb_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// Format version of the trie files this library reads.
#[no_mangle]
pub extern "C" fn pb_format_version() -> u32 {
    boost_core::automaton::VERSION
}

#[no_mangle]
#[allow(clippy::unused_unit)]
pub extern "C" fn pb_trace_init(log_dir: *const c_char) {
    ffi_guard!(();
        str: dir_str = log_dir,
    );
    crate::trace_init::init_tracing(Path::new(dir_str));
}
