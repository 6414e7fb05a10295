use std::ffi::{c_char, CString};
use std::ptr;

use boost_core::unicode;

use super::ffi_guard;

/// Normalize a word exactly as the corpus side does.
/// The caller must free the result with `pb_string_free`.
#[no_mangle]
pub extern "C" fn pb_normalize(word: *const c_char) -> *mut c_char {
    ffi_guard!(ptr::null_mut() ; str: word = word ,);
    match CString::new(unicode::normalize(word)) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Returns 1 if normalization would change the word.
#[no_mangle]
pub extern "C" fn pb_has_accents(word: *const c_char) -> u8 {
    ffi_guard!(0 ; str: word = word ,);
    unicode::has_accents(word) as u8
}

/// Free a string returned by `pb_normalize`. No-op if ptr is null.
#[no_mangle]
pub extern "C" fn pb_string_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}
