// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host-owned copies of native data.
//!
//! Every buffer handed to the host is a fresh allocation that shares no
//! storage with the native value it was copied from, and is released only
//! by its matching free function.
//!
//! Empty is always `{null, 0}`: a non-null pointer always comes with a
//! positive length. Strings are NUL-terminated, so the empty string is a
//! null pointer too.
//!
//! Arrays of records ([`RecordArray`]) own whatever their records own.
//! [`RecordArray::free`] releases each record's nested buffers first and
//! the block last.

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::translate::throw;

static LIVE_ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

/// Host-owned blocks not yet freed. A composite buffer counts its block and
/// each nested child separately.
pub fn live_allocations() -> usize {
    LIVE_ALLOCATIONS.load(Ordering::SeqCst)
}

fn allocated() {
    LIVE_ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
}

fn released() {
    LIVE_ALLOCATIONS.fetch_sub(1, Ordering::SeqCst);
}

/// Converts a Rust length to the host's `int`. Throws on overflow.
pub fn length_to_c(len: usize) -> c_int {
    match c_int::try_from(len) {
        Ok(len) => len,
        Err(_) => throw(format!("buffer of {} elements exceeds the host size limit", len)),
    }
}

// ============================================================================
// Strings
// ============================================================================

/// Copies `value` into a NUL-terminated host string. Empty maps to null.
///
/// Raises a [`crate::NativeException`] if `value` contains a NUL byte.
pub fn copy_str(value: &str) -> *mut c_char {
    if value.is_empty() {
        return ptr::null_mut();
    }
    match CString::new(value) {
        Ok(copy) => {
            allocated();
            copy.into_raw()
        }
        Err(e) => throw(format!(
            "string contains a NUL byte at offset {}",
            e.nul_position()
        )),
    }
}

/// Frees a string from [`copy_str`]. Null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or come from [`copy_str`] and not have been freed.
pub unsafe fn free_str(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    released();
    // SAFETY: guaranteed by the caller.
    drop(unsafe { CString::from_raw(ptr) });
}

/// Borrows a host string for the duration of the call. Null maps to `None`.
///
/// Raises a [`crate::NativeException`] for invalid UTF-8.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string live for `'a`.
pub unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    let raw = unsafe { CStr::from_ptr(ptr) };
    match raw.to_str() {
        Ok(value) => Some(value),
        Err(e) => throw(format!("string is not valid UTF-8: {}", e)),
    }
}

/// Like [`read_str`], but null raises a [`crate::NativeException`].
///
/// # Safety
///
/// Same contract as [`read_str`].
pub unsafe fn require_str<'a>(ptr: *const c_char, name: &'static str) -> &'a str {
    // SAFETY: guaranteed by the caller.
    match unsafe { read_str(ptr) } {
        Some(value) => value,
        None => throw(format!("{} must not be null", name)),
    }
}

/// Borrows a host array of `len` elements. `{null, 0}` is the empty slice.
///
/// # Safety
///
/// `data` must be null or point to `len` initialized elements live for `'a`.
pub unsafe fn borrow_slice<'a, T>(data: *const T, len: c_int, name: &'static str) -> &'a [T] {
    let Ok(len) = usize::try_from(len) else {
        throw(format!("{} has negative length {}", name, len))
    };
    if len == 0 {
        return &[];
    }
    if data.is_null() {
        throw(format!("{} is null but has length {}", name, len));
    }
    // SAFETY: guaranteed by the caller.
    unsafe { slice::from_raw_parts(data, len) }
}

// ============================================================================
// Records
// ============================================================================

/// Fixed-size element of a [`RecordArray`].
///
/// # Safety
///
/// `release` must free exactly the host buffers this record owns, and leave
/// the record in a state where calling it again is harmless.
pub unsafe trait Record: Sized {
    /// Frees nested buffers owned by this record.
    ///
    /// # Safety
    ///
    /// Only called by [`RecordArray::free`], once per record, before the
    /// block is freed.
    unsafe fn release(&mut self) {}
}

unsafe impl Record for bool {}
unsafe impl Record for u8 {}
unsafe impl Record for i32 {}
unsafe impl Record for i64 {}
unsafe impl Record for f32 {}
unsafe impl Record for f64 {}

// ============================================================================
// Byte buffers
// ============================================================================

/// `{data, len}` copy of a byte string. Also the record type of serialized
/// message arrays.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBuffer {
    pub data: *mut u8,
    pub len: c_int,
}

/// A serialized message crossing the boundary.
pub type SerializedProto = ByteBuffer;

/// Array of serialized messages. Frees each message, then the array.
pub type SerializedProtoArray = RecordArray<SerializedProto>;

impl Default for ByteBuffer {
    fn default() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }
}

impl ByteBuffer {
    pub fn copy_from(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let len = length_to_c(bytes.len());
        let block: Box<[u8]> = bytes.into();
        allocated();
        Self {
            data: Box::into_raw(block).cast::<u8>(),
            len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_null()
    }

    /// # Safety
    ///
    /// `self` must come from [`ByteBuffer::copy_from`] and not have been freed.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.data.is_null() || self.len <= 0 {
            return &[];
        }
        // SAFETY: guaranteed by the caller.
        unsafe { slice::from_raw_parts(self.data, self.len as usize) }
    }

    /// Frees the copy. `{null, 0}` is a no-op.
    ///
    /// # Safety
    ///
    /// `self` must come from [`ByteBuffer::copy_from`] and not have been freed.
    pub unsafe fn free(self) {
        if self.data.is_null() {
            return;
        }
        released();
        let block = ptr::slice_from_raw_parts_mut(self.data, self.len.max(0) as usize);
        // SAFETY: allocated as a Box<[u8]> of exactly `len` bytes.
        drop(unsafe { Box::from_raw(block) });
    }
}

unsafe impl Record for ByteBuffer {
    unsafe fn release(&mut self) {
        // SAFETY: records of a RecordArray come from `copy_from`.
        unsafe { std::mem::take(self).free() };
    }
}

// ============================================================================
// Record arrays
// ============================================================================

/// `{data, size}` block of contiguous records.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub struct RecordArray<T> {
    pub data: *mut T,
    pub size: c_int,
}

impl<T> Default for RecordArray<T> {
    fn default() -> Self {
        Self {
            data: ptr::null_mut(),
            size: 0,
        }
    }
}

impl<T: Record> RecordArray<T> {
    /// Moves already-marshaled records into a host-owned block.
    pub fn from_vec(records: Vec<T>) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let size = length_to_c(records.len());
        allocated();
        Self {
            data: Box::into_raw(records.into_boxed_slice()).cast::<T>(),
            size,
        }
    }

    /// Copies plain records into a host-owned block.
    pub fn copy_from(records: &[T]) -> Self
    where
        T: Copy,
    {
        Self::from_vec(records.to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_null()
    }

    /// # Safety
    ///
    /// `self` must come from this type's constructors and not have been freed.
    pub unsafe fn as_slice(&self) -> &[T] {
        if self.data.is_null() || self.size <= 0 {
            return &[];
        }
        // SAFETY: guaranteed by the caller.
        unsafe { slice::from_raw_parts(self.data, self.size as usize) }
    }

    /// Releases every record's nested buffers, then the block.
    ///
    /// # Safety
    ///
    /// `self` must come from this type's constructors and not have been freed.
    pub unsafe fn free(self) {
        if self.data.is_null() {
            return;
        }
        let block = ptr::slice_from_raw_parts_mut(self.data, self.size.max(0) as usize);
        // SAFETY: allocated as a Box<[T]> of exactly `size` records.
        let mut records = unsafe { Box::from_raw(block) };
        for record in records.iter_mut() {
            // SAFETY: each record is released exactly once, here.
            unsafe { record.release() };
        }
        released();
        drop(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReturnCode;
    use crate::call::guard_exceptions;
    use serial_test::serial;

    #[test]
    #[serial]
    fn string_copy_is_independent_of_the_source() {
        let before = live_allocations();
        let source = String::from("hello");
        let copy = copy_str(&source);
        drop(source);

        assert_eq!(unsafe { read_str(copy) }, Some("hello"));
        assert_eq!(live_allocations(), before + 1);
        unsafe { free_str(copy) };
        assert_eq!(live_allocations(), before);
    }

    #[test]
    #[serial]
    fn empty_string_is_null() {
        let before = live_allocations();
        let copy = copy_str("");
        assert!(copy.is_null());
        assert_eq!(unsafe { read_str(copy) }, None);
        unsafe { free_str(copy) };
        assert_eq!(live_allocations(), before);
    }

    #[test]
    fn interior_nul_is_standard_error() {
        let code = guard_exceptions("test_copy_str", || {
            let _ = copy_str("a\0b");
        });
        assert_eq!(code, ReturnCode::StandardError);
    }

    #[test]
    #[serial]
    fn byte_buffer_round_trip() {
        let bytes = [0_u8, 1, 2, 255, 0];
        let buffer = ByteBuffer::copy_from(&bytes);
        assert_eq!(buffer.len, 5);
        assert_eq!(unsafe { buffer.as_slice() }, &bytes);
        unsafe { buffer.free() };
    }

    #[test]
    fn empty_byte_buffer_is_null() {
        let buffer = ByteBuffer::copy_from(&[]);
        assert!(buffer.data.is_null());
        assert_eq!(buffer.len, 0);
        assert!(unsafe { buffer.as_slice() }.is_empty());
    }

    #[test]
    #[serial]
    fn nested_array_frees_every_child() {
        let before = live_allocations();
        let messages = vec![
            ByteBuffer::copy_from(b"first"),
            ByteBuffer::copy_from(b""),
            ByteBuffer::copy_from(b"third"),
        ];
        let array = SerializedProtoArray::from_vec(messages);
        // Two non-empty children plus the block.
        assert_eq!(live_allocations(), before + 3);

        let copied: Vec<Vec<u8>> = unsafe { array.as_slice() }
            .iter()
            .map(|m| unsafe { m.as_slice() }.to_vec())
            .collect();
        assert_eq!(copied, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);

        unsafe { array.free() };
        assert_eq!(live_allocations(), before);
    }

    #[test]
    #[serial]
    fn scalar_array_round_trip() {
        let values = [1.5_f32, -0.25, 3.0];
        let array = RecordArray::copy_from(&values);
        assert_eq!(array.size, 3);
        assert_eq!(unsafe { array.as_slice() }, &values);
        unsafe { array.free() };

        let empty = RecordArray::<f32>::copy_from(&[]);
        assert!(empty.is_empty());
        unsafe { empty.free() };
    }

    #[test]
    fn borrow_slice_accepts_null_empty() {
        let empty = unsafe { borrow_slice::<f32>(ptr::null(), 0, "values") };
        assert!(empty.is_empty());
    }

    #[test]
    fn borrow_slice_rejects_null_with_length() {
        let code = guard_exceptions("test_borrow_slice", || {
            let _ = unsafe { borrow_slice::<f32>(ptr::null(), 4, "values") };
        });
        assert_eq!(code, ReturnCode::StandardError);
    }
}
