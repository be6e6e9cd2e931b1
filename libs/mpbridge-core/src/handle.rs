// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Ownership conventions for opaque handles.
//!
//! On the wire a handle is a bare address. On the Rust side the two ways
//! of holding one are distinct types:
//!
//! - [`Owned<T>`] is a native value the host will own once it is released
//!   with [`Owned::into_raw`]. The host must hand the address back to the
//!   type's `Destroy` function exactly once.
//! - [`Borrowed<'a, T>`] / [`BorrowedMut<'a, T>`] view a handle the host
//!   passed in as a parameter. They never free it and cannot outlive the
//!   call.
//!
//! Results are written through [`OutHandle`] and [`Out`], which clear the
//! host's slot first so that every failure path leaves it null.
//!
//! Double free and use after free are not detected here. Avoiding them is
//! the host's obligation.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::translate::{self, throw};

static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Handles released to the host and not yet destroyed.
pub fn live_handles() -> usize {
    LIVE_HANDLES.load(Ordering::SeqCst)
}

// ============================================================================
// Owned
// ============================================================================

/// A heap-resident native value that can be released to the host.
#[derive(Debug)]
pub struct Owned<T> {
    value: Box<T>,
}

impl<T> Owned<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Box::new(value),
        }
    }

    /// Gives up ownership to the host.
    pub fn into_raw(self) -> *mut T {
        LIVE_HANDLES.fetch_add(1, Ordering::SeqCst);
        Box::into_raw(self.value)
    }

    /// Takes back a handle produced by [`Owned::into_raw`]. `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or an address returned by `into_raw` for the same
    /// `T` that has not been reclaimed yet.
    pub unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| {
            LIVE_HANDLES.fetch_sub(1, Ordering::SeqCst);
            Self {
                // SAFETY: guaranteed by the caller.
                value: unsafe { Box::from_raw(ptr.as_ptr()) },
            }
        })
    }

    pub fn into_inner(self) -> T {
        *self.value
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Frees a host-owned handle. Null is a no-op. A panic while dropping the
/// value is logged and swallowed.
///
/// # Safety
///
/// Same contract as [`Owned::from_raw`].
pub unsafe fn destroy<T>(op: &'static str, ptr: *mut T) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    let owned = unsafe { Owned::from_raw(ptr) };
    if let Err(caught) = translate::translate(move || drop(owned)) {
        caught.log(op);
    }
}

// ============================================================================
// Borrowed
// ============================================================================

/// Shared view of a host-supplied handle, valid for the current call.
#[derive(Debug)]
pub struct Borrowed<'a, T> {
    value: &'a T,
}

impl<T> Clone for Borrowed<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Borrowed<'_, T> {}

impl<'a, T> Borrowed<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be null or point to a live `T` for `'a`.
    pub unsafe fn from_ptr(ptr: *const T) -> Option<Self> {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr.as_ref() }.map(|value| Self { value })
    }

    /// Like [`Borrowed::from_ptr`], but a null handle raises a
    /// [`crate::NativeException`] naming the parameter.
    ///
    /// # Safety
    ///
    /// Same contract as [`Borrowed::from_ptr`].
    pub unsafe fn require(ptr: *const T, name: &'static str) -> Self {
        // SAFETY: guaranteed by the caller.
        match unsafe { Self::from_ptr(ptr) } {
            Some(borrowed) => borrowed,
            None => null_parameter(name),
        }
    }

    pub fn get(self) -> &'a T {
        self.value
    }
}

impl<T> Deref for Borrowed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value
    }
}

/// Exclusive view of a host-supplied handle, valid for the current call.
#[derive(Debug)]
pub struct BorrowedMut<'a, T> {
    value: &'a mut T,
}

impl<'a, T> BorrowedMut<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be null or point to a live `T` for `'a` that nothing else
    /// accesses during the call.
    pub unsafe fn from_ptr(ptr: *mut T) -> Option<Self> {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr.as_mut() }.map(|value| Self { value })
    }

    /// # Safety
    ///
    /// Same contract as [`BorrowedMut::from_ptr`].
    pub unsafe fn require(ptr: *mut T, name: &'static str) -> Self {
        // SAFETY: guaranteed by the caller.
        match unsafe { Self::from_ptr(ptr) } {
            Some(borrowed) => borrowed,
            None => null_parameter(name),
        }
    }
}

impl<T> Deref for BorrowedMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value
    }
}

impl<T> DerefMut for BorrowedMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value
    }
}

#[cold]
fn null_parameter(name: &'static str) -> ! {
    tracing::warn!("Null pointer passed as {}", name);
    throw(format!("{} must not be null", name))
}

// ============================================================================
// Out-parameters
// ============================================================================

/// Host slot that receives a new owned handle.
#[derive(Debug)]
pub struct OutHandle<'a, T> {
    slot: NonNull<*mut T>,
    _slot: PhantomData<&'a mut *mut T>,
}

impl<T> OutHandle<'_, T> {
    /// Clears the slot to null. A null slot raises a
    /// [`crate::NativeException`].
    ///
    /// # Safety
    ///
    /// `slot` must be null or valid for writes for the duration of the call.
    pub unsafe fn new(slot: *mut *mut T, name: &'static str) -> Self {
        let Some(slot) = NonNull::new(slot) else {
            null_parameter(name)
        };
        // SAFETY: guaranteed by the caller.
        unsafe { slot.as_ptr().write(ptr::null_mut()) };
        Self {
            slot,
            _slot: PhantomData,
        }
    }

    pub fn write(self, value: Owned<T>) {
        // SAFETY: checked non-null and writable in `new`.
        unsafe { self.slot.as_ptr().write(value.into_raw()) };
    }

    /// Writes the handle, or leaves the slot null for `None`.
    pub fn write_option(self, value: Option<Owned<T>>) {
        if let Some(value) = value {
            self.write(value);
        }
    }
}

/// Host slot that receives a primitive or a buffer descriptor.
#[derive(Debug)]
pub struct Out<'a, T> {
    slot: NonNull<T>,
    _slot: PhantomData<&'a mut T>,
}

impl<T> Out<'_, T> {
    /// A null slot raises a [`crate::NativeException`]. The slot is left
    /// untouched until [`Out::write`].
    ///
    /// # Safety
    ///
    /// `slot` must be null or valid for writes for the duration of the call.
    pub unsafe fn new(slot: *mut T, name: &'static str) -> Self {
        let Some(slot) = NonNull::new(slot) else {
            null_parameter(name)
        };
        Self {
            slot,
            _slot: PhantomData,
        }
    }

    pub fn write(self, value: T) {
        // SAFETY: checked non-null and writable in `new`. The previous
        // contents are host memory and are not dropped.
        unsafe { self.slot.as_ptr().write(value) };
    }
}

impl<T> Out<'_, T> {
    /// Like [`Out::new`], then writes `empty` so that a failure later in the
    /// call leaves a defined value behind.
    ///
    /// # Safety
    ///
    /// Same contract as [`Out::new`].
    pub unsafe fn reset(slot: *mut T, name: &'static str, empty: T) -> Self {
        // SAFETY: guaranteed by the caller.
        let out = unsafe { Self::new(slot, name) };
        // SAFETY: as in `write`.
        unsafe { out.slot.as_ptr().write(empty) };
        out
    }
}

impl<T: Default> Out<'_, T> {
    /// [`Out::reset`] to `T::default()`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Out::new`].
    pub unsafe fn cleared(slot: *mut T, name: &'static str) -> Self {
        // SAFETY: guaranteed by the caller.
        unsafe { Self::reset(slot, name, T::default()) }
    }
}

// ============================================================================
// Consumable
// ============================================================================

/// Interior value that can be moved out once. Afterwards the holder is
/// spent and further access fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumable<T> {
    value: Option<T>,
}

impl<T> Consumable<T> {
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn consume(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn is_spent(&self) -> bool {
        self.value.is_none()
    }
}
