// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Safety boundary between a garbage-collected host and native code.
//!
//! Every exposed operation runs through [`call::guard_exceptions`] or
//! [`call::guard_all`], which turn panics and trapped `SIGABRT`s into a
//! [`ReturnCode`] so that nothing unwinds or aborts across the C ABI.
//! Values cross the boundary either as opaque handles ([`handle`]) or as
//! flat host-owned copies ([`marshal`]).
//!
//! ```ignore
//! use mpbridge_core::{call, handle, ReturnCode};
//!
//! #[unsafe(no_mangle)]
//! pub unsafe extern "C" fn mp_Widget__Create(out: *mut *mut Widget) -> ReturnCode {
//!     call::guard_exceptions("mp_Widget__Create", || {
//!         let slot = unsafe { handle::OutHandle::new(out, "widget_out") };
//!         slot.write(handle::Owned::new(Widget::default()));
//!     })
//! }
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod fatal;
pub mod handle;
pub mod logging;
pub mod marshal;
pub mod return_code;
pub mod translate;
pub mod trap;

pub use call::{Guard, guard_all, guard_exceptions};
pub use config::LoggingConfig;
pub use error::{BridgeError, Result};
pub use return_code::ReturnCode;
pub use translate::{NativeException, throw};
