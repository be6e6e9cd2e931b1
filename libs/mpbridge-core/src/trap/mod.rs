// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Thread-scoped interception of `SIGABRT`.
//!
//! [`run_trapped`] runs a closure so that a fatal check inside it (which
//! ends in `abort()`) jumps back to the trap instead of killing the
//! process. The jump target is thread-local and stacked, so traps nest on
//! one thread and run concurrently on many.
//!
//! # Skipped frames
//!
//! A trapped abort leaves the closure by `siglongjmp`. Nothing on the
//! skipped frames is dropped: owned values leak and held locks stay held.
//! Code reachable from a trapped closure must not abort while holding a
//! lock or an entered tracing span.
//!
//! # Disposition
//!
//! Every trapped call installs the handler and keeps the disposition it
//! replaced. Leaving a call restores that disposition when a body changed
//! it mid-call; the last call out, on any thread, puts back whatever was
//! there before the first one came in. A `SIGABRT` on a thread with no
//! jump target is forwarded to the disposition the handler replaced.
//!
//! On targets without POSIX signals the closure runs directly and
//! [`TrapOutcome::Aborted`] is never produced.

#[cfg(not(unix))]
mod fallback;
#[cfg(unix)]
mod unix;

#[cfg(not(unix))]
use fallback as imp;
#[cfg(unix)]
use unix as imp;

use std::cell::Cell;
use std::marker::PhantomData;

use crate::Result;

/// What happened to a trapped closure.
#[derive(Debug, PartialEq, Eq)]
pub enum TrapOutcome<R> {
    Completed(R),
    Aborted,
}

impl<R> TrapOutcome<R> {
    pub fn is_aborted(&self) -> bool {
        matches!(self, TrapOutcome::Aborted)
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Runs `f` with `SIGABRT` trapped on the calling thread.
///
/// A panic escaping `f` is carried across the native jump frame and resumed
/// here, so callers see it exactly as if `f` had been called directly.
///
/// Returns [`crate::BridgeError::TrapSetup`] if the handler could not be
/// installed; `f` has not run in that case.
pub fn run_trapped<R, F>(f: F) -> Result<TrapOutcome<R>>
where
    F: FnOnce() -> R,
{
    let _depth = DepthGuard::enter();
    imp::run(f)
}

/// Number of trapped calls active on the current thread.
pub fn depth() -> usize {
    DEPTH.with(Cell::get)
}

/// Whether the current thread has a live jump target.
pub fn is_armed() -> bool {
    imp::is_armed()
}

/// Address of the current `SIGABRT` handler (`SIG_DFL` is 0), for
/// comparing dispositions before and after a batch of calls.
pub fn abort_disposition() -> Option<usize> {
    imp::abort_disposition()
}

struct DepthGuard {
    _not_send: PhantomData<*const ()>,
}

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
