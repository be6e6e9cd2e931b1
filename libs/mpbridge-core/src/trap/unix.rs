// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::{c_int, c_void};
use std::io;
use std::marker::PhantomData;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::thread;

use parking_lot::Mutex;

use super::TrapOutcome;
use crate::{BridgeError, Result};

// native/abort_trap.c
unsafe extern "C" {
    fn mpb_abort_trap_run(body: unsafe extern "C" fn(*mut c_void), ctx: *mut c_void) -> c_int;
    fn mpb_abort_trap_handler(sig: c_int, info: *mut libc::siginfo_t, context: *mut c_void);
    fn mpb_abort_trap_set_chain(action: *const libc::sigaction);
    fn mpb_abort_trap_active() -> c_int;
}

// ============================================================================
// Disposition
// ============================================================================

fn trap_handler_address() -> libc::sighandler_t {
    let handler: unsafe extern "C" fn(c_int, *mut libc::siginfo_t, *mut c_void) =
        mpb_abort_trap_handler;
    handler as libc::sighandler_t
}

fn is_trap_handler(action: &libc::sigaction) -> bool {
    action.sa_sigaction == trap_handler_address()
}

/// Trapped calls active across all threads, and the disposition the first
/// of them replaced. The count only decides when that disposition comes
/// back; every call installs the handler itself.
struct Installed {
    active: usize,
    original: Option<libc::sigaction>,
}

static INSTALLED: Mutex<Installed> = parking_lot::const_mutex(Installed {
    active: 0,
    original: None,
});

/// Holds our `SIGABRT` handler in place for one trapped call and remembers
/// the disposition it replaced.
struct DispositionGuard {
    saved: libc::sigaction,
    first: bool,
    _not_send: PhantomData<*const ()>,
}

impl DispositionGuard {
    fn install() -> io::Result<Self> {
        let mut installed = INSTALLED.lock();

        // SAFETY: sigaction is plain data; all-zero is a valid empty mask.
        let mut action: libc::sigaction = unsafe { mem::zeroed() };
        action.sa_sigaction = trap_handler_address();
        action.sa_flags = libc::SA_SIGINFO;
        let mut previous: libc::sigaction = unsafe { mem::zeroed() };

        // SAFETY: both pointers reference live stack values.
        let rc = unsafe {
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(libc::SIGABRT, &action, &mut previous)
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }

        if !is_trap_handler(&previous) {
            // SAFETY: copied by the shim before it returns.
            unsafe { mpb_abort_trap_set_chain(&previous) };
        }

        let first = installed.active == 0;
        if first {
            installed.original = Some(previous);
        }
        installed.active += 1;
        tracing::trace!(
            previous = previous.sa_sigaction,
            active = installed.active,
            "Installed SIGABRT trap handler"
        );

        Ok(Self {
            saved: previous,
            first,
            _not_send: PhantomData,
        })
    }
}

impl Drop for DispositionGuard {
    fn drop(&mut self) {
        let mut installed = INSTALLED.lock();
        installed.active = installed.active.saturating_sub(1);

        // The last call out restores what it saw, or the original if it only
        // saw another call's handler. Earlier exits restore only dispositions
        // that some body set while the trap was up.
        let restore = if installed.active == 0 {
            let original = installed.original.take();
            if is_trap_handler(&self.saved) {
                original
            } else {
                Some(self.saved)
            }
        } else if self.first || is_trap_handler(&self.saved) {
            None
        } else {
            Some(self.saved)
        };

        let Some(restore) = restore else {
            return;
        };
        // SAFETY: `restore` was filled in by a successful sigaction call.
        let rc = unsafe { libc::sigaction(libc::SIGABRT, &restore, ptr::null_mut()) };
        if rc != 0 {
            tracing::error!(
                "Failed to restore SIGABRT disposition: {}",
                io::Error::last_os_error()
            );
        } else {
            tracing::trace!(
                restored = restore.sa_sigaction,
                "Restored SIGABRT disposition"
            );
        }
    }
}

// ============================================================================
// Protected region
// ============================================================================

struct Frame<F, R> {
    body: Option<F>,
    result: Option<thread::Result<R>>,
}

/// Entered from C. Unwinding must stop here, so panics are parked in the
/// frame and resumed once the C frame has returned.
unsafe extern "C" fn trampoline<F, R>(ctx: *mut c_void)
where
    F: FnOnce() -> R,
{
    // SAFETY: ctx is the `Frame<F, R>` passed by `run`, alive for the call.
    let frame = unsafe { &mut *ctx.cast::<Frame<F, R>>() };
    if let Some(body) = frame.body.take() {
        frame.result = Some(panic::catch_unwind(AssertUnwindSafe(body)));
    }
}

pub(super) fn run<R, F>(f: F) -> Result<TrapOutcome<R>>
where
    F: FnOnce() -> R,
{
    let _disposition = DispositionGuard::install().map_err(BridgeError::TrapSetup)?;

    let mut frame = Frame {
        body: Some(f),
        result: None,
    };

    // SAFETY: the trampoline is instantiated for this exact frame type.
    let trapped = unsafe {
        mpb_abort_trap_run(
            trampoline::<F, R>,
            (&mut frame as *mut Frame<F, R>).cast::<c_void>(),
        )
    };

    if trapped != 0 {
        return Ok(TrapOutcome::Aborted);
    }

    match frame.result.take() {
        Some(Ok(value)) => Ok(TrapOutcome::Completed(value)),
        Some(Err(payload)) => panic::resume_unwind(payload),
        None => Err(BridgeError::TrapSetup(io::Error::other(
            "trapped body returned without running",
        ))),
    }
}

pub(super) fn is_armed() -> bool {
    // SAFETY: reads a thread-local pointer, no arguments.
    unsafe { mpb_abort_trap_active() != 0 }
}

pub(super) fn abort_disposition() -> Option<usize> {
    // SAFETY: query-only sigaction into a zeroed local.
    let mut current: libc::sigaction = unsafe { mem::zeroed() };
    let rc = unsafe { libc::sigaction(libc::SIGABRT, ptr::null(), &mut current) };
    (rc == 0).then_some(current.sa_sigaction)
}
