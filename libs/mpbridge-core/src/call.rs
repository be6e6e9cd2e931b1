// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The invocation pattern shared by every exposed operation.
//!
//! The body writes its results through out-parameters and returns `()`.
//! The wrapper owns the return code: it starts `Unset`, becomes `Success`
//! only when the body returns normally, and otherwise records the single
//! failure that ended the call.

use std::panic::{self, AssertUnwindSafe};

use crate::ReturnCode;
use crate::error::Result;
use crate::translate;
use crate::trap::{self, TrapOutcome};

/// Which failure classes a boundary call survives.
///
/// `Exceptions` is cheaper (no signal handler install), but a fatal check
/// reached under it terminates the process. Operations that can reach a
/// fatal check must use `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Exceptions,
    All,
}

/// Runs `f` catching panics only.
pub fn guard_exceptions<F>(op: &'static str, f: F) -> ReturnCode
where
    F: FnOnce(),
{
    guarded(Guard::Exceptions, op, f)
}

/// Runs `f` catching panics and trapping `SIGABRT`.
pub fn guard_all<F>(op: &'static str, f: F) -> ReturnCode
where
    F: FnOnce(),
{
    guarded(Guard::All, op, f)
}

pub fn guarded<F>(guard: Guard, op: &'static str, f: F) -> ReturnCode
where
    F: FnOnce(),
{
    let _span = tracing::trace_span!("boundary_call", op).entered();
    let mut state = CallState::new();

    let outcome = translate::translate(|| -> Result<TrapOutcome<()>> {
        match guard {
            Guard::Exceptions => Ok(TrapOutcome::Completed(f())),
            Guard::All => trap::run_trapped(f),
        }
    });

    match outcome {
        Ok(Ok(TrapOutcome::Completed(()))) => state.settle(ReturnCode::Success),
        Ok(Ok(TrapOutcome::Aborted)) => {
            log_failure(op, "Aborted");
            state.settle(ReturnCode::Aborted);
        }
        Ok(Err(e)) => {
            log_failure(op, &e.to_string());
            state.settle(ReturnCode::UnknownError);
        }
        Err(caught) => {
            caught.log(op);
            state.settle(caught.return_code());
        }
    }

    state.finish(op)
}

/// Return-code state of one call. Settles at most once.
struct CallState {
    code: ReturnCode,
}

impl CallState {
    fn new() -> Self {
        Self {
            code: ReturnCode::Unset,
        }
    }

    fn settle(&mut self, code: ReturnCode) {
        debug_assert_eq!(self.code, ReturnCode::Unset, "boundary call settled twice");
        self.code = code;
    }

    fn finish(self, op: &str) -> ReturnCode {
        if self.code == ReturnCode::Unset {
            log_failure(op, "Boundary call finished without an outcome");
            return ReturnCode::UnknownError;
        }
        self.code
    }
}

fn log_failure(op: &str, message: &str) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| tracing::error!(op, "{}", message)));
}
