// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Abort trap integration tests.
//!
//! Every test here observes the process-wide SIGABRT disposition, so all of
//! them run serially.

#![cfg(unix)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use serial_test::serial;

use mpbridge_core::trap::{self, TrapOutcome};
use mpbridge_core::{ReturnCode, check, check_eq, fatal, guard_all, guard_exceptions, throw};

// =============================================================================
// Single calls
// =============================================================================

#[test]
#[serial]
fn fatal_check_is_reported_as_aborted() {
    let code = guard_all("test_fatal", || {
        let ready = false;
        check!(ready, "pipeline not ready");
    });
    assert_eq!(code, ReturnCode::Aborted);
    assert_eq!(trap::depth(), 0);
    assert!(!trap::is_armed());
}

#[test]
#[serial]
fn check_eq_mismatch_aborts() {
    let code = guard_all("test_check_eq", || check_eq!(2 + 2, 5));
    assert_eq!(code, ReturnCode::Aborted);
}

#[test]
#[serial]
fn passing_checks_complete_normally() {
    let code = guard_all("test_checks_pass", || {
        check!(1 < 2);
        check_eq!("a", "a");
    });
    assert_eq!(code, ReturnCode::Success);
}

#[test]
#[serial]
fn run_trapped_reports_the_boolean_outcome() {
    let completed = trap::run_trapped(|| 9).unwrap();
    assert_eq!(completed, TrapOutcome::Completed(9));

    let aborted = trap::run_trapped(|| -> u32 { fatal!("unreachable state") }).unwrap();
    assert!(aborted.is_aborted());
}

#[test]
#[serial]
fn panic_inside_trap_reaches_the_translator() {
    let code = guard_all("test_panic_in_trap", || throw("thrown under the trap"));
    assert_eq!(code, ReturnCode::StandardError);
    assert_eq!(trap::depth(), 0);
}

// =============================================================================
// Disposition restore
// =============================================================================

#[test]
#[serial]
fn disposition_is_restored_after_every_outcome() {
    let before = trap::abort_disposition().unwrap();

    for i in 0..30 {
        let code = guard_all("test_mixed", || match i % 3 {
            0 => {}
            1 => throw("recoverable"),
            _ => fatal!("fatal"),
        });
        let expected = match i % 3 {
            0 => ReturnCode::Success,
            1 => ReturnCode::StandardError,
            _ => ReturnCode::Aborted,
        };
        assert_eq!(code, expected);
        assert_eq!(trap::abort_disposition().unwrap(), before);
    }
}

#[test]
#[serial]
fn host_installed_disposition_survives() {
    extern "C" fn host_handler(_sig: libc::c_int) {}

    let host: extern "C" fn(libc::c_int) = host_handler;
    let original = unsafe { libc::signal(libc::SIGABRT, host as libc::sighandler_t) };
    let installed = trap::abort_disposition().unwrap();
    assert_eq!(installed, host as libc::sighandler_t);

    assert_eq!(guard_all("test_host", || fatal!("boom")), ReturnCode::Aborted);
    assert_eq!(guard_all("test_host", || {}), ReturnCode::Success);
    assert_eq!(trap::abort_disposition().unwrap(), installed);

    unsafe { libc::signal(libc::SIGABRT, original) };
}

#[test]
#[serial]
fn exception_only_variant_leaves_disposition_alone() {
    let before = trap::abort_disposition().unwrap();
    let code = guard_exceptions("test_plain", || {
        assert_eq!(trap::abort_disposition().unwrap(), before);
        assert!(!trap::is_armed());
    });
    assert_eq!(code, ReturnCode::Success);
}

#[test]
#[serial]
fn inner_call_traps_after_body_replaces_the_handler() {
    extern "C" fn body_handler(_sig: libc::c_int) {}

    let before = trap::abort_disposition().unwrap();
    let body: extern "C" fn(libc::c_int) = body_handler;
    let mut inner_code = ReturnCode::Unset;
    let mut after_inner = 0;

    let outer_code = guard_all("test_outer_replaces", || {
        unsafe { libc::signal(libc::SIGABRT, body as libc::sighandler_t) };
        inner_code = guard_all("test_inner_after_replace", || fatal!("inner failure"));
        after_inner = trap::abort_disposition().unwrap();
    });

    assert_eq!(inner_code, ReturnCode::Aborted);
    assert_eq!(outer_code, ReturnCode::Success);
    // The inner call hands back what it found.
    assert_eq!(after_inner, body as libc::sighandler_t);
    assert_eq!(trap::abort_disposition().unwrap(), before);
}

static HOST_SAW_ABORT: AtomicBool = AtomicBool::new(false);

extern "C" fn recording_handler(_sig: libc::c_int) {
    HOST_SAW_ABORT.store(true, Ordering::SeqCst);
}

#[test]
#[serial]
fn abort_outside_any_trap_reaches_the_host_handler() {
    HOST_SAW_ABORT.store(false, Ordering::SeqCst);
    let host: extern "C" fn(libc::c_int) = recording_handler;
    let original = unsafe { libc::signal(libc::SIGABRT, host as libc::sighandler_t) };

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let worker = thread::spawn(move || {
        guard_all("test_held_open", move || {
            entered_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
    });
    entered_rx.recv().unwrap();

    // The worker's trap handler is installed, but this thread has no target.
    assert!(!trap::is_armed());
    assert_ne!(trap::abort_disposition().unwrap(), host as libc::sighandler_t);
    unsafe { libc::raise(libc::SIGABRT) };
    assert!(HOST_SAW_ABORT.load(Ordering::SeqCst));

    release_tx.send(()).unwrap();
    assert_eq!(worker.join().unwrap(), ReturnCode::Success);
    assert_eq!(trap::abort_disposition().unwrap(), host as libc::sighandler_t);

    unsafe { libc::signal(libc::SIGABRT, original) };
}

// =============================================================================
// Nesting
// =============================================================================

#[test]
#[serial]
fn inner_abort_does_not_disturb_the_outer_call() {
    let before = trap::abort_disposition().unwrap();
    let mut inner_code = ReturnCode::Unset;

    let outer_code = guard_all("test_outer", || {
        let outer_disposition = trap::abort_disposition().unwrap();
        assert_eq!(trap::depth(), 1);

        inner_code = guard_all("test_inner", || {
            assert_eq!(trap::depth(), 2);
            fatal!("inner failure");
        });

        assert_eq!(trap::depth(), 1);
        assert!(trap::is_armed());
        assert_eq!(trap::abort_disposition().unwrap(), outer_disposition);
    });

    assert_eq!(inner_code, ReturnCode::Aborted);
    assert_eq!(outer_code, ReturnCode::Success);
    assert_eq!(trap::abort_disposition().unwrap(), before);
}

#[test]
#[serial]
fn outer_trap_catches_abort_after_inner_returns() {
    let mut inner_code = ReturnCode::Unset;
    let outer_code = guard_all("test_outer", || {
        inner_code = guard_all("test_inner", || {});
        fatal!("outer failure after inner success");
    });
    assert_eq!(inner_code, ReturnCode::Success);
    assert_eq!(outer_code, ReturnCode::Aborted);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
#[serial]
fn concurrent_guarded_calls_count_aborts_exactly() {
    const THREADS: usize = 8;
    const CALLS: usize = 10_000;

    let before = trap::abort_disposition().unwrap();
    let aborted = Arc::new(AtomicUsize::new(0));
    let triggered = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let aborted = Arc::clone(&aborted);
            let triggered = Arc::clone(&triggered);
            thread::spawn(move || {
                for i in (t..CALLS).step_by(THREADS) {
                    let trigger = i % 2 == 0;
                    if trigger {
                        triggered.fetch_add(1, Ordering::SeqCst);
                    }

                    let code = guard_all("test_concurrent", || {
                        if trigger {
                            fatal!("call {} on thread {}", i, t);
                        }
                    });

                    match code {
                        ReturnCode::Aborted => {
                            aborted.fetch_add(1, Ordering::SeqCst);
                        }
                        ReturnCode::Success => {}
                        other => panic!("unexpected return code {}", other),
                    }
                    assert_eq!(code == ReturnCode::Aborted, trigger);
                    assert_eq!(trap::depth(), 0);
                    assert!(!trap::is_armed());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(triggered.load(Ordering::SeqCst), CALLS / 2);
    assert_eq!(aborted.load(Ordering::SeqCst), CALLS / 2);
    assert_eq!(trap::abort_disposition().unwrap(), before);
}
