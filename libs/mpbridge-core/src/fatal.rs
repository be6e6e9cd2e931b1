// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Invariant checks that terminate the process.
//!
//! A failed check logs the condition and calls `abort()`, raising `SIGABRT`.
//! Inside [`crate::guard_all`] that becomes [`crate::ReturnCode::Aborted`];
//! anywhere else the process dies.

use std::fmt;

#[cold]
#[inline(never)]
pub fn abort_with(file: &'static str, line: u32, message: fmt::Arguments<'_>) -> ! {
    tracing::error!("Check failed at {}:{}: {}", file, line, message);
    std::process::abort()
}

/// Unconditional fatal error.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        $crate::fatal::abort_with(::std::file!(), ::std::line!(), ::std::format_args!($($arg)+))
    };
}

/// Aborts unless `cond` holds.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::fatal::abort_with(
                ::std::file!(),
                ::std::line!(),
                ::std::format_args!("{}", ::std::stringify!($cond)),
            )
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::fatal::abort_with(
                ::std::file!(),
                ::std::line!(),
                ::std::format_args!("{}: {}", ::std::stringify!($cond), ::std::format_args!($($arg)+)),
            )
        }
    };
}

/// Aborts unless `left == right`, logging both values.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    $crate::fatal::abort_with(
                        ::std::file!(),
                        ::std::line!(),
                        ::std::format_args!(
                            "{} == {} ({:?} vs. {:?})",
                            ::std::stringify!($left),
                            ::std::stringify!($right),
                            left,
                            right
                        ),
                    )
                }
            }
        }
    };
}
