// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::TrapOutcome;
use crate::Result;

pub(super) fn run<R, F>(f: F) -> Result<TrapOutcome<R>>
where
    F: FnOnce() -> R,
{
    Ok(TrapOutcome::Completed(f()))
}

pub(super) fn is_armed() -> bool {
    false
}

pub(super) fn abort_disposition() -> Option<usize> {
    None
}
