// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use mpbridge_core::fatal;
use mpbridge_core::handle::Consumable;

use crate::Status;

/// Either a value or the error that prevented producing one.
///
/// Reading the value of an error (or of a value that was already consumed)
/// is a program error and aborts, like in the wrapped library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOr<T> {
    inner: Result<Consumable<T>, Status>,
}

impl<T> StatusOr<T> {
    pub fn from_value(value: T) -> Self {
        Self {
            inner: Ok(Consumable::new(value)),
        }
    }

    /// An OK status carries no value, so it is stored as an internal error.
    pub fn from_status(status: Status) -> Self {
        let status = if status.ok() {
            Status::internal("OK status passed where an error status was expected")
        } else {
            status
        };
        Self { inner: Err(status) }
    }

    /// True while a value is held.
    pub fn ok(&self) -> bool {
        matches!(&self.inner, Ok(slot) if !slot.is_spent())
    }

    pub fn status(&self) -> Status {
        match &self.inner {
            Ok(slot) if slot.is_spent() => Status::failed_precondition("value has been consumed"),
            Ok(_) => Status::OK,
            Err(status) => status.clone(),
        }
    }

    pub fn value(&self) -> &T {
        match &self.inner {
            Ok(slot) => match slot.get() {
                Some(value) => value,
                None => fatal!("Attempting to fetch a value that has been consumed"),
            },
            Err(status) => fatal!("Attempting to fetch value instead of handling error {}", status),
        }
    }

    /// Moves the value out, leaving `self` spent.
    pub fn consume(&mut self) -> T {
        match &mut self.inner {
            Ok(slot) => match slot.consume() {
                Some(value) => value,
                None => fatal!("Attempting to consume a value that has been consumed"),
            },
            Err(status) => fatal!("Attempting to consume value instead of handling error {}", status),
        }
    }

    pub fn into_result(mut self) -> Result<T, Status> {
        let status = self.status();
        match &mut self.inner {
            Ok(slot) => slot.consume().ok_or(status),
            Err(_) => Err(status),
        }
    }
}

impl<T> From<Result<T, Status>> for StatusOr<T> {
    fn from(result: Result<T, Status>) -> Self {
        match result {
            Ok(value) => Self::from_value(value),
            Err(status) => Self::from_status(status),
        }
    }
}
