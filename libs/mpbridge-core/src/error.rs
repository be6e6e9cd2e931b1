// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::ReturnCode;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Boundary call failed: {0}")]
    Call(ReturnCode),

    #[error("Failed to install abort trap: {0}")]
    TrapSetup(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
