// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

#![allow(clippy::disallowed_macros)]

fn main() {
    println!("cargo:rerun-if-changed=native/abort_trap.c");

    // The trap relies on POSIX signals; other targets run guarded calls
    // without it and never report an abort.
    let family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if family.split(',').any(|f| f == "unix") {
        cc::Build::new()
            .file("native/abort_trap.c")
            .warnings(true)
            .compile("mpbridge_abort_trap");
    }
}
