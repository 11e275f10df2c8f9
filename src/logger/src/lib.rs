// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Structured logging setup.
//!
//! Diagnostics (progress, warnings, errors) go through `tracing` to stderr.
//! The stable, scriptable report lines the orchestrator prints for `--scan`
//! and `--reverse` are a separate output contract and are never routed
//! through this logger.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `verbose` lowers the default filter from `info` to `debug`; the
/// `RUST_LOG` environment variable, if set, always takes precedence.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
