// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C5/C6: generating LLC traffic on a target address (the poker) and reading
//! off which slice absorbed it (the three probe backends).

pub mod pmon;
mod poker;
pub mod timing;

pub use pmon::{probe_core, probe_xeon, SliceReport};
pub use poker::{Poker, DEFAULT_POKES};
pub use timing::probe_clflush;

/// Errors raised by any of the three slice-probe backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Xeon or Core uncore-PMON backend failure.
    #[error(transparent)]
    Pmon(#[from] pmon::Error),
    /// clflush-timing backend failure.
    #[error(transparent)]
    Timing(#[from] timing::Error),
}
