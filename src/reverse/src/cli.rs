// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Command-line surface, matching the original tool's flag names with two
//! additions (`--pokes`, `--samples`) that expose previously hardcoded
//! tuning constants.

use clap::Parser;

/// Reverse engineers Intel's undocumented LLC slice-selection hash function.
#[derive(Debug, Parser)]
#[command(name = "reverse", version, about)]
pub struct Cli {
    /// Emit slice labels for 20 consecutive 64-byte offsets of a stack buffer instead of recovering the hash.
    #[arg(short = 's', long)]
    pub scan: bool,

    /// Use the clflush-timing backend instead of uncore PMON counters.
    #[arg(short = 'f', long)]
    pub clflush: bool,

    /// Lower the log filter to debug.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Number of `clflush` iterations per poke.
    #[arg(long, default_value_t = slice_probe::DEFAULT_POKES)]
    pub pokes: u32,

    /// Address pairs sampled per candidate bit during hash recovery. Defaults
    /// to the selected CPU class's documented sample count (500 for Core, 100
    /// for Xeon) when unset.
    #[arg(long)]
    pub samples: Option<usize>,
}
