// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Top-level error type, composing every component's error via `#[from]` the
//! way the original firecracker binary composes its `MainError`. Each
//! variant carries the process exit code the original CLI used for that
//! failure class.

/// Errors that can abort a `reverse` run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Host CPU is not `GenuineIntel`, or its µarch has no counter profile.
    #[error("{0}")]
    Unsupported(String),
    /// Pinning the process to logical CPU 0 failed.
    #[error("failed to pin to CPU 0: {0}")]
    Affinity(#[from] utils::affinity::Error),
    /// Platform probe (C1) failed.
    #[error(transparent)]
    Platform(#[from] platform::Error),
    /// µarch profile selection (C4) failed.
    #[error(transparent)]
    Profile(#[from] uarch_profile::Error),
    /// MSR access (C2) failed.
    #[error(transparent)]
    Msr(#[from] msr::Error),
    /// Pagemap translation (C3) failed.
    #[error(transparent)]
    Pagemap(#[from] pagemap::Error),
    /// Huge-page allocation or reverse-map lookup (C7) failed.
    #[error(transparent)]
    PairGen(#[from] pair_gen::Error),
    /// A slice probe (C6) failed.
    #[error(transparent)]
    SliceProbe(#[from] slice_probe::Error),
}

impl From<crate::oracle::OracleError> for CliError {
    fn from(err: crate::oracle::OracleError) -> Self {
        Self::SliceProbe(err.0)
    }
}

impl From<hash_recovery::Error<crate::oracle::OracleError>> for CliError {
    fn from(err: hash_recovery::Error<crate::oracle::OracleError>) -> Self {
        match err {
            hash_recovery::Error::PairGen(err) => Self::PairGen(err),
            hash_recovery::Error::Oracle(err) => Self::from(err),
        }
    }
}

impl CliError {
    /// Maps this error to the process exit code the original CLI used for
    /// its failure class: 1 for configuration/allocation, 2-4 for MSR
    /// errors, 127 for other I/O.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unsupported(_) | Self::Profile(_) | Self::PairGen(_) => 1,
            Self::Msr(err) => err.exit_code(),
            Self::SliceProbe(slice_probe::Error::Pmon(slice_probe::pmon::Error::Msr(err))) => err.exit_code(),
            Self::Affinity(_) | Self::Platform(_) | Self::Pagemap(_) | Self::SliceProbe(_) => 127,
        }
    }
}
