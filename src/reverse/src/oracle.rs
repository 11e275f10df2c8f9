// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Adapts whichever C6 backend was selected to [`hash_recovery::SliceOracle`],
//! so C8 never needs to know which of the three it's driving.

use hash_recovery::SliceOracle;

/// Error raised by any backend while acting as a slice oracle.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct OracleError(#[from] slice_probe::Error);

/// The selected C6 backend, holding exactly the state that backend needs.
pub enum Backend<'a> {
    /// Xeon uncore CBo counters.
    Xeon {
        /// MSR gateway, pinned to CPU 0 by the orchestrator.
        gateway: &'a msr::Gateway,
        /// Selected Xeon register/value table.
        profile: &'a uarch_profile::XeonProfile,
        /// Shared poker.
        poker: &'a mut slice_probe::Poker,
        /// Pokes per probe.
        pokes: u32,
    },
    /// Core (client) uncore CBo counters.
    Core {
        /// MSR gateway, pinned to CPU 0 by the orchestrator.
        gateway: &'a msr::Gateway,
        /// Selected Core register/value table.
        profile: &'a uarch_profile::CoreProfile,
        /// Physical core count (post Skylake/Kaby-Lake 8-core clamp).
        nb_cores: u32,
        /// Shared poker.
        poker: &'a mut slice_probe::Poker,
        /// Pokes per probe.
        pokes: u32,
    },
    /// clflush-timing backend.
    Clflush {
        /// Probed platform info (APIC-to-core mapping, thread counts).
        platform: &'a platform::Platform,
    },
}

impl SliceOracle for Backend<'_> {
    type Error = OracleError;

    fn slice(&mut self, addr: u64) -> Result<u32, OracleError> {
        // SAFETY: `addr` is a physical-address-known virtual address produced
        // by C7, backed by mapped huge-page memory for the lifetime of this call.
        let ptr = addr as *const u8;
        match self {
            Self::Xeon { gateway, profile, poker, pokes } => {
                let report = slice_probe::probe_xeon(gateway, profile, poker, ptr, *pokes)
                    .map_err(slice_probe::Error::from)?;
                Ok(report.slice)
            }
            Self::Core { gateway, profile, nb_cores, poker, pokes } => {
                let report = slice_probe::probe_core(gateway, profile, *nb_cores, poker, ptr, *pokes)
                    .map_err(slice_probe::Error::from)?;
                Ok(report.slice)
            }
            Self::Clflush { platform } => {
                let slice = slice_probe::probe_clflush(platform, ptr).map_err(slice_probe::Error::from)?;
                Ok(slice)
            }
        }
    }
}
