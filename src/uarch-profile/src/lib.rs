// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C4: Microarchitecture Profile.
//!
//! Static uncore PMON register/value tables, one per (class, µarch) pair.
//! These numbers are not discoverable at runtime; they come straight from
//! Intel's uncore performance monitoring manuals for each generation and are
//! reproduced here verbatim.

use platform::{Class, Uarch};

/// Errors raised while selecting a profile for a probed platform.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// (class, µarch) is recognized by [`platform`] but has no counter table
    /// here (Skylake-SP: recognized, but its server uncore layout was never
    /// reverse engineered for this tool).
    #[error("{0:?}/{1:?} has no uncore PMON profile")]
    NoProfile(Class, Uarch),
    /// The probed physical core count exceeds the µarch's slice count, which
    /// should be impossible for a correctly identified part.
    #[error("physical core count {nb_cores} exceeds max_slices {max_slices} for this microarchitecture")]
    TooManyCores {
        /// Physical core count reported by CPUID.
        nb_cores: u32,
        /// `max_slices` for the selected profile.
        max_slices: u32,
    },
}

/// Per-slice uncore CBo (Caching Box) register set for the Xeon PMON layout.
#[derive(Debug, Clone)]
pub struct XeonProfile {
    /// Number of LLC slices (== number of CBos).
    pub max_slices: u32,
    /// Per-slice free-running counter register (`MSR_C_PMON_CTR0`-style).
    pub ctr0: Vec<u32>,
    /// Per-slice box filter register.
    pub box_filter: Vec<u32>,
    /// Per-slice event-select register.
    pub ctl0: Vec<u32>,
    /// Per-slice box control register.
    pub box_ctl: Vec<u32>,
    /// Value written to `box_ctl` to freeze the box's counters.
    pub box_freeze: u64,
    /// Value written to `box_ctl` to reset the box's counters to zero.
    pub box_reset: u64,
    /// Value written to `ctl0` to enable counting.
    pub enable_counting: u64,
    /// Value written to `ctl0` selecting the LLC-lookup event.
    pub select_event: u64,
    /// Value written to `box_filter` selecting the address/opcode filter.
    pub filter: u64,
    /// Value written to `box_ctl` to unfreeze the box's counters.
    pub box_unfreeze: u64,
}

/// Uncore CBo register set for the Core (client) PMON layout.
#[derive(Debug, Clone)]
pub struct CoreProfile {
    /// Number of LLC slices (== number of CBos).
    pub max_slices: u32,
    /// Global enable/freeze register (`MSR_UNC_PERF_GLOBAL_CTR`).
    pub perf_global_ctr: u32,
    /// Per-slice event-select register.
    pub cbo_perfevtsel0: Vec<u32>,
    /// Per-slice free-running counter register.
    pub cbo_per_ctr0: Vec<u32>,
    /// Value written to `perf_global_ctr` to enable all configured counters.
    pub enable_ctrs: u64,
    /// Value written to `perf_global_ctr` to disable all counters.
    pub disable_ctrs: u64,
    /// Value written to each `cbo_perfevtsel0` entry selecting the LLC-lookup event.
    pub select_evt_core: u64,
    /// Value written to each `cbo_per_ctr0` entry to reset it to zero.
    pub reset_ctrs: u64,
}

/// The selected uncore PMON profile, plus the (possibly adjusted) physical
/// core count to drive it with.
#[derive(Debug, Clone)]
pub enum Profile {
    /// Server uncore layout.
    Xeon(XeonProfile),
    /// Client uncore layout.
    Core(CoreProfile),
}

impl Profile {
    /// Number of LLC slices this profile's counters cover.
    #[must_use]
    pub fn max_slices(&self) -> u32 {
        match self {
            Self::Xeon(p) => p.max_slices,
            Self::Core(p) => p.max_slices,
        }
    }
}

fn xeon_ctr0(base_hi: &[u32]) -> Vec<u32> {
    base_hi.to_vec()
}

/// Selects the uncore PMON profile for `class`/`uarch`, validating that
/// `nb_cores` physical cores fit within the profile's slice count.
///
/// On 8-core Skylake/Kaby Lake client parts one CBo is undocumented; the
/// returned `nb_cores` is clamped to 7 (the known CBos), matching the
/// original tool's special case, and the 8th slice's support set is deduced
/// afterwards rather than probed directly.
///
/// # Errors
///
/// [`Error::NoProfile`] if this (class, µarch) has no counter table, or
/// [`Error::TooManyCores`] if `nb_cores` exceeds `max_slices`.
pub fn profile_for(class: Class, uarch: Uarch, nb_cores: u32) -> Result<(Profile, u32), Error> {
    let profile = match (class, uarch) {
        (Class::Xeon, Uarch::SandyBridge) => Profile::Xeon(XeonProfile {
            max_slices: 8,
            ctr0: xeon_ctr0(&[0xd16, 0xd36, 0xd56, 0xd76, 0xd96, 0xdb6, 0xdd6, 0xdf6]),
            box_filter: xeon_ctr0(&[0xd14, 0xd34, 0xd54, 0xd74, 0xd94, 0xdb4, 0xdd4, 0xdf4]),
            ctl0: xeon_ctr0(&[0xd10, 0xd30, 0xd50, 0xd70, 0xd90, 0xdb0, 0xdd0, 0xdf0]),
            box_ctl: xeon_ctr0(&[0xd04, 0xd24, 0xd44, 0xd64, 0xd84, 0xda4, 0xdc4, 0xde4]),
            box_freeze: 0x1_0100,
            box_reset: 0x1_0103,
            enable_counting: 0x40_0000,
            select_event: 0x40_1134,
            filter: 0x7c_0000,
            box_unfreeze: 0x1_0000,
        }),
        (Class::Xeon, Uarch::IvyBridge) => Profile::Xeon(XeonProfile {
            max_slices: 15,
            ctr0: xeon_ctr0(&[
                0xd16, 0xd36, 0xd56, 0xd76, 0xd96, 0xdb6, 0xdd6, 0xdf6, 0xe16, 0xe36, 0xe56, 0xe76,
                0xe96, 0xeb6, 0xed6,
            ]),
            box_filter: xeon_ctr0(&[
                0xd14, 0xd34, 0xd54, 0xd74, 0xd94, 0xdb4, 0xdd4, 0xdf4, 0xe14, 0xe34, 0xe54, 0xe74,
                0xe94, 0xeb4, 0xed4,
            ]),
            ctl0: xeon_ctr0(&[
                0xd10, 0xd30, 0xd50, 0xd70, 0xd90, 0xdb0, 0xdd0, 0xdf0, 0xe10, 0xe30, 0xe50, 0xe70,
                0xe90, 0xeb0, 0xed0,
            ]),
            box_ctl: xeon_ctr0(&[
                0xd04, 0xd24, 0xd44, 0xd64, 0xd84, 0xda4, 0xdc4, 0xde4, 0xe04, 0xe24, 0xe44, 0xe64,
                0xe84, 0xea4, 0xec4,
            ]),
            box_freeze: 0x3_0100,
            box_reset: 0x3_0103,
            enable_counting: 0x40_0000,
            select_event: 0x40_1134,
            filter: 0x7e_0010,
            box_unfreeze: 0x3_0000,
        }),
        (Class::Xeon, Uarch::Haswell) => Profile::Xeon(XeonProfile {
            max_slices: 18,
            ctr0: xeon_ctr0(&[
                0xe08, 0xe18, 0xe28, 0xe38, 0xe48, 0xe58, 0xe68, 0xe78, 0xe88, 0xe98, 0xea8, 0xeb8,
                0xec8, 0xed8, 0xee8, 0xef8, 0xf08, 0xf18,
            ]),
            box_filter: xeon_ctr0(&[
                0xe05, 0xe15, 0xe25, 0xe35, 0xe45, 0xe55, 0xe65, 0xe75, 0xe85, 0xe95, 0xea5, 0xeb5,
                0xec5, 0xed5, 0xee5, 0xef5, 0xf05, 0xf15,
            ]),
            ctl0: xeon_ctr0(&[
                0xe01, 0xe11, 0xe21, 0xe31, 0xe41, 0xe51, 0xe61, 0xe71, 0xe81, 0xe91, 0xea1, 0xeb1,
                0xec1, 0xed1, 0xee1, 0xef1, 0xf01, 0xf11,
            ]),
            box_ctl: xeon_ctr0(&[
                0xe00, 0xe10, 0xe20, 0xe30, 0xe40, 0xe50, 0xe60, 0xe70, 0xe80, 0xe90, 0xea0, 0xeb0,
                0xec0, 0xed0, 0xee0, 0xef0, 0xf00, 0xf10,
            ]),
            box_freeze: 0x3_0100,
            box_reset: 0x3_0103,
            enable_counting: 0x40_0000,
            select_event: 0x40_1134,
            filter: 0x7e_0020,
            box_unfreeze: 0x3_0000,
        }),
        (Class::Xeon, Uarch::Broadwell) => Profile::Xeon(XeonProfile {
            max_slices: 24,
            ctr0: xeon_ctr0(&[
                0xe08, 0xe18, 0xe28, 0xe38, 0xe48, 0xe58, 0xe68, 0xe78, 0xe88, 0xe98, 0xea8, 0xeb8,
                0xec8, 0xed8, 0xee8, 0xef8, 0xf08, 0xf18, 0xf28, 0xf38, 0xf48, 0xf58, 0xf68, 0xf78,
            ]),
            box_filter: xeon_ctr0(&[
                0xe05, 0xe15, 0xe25, 0xe35, 0xe45, 0xe55, 0xe65, 0xe75, 0xe85, 0xe95, 0xea5, 0xeb5,
                0xec5, 0xed5, 0xee5, 0xef5, 0xf05, 0xf15, 0xf25, 0xf35, 0xf45, 0xf55, 0xf65, 0xf75,
            ]),
            ctl0: xeon_ctr0(&[
                0xe01, 0xe11, 0xe21, 0xe31, 0xe41, 0xe51, 0xe61, 0xe71, 0xe81, 0xe91, 0xea1, 0xeb1,
                0xec1, 0xed1, 0xee1, 0xef1, 0xf01, 0xf11, 0xf21, 0xf31, 0xf41, 0xf51, 0xf61, 0xf71,
            ]),
            box_ctl: xeon_ctr0(&[
                0xe00, 0xe10, 0xe20, 0xe30, 0xe40, 0xe50, 0xe60, 0xe70, 0xe80, 0xe90, 0xea0, 0xeb0,
                0xec0, 0xed0, 0xee0, 0xef0, 0xf00, 0xf10, 0xf20, 0xf30, 0xf40, 0xf50, 0xf60, 0xf70,
            ]),
            box_freeze: 0x3_0100,
            box_reset: 0x3_0103,
            enable_counting: 0x40_0000,
            select_event: 0x40_1134,
            filter: 0xfe_0020,
            box_unfreeze: 0x3_0000,
        }),
        (Class::Core, Uarch::Skylake | Uarch::KabyLake) => {
            let nb_cores = if nb_cores == 8 { 7 } else { nb_cores };
            return finish(
                Profile::Core(CoreProfile {
                    max_slices: 7,
                    perf_global_ctr: 0xe01,
                    cbo_perfevtsel0: vec![0x700, 0x710, 0x720, 0x730, 0x740, 0x750, 0x760],
                    cbo_per_ctr0: vec![0x706, 0x716, 0x726, 0x736, 0x746, 0x756, 0x766],
                    enable_ctrs: 0x2000_0000,
                    disable_ctrs: 0x0,
                    select_evt_core: 0x40_8f34,
                    reset_ctrs: 0x0,
                }),
                class,
                uarch,
                nb_cores,
            );
        }
        (Class::Core, Uarch::SandyBridge | Uarch::IvyBridge | Uarch::Haswell | Uarch::Broadwell) => {
            Profile::Core(CoreProfile {
                max_slices: 4,
                perf_global_ctr: 0x391,
                cbo_perfevtsel0: vec![0x700, 0x710, 0x720, 0x730],
                cbo_per_ctr0: vec![0x706, 0x716, 0x726, 0x736],
                enable_ctrs: 0x2000_000f,
                disable_ctrs: 0x0,
                select_evt_core: 0x40_8f34,
                reset_ctrs: 0x0,
            })
        }
        (c, u) => return Err(Error::NoProfile(c, u)),
    };

    finish(profile, class, uarch, nb_cores)
}

fn finish(profile: Profile, class: Class, uarch: Uarch, nb_cores: u32) -> Result<(Profile, u32), Error> {
    let max_slices = profile.max_slices();
    if nb_cores > max_slices {
        return Err(Error::TooManyCores { nb_cores, max_slices });
    }
    tracing::debug!(?class, ?uarch, max_slices, nb_cores, "selected uncore PMON profile");
    Ok((profile, nb_cores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandy_bridge_xeon_has_eight_slices() {
        let (profile, nb_cores) = profile_for(Class::Xeon, Uarch::SandyBridge, 8).unwrap();
        assert_eq!(profile.max_slices(), 8);
        assert_eq!(nb_cores, 8);
        match profile {
            Profile::Xeon(p) => assert_eq!(p.ctr0.len(), 8),
            Profile::Core(_) => panic!("expected Xeon profile"),
        }
    }

    #[test]
    fn broadwell_xeon_has_twenty_four_slices() {
        let (profile, _) = profile_for(Class::Xeon, Uarch::Broadwell, 22).unwrap();
        assert_eq!(profile.max_slices(), 24);
    }

    #[test]
    fn eight_core_skylake_client_clamps_to_seven() {
        let (profile, nb_cores) = profile_for(Class::Core, Uarch::Skylake, 8).unwrap();
        assert_eq!(nb_cores, 7);
        assert_eq!(profile.max_slices(), 7);
    }

    #[test]
    fn six_core_skylake_client_unclamped() {
        let (_, nb_cores) = profile_for(Class::Core, Uarch::Skylake, 6).unwrap();
        assert_eq!(nb_cores, 6);
    }

    #[test]
    fn pre_skylake_core_has_four_slices() {
        let (profile, _) = profile_for(Class::Core, Uarch::Haswell, 4).unwrap();
        assert_eq!(profile.max_slices(), 4);
    }

    #[test]
    fn skylake_sp_has_no_profile() {
        assert!(matches!(
            profile_for(Class::Xeon, Uarch::SkylakeSp, 1),
            Err(Error::NoProfile(Class::Xeon, Uarch::SkylakeSp))
        ));
    }

    #[test]
    fn too_many_cores_for_profile_is_rejected() {
        assert!(matches!(
            profile_for(Class::Core, Uarch::Haswell, 5),
            Err(Error::TooManyCores { nb_cores: 5, max_slices: 4 })
        ));
    }
}
