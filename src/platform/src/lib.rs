// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C1: Platform Probe.
//!
//! A one-shot query of the host's CPU identity: vendor, raw display model,
//! physical core count and the APIC-to-core mapping needed to pin the timing
//! backend's histogram to a specific physical core later on. Dispatching the
//! display model to a `(Class, Uarch)` pair is a separate, fallible step
//! ([`dispatch`]) left to callers that actually need a resolved class, since
//! it's the one part of this probe that can fail on an unrecognized CPU.

pub mod cpuinfo;

use bit_fields::BitRange;

/// CPU class: whether the uncore counter layout is the Xeon (many CBos,
/// per-slice filter registers) or Core (client, `UNC_PERF_GLOBAL_CTR`) shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// Client part.
    Core,
    /// Server part.
    Xeon,
}

/// Microarchitecture generation, used to key the [`uarch-profile`](../uarch_profile)
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uarch {
    /// Sandy Bridge.
    SandyBridge,
    /// Ivy Bridge.
    IvyBridge,
    /// Haswell.
    Haswell,
    /// Broadwell.
    Broadwell,
    /// Skylake (client).
    Skylake,
    /// Kaby Lake (and Coffee Lake, which is identical in practice).
    KabyLake,
    /// Skylake server. Recognised but unsupported by the counter backends.
    SkylakeSp,
}

/// Errors raised while probing the host platform.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CPUID leaf 0 did not report `GenuineIntel`.
    #[error("CPU vendor is not GenuineIntel")]
    NotIntel,
    /// The display model from CPUID leaf 1 has no (class, µarch) mapping.
    #[error("unrecognized CPU display model {0}")]
    UnsupportedModel(u32),
    /// Display model maps to a known but explicitly unsupported µarch (Skylake-SP).
    #[error("{0:?} is recognized but not supported by the counter backends")]
    UnsupportedUarch(Uarch),
    /// `nb_cores` exceeds the µarch's `max_slices`, which cannot happen on a
    /// correctly identified part.
    #[error("physical core count {nb_cores} exceeds max_slices {max_slices}")]
    Incoherent {
        /// Physical core count derived from CPUID leaf 0xB.
        nb_cores: u32,
        /// `max_slices` from the selected profile.
        max_slices: u32,
    },
    /// Could not read `/proc/cpuinfo`.
    #[error("failed to read /proc/cpuinfo: {0}")]
    CpuInfo(#[from] std::io::Error),
    /// `/proc/cpuinfo` is missing the `{0}` field the probe needs.
    #[error("/proc/cpuinfo is missing `{0}` entries")]
    MalformedCpuInfo(&'static str),
    /// No logical processor in `/proc/cpuinfo` reports the currently running
    /// APIC id.
    #[error("current APIC id {0} not found in /proc/cpuinfo")]
    UnknownApicId(u32),
}

/// Platform info computed once at startup and never mutated afterwards.
///
/// Notably absent: `(class, µarch)`. Resolving those is fallible on an
/// unrecognized CPU, and the clflush-timing backend never needs them, so
/// callers dispatch on `display_model` themselves only once they know they
/// need a resolved class (see [`dispatch`]).
#[derive(Debug, Clone)]
pub struct Platform {
    /// Raw CPUID display model, undispatched.
    pub display_model: u32,
    /// Physical core count (`threads_per_package / threads_per_core`).
    pub nb_cores: u32,
    /// `(apic_id, core_id)` for every logical processor, in `/proc/cpuinfo` order.
    pub apic_to_core: Vec<(u32, u32)>,
    /// `core_id` of the logical processor currently executing this thread.
    pub current_core: u32,
}

#[inline]
fn cpuid(leaf: u32, subleaf: u32) -> core::arch::x86_64::CpuidResult {
    // SAFETY: `cpuid` is available on every x86_64 target this crate builds for.
    unsafe { core::arch::x86_64::__cpuid_count(leaf, subleaf) }
}

/// Returns `true` iff CPUID leaf 0 reports the `GenuineIntel` vendor string.
#[must_use]
pub fn vendor_is_intel() -> bool {
    let leaf0 = cpuid(0, 0);
    // The vendor string is ebx-edx-ecx, not ebx-ecx-edx.
    let mut vendor = [0_u8; 12];
    vendor[0..4].copy_from_slice(&leaf0.ebx.to_le_bytes());
    vendor[4..8].copy_from_slice(&leaf0.edx.to_le_bytes());
    vendor[8..12].copy_from_slice(&leaf0.ecx.to_le_bytes());
    &vendor == b"GenuineIntel"
}

/// `((eax >> 16) & 0xF) << 4 | ((eax >> 4) & 0xF)` from CPUID leaf 1, eax.
#[must_use]
pub fn display_model() -> u32 {
    let eax = cpuid(1, 0).eax;
    let extended_model = BitRange::<_, 16, 20>(&eax).read();
    let model = BitRange::<_, 4, 8>(&eax).read();
    (extended_model << 4) | model
}

/// Threads per core, from CPUID leaf 0xB sub-leaf 0, ebx.
#[must_use]
pub fn threads_per_core() -> u32 {
    cpuid(0xB, 0).ebx
}

/// Threads per package, from CPUID leaf 0xB sub-leaf 1, ebx.
#[must_use]
pub fn threads_per_package() -> u32 {
    cpuid(0xB, 1).ebx
}

/// The APIC id of the logical processor currently executing, from CPUID leaf
/// 0xB sub-leaf 1, edx.
#[must_use]
pub fn current_apic_id() -> u32 {
    cpuid(0xB, 1).edx
}

/// Maps a CPUID display model to its (class, µarch) pair.
pub fn dispatch(model: u32) -> Result<(Class, Uarch), Error> {
    match model {
        45 => Ok((Class::Xeon, Uarch::SandyBridge)),
        62 => Ok((Class::Xeon, Uarch::IvyBridge)),
        63 => Ok((Class::Xeon, Uarch::Haswell)),
        86 | 79 => Ok((Class::Xeon, Uarch::Broadwell)),
        85 => Ok((Class::Xeon, Uarch::SkylakeSp)),
        42 => Ok((Class::Core, Uarch::SandyBridge)),
        58 => Ok((Class::Core, Uarch::IvyBridge)),
        60 | 69 | 70 => Ok((Class::Core, Uarch::Haswell)),
        61 | 71 => Ok((Class::Core, Uarch::Broadwell)),
        78 | 94 => Ok((Class::Core, Uarch::Skylake)),
        142 | 158 => Ok((Class::Core, Uarch::KabyLake)),
        other => Err(Error::UnsupportedModel(other)),
    }
}

/// Runs the C1 probe: vendor check, physical core count and the
/// APIC-to-core mapping. Does not dispatch `(class, µarch)` — an
/// unrecognized display model is not fatal here, since the clflush-timing
/// backend has no use for it. Callers that need a resolved class call
/// [`dispatch`] themselves.
///
/// # Errors
///
/// When the vendor isn't Intel, or `/proc/cpuinfo` doesn't contain the
/// expected `core id`/`initial apicid` fields.
pub fn probe() -> Result<Platform, Error> {
    if !vendor_is_intel() {
        return Err(Error::NotIntel);
    }

    let display_model = display_model();
    let nb_cores = threads_per_package() / threads_per_core().max(1);

    let core_ids = cpuinfo::core_ids()?;
    let apic_ids = cpuinfo::apic_ids()?;
    let apic_to_core: Vec<(u32, u32)> = apic_ids.into_iter().zip(core_ids).collect();

    let current_apic = current_apic_id();
    let current_core = apic_to_core
        .iter()
        .find(|(apic, _)| *apic == current_apic)
        .map(|(_, core)| *core)
        .ok_or(Error::UnknownApicId(current_apic))?;

    Ok(Platform {
        display_model,
        nb_cores,
        apic_to_core,
        current_core,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_xeon_models() {
        assert_eq!(dispatch(45).unwrap(), (Class::Xeon, Uarch::SandyBridge));
        assert_eq!(dispatch(63).unwrap(), (Class::Xeon, Uarch::Haswell));
        assert_eq!(dispatch(86).unwrap(), (Class::Xeon, Uarch::Broadwell));
        assert_eq!(dispatch(79).unwrap(), (Class::Xeon, Uarch::Broadwell));
    }

    #[test]
    fn dispatch_core_models() {
        assert_eq!(dispatch(142).unwrap(), (Class::Core, Uarch::KabyLake));
        assert_eq!(dispatch(158).unwrap(), (Class::Core, Uarch::KabyLake));
        assert_eq!(dispatch(78).unwrap(), (Class::Core, Uarch::Skylake));
    }

    #[test]
    fn dispatch_unknown_model_errors() {
        assert!(matches!(dispatch(7), Err(Error::UnsupportedModel(7))));
    }

    #[test]
    fn dispatch_skylake_sp_recognized() {
        assert_eq!(dispatch(85).unwrap(), (Class::Xeon, Uarch::SkylakeSp));
    }

    #[test]
    fn display_model_extraction_matches_known_encoding() {
        // family=6, model=0x8E (Kaby Lake R), extended_model=8: eax layout
        // bits [19:16]=extended model, [7:4]=model.
        let eax: u32 = (8 << 16) | (0xE << 4);
        let extended_model = BitRange::<_, 16, 20>(&eax).read();
        let model = BitRange::<_, 4, 8>(&eax).read();
        assert_eq!((extended_model << 4) | model, 142);
    }
}
