// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C6: the clflush-timing slice-probe backend. Needs no MSR access, so it
//! works on any Intel part, at the cost of running once per logical CPU and
//! needing `nb_tries` samples per core to beat the noise floor.

use core::arch::x86_64::{_mm_clflush, _mm_mfence, _rdtsc};

use platform::Platform;

/// Samples per core when building the hit histogram.
const NB_TRIES: usize = 50 * 1024;
/// Histogram bucket count; deltas above this are clamped into the last bucket.
const SIZE_HIST: usize = 600;
/// A core counts as "same slice" if more than this many samples hit below `T_HIT_REMOTE`.
const SAME_SLICE_VOTE_THRESHOLD: usize = 50;
/// Cycle-delta threshold distinguishing a local hit from a remote-slice hit.
const T_HIT_REMOTE: usize = 160;

/// Errors raised by [`probe_clflush`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Couldn't pin the calling thread to the logical CPU under test.
    #[error(transparent)]
    Affinity(#[from] utils::affinity::Error),
}

#[inline]
fn rdtsc_fenced() -> u64 {
    // SAFETY: `mfence`/`rdtsc` are always available on x86_64.
    unsafe {
        _mm_mfence();
        let tsc = _rdtsc();
        _mm_mfence();
        tsc
    }
}

#[inline]
fn flush_hit(addr: *const u8) -> u64 {
    let start = rdtsc_fenced();
    // SAFETY: `clflush` never faults regardless of cache state.
    unsafe { _mm_clflush(addr) };
    let delta = rdtsc_fenced() - start;
    // SAFETY: `addr` points at memory owned by the caller for the probe's duration.
    unsafe {
        std::ptr::read_volatile(addr);
        std::ptr::read_volatile(addr);
    }
    delta
}

fn same_slice(histogram: &[usize; SIZE_HIST]) -> bool {
    let count: usize = histogram[..T_HIT_REMOTE].iter().sum();
    count > SAME_SLICE_VOTE_THRESHOLD
}

/// Probes a single address by pinning to each logical CPU in turn and
/// measuring clflush-then-reload latency; the first physical core whose
/// histogram votes "same slice" wins.
///
/// # Errors
///
/// See [`Error`].
pub fn probe_clflush(platform: &Platform, addr: *const u8) -> Result<u32, Error> {
    let threads_per_package = platform::threads_per_package();
    let mut core_used = vec![false; platform.apic_to_core.len().max(1)];
    let mut slice = 0_u32;

    for thread in 0..threads_per_package {
        utils::affinity::pin_to_cpu(thread)?;

        let current_apic = platform::current_apic_id();
        let Some(&(_, current_core)) = platform
            .apic_to_core
            .iter()
            .find(|(apic, _)| *apic == current_apic)
        else {
            continue;
        };

        if core_used.get(current_core as usize).copied().unwrap_or(false) {
            continue;
        }

        let mut histogram = [0_usize; SIZE_HIST];
        for _ in 0..NB_TRIES {
            let delta = flush_hit(addr) as usize;
            histogram[delta.min(SIZE_HIST - 1)] += 1;
        }

        if let Some(used) = core_used.get_mut(current_core as usize) {
            *used = true;
        }

        if same_slice(&histogram) {
            slice = current_core;
            break;
        }
    }

    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_slice_requires_majority_below_threshold() {
        let mut histogram = [0_usize; SIZE_HIST];
        histogram[100] = 51;
        assert!(same_slice(&histogram));

        let mut sparse = [0_usize; SIZE_HIST];
        sparse[100] = 10;
        assert!(!same_slice(&sparse));
    }

    #[test]
    fn samples_at_or_past_threshold_do_not_count() {
        let mut histogram = [0_usize; SIZE_HIST];
        histogram[T_HIT_REMOTE] = 1000;
        assert!(!same_slice(&histogram));
    }
}
