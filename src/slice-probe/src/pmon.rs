// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C6: the Xeon and Core uncore-PMON slice-probe backends.
//!
//! Both backends follow the same shape: freeze/reset/select/enable the
//! boxes, poke the target address, freeze again, read the per-slice
//! counters, and take the argmax.

use uarch_profile::{CoreProfile, XeonProfile};

use crate::poker::Poker;

/// The pinned logical CPU every MSR access in this tool targets.
const MSR_CPU: u32 = 0;

/// Errors raised by [`probe_xeon`]/[`probe_core`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read or write against the MSR gateway failed.
    #[error("MSR access failed during slice probe: {0}")]
    Msr(#[from] msr::Error),
    /// Reading back the physical address of the poked line failed.
    #[error("failed to resolve poked address: {0}")]
    Pagemap(#[from] pagemap::Error),
}

/// Result of a single-address slice probe: the winning slice, a confidence
/// ratio for diagnostics, and the raw per-slice counts.
#[derive(Debug, Clone)]
pub struct SliceReport {
    /// Physical address that was probed.
    pub phys: u64,
    /// Slice index with the highest excess count.
    pub slice: u32,
    /// `second_highest / highest * 100`, as a rough confidence indicator.
    pub confidence_percent: f32,
    /// Per-slice excess counts (`raw - pokes`, saturating at zero).
    pub counts: Vec<u32>,
}

fn argmax_with_confidence(counts: &[u32]) -> (u32, f32) {
    let mut slice = 0_usize;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[slice] {
            slice = i;
        }
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    let first = sorted[sorted.len() - 1];
    let second = if sorted.len() >= 2 { sorted[sorted.len() - 2] } else { 0 };
    let confidence_percent = if first == 0 {
        0.0
    } else {
        f64::from(second) / f64::from(first) * 100.0
    } as f32;
    (slice as u32, confidence_percent)
}

fn excess(raw: u64, pokes: u32) -> u32 {
    raw.saturating_sub(u64::from(pokes)) as u32
}

/// Probes a single address on the Xeon CBo counter layout.
///
/// # Errors
///
/// See [`Error`].
pub fn probe_xeon(
    gateway: &msr::Gateway,
    profile: &XeonProfile,
    poker: &mut Poker,
    addr: *const u8,
    pokes: u32,
) -> Result<SliceReport, Error> {
    let n = profile.max_slices as usize;

    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.box_ctl[i], profile.box_freeze)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.box_ctl[i], profile.box_reset)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.ctl0[i], profile.enable_counting)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.ctl0[i], profile.select_event)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.box_filter[i], profile.filter)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.box_ctl[i], profile.box_unfreeze)?;
    }

    let phys = poker.poke(addr)?;

    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.box_ctl[i], profile.box_freeze)?;
    }

    let mut counts = Vec::with_capacity(n);
    for i in 0..n {
        let raw = gateway.read(MSR_CPU, profile.ctr0[i])?;
        counts.push(excess(raw, pokes));
    }

    let (slice, confidence_percent) = argmax_with_confidence(&counts);
    Ok(SliceReport { phys, slice, confidence_percent, counts })
}

/// Probes a single address on the Core (client) CBo counter layout.
///
/// # Errors
///
/// See [`Error`].
pub fn probe_core(
    gateway: &msr::Gateway,
    profile: &CoreProfile,
    nb_cores: u32,
    poker: &mut Poker,
    addr: *const u8,
    pokes: u32,
) -> Result<SliceReport, Error> {
    let n = nb_cores as usize;

    gateway.write_one(MSR_CPU, profile.perf_global_ctr, profile.disable_ctrs)?;
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.cbo_per_ctr0[i], profile.reset_ctrs)?;
    }
    for i in 0..n {
        gateway.write_one(MSR_CPU, profile.cbo_perfevtsel0[i], profile.select_evt_core)?;
    }
    gateway.write_one(MSR_CPU, profile.perf_global_ctr, profile.enable_ctrs)?;

    let phys = poker.poke(addr)?;

    let mut counts = Vec::with_capacity(n);
    for i in 0..n {
        let raw = gateway.read(MSR_CPU, profile.cbo_per_ctr0[i])?;
        counts.push(excess(raw, pokes));
    }

    let (slice, confidence_percent) = argmax_with_confidence(&counts);
    Ok(SliceReport { phys, slice, confidence_percent, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_lowest_index_on_tie() {
        let (slice, _) = argmax_with_confidence(&[5, 5, 1]);
        assert_eq!(slice, 0);
    }

    #[test]
    fn argmax_picks_the_clear_winner() {
        let (slice, confidence) = argmax_with_confidence(&[1, 2, 99, 3]);
        assert_eq!(slice, 2);
        assert!(confidence < 5.0);
    }

    #[test]
    fn all_zero_counts_yield_slice_zero_and_no_panic() {
        let (slice, confidence) = argmax_with_confidence(&[0, 0, 0]);
        assert_eq!(slice, 0);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn excess_saturates_at_zero() {
        assert_eq!(excess(50, 100_000), 0);
        assert_eq!(excess(100_050, 100_000), 50);
    }
}
