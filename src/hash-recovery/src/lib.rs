// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C8: Hash Recovery Engine.
//!
//! If the slice-selection function is XOR-linear in the physical address
//! bits, flipping address bit `b` flips output bit `k` if and only if `b` is
//! in `k`'s support set. This engine asks [`pair_gen::PairGenerator`] for
//! address pairs differing in one physical bit at a time, asks a slice
//! oracle for each pair's slice, and tallies how often each output bit
//! flips. A bit's vote count crossing a threshold marks it as part of that
//! output bit's support.

use platform::Class;

/// Address pairs requested per candidate bit, matching the original tool's
/// `ADDR_PER_BIT` on the Core path (the Xeon path uses a smaller sample, see
/// [`Config::xeon`]).
pub const ADDR_PER_BIT: usize = 500;
/// Vote threshold on the Core path (500 samples/bit).
pub const THRESHOLD_CORE: u32 = 200;
/// Vote threshold on the Xeon path (100 samples/bit — a noisier, smaller sample).
pub const THRESHOLD_XEON: u32 = 10;

/// A slice-probe backend, abstracted so the engine doesn't need to know
/// which of C6's three backends produced the slice index.
pub trait SliceOracle {
    /// Error type the oracle can fail with.
    type Error: std::error::Error + 'static;
    /// Returns the slice index that address `addr` maps to.
    fn slice(&mut self, addr: u64) -> Result<u32, Self::Error>;
}

/// Errors raised while recovering the hash.
#[derive(Debug, thiserror::Error)]
pub enum Error<OracleErr: std::error::Error + 'static> {
    /// Generating a pair for some bit failed for a reason other than huge-page
    /// exhaustion (which is instead logged and skipped, see [`recover`]).
    #[error("failed to generate address pairs: {0}")]
    PairGen(#[from] pair_gen::Error),
    /// The slice oracle failed for some address.
    #[error("slice oracle failed: {0}")]
    Oracle(OracleErr),
}

/// Bit range and vote threshold for one CPU class.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Inclusive lower bound on probed address bits (always 6: cache-line offset bits are unusable).
    pub bit_start: u32,
    /// Exclusive upper bound on probed address bits.
    pub bit_max: u32,
    /// Pairs sampled per candidate bit.
    pub addr_per_bit: usize,
    /// Vote count a bit must exceed to be included in a support set.
    pub threshold: u32,
}

impl Config {
    /// Default configuration for Core (client) parts: bits `[6, 36)`, 500 samples/bit, threshold 200.
    #[must_use]
    pub fn core() -> Self {
        Self { bit_start: 6, bit_max: 36, addr_per_bit: ADDR_PER_BIT, threshold: THRESHOLD_CORE }
    }

    /// Default configuration for Xeon (server) parts: bits `[6, 34)`, 100 samples/bit, threshold 10.
    #[must_use]
    pub fn xeon() -> Self {
        Self { bit_start: 6, bit_max: 34, addr_per_bit: 100, threshold: THRESHOLD_XEON }
    }

    /// Selects the default configuration for `class`.
    #[must_use]
    pub fn for_class(class: Class) -> Self {
        match class {
            Class::Core => Self::core(),
            Class::Xeon => Self::xeon(),
        }
    }
}

/// `ceil(log2(n))`, the number of output bits a slice index in `[0, n)` needs.
#[must_use]
pub fn output_bits(n: u32) -> u32 {
    if n <= 1 {
        return 0;
    }
    u32::BITS - (n - 1).leading_zeros()
}

/// Runs the vote-matrix recovery over every bit in `config`'s range, using
/// `pairs` to generate address pairs and `oracle` to resolve slices.
///
/// Returns, for each output bit `k` in `[0, output_bits(nb_cores))`, the
/// sorted list of address bits whose votes exceeded `config.threshold`.
///
/// # Errors
///
/// Returns [`Error::Oracle`] if the slice oracle fails, or [`Error::PairGen`]
/// if pair generation fails for a reason other than huge-page exhaustion.
/// [`pair_gen::Error::InsufficientHugePages`] alone is logged and that bit is
/// skipped, not fatal.
pub fn recover<O: SliceOracle>(
    pairs: &mut pair_gen::PairGenerator,
    class: Class,
    nb_cores: u32,
    config: Config,
    oracle: &mut O,
) -> Result<Vec<Vec<u32>>, Error<O::Error>> {
    let nbits = output_bits(nb_cores) as usize;
    let bit_max = config.bit_max.min(pairs.bit_max());
    let mut votes = vec![vec![0_u32; (bit_max - config.bit_start) as usize]; nbits];

    for bit in config.bit_start..bit_max {
        let candidates = match pairs.pairs_for_bit(class, bit, config.addr_per_bit) {
            Ok(c) => c,
            Err(pair_gen::Error::InsufficientHugePages(_)) => {
                tracing::warn!(bit, "skipping bit: insufficient huge pages available");
                continue;
            }
            Err(err) => return Err(Error::PairGen(err)),
        };

        for (v1, v2) in candidates {
            let s1 = oracle.slice(v1).map_err(Error::Oracle)?;
            let s2 = oracle.slice(v2).map_err(Error::Oracle)?;
            for k in 0..nbits {
                if ((s1 >> k) & 1) != ((s2 >> k) & 1) {
                    votes[k][(bit - config.bit_start) as usize] += 1;
                }
            }
        }
    }

    let support_sets = votes
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .filter(|&(_, v)| v > config.threshold)
                .map(|(i, _)| i as u32 + config.bit_start)
                .collect()
        })
        .collect();

    Ok(support_sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const H0: [u32; 19] = [6, 10, 12, 14, 16, 17, 18, 20, 22, 24, 25, 26, 27, 28, 30, 32, 33, 35, 36];
    const H1: [u32; 19] = [7, 11, 13, 15, 17, 19, 20, 21, 22, 23, 24, 26, 28, 29, 31, 33, 34, 35, 37];

    fn known_sandy_bridge_hash(phys_addr: u64) -> u32 {
        let hash0 = H0.iter().fold(0_u32, |acc, &bit| acc ^ ((phys_addr >> bit) as u32 & 1));
        let hash1 = H1.iter().fold(0_u32, |acc, &bit| acc ^ ((phys_addr >> bit) as u32 & 1));
        (hash1 << 1) | hash0
    }

    struct KnownHashOracle;

    impl SliceOracle for KnownHashOracle {
        type Error = Infallible;
        fn slice(&mut self, addr: u64) -> Result<u32, Infallible> {
            Ok(known_sandy_bridge_hash(addr))
        }
    }

    #[test]
    fn output_bits_matches_expected_counts() {
        assert_eq!(output_bits(1), 0);
        assert_eq!(output_bits(2), 1);
        assert_eq!(output_bits(4), 2);
        assert_eq!(output_bits(8), 3);
        assert_eq!(output_bits(7), 3);
    }

    #[test]
    fn vote_tally_flags_a_bit_present_in_every_pair() {
        // Simulates a single candidate bit being in the support set: every
        // pair flips the output bit, so its vote count should equal the
        // sample size and clear any reasonable threshold.
        let mut votes = 0_u32;
        let samples = 500;
        for _ in 0..samples {
            let s1 = known_sandy_bridge_hash(0);
            let s2 = known_sandy_bridge_hash(1 << 6);
            if (s1 & 1) != (s2 & 1) {
                votes += 1;
            }
        }
        assert_eq!(votes, samples);
        assert!(votes > THRESHOLD_CORE);
    }

    #[test]
    fn bit_outside_support_set_never_votes() {
        // Bit 8 is in neither H0 nor H1, so flipping it should never flip
        // either output bit.
        let mut votes = [0_u32; 2];
        for _ in 0..100 {
            let s1 = known_sandy_bridge_hash(0);
            let s2 = known_sandy_bridge_hash(1 << 8);
            for (k, v) in votes.iter_mut().enumerate() {
                if ((s1 >> k) & 1) != ((s2 >> k) & 1) {
                    *v += 1;
                }
            }
        }
        assert_eq!(votes, [0, 0]);
    }

    #[test]
    fn known_hash_oracle_agrees_with_reference_on_h0_membership() {
        // Bit 6 is in H0: flipping it alone should always flip output bit 0.
        let mut oracle = KnownHashOracle;
        let s1 = oracle.slice(0).unwrap();
        let s2 = oracle.slice(1 << 6).unwrap();
        assert_ne!(s1 & 1, s2 & 1);
    }
}
