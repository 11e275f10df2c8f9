// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C5: Poker.
//!
//! Generates LLC traffic to one address by repeatedly flushing it from cache,
//! so an uncore PMON counter or a clflush-timing histogram built elsewhere
//! has something to observe.

use core::arch::x86_64::_mm_clflush;

use pagemap::Translator;

/// Default number of `clflush` iterations per poke, matching the original
/// tool's `nb_pokes`.
pub const DEFAULT_POKES: u32 = 100_000;

/// Re-pokes a single virtual address and reports its physical address,
/// reusing [`pagemap::Translator`]'s single-page cache across calls the same
/// way the original `poke()` reused its `lastVirtualPage`/`lastPhysPage`
/// statics.
#[derive(Debug)]
pub struct Poker {
    translator: Translator,
    pokes: u32,
}

impl Poker {
    /// Creates a poker that flushes `pokes` times per call.
    #[must_use]
    pub fn new(pokes: u32) -> Self {
        Self {
            translator: Translator::new(),
            pokes,
        }
    }

    /// Flushes `addr` from cache `self.pokes` times, then resolves and
    /// returns its physical address.
    ///
    /// # Errors
    ///
    /// Propagates [`pagemap::Error`] if the address can't be translated.
    pub fn poke(&mut self, addr: *const u8) -> Result<u64, pagemap::Error> {
        for _ in 0..self.pokes {
            // SAFETY: `clflush` never faults regardless of the line's cache state.
            unsafe { _mm_clflush(addr) };
        }
        self.translator.translate(addr as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pokes_matches_original_nb_pokes() {
        assert_eq!(DEFAULT_POKES, 100_000);
    }

    #[test]
    fn poker_constructed_with_custom_count() {
        let poker = Poker::new(42);
        assert_eq!(poker.pokes, 42);
    }
}
