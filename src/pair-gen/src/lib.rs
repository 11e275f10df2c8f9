// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C7: Pair Generator.
//!
//! Produces virtual address pairs `(v1, v2)` whose physical addresses are
//! known to differ in exactly one bit, for every bit in `[6, bit_max)`. Low
//! bits fall inside a single huge page, where virtual and physical offsets
//! coincide; high bits need a reverse map built from several huge pages'
//! actual physical addresses.

mod hugepage;

use std::collections::HashMap;

use hugepage::HugePage;
use platform::Class;

pub use hugepage::{SIZE_1GIB, SIZE_2MIB};

/// Cache-line granularity pairs are generated at, matching the probe's poke unit.
const LINE_SIZE: u64 = 64;
/// Number of 1 GiB pages mapped for the Xeon high-bit regime.
const XEON_HIGH_PAGE_COUNT: usize = 11;
/// First bit the low-bit regime covers.
const LOW_BIT_START: u32 = 6;

/// Errors raised while generating address pairs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mapping the backing huge page(s) failed.
    #[error(transparent)]
    HugePage(#[from] hugepage::Error),
    /// Resolving a mapped page's physical address failed.
    #[error(transparent)]
    Pagemap(#[from] pagemap::Error),
    /// Reading `/proc/meminfo` for `HugePages_Free` failed.
    #[error(transparent)]
    Meminfo(#[from] utils::meminfo::Error),
    /// No free huge page pairs differ in bit `0`, so this bit can't be probed.
    #[error("not enough huge pages available to test bit {0}")]
    InsufficientHugePages(u32),
    /// `bit` falls outside `[6, bit_max)` for this generator.
    #[error("bit {bit} is out of range [6, {bit_max})")]
    BitOutOfRange {
        /// Bit that was requested.
        bit: u32,
        /// Exclusive upper bound for this generator.
        bit_max: u32,
    },
}

struct Layout {
    low_page_size: usize,
    low_bit_end: u32,
    high_page_size: usize,
    bit_max: u32,
}

fn layout_for(class: Class) -> Layout {
    match class {
        Class::Core => Layout {
            low_page_size: SIZE_2MIB,
            low_bit_end: 21,
            high_page_size: SIZE_2MIB,
            bit_max: 36,
        },
        Class::Xeon => Layout {
            low_page_size: SIZE_1GIB,
            low_bit_end: 30,
            high_page_size: SIZE_1GIB,
            bit_max: 34,
        },
    }
}

/// Generates address pairs `(v1, v2)` with `phys(v2) == phys(v1) ^ (1 << bit)`.
pub struct PairGenerator {
    layout: Layout,
    low_page: Option<HugePage>,
    high_pages: Option<Vec<HugePage>>,
    translator: pagemap::Translator,
}

impl PairGenerator {
    /// Creates a pair generator for the given CPU class. No memory is mapped
    /// until the first call to [`pairs_for_bit`](Self::pairs_for_bit).
    #[must_use]
    pub fn new(class: Class) -> Self {
        Self {
            layout: layout_for(class),
            low_page: None,
            high_pages: None,
            translator: pagemap::Translator::new(),
        }
    }

    /// Exclusive upper bound on probeable bits for this generator.
    #[must_use]
    pub fn bit_max(&self) -> u32 {
        self.layout.bit_max
    }

    fn low_page(&mut self) -> Result<&HugePage, Error> {
        if self.low_page.is_none() {
            self.low_page = Some(HugePage::map(self.layout.low_page_size, self.layout.low_page_size)?);
        }
        Ok(self.low_page.as_ref().expect("just inserted"))
    }

    fn high_pages(&mut self, class: Class) -> Result<&[HugePage], Error> {
        if self.high_pages.is_none() {
            let (count, page_size) = match class {
                Class::Core => {
                    let free = utils::meminfo::hugepages_free()?;
                    (free as usize, self.layout.high_page_size)
                }
                Class::Xeon => (XEON_HIGH_PAGE_COUNT, self.layout.high_page_size),
            };
            let mut pages = Vec::with_capacity(count);
            for _ in 0..count {
                pages.push(HugePage::map(page_size, page_size)?);
            }
            self.high_pages = Some(pages);
        }
        Ok(self.high_pages.as_deref().expect("just inserted"))
    }

    /// Generates up to `n` pairs differing only in physical address bit `bit`.
    ///
    /// # Errors
    ///
    /// [`Error::BitOutOfRange`] if `bit` is outside `[6, bit_max)`;
    /// [`Error::InsufficientHugePages`] if the high-bit reverse map has no
    /// candidate pair for `bit`; [`Error::HugePage`]/[`Error::Pagemap`]/
    /// [`Error::Meminfo`] on the respective I/O failure.
    pub fn pairs_for_bit(&mut self, class: Class, bit: u32, n: usize) -> Result<Vec<(u64, u64)>, Error> {
        if bit < LOW_BIT_START || bit >= self.layout.bit_max {
            return Err(Error::BitOutOfRange { bit, bit_max: self.layout.bit_max });
        }
        if bit < self.layout.low_bit_end {
            self.low_bit_pairs(bit, n)
        } else {
            self.high_bit_pairs(class, bit, n)
        }
    }

    fn low_bit_pairs(&mut self, bit: u32, n: usize) -> Result<Vec<(u64, u64)>, Error> {
        let page = self.low_page()?;
        let base = page.addr();
        let page_len = page.len() as u64;
        let flip = 1_u64 << bit;

        let mut pairs = Vec::with_capacity(n);
        for j in 0..n as u64 {
            let offset1 = (j * LINE_SIZE) % page_len;
            let offset2 = offset1 ^ flip;
            if offset2 >= page_len {
                continue;
            }
            pairs.push((base + offset1, base + offset2));
        }
        Ok(pairs)
    }

    fn high_bit_pairs(&mut self, class: Class, bit: u32, n: usize) -> Result<Vec<(u64, u64)>, Error> {
        let high_page_size = self.layout.high_page_size;
        let shift = high_page_size.trailing_zeros();

        let pages = self.high_pages(class)?;
        if pages.is_empty() {
            return Err(Error::InsufficientHugePages(bit));
        }
        let bases: Vec<u64> = pages.iter().map(HugePage::addr).collect();

        let mut phys_page_no = Vec::with_capacity(bases.len());
        for &base in &bases {
            phys_page_no.push(self.translator.translate(base)? >> shift);
        }

        let mut reverse: HashMap<u64, usize> = HashMap::with_capacity(phys_page_no.len());
        for (idx, &pn) in phys_page_no.iter().enumerate() {
            reverse.entry(pn).or_insert(idx);
        }

        let flip_pages = 1_u64 << (bit - shift);
        let mut found = None;
        for (i, &pn) in phys_page_no.iter().enumerate() {
            let candidate = pn ^ flip_pages;
            if let Some(&j) = reverse.get(&candidate) {
                found = Some((i, j));
                break;
            }
        }
        let Some((i, j)) = found else {
            return Err(Error::InsufficientHugePages(bit));
        };

        let page_len = high_page_size as u64;
        let mut pairs = Vec::with_capacity(n);
        for k in 0..n as u64 {
            let offset = (k * LINE_SIZE) % page_len;
            pairs.push((bases[i] + offset, bases[j] + offset));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_layout_covers_expected_bit_range() {
        let layout = layout_for(Class::Core);
        assert_eq!(layout.low_bit_end, 21);
        assert_eq!(layout.bit_max, 36);
    }

    #[test]
    fn xeon_layout_covers_expected_bit_range() {
        let layout = layout_for(Class::Xeon);
        assert_eq!(layout.low_bit_end, 30);
        assert_eq!(layout.bit_max, 34);
    }

    #[test]
    fn bit_below_range_is_rejected() {
        let mut gen = PairGenerator::new(Class::Core);
        assert!(matches!(
            gen.pairs_for_bit(Class::Core, 5, 10),
            Err(Error::BitOutOfRange { bit: 5, .. })
        ));
    }

    #[test]
    fn bit_at_or_above_bit_max_is_rejected() {
        let mut gen = PairGenerator::new(Class::Core);
        assert!(matches!(
            gen.pairs_for_bit(Class::Core, 36, 10),
            Err(Error::BitOutOfRange { bit: 36, .. })
        ));
    }
}
