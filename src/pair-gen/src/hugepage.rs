// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A single `mmap(MAP_HUGETLB)` region: raw backing storage for the pair
//! generator's low-bit and high-bit regimes.

use std::ptr::NonNull;

/// 2 MiB huge page size, the kernel default `Hugepagesize`.
pub const SIZE_2MIB: usize = 0x20_0000;
/// 1 GiB huge page size, used for the Xeon regimes.
pub const SIZE_1GIB: usize = 0x4000_0000;

/// Errors raised while mapping huge pages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `mmap(MAP_HUGETLB)` failed, most commonly because not enough huge
    /// pages were reserved (`/proc/sys/vm/nr_hugepages`).
    #[error("failed to map {len} bytes of huge pages: {source}")]
    MmapFailed {
        /// Requested mapping length in bytes.
        len: usize,
        /// Underlying `mmap` error.
        source: std::io::Error,
    },
}

/// An owned `mmap`-backed huge-page region, unmapped on drop.
#[derive(Debug)]
pub struct HugePage {
    ptr: NonNull<u8>,
    len: usize,
}

impl HugePage {
    /// Maps `len` bytes (must be a multiple of `page_size`) of anonymous,
    /// populated, huge-page-backed memory. `page_size` selects the encoding:
    /// [`SIZE_2MIB`] uses the kernel's default huge-page size, [`SIZE_1GIB`]
    /// requests the 1 GiB size explicitly via `MAP_HUGE_1GB`-equivalent
    /// encoding.
    ///
    /// # Errors
    ///
    /// See [`Error`].
    pub fn map(len: usize, page_size: usize) -> Result<Self, Error> {
        let huge_flag = if page_size == SIZE_1GIB {
            30 << libc::MAP_HUGE_SHIFT
        } else {
            0
        };
        // SAFETY: all arguments are well-formed for an anonymous mapping.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_POPULATE | libc::MAP_HUGETLB | huge_flag,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(Error::MmapFailed { len, source: std::io::Error::last_os_error() });
        }
        // SAFETY: `ptr` was just checked non-null by the `MAP_FAILED` comparison.
        let ptr = unsafe { NonNull::new_unchecked(ptr.cast::<u8>()) };

        // Touch one byte per base page to force the entire huge page resident;
        // `MAP_POPULATE` alone is not guaranteed to pre-fault every page.
        // SAFETY: `ptr..ptr+len` is the region just mapped above.
        unsafe {
            let slice = std::slice::from_raw_parts_mut(ptr.as_ptr(), len);
            for byte in slice.iter_mut().step_by(4096) {
                *byte = 0x0c;
            }
        }

        Ok(Self { ptr, len })
    }

    /// Base virtual address of this region.
    #[must_use]
    pub fn addr(&self) -> u64 {
        self.ptr.as_ptr() as u64
    }

    /// Length of this region in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this region is empty (never true for a successfully mapped page).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for HugePage {
    fn drop(&mut self) {
        // SAFETY: `self.ptr`/`self.len` describe exactly the region `map` returned.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast::<libc::c_void>(), self.len);
        }
    }
}

// SAFETY: the mapping is exclusively owned by this `HugePage` and never
// aliased; sending it across threads only moves that ownership.
unsafe impl Send for HugePage {}
