// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Pins the calling thread to a single logical CPU, so a timing measurement
//! or an MSR read/write lands on the core it's meant to.

/// Errors raised by [`pin_to_cpu`].
#[derive(Debug, thiserror::Error)]
#[error("failed to pin thread to CPU {cpu}: {source}")]
pub struct Error {
    /// Logical CPU the caller tried to pin to.
    pub cpu: u32,
    /// Underlying `sched_setaffinity` error.
    pub source: std::io::Error,
}

/// Restricts the calling thread's affinity mask to logical CPU `cpu`.
///
/// # Errors
///
/// Returns [`Error`] if `sched_setaffinity` fails, e.g. because `cpu` doesn't exist.
pub fn pin_to_cpu(cpu: u32) -> Result<(), Error> {
    // SAFETY: `set` is a plain stack value zero-initialized before use.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `set` is a valid `cpu_set_t`.
    unsafe { libc::CPU_ZERO(&mut set) };
    // SAFETY: `cpu as usize` indexes within the mask; `CPU_SET` itself bounds-checks.
    unsafe { libc::CPU_SET(cpu as usize, &mut set) };
    // SAFETY: `set` is fully initialized and sized by `size_of::<cpu_set_t>()`.
    let rc = unsafe {
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        return Err(Error {
            cpu,
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinning_to_cpu_zero_succeeds() {
        // Every Linux host has at least logical CPU 0.
        assert!(pin_to_cpu(0).is_ok());
    }

    #[test]
    fn pinning_to_an_absurd_cpu_fails() {
        assert!(pin_to_cpu(u32::MAX - 1).is_err());
    }
}
