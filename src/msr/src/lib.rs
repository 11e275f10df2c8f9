// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C2: MSR Gateway.
//!
//! Positional 8-byte reads/writes against `/dev/cpu/{N}/msr`, the kernel's
//! `msr` driver interface. One file descriptor is opened per logical CPU on
//! first use and kept open for the lifetime of the process; the process is
//! short-lived and single-threaded, so there is nothing to gain from closing
//! it early.

use std::collections::HashMap;
use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::sync::Mutex;

/// Errors raised by [`Gateway::read`]/[`Gateway::write`], distinguishable the
/// way `rdmsr`/`wrmsr` distinguish them on the command line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `open` failed with `ENXIO`: no such logical CPU.
    #[error("no such CPU {0}")]
    NoSuchCpu(u32),
    /// `open` failed with `EIO`: the CPU doesn't support MSRs (module not
    /// loaded, or unsupported architecture).
    #[error("CPU {0} does not support MSRs")]
    MsrUnsupported(u32),
    /// `open` failed for any other reason (commonly permissions).
    #[error("cannot access /dev/cpu/{cpu}/msr: {source}")]
    AccessDenied {
        /// Logical CPU number.
        cpu: u32,
        /// Underlying `open` error.
        source: std::io::Error,
    },
    /// `pread` did not return a full 8-byte MSR value.
    #[error("CPU {cpu} cannot read MSR {reg:#010x}: {source}")]
    ReadFailed {
        /// Logical CPU number.
        cpu: u32,
        /// MSR register number.
        reg: u32,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// `pwrite` did not write a full 8-byte MSR value.
    #[error("CPU {cpu} cannot set MSR {reg:#010x} to {value:#018x}: {source}")]
    WriteFailed {
        /// Logical CPU number.
        cpu: u32,
        /// MSR register number.
        reg: u32,
        /// Value that failed to write.
        value: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    /// The process exit code the original `rdmsr`/`wrmsr` utilities used for
    /// this failure kind: 2 for no-such-CPU, 3 for MSR-unsupported, 4 for a
    /// failed read/write, 127 for anything else.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoSuchCpu(_) => 2,
            Self::MsrUnsupported(_) => 3,
            Self::ReadFailed { .. } | Self::WriteFailed { .. } => 4,
            Self::AccessDenied { .. } => 127,
        }
    }
}

/// Owns one lazily-opened, process-global file descriptor per logical CPU.
#[derive(Debug, Default)]
pub struct Gateway {
    fds: Mutex<HashMap<u32, RawFd>>,
}

impl Gateway {
    /// Creates an empty gateway. No file descriptors are opened until the
    /// first [`read`](Self::read)/[`write`](Self::write) call for a given CPU.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fd_for(&self, cpu: u32) -> Result<RawFd, Error> {
        let mut fds = self.fds.lock().expect("msr gateway lock poisoned");
        if let Some(fd) = fds.get(&cpu) {
            return Ok(*fd);
        }

        let path = CString::new(format!("/dev/cpu/{cpu}/msr")).expect("no interior NUL");
        // SAFETY: `path` is a valid, NUL-terminated C string owned for the duration of the call.
        let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR) };
        if fd < 0 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::ENXIO) => Error::NoSuchCpu(cpu),
                Some(libc::EIO) => Error::MsrUnsupported(cpu),
                _ => Error::AccessDenied { cpu, source: err },
            });
        }
        fds.insert(cpu, fd);
        Ok(fd)
    }

    /// Reads the 64-bit value of MSR `reg` on logical CPU `cpu`.
    ///
    /// # Errors
    ///
    /// See [`Error`].
    pub fn read(&self, cpu: u32, reg: u32) -> Result<u64, Error> {
        let fd = self.fd_for(cpu)?;
        let mut data = 0_u64;
        // SAFETY: `fd` is open and owned by this gateway; the buffer is sized for one MSR value.
        let n = unsafe {
            libc::pread(
                fd,
                std::ptr::addr_of_mut!(data).cast::<libc::c_void>(),
                std::mem::size_of::<u64>(),
                libc::off_t::from(reg),
            )
        };
        if n as usize != std::mem::size_of::<u64>() {
            return Err(Error::ReadFailed {
                cpu,
                reg,
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(data)
    }

    /// Writes each of `values` in turn to MSR `reg` on logical CPU `cpu`,
    /// matching the original `wrmsr -p cpu reg val1 val2 ...` semantics of
    /// repeated positional writes to the same register.
    ///
    /// # Errors
    ///
    /// See [`Error`].
    pub fn write(&self, cpu: u32, reg: u32, values: &[u64]) -> Result<(), Error> {
        let fd = self.fd_for(cpu)?;
        for &value in values {
            // SAFETY: `fd` is open and owned by this gateway; `value` is a plain `u64`.
            let n = unsafe {
                libc::pwrite(
                    fd,
                    std::ptr::addr_of!(value).cast::<libc::c_void>(),
                    std::mem::size_of::<u64>(),
                    libc::off_t::from(reg),
                )
            };
            if n as usize != std::mem::size_of::<u64>() {
                return Err(Error::WriteFailed {
                    cpu,
                    reg,
                    value,
                    source: std::io::Error::last_os_error(),
                });
            }
        }
        Ok(())
    }

    /// Convenience wrapper around [`write`](Self::write) for the common
    /// single-value case.
    ///
    /// # Errors
    ///
    /// See [`Error`].
    pub fn write_one(&self, cpu: u32, reg: u32, value: u64) -> Result<(), Error> {
        self.write(cpu, reg, &[value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cpu_reports_distinguishable_error() {
        let gateway = Gateway::new();
        // CPU 9999 does not exist on any real machine; exercises the ENXIO path
        // without requiring root or the `msr` kernel module.
        let err = gateway.read(9999, 0x10).unwrap_err();
        assert!(matches!(
            err,
            Error::NoSuchCpu(9999) | Error::AccessDenied { cpu: 9999, .. }
        ));
    }

    #[test]
    fn exit_codes_match_original_rdmsr_wrmsr_cli() {
        assert_eq!(Error::NoSuchCpu(0).exit_code(), 2);
        assert_eq!(Error::MsrUnsupported(0).exit_code(), 3);
        assert_eq!(
            Error::ReadFailed {
                cpu: 0,
                reg: 0,
                source: std::io::Error::from_raw_os_error(libc::EIO),
            }
            .exit_code(),
            4
        );
        assert_eq!(
            Error::AccessDenied {
                cpu: 0,
                source: std::io::Error::from_raw_os_error(libc::EACCES),
            }
            .exit_code(),
            127
        );
    }
}
