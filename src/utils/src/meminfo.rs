// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Reads free huge-page counts from `/proc/meminfo`, replacing the original
//! tool's `grep 'HugePages_Free' /proc/meminfo | awk '{print $2}'` pipeline
//! with a direct parse.

use std::fs;

/// Errors raised while reading huge-page availability.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Couldn't read `/proc/meminfo`.
    #[error("failed to read /proc/meminfo: {0}")]
    Io(#[from] std::io::Error),
    /// `/proc/meminfo` has no `HugePages_Free` line, or its value isn't an integer.
    #[error("/proc/meminfo is missing a usable HugePages_Free entry")]
    Missing,
}

/// Returns the number of free default-size huge pages reported by the kernel.
///
/// # Errors
///
/// See [`Error`].
pub fn hugepages_free() -> Result<u64, Error> {
    let meminfo = fs::read_to_string("/proc/meminfo")?;
    parse_hugepages_free(&meminfo)
}

fn parse_hugepages_free(meminfo: &str) -> Result<u64, Error> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("HugePages_Free:"))
        .and_then(|rest| rest.trim().split_whitespace().next())
        .and_then(|count| count.parse::<u64>().ok())
        .ok_or(Error::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MemTotal:       32859452 kB
HugePages_Total:     128
HugePages_Free:       64
HugePages_Rsvd:        0
Hugepagesize:       2048 kB
";

    #[test]
    fn parses_hugepages_free() {
        assert_eq!(parse_hugepages_free(SAMPLE).unwrap(), 64);
    }

    #[test]
    fn missing_field_errors() {
        assert!(matches!(parse_hugepages_free("MemTotal: 1 kB\n"), Err(Error::Missing)));
    }
}
