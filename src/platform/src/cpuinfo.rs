// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Parses `/proc/cpuinfo` for the two ordered sequences the platform probe
//! needs: `core id` and `initial apicid`, one entry per logical processor, in
//! the order the kernel lists them (i.e. indexed by logical processor
//! number).

use std::fs;

use crate::Error;

fn field_values(cpuinfo: &str, field: &'static str) -> Result<Vec<u32>, Error> {
    let mut values = Vec::new();
    for line in cpuinfo.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim() != field {
            continue;
        }
        let value = value
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::MalformedCpuInfo(field))?;
        values.push(value);
    }
    if values.is_empty() {
        return Err(Error::MalformedCpuInfo(field));
    }
    Ok(values)
}

/// `core id` for every logical processor, indexed in `/proc/cpuinfo` order.
pub fn core_ids() -> Result<Vec<u32>, Error> {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo")?;
    field_values(&cpuinfo, "core id")
}

/// `initial apicid` for every logical processor, indexed in `/proc/cpuinfo` order.
pub fn apic_ids() -> Result<Vec<u32>, Error> {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo")?;
    field_values(&cpuinfo, "initial apicid")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
processor\t: 0
core id\t\t: 0
initial apicid\t: 0

processor\t: 1
core id\t\t: 1
initial apicid\t: 2

processor\t: 2
core id\t\t: 0
initial apicid\t: 1
";

    #[test]
    fn parses_core_ids_in_order() {
        assert_eq!(field_values(SAMPLE, "core id").unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn parses_apic_ids_in_order() {
        assert_eq!(field_values(SAMPLE, "initial apicid").unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn missing_field_is_malformed() {
        assert!(field_values(SAMPLE, "microcode").is_err());
    }
}
