// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C9: Orchestrator.
//!
//! Verifies the host CPU vendor, pins the process to logical CPU 0, selects a
//! C6 backend, and runs either `--scan` (a quick sanity check against 20
//! consecutive cache lines) or the full hash-recovery pass. Resolving
//! `(class, µarch)` from the display model is deferred until a code path that
//! actually needs it runs it — the counter backends always need it, the
//! clflush-timing backend only needs it for hash recovery, and `--scan
//! --clflush` never needs it at all, so it must stay usable on an
//! unrecognized CPU.

mod cli;
mod error;
mod oracle;

use clap::Parser;

use cli::Cli;
use error::CliError;
use oracle::Backend;

/// Slices a clflush-only run is assumed to span, since there's no counter
/// profile to read a real slice count from.
const CLFLUSH_MAX_SLICES: u32 = 64;
/// Number of consecutive cache lines probed by `--scan`.
const SCAN_LINES: usize = 20;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(%err, "fatal");
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if !platform::vendor_is_intel() {
        return Err(CliError::Unsupported("CPU vendor is not GenuineIntel".to_owned()));
    }
    utils::affinity::pin_to_cpu(0)?;

    let platform = platform::probe()?;

    if cli.clflush {
        return run_clflush(cli, &platform);
    }

    let (class, uarch) = platform::dispatch(platform.display_model)?;
    let (profile, nb_cores) = uarch_profile::profile_for(class, uarch, platform.nb_cores)?;
    match profile {
        uarch_profile::Profile::Xeon(xeon) => run_counters(cli, class, nb_cores, CounterProfile::Xeon(xeon)),
        uarch_profile::Profile::Core(core) => run_counters(cli, class, nb_cores, CounterProfile::Core(core)),
    }
}

enum CounterProfile {
    Xeon(uarch_profile::XeonProfile),
    Core(uarch_profile::CoreProfile),
}

fn run_counters(
    cli: &Cli,
    class: platform::Class,
    nb_cores: u32,
    profile: CounterProfile,
) -> Result<(), CliError> {
    let gateway = msr::Gateway::new();
    let mut poker = slice_probe::Poker::new(cli.pokes);

    let mut backend = |addr: u64| -> Result<slice_probe::SliceReport, slice_probe::Error> {
        let ptr = addr as *const u8;
        match &profile {
            CounterProfile::Xeon(p) => slice_probe::probe_xeon(&gateway, p, &mut poker, ptr, cli.pokes),
            CounterProfile::Core(p) => slice_probe::probe_core(&gateway, p, nb_cores, &mut poker, ptr, cli.pokes),
        }
        .map_err(slice_probe::Error::from)
    };

    if cli.scan {
        let buf = [0_u8; SCAN_LINES * 64];
        let base = buf.as_ptr() as u64;
        for i in 0..SCAN_LINES as u64 {
            let report = backend(base + i * 64)?;
            print_counter_report(&report);
        }
        return Ok(());
    }

    let mut pairs = pair_gen::PairGenerator::new(class);
    let mut oracle = match &profile {
        CounterProfile::Xeon(p) => Backend::Xeon { gateway: &gateway, profile: p, poker: &mut poker, pokes: cli.pokes },
        CounterProfile::Core(p) => {
            Backend::Core { gateway: &gateway, profile: p, nb_cores, poker: &mut poker, pokes: cli.pokes }
        }
    };
    let default_config = hash_recovery::Config::for_class(class);
    let config = hash_recovery::Config {
        addr_per_bit: cli.samples.unwrap_or(default_config.addr_per_bit),
        ..default_config
    };
    let support_sets = hash_recovery::recover(&mut pairs, class, nb_cores, config, &mut oracle)?;

    print_support_sets(&support_sets);
    Ok(())
}

fn run_clflush(cli: &Cli, platform: &platform::Platform) -> Result<(), CliError> {
    if cli.scan {
        let mut translator = pagemap::Translator::new();
        let buf = [0_u8; SCAN_LINES * 64];
        let base = buf.as_ptr() as u64;
        for i in 0..SCAN_LINES as u64 {
            let addr = base + i * 64;
            let slice = slice_probe::probe_clflush(platform, addr as *const u8)
                .map_err(slice_probe::Error::from)?;
            let phys = translator.translate(addr)?;
            println!("{phys:064b} {slice}");
        }
        return Ok(());
    }

    let (class, _uarch) = platform::dispatch(platform.display_model)?;
    let mut pairs = pair_gen::PairGenerator::new(class);
    let mut oracle = Backend::Clflush { platform };
    let default_config = hash_recovery::Config::for_class(class);
    let config = hash_recovery::Config {
        addr_per_bit: cli.samples.unwrap_or(default_config.addr_per_bit),
        ..default_config
    };
    let support_sets = hash_recovery::recover(&mut pairs, class, CLFLUSH_MAX_SLICES, config, &mut oracle)?;
    print_support_sets(&support_sets);
    Ok(())
}

fn print_counter_report(report: &slice_probe::SliceReport) {
    let counts = report
        .counts
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{:064b} {} {:.1} {}",
        report.phys, report.slice, report.confidence_percent, counts
    );
}

fn print_support_sets(support_sets: &[Vec<u32>]) {
    for (k, bits) in support_sets.iter().enumerate() {
        let bits = bits.iter().map(|b| format!("b{b}")).collect::<Vec<_>>().join(" ");
        println!("o{k} = {bits}");
    }
}
