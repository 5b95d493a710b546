//! Check command implementation.
//!
//! Validates configuration, pseudo-file access and one full snapshot.

use procsnap::reader::read_first_with_prefix;
use procsnap::source::{ALL_SOURCES, MEMINFO};
use procsnap::{Budget, CollectError, Collector, Domain, HostSource};

use crate::commands::snapshot::collector_from_config;
use crate::config::{validate_effective_config, Config};
use crate::startup_checks;

/// Validates system requirements and configuration.
pub fn command_check(
    sources_only: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 procsnap - System Check");
    println!("==========================");

    let mut all_ok = true;
    let collector = collector_from_config(config);
    let source = collector.source();

    // Check pseudo-files
    println!("\n📁 Checking {} ...", source.root().display());
    for rel in ALL_SOURCES {
        let path = source.display_path(rel);
        match source.open(rel) {
            Ok(_) => println!("   ✅ {}", path),
            Err(e) => {
                println!("   ❌ {}: {}", path, e);
                all_ok = false;
            }
        }
    }

    match source.fs_usage("/") {
        Ok(usage) => println!(
            "   ✅ statvfs(/) ok: {} blocks of {} bytes",
            usage.blocks, usage.block_size
        ),
        Err(e) => {
            println!("   ❌ statvfs(/) failed: {}", e);
            all_ok = false;
        }
    }

    match memory_total_line(source, &Budget::with_timeout(config.timeout())) {
        Ok(Some(line)) => println!("   ℹ️  {}", line),
        Ok(None) => println!("   ⚠️  no MemTotal line in {}", source.display_path(MEMINFO)),
        Err(e) => println!("   ❌ {}", e),
    }

    if let Err(e) = startup_checks::validate_requirements(source) {
        println!("   ❌ Startup validation failed: {}", e);
        all_ok = false;
    }

    // Check one real snapshot
    if !sources_only {
        println!("\n📊 Taking one snapshot ({:?})...", collector.mode());
        let budget = Budget::with_timeout(config.timeout());
        let (metrics, errors) = collector.collect(&budget);
        for domain in Domain::ALL {
            match errors.failed(domain) {
                None => println!("   ✅ {}", domain),
                Some(e) => {
                    println!("   ❌ {}: {}", domain, e);
                    all_ok = false;
                }
            }
        }
        println!(
            "   ℹ️  host '{}': {} cores, {} disks, {} interfaces",
            metrics.host,
            metrics.cpu.cores,
            metrics.disk.len(),
            metrics.net.len()
        );
        if let Some(left) = budget.remaining() {
            println!(
                "   ℹ️  finished with {}ms of the {}ms budget left",
                left.as_millis(),
                config.timeout().as_millis()
            );
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}

/// The `MemTotal:` row of meminfo, normalized to single spaces.
fn memory_total_line(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<Option<String>, CollectError> {
    let line = read_first_with_prefix(source, MEMINFO, "MemTotal:", budget)?;
    Ok(line.map(|l| l.split_whitespace().collect::<Vec<_>>().join(" ")))
}
