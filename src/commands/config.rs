//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(default_file_name(format)),
    };

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "procsnap.yaml",
        ConfigFormat::Json => "procsnap.json",
        ConfigFormat::Toml => "procsnap.toml",
    }
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# procsnap Configuration
# ======================
#
# Sources
# -------
# proc_root: "/proc"           # Root of the proc filesystem (e.g. /host/proc in a container)
# io_buffer_kb: 64             # Read buffer size for pseudo-files
#
# Collection
# ----------
# timeout_ms: 5000             # Deadline for one snapshot
# parallel: false              # Collect cpu/memory/disk/network concurrently
# parallelism: null            # Worker threads for parallel mode (null = auto)
#
# Sampling
# --------
# count: 1                     # Number of snapshots to take
# refresh_interval_secs: 5     # Pause between snapshots when count > 1
#
# Output
# ------
# output_format: "json"        # json, yaml, table
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace (written to stderr)
"#;

    format!("{comments}\n{yaml}")
}
