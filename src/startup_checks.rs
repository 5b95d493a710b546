//! Startup requirement validation for procsnap.
//!
//! Confirms that the proc root is present, that every pseudo-file the
//! collectors read can be opened, and that the capacity call works on `/`.

use procsnap::source::ALL_SOURCES;
use procsnap::{HostSource, ProcFs};
use tracing::{debug, error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(source: &ProcFs) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_proc_root(source)?;
    check_sources(source)?;
    check_capacity_call(source)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

fn check_proc_root(source: &ProcFs) -> Result<(), ValidationError> {
    let root = source.root();
    if !root.is_dir() {
        error!("❌ {} not found or not a directory", root.display());
        error!("   Solution: mount procfs or pass --proc-root");
        return Err(ValidationError::ProcRootMissing(root.display().to_string()));
    }
    debug!("Proc root present: {}", root.display());
    Ok(())
}

/// Check that each pseudo-file opens. Missing files are collected so one run
/// reports all of them.
fn check_sources(source: &ProcFs) -> Result<(), ValidationError> {
    let mut missing = Vec::new();

    for rel in ALL_SOURCES {
        let path = source.display_path(rel);
        match source.open(rel) {
            Ok(_) => info!("✅ {} readable", path),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                error!("❌ Cannot read {} - insufficient permissions", path);
                return Err(ValidationError::InsufficientPermissions(format!("{}: {}", path, e)));
            }
            Err(e) => {
                error!("❌ Cannot open {}: {}", path, e);
                missing.push(path);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SourcesUnavailable(missing.join(", ")))
    }
}

fn check_capacity_call(source: &ProcFs) -> Result<(), ValidationError> {
    match source.fs_usage("/") {
        Ok(usage) if usage.blocks == 0 => {
            warn!("⚠️  statvfs(/) reports zero blocks - disk usage will read as 0%");
            Ok(())
        }
        Ok(_) => {
            info!("✅ statvfs(/) works");
            Ok(())
        }
        Err(e) => {
            error!("❌ statvfs(/) failed: {}", e);
            Err(ValidationError::CapacityCallFailed(e.to_string()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Proc root not found: {0}")]
    ProcRootMissing(String),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Pseudo-files unavailable: {0}")]
    SourcesUnavailable(String),

    #[error("Filesystem capacity call failed: {0}")]
    CapacityCallFailed(String),
}
