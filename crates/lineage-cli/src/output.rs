use std::fs;
use std::path::Path;

use lineage_core::LineageError;
use lineage_trace::{load_trace, ParserConfig, Registry};
use log::warn;
use serde::Serialize;

/// Writes `value` as pretty JSON, creating parent directories.
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), LineageError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| LineageError::io("create-dir", err).with_context("path", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| LineageError::serde("serialize-output", err))?;
    fs::write(path, json)
        .map_err(|err| LineageError::io("write-output", err).with_context("path", path.display()))
}

/// Parses the log at `path`; a missing log yields an empty registry.
pub fn load_registry(path: &Path, config: &ParserConfig) -> Result<Registry, LineageError> {
    match load_trace(path, config)? {
        Some(registry) => Ok(registry),
        None => {
            warn!("{} does not exist, continuing with an empty registry", path.display());
            Ok(Registry::new())
        }
    }
}
