use std::{fs, path::Path};

use log::debug;
use serde::Serialize;

#[derive(Serialize)]
struct Progress<'a> {
    current: usize,
    total: usize,
    phase: &'a str,
    status: &'a str,
}

/// Overwrite `path` with a one-line JSON progress record. Failures are only logged.
pub fn write_progress(path: &Path, current: usize, total: usize, phase: &str, status: &str) {
    let progress = Progress {
        current,
        total,
        phase,
        status,
    };

    let result = serde_json::to_string(&progress)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(e) = result {
        debug!("Could not write progress to {}: {}", path.display(), e);
    }
}
