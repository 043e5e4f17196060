// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware configuration lookup.

use std::path::{Path, PathBuf};

use passwerk_core::PhotoConfig;
use passwerk_core::error::Result;
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "config.json";

/// Return the per-user configuration directory.
pub fn config_dir() -> PathBuf {
    dirs_fallback().join("passwerk")
}

/// Resolve the configuration for a run.
///
/// An explicit file must load. Without one, the per-user `config.json` is
/// used when present and readable, and defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PhotoConfig> {
    if let Some(path) = explicit {
        let config = PhotoConfig::load(path)?;
        info!(path = %path.display(), "loaded configuration");
        return Ok(config);
    }
    Ok(load_config(&config_dir()).unwrap_or_default())
}

fn load_config(dir: &Path) -> Option<PhotoConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no user configuration, using defaults");
        return None;
    }
    match PhotoConfig::load(&path) {
        Ok(config) => {
            info!(path = %path.display(), "loaded user configuration");
            Some(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable user configuration");
            None
        }
    }
}

fn dirs_fallback() -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}
