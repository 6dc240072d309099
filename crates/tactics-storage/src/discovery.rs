//! Storage root discovery across known launcher layouts.

use std::path::{Path, PathBuf};

use tracing::info;

const MODEL_DIR: [&str; 2] = ["models", "ai_enhanced"];

/// Launcher-specific prefixes under the home directory, in search order.
const LAUNCHER_PREFIXES: &[&[&str]] = &[
    &[".minecraft"],
    &[".modrinth", "profiles", "default"],
    &[".local", "share", "PrismLauncher", "instances"],
    &[".multimc", "instances"],
    &["curseforge", "minecraft", "Instances"],
    &["ATLauncher", "instances"],
];

fn model_dir_under(base: PathBuf) -> PathBuf {
    MODEL_DIR.iter().fold(base, |p, part| p.join(part))
}

/// Every candidate root in search order; the last one is relative to the
/// working directory.
pub fn candidates(home: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = LAUNCHER_PREFIXES
        .iter()
        .map(|prefix| model_dir_under(prefix.iter().fold(home.to_path_buf(), |p, s| p.join(s))))
        .collect();
    out.push(model_dir_under(PathBuf::new()));
    out
}

/// First existing candidate under `home`, else the first candidate.
pub fn locate_root_in(home: &Path) -> PathBuf {
    let all = candidates(home);
    if let Some(found) = all.iter().find(|p| p.exists()) {
        info!(path = %found.display(), "found existing model directory");
        return found.clone();
    }
    let default = all
        .into_iter()
        .next()
        .unwrap_or_else(|| model_dir_under(home.to_path_buf()));
    info!(path = %default.display(), "using default model directory");
    default
}

/// [`locate_root_in`] for the current user's home. Without a home directory
/// only the working-directory candidate is left.
pub fn locate_root() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => locate_root_in(&home),
        None => model_dir_under(PathBuf::new()),
    }
}
