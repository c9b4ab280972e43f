use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Resolve the application home directory into an absolute path.
///
/// - `configured`: value from config; `None` selects the platform default
///   (`%APPDATA%/<default_subdir>` on Windows, `$HOME/<default_subdir>` elsewhere).
/// - A leading `~` is expanded to the user's home directory.
/// - Relative paths are resolved against the current working directory.
/// - When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match configured {
        Some(raw) => expand_path(raw.trim())?,
        None => platform_base_dir()?.join(default_subdir),
    };

    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        env::current_dir()
            .context("cannot determine current directory")?
            .join(resolved)
    };

    if create {
        std::fs::create_dir_all(&absolute)
            .with_context(|| format!("cannot create home_dir '{}'", absolute.display()))?;
    }

    Ok(absolute)
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(Path::new(raw).to_path_buf())
}

fn user_home() -> Result<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("neither HOME nor USERPROFILE is set"))
}

fn platform_base_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        if let Some(appdata) = env::var_os("APPDATA") {
            return Ok(PathBuf::from(appdata));
        }
    }
    user_home()
}
