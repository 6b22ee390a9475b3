use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the kiln data directory: `$KILN_HOME`, else `~/.kiln`
pub fn get_kiln_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(v) = std::env::var("KILN_HOME") {
        if !v.trim().is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".kiln"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.kiln/config.toml (highest)
    let kiln_config = get_kiln_data_dir()?.join("config.toml");

    // Priority 2: ./kiln.config.toml (current directory)
    let local_config = Path::new("kiln.config.toml");

    let mut cfg = if kiln_config.exists() {
        load_from(&kiln_config)?
    } else if local_config.exists() {
        load_from(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    // Environment variable overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("KILN_MAX_WORKERS") {
        match v.trim().parse::<usize>() {
            Ok(n) if n > 0 => cfg.execution.max_workers = Some(n),
            _ => tracing::warn!("ignoring invalid KILN_MAX_WORKERS={v}"),
        }
    }
    if let Ok(v) = std::env::var("KILN_FAIL_FAST") {
        if !v.trim().is_empty() {
            cfg.execution.fail_fast = v.eq_ignore_ascii_case("true") || v.trim() == "1";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[logging]\nlevel = \"debug\"\n\n[execution]\nmax_workers = 2\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.execution.max_workers, Some(2));
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir.path().join("nope.toml")).is_err());
    }
}
