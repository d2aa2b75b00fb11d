// src/infra/paths.rs - XDG-compliant path management
//
// All paths respect the CALLHINT_HOME environment variable for isolation.
// When CALLHINT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.callhint/ and data uses XDG_DATA_HOME/callhint.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the CALLHINT_HOME override, if set.
fn callhint_home() -> Option<PathBuf> {
    std::env::var_os("CALLHINT_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $CALLHINT_HOME/ or ~/.callhint/
pub fn config_dir() -> PathBuf {
    if let Some(home) = callhint_home() {
        return home;
    }
    dirs_home().join(".callhint")
}

/// Data directory: $CALLHINT_HOME/data/ or ~/.local/share/callhint/
pub fn data_dir() -> PathBuf {
    if let Some(home) = callhint_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "callhint")
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// SQLite database path
pub fn db_path() -> PathBuf {
    data_dir().join("callhint.db")
}

/// JSON learning-state file for a profile
pub fn state_file_path(profile: &str) -> PathBuf {
    data_dir().join("state").join(format!("{profile}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_data_dir() {
        let data = data_dir();
        assert!(db_path().starts_with(&data));
        assert!(state_file_path("bob").ends_with("state/bob.json"));
        assert!(config_file_path().ends_with("config.toml"));
    }
}
