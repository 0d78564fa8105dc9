//! Process state the path logic depends on, captured once.

use std::path::PathBuf;

use super::{AppConfig, ConfigError};

/// Working directory, home directory and cache root override.
///
/// Built once by [`Environment::capture`] and passed down explicitly; tests
/// construct it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub cwd: PathBuf,
    pub home: PathBuf,
    pub snapshots_dir: Option<PathBuf>,
}

impl Environment {
    /// Read the current directory and home directory of this process.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if either cannot be determined.
    pub fn capture(config: &AppConfig) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Missing {
            field: "cwd".into(),
            hint: format!("current directory is not accessible: {e}"),
        })?;
        let home = dirs_next::home_dir().ok_or_else(|| ConfigError::Missing {
            field: "home".into(),
            hint: "home directory not found; set HOME".into(),
        })?;
        let snapshots_dir = config.dir.clone().filter(|dir| !dir.as_os_str().is_empty());

        Ok(Self { cwd, home, snapshots_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_override_and_drops_empty() {
        figment::Jail::expect_with(|jail| {
            let config = AppConfig { dir: Some(PathBuf::from("/tmp/snaps")), ..Default::default() };
            let env = Environment::capture(&config).map_err(|e| e.to_string())?;
            assert_eq!(env.snapshots_dir, Some(PathBuf::from("/tmp/snaps")));
            assert_eq!(env.cwd.canonicalize().unwrap(), jail.directory().canonicalize().unwrap());

            let config = AppConfig { dir: Some(PathBuf::new()), ..Default::default() };
            assert!(Environment::capture(&config).map_err(|e| e.to_string())?.snapshots_dir.is_none());
            Ok(())
        });
    }
}
