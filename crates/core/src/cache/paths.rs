//! Path normalization and cache root resolution.
//!
//! Everything here is string and path arithmetic over an [`Environment`];
//! nothing reads the process state directly.

use std::path::PathBuf;

use crate::config::Environment;

/// Directory name of the default cache root under the home directory.
pub const DEFAULT_CACHE_DIR: &str = ".wpsnapshots";

/// Append exactly one trailing `/`.
pub fn trailing_slash(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

/// Resolves user paths and the snapshot cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    env: Environment,
}

impl PathResolver {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Normalize a user-supplied path to an absolute, `/`-terminated string.
    ///
    /// - `/` is returned as is.
    /// - A path that does not start with `.`, `/`, `\` or `~` is treated as `./path`.
    /// - `./path` is resolved against the working directory.
    /// - `~path` is resolved against the home directory.
    ///
    /// Other inputs (`../x`, `.hidden`) are left relative; this is string
    /// concatenation, not canonicalization.
    pub fn normalize(&self, raw: &str) -> String {
        let mut path = raw.trim().to_string();
        if path == "/" {
            return path;
        }

        if path.chars().next().is_some_and(|c| !matches!(c, '.' | '/' | '\\' | '~')) {
            path = format!("./{path}");
        }

        if let Some(rest) = path.strip_prefix("./") {
            path = format!("{}/{rest}", self.env.cwd.display().to_string().trim_end_matches('/'));
        }

        if let Some(rest) = path.strip_prefix('~') {
            path = format!("{}{rest}", self.env.home.display().to_string().trim_end_matches('/'));
        }

        trailing_slash(&path)
    }

    /// The snapshot cache root, always `/`-terminated.
    ///
    /// A non-empty override is used verbatim; otherwise `<home>/.wpsnapshots/`.
    pub fn cache_root(&self) -> PathBuf {
        let root = match self.env.snapshots_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => trailing_slash(&dir.display().to_string()),
            None => format!("{}/{DEFAULT_CACHE_DIR}/", self.env.home.display().to_string().trim_end_matches('/')),
        };
        PathBuf::from(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(snapshots_dir: Option<&str>) -> PathResolver {
        PathResolver::new(Environment {
            cwd: PathBuf::from("/work/site"),
            home: PathBuf::from("/home/jo/"),
            snapshots_dir: snapshots_dir.map(PathBuf::from),
        })
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(trailing_slash("/a/b"), "/a/b/");
        assert_eq!(trailing_slash("/a/b///"), "/a/b/");
        assert_eq!(trailing_slash(""), "/");
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(resolver(None).normalize("/"), "/");
        assert_eq!(resolver(None).normalize("  /  "), "/");
    }

    #[test]
    fn test_normalize_relative() {
        let r = resolver(None);
        assert_eq!(r.normalize("test"), "/work/site/test/");
        assert_eq!(r.normalize("./test/"), "/work/site/test/");
        assert_eq!(r.normalize("./"), "/work/site/");
    }

    #[test]
    fn test_normalize_home() {
        let r = resolver(None);
        assert_eq!(r.normalize("~"), "/home/jo/");
        assert_eq!(r.normalize("~/test"), "/home/jo/test/");
    }

    #[test]
    fn test_normalize_absolute_and_best_effort() {
        let r = resolver(None);
        assert_eq!(r.normalize("/var/www"), "/var/www/");
        assert_eq!(r.normalize("../up"), "../up/");
    }

    #[test]
    fn test_cache_root_default() {
        assert_eq!(resolver(None).cache_root(), PathBuf::from("/home/jo/.wpsnapshots/"));
    }

    #[test]
    fn test_cache_root_override() {
        assert_eq!(resolver(Some("/tmp/snaps")).cache_root(), PathBuf::from("/tmp/snaps/"));
        assert_eq!(resolver(Some("/tmp/snaps//")).cache_root(), PathBuf::from("/tmp/snaps/"));
        assert_eq!(resolver(Some("")).cache_root(), PathBuf::from("/home/jo/.wpsnapshots/"));
    }
}
