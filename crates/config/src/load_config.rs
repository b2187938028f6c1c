// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `start` looking for `filename`.
pub fn find_in_parent(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.exists())
}

/// Pick the config file to load.
///
/// An explicit path always wins and is resolved against `cwd` when relative. Otherwise the
/// nearest `filename` at or above `cwd` is used, falling back to `default_dir/filename`.
pub fn resolve_config_path(
    find: FindInParent,
    cwd: impl AsRef<Path>,
    default_dir: impl AsRef<Path>,
    filename: &str,
    explicit: Option<PathBuf>,
) -> PathBuf {
    let cwd = cwd.as_ref();
    match explicit {
        Some(path) if path.is_absolute() => path,
        Some(path) => clean(cwd.join(path)),
        None => find(cwd, filename).unwrap_or_else(|| clean(default_dir.as_ref().join(filename))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/work/e2s.config.yaml"))
    }

    #[test]
    fn test_resolution_order() {
        let path = resolve_config_path(not_found, "/work/sub", "/etc/e2s", "e2s.config.yaml", None);
        assert_eq!(path, PathBuf::from("/etc/e2s/e2s.config.yaml"));

        let path = resolve_config_path(found, "/work/sub", "/etc/e2s", "e2s.config.yaml", None);
        assert_eq!(path, PathBuf::from("/work/e2s.config.yaml"));

        let path = resolve_config_path(
            found,
            "/work/sub",
            "/etc/e2s",
            "e2s.config.yaml",
            Some(PathBuf::from("/abs/custom.yaml")),
        );
        assert_eq!(path, PathBuf::from("/abs/custom.yaml"));

        let path = resolve_config_path(
            found,
            "/work/sub",
            "/etc/e2s",
            "e2s.config.yaml",
            Some(PathBuf::from("../conf/custom.yaml")),
        );
        assert_eq!(path, PathBuf::from("/work/conf/custom.yaml"));
    }
}
