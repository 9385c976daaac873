//! Path authorization.
//!
//! A path is authorized when, after normalization, it sits under the fixed
//! scratch root or under one of the configured `allowedPaths`. Matching is by
//! whole path components: `/home/me/proj` covers `/home/me/proj/src` but not
//! `/home/me/project2`.

use crate::policy::defaults::SCRATCH_ROOT;
use crate::policy::types::PolicyConfig;
use std::path::{Component, Path, PathBuf};

/// Expand `~` and `~/...` to the home directory. `~user` is not supported.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if path.starts_with('~') {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Normalize `path` into an absolute path.
///
/// Returns `None` for empty paths, NUL bytes, any `..` segment, and
/// unresolvable home shorthand. Relative paths resolve against `working_dir`.
pub fn resolve(path: &str, working_dir: &Path) -> Option<PathBuf> {
    let path = path.trim();
    if path.is_empty() || path.contains('\0') {
        return None;
    }

    let expanded = expand_home(path)?;
    if expanded
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    let joined = if expanded.is_absolute() {
        expanded
    } else {
        if working_dir
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }
        working_dir.join(expanded)
    };

    if !joined.is_absolute() {
        return None;
    }

    // Drop `.` segments; `components()` already collapses `//`.
    Some(
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    )
}

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Whether the shell could expand `word` into a path other than its text.
///
/// Parameter, command and brace expansion make a word unresolvable. Glob
/// characters are tolerated in the final component only, and not when that
/// component starts with `.` or `[`, which could reach `..`.
pub fn has_expansion(word: &str) -> bool {
    if word.contains(['$', '`', '{', '}']) {
        return true;
    }
    let trimmed = word.trim_end_matches('/');
    let (parents, last) = match trimmed.rsplit_once('/') {
        Some((parents, last)) => (parents, last),
        None => ("", trimmed),
    };
    if parents.contains(GLOB_CHARS) {
        return true;
    }
    last.contains(GLOB_CHARS) && (last.starts_with('.') || last.starts_with('['))
}

/// Whether `path` is under the scratch root or an allowed path.
pub fn is_authorized(path: &str, working_dir: &Path, config: &PolicyConfig) -> bool {
    if has_expansion(path) {
        return false;
    }
    let Some(resolved) = resolve(path, working_dir) else {
        return false;
    };

    if resolved.starts_with(SCRATCH_ROOT) {
        return true;
    }

    config
        .allowed_paths
        .iter()
        .filter_map(|entry| allowed_root(entry))
        .any(|root| resolved.starts_with(root))
}

/// Whether `path` is strictly inside the scratch root (not the root itself).
/// Used for destructive operations, which ignore `allowedPaths`.
pub fn is_inside_scratch(path: &str, working_dir: &Path) -> bool {
    if has_expansion(path) {
        return false;
    }
    let Some(resolved) = resolve(path, working_dir) else {
        return false;
    };
    resolved.starts_with(SCRATCH_ROOT) && resolved != Path::new(SCRATCH_ROOT)
}

/// Normalize an `allowedPaths` entry. Relative or traversing entries are ignored.
pub fn allowed_root(entry: &str) -> Option<PathBuf> {
    let expanded = expand_home(entry.trim())?;
    if !expanded.is_absolute()
        || expanded
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(
        expanded
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(paths: &[&str]) -> PolicyConfig {
        PolicyConfig {
            allowed_paths: paths.iter().map(|p| p.to_string()).collect(),
            ..PolicyConfig::default()
        }
    }

    #[test]
    fn test_scratch_always_authorized() {
        let config = PolicyConfig::default();
        let cwd = Path::new("/home/user/project");
        assert!(is_authorized("/tmp/x", cwd, &config));
        assert!(is_authorized("/tmp/deep/nested/file.txt", cwd, &config));
        assert!(is_authorized("/tmp", cwd, &config));
    }

    #[test]
    fn test_empty_allowed_paths_denies_home() {
        let config = PolicyConfig::default();
        let cwd = Path::new("/");
        assert!(!is_authorized("/home/user/secret", cwd, &config));
    }

    #[test]
    fn test_allowed_path_prefix_by_component() {
        let config = config_with(&["/home/user"]);
        let cwd = Path::new("/");
        assert!(is_authorized("/home/user/secret", cwd, &config));
        assert!(is_authorized("/home/user", cwd, &config));
        assert!(!is_authorized("/home/username/secret", cwd, &config));
        assert!(!is_authorized("/home", cwd, &config));
    }

    #[test]
    fn test_relative_resolves_against_working_dir() {
        let config = config_with(&["/work/repo"]);
        assert!(is_authorized("src/main.rs", Path::new("/work/repo"), &config));
        assert!(is_authorized("./src/main.rs", Path::new("/work/repo"), &config));
        assert!(!is_authorized("src/main.rs", Path::new("/work/other"), &config));
        assert!(is_authorized("notes.txt", Path::new("/tmp/session"), &config));
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let config = config_with(&["/work/repo"]);
        let cwd = Path::new("/work/repo");
        assert!(!is_authorized("../other/file", cwd, &config));
        assert!(!is_authorized("/tmp/../etc/passwd", cwd, &config));
        assert!(!is_authorized("/work/repo/src/../../x", cwd, &config));
    }

    #[test]
    fn test_rejects_empty_and_nul() {
        let config = PolicyConfig::default();
        let cwd = Path::new("/tmp");
        assert!(!is_authorized("", cwd, &config));
        assert!(!is_authorized("/tmp/a\0b", cwd, &config));
    }

    #[test]
    fn test_home_shorthand() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let config = config_with(&["~/code"]);
        let cwd = Path::new("/");
        assert!(is_authorized("~/code/app/main.rs", cwd, &config));
        assert!(is_authorized(
            &home.join("code/x").to_string_lossy(),
            cwd,
            &config
        ));
        assert!(!is_authorized("~/Documents/taxes.pdf", cwd, &config));
        assert!(!is_authorized("~other/code", cwd, &config));
    }

    #[test]
    fn test_relative_allowed_entry_ignored() {
        let config = config_with(&["repo"]);
        assert!(!is_authorized("/repo/file", Path::new("/"), &config));
        assert!(allowed_root("repo").is_none());
        assert!(allowed_root("/a/../b").is_none());
    }

    #[test]
    fn test_inside_scratch_is_strict() {
        let cwd = Path::new("/home/user");
        assert!(is_inside_scratch("/tmp/build", cwd));
        assert!(is_inside_scratch("/tmp/*", cwd));
        assert!(!is_inside_scratch("/tmp", cwd));
        assert!(!is_inside_scratch("/tmp/", cwd));
        assert!(!is_inside_scratch("/home/user/project", cwd));
        assert!(!is_inside_scratch("build", cwd));
        assert!(is_inside_scratch("build", Path::new("/tmp/work")));
        assert!(!is_inside_scratch("$TMPDIR/x", cwd));
        assert!(!is_inside_scratch("/tmp/../home", cwd));
    }

    #[test]
    fn test_expansions_are_unresolvable() {
        let cwd = Path::new("/home/dev");
        let config = PolicyConfig::default();
        assert!(!is_inside_scratch("/tmp/{x,..}/home", cwd));
        assert!(!is_authorized("/tmp/{x,..}/home", cwd, &config));
        assert!(!is_inside_scratch("/tmp/x{,/../../home}", cwd));
        assert!(!is_inside_scratch("/tmp/`echo ..`/home", cwd));
        assert!(!is_inside_scratch("/tmp/*/../home", cwd));
        assert!(!is_inside_scratch("/tmp/.*", cwd));
        assert!(!is_authorized("/tmp/.?/etc", cwd, &config));
        assert!(is_inside_scratch("/tmp/build/*.o", cwd));
        assert!(is_authorized("/tmp/logs/run-?.txt", cwd, &config));

        assert!(has_expansion("$HOME"));
        assert!(has_expansion("a/{b,c}"));
        assert!(!has_expansion("/tmp/plain/path"));
        assert!(!has_expansion("src/*.rs"));
    }

    #[test]
    fn test_resolve_normalizes() {
        let cwd = Path::new("/work");
        assert_eq!(
            resolve("./a//b/./c", cwd),
            Some(PathBuf::from("/work/a/b/c"))
        );
        assert_eq!(resolve("/x/y/", cwd), Some(PathBuf::from("/x/y")));
    }
}
