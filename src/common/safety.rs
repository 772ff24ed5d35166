use std::path::Path;

/// Paths that must never be moved to the trash, whatever a plan says.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/Library/Application Support",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Library/PreferencePanes",
    "/usr",
    "/bin",
    "/sbin",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/Volumes",
];

/// Home-relative paths that must never be trashed as a whole
const PROTECTED_HOME_DIRS: &[&str] = &[
    "",
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    "Library/Application Support",
    "Library/Caches",
    "Library/Containers",
    "Library/Group Containers",
    "Library/Preferences",
    "Library/Logs",
    "Library/LaunchAgents",
    "Applications",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected against the current user's home.
pub fn is_protected(path: &Path) -> bool {
    match dirs::home_dir() {
        Some(home) => is_protected_under(path, &home),
        None => is_protected_under(path, Path::new("/nonexistent-home")),
    }
}

/// Check if a path is protected, with the home directory made explicit.
pub fn is_protected_under(path: &Path, home: &Path) -> bool {
    // Path equality compares components, so trailing separators don't matter
    if PROTECTED_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }

    PROTECTED_HOME_DIRS.iter().any(|dir| {
        let protected = if dir.is_empty() {
            home.to_path_buf()
        } else {
            home.join(dir)
        };
        path == protected
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_protected() {
        assert!(is_protected(Path::new("/")));
    }

    #[test]
    fn test_system_dirs_protected() {
        assert!(is_protected(Path::new("/System")));
        assert!(is_protected(Path::new("/Users")));
        assert!(is_protected(Path::new("/Applications")));
        assert!(is_protected(Path::new("/Library/LaunchDaemons")));
    }

    #[test]
    fn test_home_roots_protected() {
        let home = Path::new("/Users/me");
        assert!(is_protected_under(home, home));
        assert!(is_protected_under(&home.join("Library/Caches"), home));
        assert!(is_protected_under(&home.join("Documents/"), home));
    }

    #[test]
    fn test_app_artifacts_not_protected() {
        let home = Path::new("/Users/me");
        assert!(!is_protected_under(&home.join("Library/Caches/com.example.app"), home));
        assert!(!is_protected_under(Path::new("/Applications/Slack.app"), home));
        assert!(!is_protected_under(Path::new("/tmp/somefile"), home));
    }
}
