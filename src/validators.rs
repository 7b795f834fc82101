//! Validation for configuration values that feed the sync run.

use crate::config::Config;

/// Validate the remote repository URL.
/// Returns an error message if validation fails, None if valid.
pub fn validate_repo_url(repo: &str) -> Option<String> {
    let repo = repo.trim();
    if repo.is_empty() {
        return Some("Repository URL cannot be empty".to_string());
    }

    let Some(rest) = repo
        .strip_prefix("https://")
        .or_else(|| repo.strip_prefix("http://"))
    else {
        return Some("Repository URL must start with https:// or http://".to_string());
    };

    if rest.trim_end_matches('/').split('/').count() < 2 {
        return Some("Repository URL must include a repository path".to_string());
    }

    None
}

/// Validate a branch name as it appears in the archive URL.
/// Returns an error message if validation fails, None if valid.
pub fn validate_branch(branch: &str) -> Option<String> {
    if branch.is_empty() {
        return Some("Branch cannot be empty".to_string());
    }
    if branch.chars().any(char::is_whitespace) {
        return Some("Branch cannot contain whitespace".to_string());
    }
    if branch.contains("..") || branch.starts_with('/') || branch.ends_with('/') {
        return Some("Branch is not a valid ref name".to_string());
    }
    None
}

/// Validate the template extension list.
/// Returns an error message if validation fails, None if valid.
pub fn validate_extensions(extensions: &[String]) -> Option<String> {
    if extensions.is_empty() {
        return Some("At least one template extension is required".to_string());
    }
    for ext in extensions {
        if ext.is_empty() {
            return Some("Extensions cannot be empty".to_string());
        }
        if ext.contains(['.', '/', '\\']) {
            return Some(format!(
                "Extension {:?} must be given without a dot or separator",
                ext
            ));
        }
    }
    None
}

/// Validate the installation root path.
/// Returns an error message if validation fails, None if valid.
pub fn validate_root(root: &str) -> Option<String> {
    if root.trim().is_empty() {
        return Some("Installation root cannot be empty".to_string());
    }

    let expanded = Config::expand_tilde(root);
    match std::fs::metadata(&expanded) {
        Ok(metadata) if !metadata.is_dir() => Some("Installation root is not a directory".to_string()),
        // Missing is fine; the scaffolder creates it.
        _ => None,
    }
}

/// Run every validator against a config and collect the failures.
pub fn validate_config(config: &Config) -> Vec<String> {
    [
        validate_repo_url(&config.remote.repo).map(|e| format!("remote.repo: {}", e)),
        validate_branch(&config.remote.branch).map(|e| format!("remote.branch: {}", e)),
        validate_extensions(&config.sync.extensions).map(|e| format!("sync.extensions: {}", e)),
        validate_root(&config.paths.root).map(|e| format!("paths.root: {}", e)),
    ]
    .into_iter()
    .flatten()
    .collect()
}
