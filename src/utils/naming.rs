use regex::Regex;
use std::sync::OnceLock;

/// `<32 lowercase hex>.<ext>`, as produced by [`artifact_file_name`]
const ARTIFACT_NAME_PATTERN: &str = r"^[0-9a-f]{32}\.([A-Za-z0-9]+)$";

/// Collision-resistant random file name component (32 hex chars)
pub fn random_name() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Name for a freshly allocated artifact in a namespace directory
pub fn artifact_file_name(extension: &str) -> String {
    format!("{}.{}", random_name(), extension)
}

/// Name for a new manifest file with the given prefix
pub fn manifest_file_name(prefix: &str) -> String {
    format!("{}{}", prefix, random_name())
}

/// Whether `name` looks like an artifact this crate allocated
pub fn is_allocated_artifact_name(name: &str, extension: &str) -> bool {
    let Some(pattern) = artifact_pattern() else {
        return false;
    };
    pattern
        .captures(name)
        .is_some_and(|caps| &caps[1] == extension)
}

/// Compiled artifact name pattern; `None` only if the pattern is rejected by the regex engine
pub fn artifact_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(ARTIFACT_NAME_PATTERN).ok())
        .as_ref()
}
