//! Derivation of structured-lease record names from a prefix and a group.
//!
//! Every process sharing a store must derive the same name for the same group,
//! so the transformation below is fixed.

/// Builds the record name for `group` under `prefix`.
///
/// `"My Lock!!"` + `"Group A"` becomes `"my-lock---group-a"`.
pub fn derive_resource_name(prefix: &str, group: &str) -> String {
    sanitize_resource_name(&format!("{}-{}", prefix, group))
}

/// Lower-cases `name`, replaces anything outside `[a-z0-9-.]` with `-`, then
/// strips non-alphanumerics from both ends. Idempotent.
pub fn sanitize_resource_name(name: &str) -> String {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '-',
        })
        .collect();

    normalized
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}
