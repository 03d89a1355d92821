use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Prefix of pool keys held by nodes whose source is not resolved yet.
pub const PENDING_KEY_PREFIX: &str = "pending:";

/// Normalize a media source locator into an asset pool key.
///
/// URLs get a lowercase scheme and host and lose their `#fragment`; paths use `/` separators with
/// `.` and empty segments removed. Two locators that fetch the same bytes map to the same key.
pub fn normalize_source_key(src: &str) -> ScenecastResult<String> {
    let s = src.trim();
    if s.is_empty() {
        return Err(ScenecastError::validation("media source must be non-empty"));
    }

    if let Some((scheme, rest)) = s.split_once("://") {
        let rest = rest.split('#').next().unwrap_or_default();
        let (authority, tail) = match rest.find(['/', '?']) {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(ScenecastError::validation(format!(
                "media url '{s}' has no host"
            )));
        }
        let tail = if tail.is_empty() { "/" } else { tail };
        return Ok(format!(
            "{}://{}{}",
            scheme.to_ascii_lowercase(),
            authority.to_ascii_lowercase(),
            tail
        ));
    }

    let unified = s.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.is_empty() {
        return Err(ScenecastError::validation(
            "media source must contain a file name",
        ));
    }
    let joined = parts.join("/");
    Ok(if absolute { format!("/{joined}") } else { joined })
}

/// Pool key used by node `node` until its source resolves.
pub fn pending_key(node: u64) -> String {
    format!("{PENDING_KEY_PREFIX}{node}")
}

/// Turn an asset key into a safe file stem (slashes and brackets become `-`).
pub fn sanitize_file_stem(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| match c {
            '/' | '\\' | '[' | ']' | ':' => '-',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "asset".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
