//! Object key construction.
//!
//! Keys look like `{folder}/{base}_{suffix}{ext}`. The suffix is 8 random
//! lowercase hex characters, so two uploads of `invoice.pdf` into the same
//! folder never collide.

use uuid::Uuid;

const SUFFIX_LEN: usize = 8;
const FALLBACK_BASE: &str = "file";

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Normalize a folder to forward-slash segments.
///
/// Backslashes become slashes; empty, `.` and `..` segments are dropped.
#[must_use]
pub fn normalize_folder(folder: &str) -> String {
    folder
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a sanitized name into base and extension (extension keeps its dot).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx < name.len() - 1 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Build a unique object key for `file_name` under `folder`.
///
/// Only the last path component of `file_name` is used.
#[must_use]
pub fn build_object_key(folder: &str, file_name: &str) -> String {
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let sanitized = sanitize_file_name(last);
    let (base, ext) = split_extension(&sanitized);
    let base = base.trim_matches('.');
    let base = if base.is_empty() { FALLBACK_BASE } else { base };

    let name = format!("{base}_{}{}", random_suffix(), ext.to_ascii_lowercase());
    let folder = normalize_folder(folder);
    if folder.is_empty() {
        name
    } else {
        format!("{folder}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn suffix_of(key: &str) -> &str {
        let name = key.rsplit('/').next().unwrap();
        let stem = name.split('.').next().unwrap();
        stem.rsplit('_').next().unwrap()
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_file_name("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_file_name("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("org\\product//image/"), "org/product/image");
        assert_eq!(normalize_folder("/a/./b/../c"), "a/b/c");
        assert_eq!(normalize_folder(""), "");
    }

    #[test]
    fn test_build_object_key_shape() {
        let key = build_object_key("org/prod/image", "Front View.PNG");
        assert!(key.starts_with("org/prod/image/Front_View_"));
        assert!(key.ends_with(".png"));
        let suffix = suffix_of(&key);
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_build_object_key_drops_path_components() {
        let key = build_object_key("docs", "../../etc/passwd");
        assert!(key.starts_with("docs/passwd_"));
        let key = build_object_key("docs", "C:\\Users\\me\\manual.pdf");
        assert!(key.starts_with("docs/manual_"));
    }

    #[test]
    fn test_build_object_key_empty_base_becomes_file() {
        let key = build_object_key("docs", ".pdf");
        assert!(key.starts_with("docs/file_"));
        let key = build_object_key("docs", "");
        assert!(key.starts_with("docs/file_"));
    }

    #[test]
    fn test_build_object_key_without_folder() {
        let key = build_object_key("", "a.txt");
        assert!(!key.contains('/'));
        assert!(key.starts_with("a_"));
    }

    #[test]
    fn test_build_object_key_is_unique() {
        let a = build_object_key("f", "same.pdf");
        let b = build_object_key("f", "same.pdf");
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_key_only_contains_safe_chars(folder in ".{0,40}", name in ".{0,40}") {
            let key = build_object_key(&folder, &name);
            let file = key.rsplit('/').next().unwrap();
            for c in file.chars() {
                let safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(safe, "unexpected character {:?} in {}", c, key);
            }
            prop_assert!(!key.contains("//"));
            prop_assert!(!key.starts_with('/'));
        }

        #[test]
        fn prop_key_stays_inside_folder(name in ".{0,40}") {
            let key = build_object_key("org/product/image", &name);
            prop_assert!(key.starts_with("org/product/image/"));
            prop_assert_eq!(key.matches('/').count(), 3);
        }
    }
}
