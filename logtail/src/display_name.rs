//! reader_id -> display name assignment (spec §6): `name:path` explicitly
//! sets the name; otherwise the last 4 characters of the base name without
//! extension, uppercased, with a numeric suffix to disambiguate duplicates.

use std::collections::HashSet;
use std::path::Path;

/// Splits a `[name:]path` CLI argument into `(explicit_name, path)`.
pub fn split_name_and_path(arg: &str) -> (Option<&str>, &str) {
    match arg.split_once(':') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => (Some(name), path),
        _ => (None, arg),
    }
}

fn derive_name(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let tail: String = stem.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    tail.to_uppercase()
}

/// Assigns unique display names in argument order.
pub fn assign_names(args: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut result = Vec::with_capacity(args.len());
    for arg in args {
        let (explicit, path) = split_name_and_path(arg);
        let mut name = explicit.map(|s| s.to_string()).unwrap_or_else(|| derive_name(path));
        let mut suffix = 1;
        while used.contains(&name) {
            name = format!("{}{}", explicit.unwrap_or(&derive_name(path)), suffix);
            suffix += 1;
        }
        used.insert(name.clone());
        result.push(name);
    }
    result
}
