//! Name validation and collision suffixes for uploaded files.

use chrono::{DateTime, Utc};

/// Longest accepted name, in bytes (the common filesystem limit for one path component).
pub const MAX_NAME_LEN: usize = 255;

/// Check that an uploaded name is a single, plain path component.
pub fn validate(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("'{name}' is not a file name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("name exceeds {MAX_NAME_LEN} bytes"));
    }
    if name.contains(['/', '\\']) {
        return Err("name must not contain path separators".to_string());
    }
    if name.chars().any(char::is_control) {
        return Err("name must not contain control characters".to_string());
    }
    Ok(())
}

/// Split `name` into base and extension, keeping the dot on the extension.
/// A leading dot (`.env`) does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build the `attempt`-th alternative for a name that is already taken:
/// `report.pdf` becomes `report_20260102150405.pdf`, then `report_20260102150405_1.pdf`, ...
///
/// The result never exceeds [`MAX_NAME_LEN`]; long bases are shortened to make
/// room for the suffix, and an extension too long to keep is folded into the base.
pub fn disambiguate(name: &str, at: DateTime<Utc>, attempt: u32) -> String {
    let (base, ext) = split_extension(name);
    let stamp = at.format("%Y%m%d%H%M%S");
    let suffix = if attempt == 0 {
        format!("_{stamp}")
    } else {
        format!("_{stamp}_{attempt}")
    };

    let budget = MAX_NAME_LEN - suffix.len();
    let (base, ext) = if base.len() + ext.len() <= budget {
        (base, ext)
    } else if ext.len() < budget {
        (truncate(base, budget - ext.len()), ext)
    } else {
        (truncate(name, budget), "")
    };
    format!("{base}{suffix}{ext}")
}
