//! Centralized validation and helper functions.

/// Maximum number of donors accepted from a single input file (DOS protection)
pub const MAX_DONORS: usize = 5_000_000;

/// Longest raw typing accepted; allele strings over whole families can be long
pub const MAX_TYPING_LENGTH: usize = 4096;

/// Normalize a raw typing for lookup.
///
/// Surrounding whitespace and any locus prefix (`A*`, `HLA-DRB1*`) are removed
/// and letters are upper-cased. Returns `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use hla_match::utils::validation::normalize_typing;
///
/// assert_eq!(normalize_typing(" A*01:01 ").as_deref(), Some("01:01"));
/// assert_eq!(normalize_typing("hla-drb1*15:ab").as_deref(), Some("15:AB"));
/// assert_eq!(normalize_typing("A*"), None);
/// assert_eq!(normalize_typing("   "), None);
/// ```
#[must_use]
pub fn normalize_typing(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = match trimmed.rfind('*') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_uppercase())
    }
}

/// Check whether a typing is short enough to be worth resolving.
#[must_use]
pub fn is_valid_typing_length(raw: &str) -> bool {
    raw.len() <= MAX_TYPING_LENGTH
}

/// Check if adding another donor would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new donor.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if let Some(msg) = check_donor_limit(donors.len()) {
///     return Err(ParseError::TooManyDonors(msg));
/// }
/// donors.push(donor); // Safe to add
/// ```
#[must_use]
pub fn check_donor_limit(count: usize) -> Option<String> {
    if count >= MAX_DONORS {
        Some(format!(
            "Too many donors: adding another would exceed maximum of {MAX_DONORS}"
        ))
    } else {
        None
    }
}

/// Validate a nomenclature version such as `3.33.0`.
///
/// Versions are dot-separated numeric components.
#[must_use]
pub fn is_valid_nomenclature_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
