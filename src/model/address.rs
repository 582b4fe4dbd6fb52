//! Notification addresses.
//!
//! Notifications accept either a full email address or a bare username;
//! bare usernames are qualified with the site email domain.

/// Normalize a notification recipient.
///
/// - `"bob"` with domain `"@example.com"` → `"bob@example.com"`
/// - `"Bob Smith <bob@example.com>"` → `"bob@example.com"`
/// - `"sally@somewhere.org"` → unchanged
///
/// The domain may be given with or without its leading `@`. With an empty
/// domain a bare username is kept as-is. Returns `None` for blank input.
pub fn qualify(raw: &str, domain: &str) -> Option<String> {
    let address = bare_address(raw);
    if address.is_empty() {
        return None;
    }
    if address.contains('@') {
        return Some(address);
    }

    let domain = domain.trim();
    if domain.is_empty() {
        return Some(address);
    }
    if domain.starts_with('@') {
        Some(format!("{address}{domain}"))
    } else {
        Some(format!("{address}@{domain}"))
    }
}

/// Key under which an address is deduplicated.
pub fn address_key(address: &str) -> String {
    address.to_lowercase()
}

/// Strip a display name: `"Name <addr>"` or `"<addr>"` → `"addr"`.
fn bare_address(raw: &str) -> String {
    let trimmed = raw.trim();
    if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
        if close > open {
            return trimmed[open + 1..close].trim().to_string();
        }
    }
    trimmed.to_string()
}
