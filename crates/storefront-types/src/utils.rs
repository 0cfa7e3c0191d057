//! Utility helpers shared across storefront crates.

use std::time::{SystemTime, UNIX_EPOCH};

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncates_long_ids() {
		assert_eq!(truncate_id("abcdefghijkl"), "abcdefgh..");
		assert_eq!(truncate_id("short"), "short");
	}
}
