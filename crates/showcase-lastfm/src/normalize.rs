// SPDX-License-Identifier: GPL-3.0-or-later

//! Pure helpers for cleaning up provider payloads.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

/// Coerces a field the provider may send as a bare object, a list, or not at all
/// into a list.
///
/// Absent, `null` and the empty-string placeholder become `[]`; a bare value becomes
/// a one-element list; a list is returned as-is.
pub fn ensure_sequence(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) if text.is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

/// Pulls the 4-digit year out of a wiki timestamp like `"25 Mar 2013, 15:47"`.
///
/// Only the `", NNNN"` shape is recognised; the rest of the string is not validated.
pub fn extract_year(published: &str) -> Option<String> {
    lazy_static! {
        static ref YEAR_REGEX: Regex = Regex::new(r", (\d{4})").expect("valid year regex");
    }

    YEAR_REGEX
        .captures(published)
        .and_then(|captures| captures.get(1))
        .map(|year| year.as_str().to_string())
}

/// Simulated per-track playcount: `floor(total / (rank_index + 5) * U(0.8, 1.2)) + 1`.
///
/// The provider has no per-track figures, so this is made-up data with a
/// descending trend by rank. It is never reproducible between calls and is
/// always at least 1.
pub fn synthesize_playcount<R: Rng + ?Sized>(total: u64, rank_index: usize, rng: &mut R) -> u64 {
    let jitter: f64 = rng.gen_range(0.8..1.2);
    let share = total as f64 / (rank_index as f64 + 5.0) * jitter;
    share.floor() as u64 + 1
}
