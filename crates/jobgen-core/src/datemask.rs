//! Date-mask substitution for redirect paths.
//!
//! A template such as `out_%Y%m%d.log` contains runs of strftime specifiers
//! drawn from a fixed mask-character set. Each run is replaced in place by the
//! given instant formatted with that run as the format string. Runs the
//! formatter cannot handle (e.g. `%J`) are left verbatim.

use std::fmt::Write;
use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use regex::Regex;

const MASK_PATTERN: &str = r"%[YyjJmMdDhHISs]+";

fn mask_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MASK_PATTERN).expect("mask pattern is a valid regex"))
}

/// Returns true if `template` contains at least one date placeholder.
pub fn has_placeholder(template: &str) -> bool {
    mask_regex().is_match(template)
}

/// Replace every placeholder run in `template` with `now` formatted by it.
pub fn expand(template: &str, now: NaiveDateTime) -> String {
    mask_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let mask = &caps[0];
            format_mask(mask, now).unwrap_or_else(|| {
                tracing::warn!(mask, "unsupported date specifier in redirect path; left as is");
                mask.to_string()
            })
        })
        .into_owned()
}

fn format_mask(mask: &str, now: NaiveDateTime) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(mask).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", now.format_with_items(items.into_iter())).ok()?;
    Some(out)
}
