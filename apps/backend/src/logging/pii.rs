//! PII-safe formatting for log fields.

use std::fmt;

use lazy_regex::regex;
use regex::Captures;

/// Mask emails and opaque tokens in free text.
///
/// Emails keep the first character of the local part and the full domain.
/// Base64-like or hex runs of 16+ characters become `[REDACTED_TOKEN]`.
pub fn redact(input: &str) -> String {
    let emails = regex!(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b")
        .replace_all(input, |caps: &Captures| {
            let full = &caps[0];
            match full.split_once('@') {
                Some((local, domain)) => match local.chars().next() {
                    Some(first) => format!("{first}***@{domain}"),
                    None => full.to_string(),
                },
                None => full.to_string(),
            }
        });

    let base64 = regex!(r"\b[A-Za-z0-9+/]{16,}={0,2}\b").replace_all(&emails, "[REDACTED_TOKEN]");
    regex!(r"\b[A-Fa-f0-9]{16,}\b")
        .replace_all(&base64, "[REDACTED_TOKEN]")
        .into_owned()
}

/// Display wrapper that redacts on format, for use as `%Redacted(&email)`.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
