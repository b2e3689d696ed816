//! Record validation — filtering extracted lines down to domain names
//!
//! Validation is a pure filter: lines are trimmed and either kept as-is
//! or dropped, never rewritten and never raised as errors. The predicate
//! accepts the usual domain shape (dot-joined alphanumeric labels with
//! interior hyphens, alphabetic TLD of two or more characters) and
//! rejects bare IPv4 addresses and well-known placeholder names.

use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// Substrings that mark a record as a placeholder, not a real target
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "example.com",
    "example.org",
    "test.com",
    "localhost",
    "localdomain",
    "invalid",
];

/// Compiled domain-format predicate
#[derive(Debug, Clone)]
pub struct DomainValidator {
    domain: Regex,
    ipv4: Regex,
}

impl Default for DomainValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainValidator {
    /// Compile the domain-shape and IPv4 patterns
    // Fixed literal patterns; compilation cannot fail.
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            domain: Regex::new(
                r"(?i)^(?:[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$",
            )
            .expect("domain regex is valid"),
            ipv4: Regex::new(
                r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
            )
            .expect("ipv4 regex is valid"),
        }
    }

    /// Whether a (pre-trimmed) line is a plausible domain-name record
    ///
    /// The shape check is case-insensitive but the record itself is never
    /// rewritten; the caller keeps the original casing.
    pub fn is_valid(&self, record: &str) -> bool {
        if record.is_empty() {
            return false;
        }
        if self.ipv4.is_match(record) {
            return false;
        }
        if !self.domain.is_match(record) {
            return false;
        }
        let lowered = record.to_ascii_lowercase();
        !PLACEHOLDER_PATTERNS.iter().any(|p| lowered.contains(p))
    }
}

/// Trim and filter raw lines down to records
///
/// With a validator the output is the subsequence of lines passing
/// [`DomainValidator::is_valid`]; without one every non-empty trimmed
/// line passes through unchanged.
pub fn filter_lines<'a, I>(lines: I, validator: Option<&DomainValidator>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| validator.is_none_or(|v| v.is_valid(line)))
        .map(String::from)
        .collect()
}

/// Read one extracted file and filter its lines to records
///
/// Non-UTF-8 bytes are replaced rather than failing the file; an
/// unreadable file is logged and contributes nothing. Per-file
/// before/after counts are logged for observability only.
pub fn read_file_records(path: &Path, validator: Option<&DomainValidator>) -> Vec<String> {
    let raw = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read extracted file");
            return Vec::new();
        }
    };

    let before = raw.lines().count();
    let records = filter_lines(raw.lines(), validator);
    debug!(
        path = %path.display(),
        before,
        after = records.len(),
        "filtered extracted file"
    );
    records
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_domains() {
        let v = DomainValidator::new();
        for record in [
            "a.com",
            "sub.target.io",
            "deep.sub.domain.co",
            "with-hyphen.example-corp.net",
            "B.co",
            "xn--bcher-kva.de",
            "123.numeric-label.org",
        ] {
            assert!(v.is_valid(record), "{record} should validate");
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        let v = DomainValidator::new();
        for record in [
            "",
            "not a domain",
            "nodots",
            ".leading.dot.com",
            "trailing.dot.com.",
            "-leading.hyphen.com",
            "label-.trailing.hyphen.net",
            "double..dot.com",
            "tld.toolong.a",
            "numeric.tld.123",
            "has space.com",
        ] {
            assert!(!v.is_valid(record), "{record:?} should be rejected");
        }
    }

    #[test]
    fn rejects_ipv4_addresses() {
        let v = DomainValidator::new();
        assert!(!v.is_valid("192.168.1.1"));
        assert!(!v.is_valid("8.8.8.8"));
        assert!(!v.is_valid("255.255.255.255"));
        // Out-of-range octets are not IPs, but they are not valid domains
        // either (numeric TLD)
        assert!(!v.is_valid("999.999.999.999"));
    }

    #[test]
    fn rejects_placeholder_names() {
        let v = DomainValidator::new();
        assert!(!v.is_valid("example.com"));
        assert!(!v.is_valid("sub.example.com"));
        assert!(!v.is_valid("www.test.com"));
        assert!(!v.is_valid("EXAMPLE.COM"), "skip-list is case-insensitive");
        assert!(!v.is_valid("something.invalid"));
    }

    #[test]
    fn validation_preserves_record_case() {
        let v = DomainValidator::new();
        let out = filter_lines(["B.co", "UPPER.NET"], Some(&v));
        assert_eq!(out, vec!["B.co", "UPPER.NET"], "records are never rewritten");
    }

    #[test]
    fn filter_output_is_a_subsequence_of_input() {
        let v = DomainValidator::new();
        let input = vec!["a.com", "junk line", "b.org", "192.168.0.1", "c.io"];
        let output = filter_lines(input.clone(), Some(&v));
        assert_eq!(output, vec!["a.com", "b.org", "c.io"]);

        let mut cursor = input.iter();
        for kept in &output {
            assert!(
                cursor.any(|orig| orig.trim() == kept),
                "output must preserve input order"
            );
        }
    }

    #[test]
    fn disabled_validation_is_identity_modulo_trim() {
        let input = vec!["  a.com  ", "not a domain", "", "   ", "c.io"];
        let output = filter_lines(input, None);
        assert_eq!(output, vec!["a.com", "not a domain", "c.io"]);
    }

    #[test]
    fn lines_are_trimmed_before_the_check() {
        let v = DomainValidator::new();
        let output = filter_lines(["  spaced.net  ", "\ttabbed.org\t"], Some(&v));
        assert_eq!(output, vec!["spaced.net", "tabbed.org"]);
    }

    #[test]
    fn file_reader_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        let mut bytes = b"good.com\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"\nalso-good.net\n");
        std::fs::write(&path, bytes).unwrap();

        let v = DomainValidator::new();
        let records = read_file_records(&path, Some(&v));
        assert_eq!(records, vec!["good.com", "also-good.net"]);
    }

    #[test]
    fn unreadable_file_contributes_nothing() {
        let records = read_file_records(Path::new("/definitely/not/here.txt"), None);
        assert!(records.is_empty());
    }
}
