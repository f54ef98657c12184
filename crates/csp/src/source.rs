//! Source expressions and the formatters that canonicalize nonce and hash sources.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use sha2::Digest;

use crate::error::CspError;

/// Marker substituted with the per-request nonce when a policy is compiled.
///
/// Add it to a directive wherever a fresh `'nonce-...'` source is needed.
pub const NONCE_PLACEHOLDER: &str = "{{nonce}}";

// Keyword sources
pub const SOURCE_SELF: &str = "'self'";
pub const SOURCE_UNSAFE_INLINE: &str = "'unsafe-inline'";
pub const SOURCE_UNSAFE_EVAL: &str = "'unsafe-eval'";
pub const SOURCE_NONE: &str = "'none'";
pub const SOURCE_NONCE: &str = NONCE_PLACEHOLDER;
pub const SOURCE_STRICT_DYNAMIC: &str = "'strict-dynamic'";
pub const SOURCE_REPORT_SAMPLE: &str = "'report-sample'";
pub const SOURCE_UNSAFE_HASHES: &str = "'unsafe-hashes'";

// Scheme sources
pub const SCHEME_BLOB: &str = "blob:";
pub const SCHEME_DATA: &str = "data:";
pub const SCHEME_FILE: &str = "filesystem:";
pub const SCHEME_HTTP: &str = "http:";
pub const SCHEME_HTTPS: &str = "https:";
pub const SCHEME_MEDIA: &str = "mediastream:";

/// Formats a nonce value as a `'nonce-<value>'` source.
///
/// Surrounding whitespace and quotes are dropped, as is an existing `nonce-`
/// prefix, so passing an already formatted source back in returns it unchanged.
pub fn nonce(value: &str) -> String {
    let value = value.trim().trim_matches('\'');
    let value = value.strip_prefix("nonce-").unwrap_or(value);
    format!("'nonce-{}'", value)
}

/// Formats a base64 digest as a `'<algorithm>-<digest>'` source.
///
/// If the value already carries a `sha*-` tag it is discarded and `algorithm`
/// is used instead. No attempt is made to check the digest itself.
pub fn hash(algorithm: &str, value: &str) -> String {
    let mut value = value.trim().trim_matches('\'');

    if let Some(dash) = value.find('-') {
        if dash > 0 && value[..dash].starts_with("sha") {
            value = &value[dash + 1..];
        }
    }

    format!("'{}-{}'", algorithm, value)
}

/// Hash algorithms accepted in CSP hash sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// The algorithm tag used inside a hash source
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Hashes inline script or style content into a ready-to-use hash source.
    pub fn digest_source(self, content: &[u8]) -> String {
        let digest = match self {
            HashAlgorithm::Sha256 => general_purpose::STANDARD.encode(sha2::Sha256::digest(content)),
            HashAlgorithm::Sha384 => general_purpose::STANDARD.encode(sha2::Sha384::digest(content)),
            HashAlgorithm::Sha512 => general_purpose::STANDARD.encode(sha2::Sha512::digest(content)),
        };

        hash(self.as_str(), &digest)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(CspError::UnsupportedAlgorithm {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nonce_formatting() {
        let cases = [
            ("abc", "'nonce-abc'"),
            ("  abc  ", "'nonce-abc'"),
            ("'nonce-123'", "'nonce-123'"),
            ("  'nonce-123'  ", "'nonce-123'"),
            ("'abc'", "'nonce-abc'"),
            ("nonce-xyz", "'nonce-xyz'"),
        ];

        for (input, expected) in cases {
            assert_eq!(nonce(input), expected, "nonce({:?})", input);
        }
    }

    #[test]
    fn test_nonce_of_placeholder_is_visible() {
        assert_eq!(nonce(NONCE_PLACEHOLDER), "'nonce-{{nonce}}'");
    }

    #[test]
    fn test_hash_formatting() {
        let cases = [
            ("sha256", "xyz", "'sha256-xyz'"),
            ("sha384", "  xyz  ", "'sha384-xyz'"),
            ("sha256", "'sha256-abc'", "'sha256-abc'"),
            ("sha512", "  'sha512-abc'  ", "'sha512-abc'"),
            // A stale tag is replaced by the requested algorithm
            ("sha256", "'sha384-abc'", "'sha256-abc'"),
            // Only `sha*` prefixes are treated as tags
            ("sha256", "md5-abc", "'sha256-md5-abc'"),
            ("sha256", "-abc", "'sha256--abc'"),
        ];

        for (algo, input, expected) in cases {
            assert_eq!(hash(algo, input), expected, "hash({:?}, {:?})", algo, input);
        }
    }

    #[test]
    fn test_digest_source() {
        assert_eq!(
            HashAlgorithm::Sha256.digest_source(b""),
            "'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='"
        );
        assert_eq!(
            HashAlgorithm::Sha256.digest_source(b"abc"),
            "'sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0='"
        );

        let sha384 = HashAlgorithm::Sha384.digest_source(b"alert(1)");
        assert!(sha384.starts_with("'sha384-"));
        assert!(sha384.ends_with('\''));
        // 48 digest bytes encode to 64 base64 characters
        assert_eq!(sha384.len(), "'sha384-'".len() + 64);
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(" SHA512 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!(HashAlgorithm::Sha384.to_string(), "sha384");

        match "md5".parse::<HashAlgorithm>() {
            Err(CspError::UnsupportedAlgorithm { name }) => assert_eq!(name, "md5"),
            other => panic!("expected unsupported algorithm, got {:?}", other),
        }
    }

    fn any_algorithm() -> impl Strategy<Value = HashAlgorithm> {
        prop_oneof![
            Just(HashAlgorithm::Sha256),
            Just(HashAlgorithm::Sha384),
            Just(HashAlgorithm::Sha512),
        ]
    }

    proptest! {
        #[test]
        fn nonce_is_idempotent(raw in ".*") {
            let once = nonce(&raw);
            prop_assert_eq!(nonce(&once), once);
        }

        #[test]
        fn hash_is_idempotent(algo in any_algorithm(), raw in ".*") {
            let once = hash(algo.as_str(), &raw);
            prop_assert_eq!(hash(algo.as_str(), &once), once);
        }
    }
}
