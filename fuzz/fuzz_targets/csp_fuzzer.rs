#![no_main]
//! Content Security Policy (CSP) Focused Fuzzing
//!
//! Drives the policy registry with arbitrary operation sequences:
//! - add/set/remove with malformed directive names and sources
//! - compilation with and without nonces
//! - nonce and hash source formatting

use libfuzzer_sys::fuzz_target;
use arbitrary::{Arbitrary, Unstructured};

use citadel_csp::source::{hash, nonce};
use citadel_csp::{HashAlgorithm, Policy};

/// One registry operation
#[derive(Debug, Clone, Arbitrary)]
pub enum PolicyOp {
    Add { directive: String, sources: Vec<String> },
    Set { directive: String, sources: Vec<String> },
    Remove { directive: String },
    Compile { nonce: Option<String> },
}

/// Source formatting input
#[derive(Debug, Clone, Arbitrary)]
pub struct SourceFuzzInput {
    pub raw_nonce: String,
    pub raw_hash: String,
    pub content: Vec<u8>,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    // Choose fuzzing strategy
    let strategy = unstructured.int_in_range(0..=1).unwrap_or(0);

    match strategy {
        0 => fuzz_policy_operations(&mut unstructured),
        _ => fuzz_source_formatting(&mut unstructured),
    }
});

/// Fuzz arbitrary mutation and compilation sequences
fn fuzz_policy_operations(unstructured: &mut Unstructured) {
    let Ok(ops) = Vec::<PolicyOp>::arbitrary(unstructured) else {
        return;
    };

    let policy = Policy::new();
    for op in ops {
        match op {
            PolicyOp::Add { directive, sources } => {
                let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
                policy.add(&directive, &sources);
            }
            PolicyOp::Set { directive, sources } => {
                let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
                policy.set(&directive, &sources);
            }
            PolicyOp::Remove { directive } => {
                let was_compiled = policy.is_compiled();
                let present = policy.contains(&directive);
                policy.remove(&directive);
                if was_compiled && !present {
                    assert!(policy.is_compiled(), "no-op remove invalidated the cache");
                }
            }
            PolicyOp::Compile { nonce } => {
                let first = policy.compile(nonce.as_deref());
                let second = policy.compile(nonce.as_deref());
                assert_eq!(first, second, "compilation must be deterministic");
                assert!(policy.is_compiled());

                if policy.is_empty() {
                    assert!(first.is_empty());
                }

                if policy.needs_nonce() {
                    if let Some(value) = nonce.as_deref().filter(|value| !value.is_empty()) {
                        assert!(first.contains(&citadel_csp::nonce(value)));
                    }
                }
            }
        }
    }
}

/// Fuzz the nonce and hash formatters for idempotence
fn fuzz_source_formatting(unstructured: &mut Unstructured) {
    let Ok(input) = SourceFuzzInput::arbitrary(unstructured) else {
        return;
    };

    let once = nonce(&input.raw_nonce);
    assert_eq!(nonce(&once), once, "nonce formatting must be idempotent");

    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
        let once = hash(algorithm.as_str(), &input.raw_hash);
        assert_eq!(hash(algorithm.as_str(), &once), once, "hash formatting must be idempotent");

        let digest = algorithm.digest_source(&input.content);
        assert_eq!(hash(algorithm.as_str(), &digest), digest);
    }
}
