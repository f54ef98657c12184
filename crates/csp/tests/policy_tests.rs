//! Behavioural tests for policy compilation through the public API

use citadel_csp::directive::*;
use citadel_csp::source::*;
use citadel_csp::{Policy, PolicyConfig};
use proptest::prelude::*;

#[test]
fn test_documented_full_form() {
    let policy = Policy::new();
    policy.add(UPGRADE_INSECURE_REQUESTS, &[]);
    policy.add(FRAME_ANCESTORS, &[SOURCE_NONE]);
    policy.add(DEFAULT_SRC, &[SOURCE_SELF]);

    assert_eq!(
        &*policy.compile(None),
        "default-src 'self'; frame-ancestors 'none'; upgrade-insecure-requests"
    );
}

#[test]
fn test_duplicate_add_matches_single_add() {
    let once = Policy::new();
    once.add(IMG_SRC, &[SCHEME_DATA]);

    let twice = Policy::new();
    twice.add(IMG_SRC, &[SCHEME_DATA]);
    twice.add(IMG_SRC, &[SCHEME_DATA]);

    assert_eq!(once.compile(None), twice.compile(None));
}

#[test]
fn test_set_matches_fresh_policy() {
    let replaced = Policy::new();
    replaced.add(STYLE_SRC, &["https://old.example"]);
    replaced.set(STYLE_SRC, &["https://new.example"]);

    let fresh = Policy::new();
    fresh.add(STYLE_SRC, &["https://new.example"]);

    assert_eq!(replaced.compile(None), fresh.compile(None));
}

#[test]
fn test_placeholder_sorted_with_other_sources() {
    let policy = Policy::new();
    policy.add(SCRIPT_SRC, &["https://cdn.example.com", SOURCE_NONCE, SOURCE_STRICT_DYNAMIC]);

    assert_eq!(
        &*policy.compile(Some("abc")),
        "script-src 'strict-dynamic' https://cdn.example.com 'nonce-abc'"
    );
    assert_eq!(
        &*policy.compile(None),
        "script-src 'strict-dynamic' https://cdn.example.com 'nonce-{{nonce}}'"
    );
}

#[test]
fn test_hash_sources_from_content() {
    let policy = Policy::new();
    let inline = HashAlgorithm::Sha256.digest_source(b"abc");
    policy.add(SCRIPT_SRC, &[SOURCE_SELF, inline.as_str()]);

    // Feeding the formatted source back through the helper changes nothing
    policy.add(SCRIPT_SRC, &[hash("sha256", &inline).as_str()]);

    assert_eq!(
        &*policy.compile(None),
        "script-src 'self' 'sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0='"
    );
}

#[test]
fn test_config_and_code_agree() {
    let config = PolicyConfig::from_json(
        r#"{"directives": {"default-src": ["'self'"], "script-src": ["'self'", "{{nonce}}"]}}"#,
    )
    .unwrap();
    let from_config = Policy::from_config(&config);

    let in_code = Policy::new();
    in_code.add(SCRIPT_SRC, &[SOURCE_NONCE, SOURCE_SELF]);
    in_code.add(DEFAULT_SRC, &[SOURCE_SELF]);

    assert_eq!(from_config.compile(Some("xyz")), in_code.compile(Some("xyz")));
}

proptest! {
    #[test]
    fn compile_ignores_insertion_order(
        entries in proptest::collection::vec(
            (
                prop_oneof![Just(DEFAULT_SRC), Just(SCRIPT_SRC), Just(IMG_SRC), Just(SANDBOX)],
                "[a-z:/.']{1,12}",
            ),
            0..24,
        )
    ) {
        let forward = Policy::new();
        for (directive, source) in &entries {
            forward.add(directive, &[source.as_str()]);
        }

        let backward = Policy::new();
        for (directive, source) in entries.iter().rev() {
            backward.add(directive, &[source.as_str()]);
        }

        prop_assert_eq!(forward.compile(None), backward.compile(None));
    }

    #[test]
    fn compiled_output_is_well_formed(
        entries in proptest::collection::vec(("[a-z-]{0,10}", " ?[a-z']{0,8} ?"), 0..16)
    ) {
        let policy = Policy::new();
        for (directive, source) in &entries {
            policy.add(directive, &[source.as_str()]);
        }

        let header = policy.compile(None);
        prop_assert!(!header.contains(";;"));
        prop_assert!(!header.starts_with(';') && !header.ends_with(';'));
        prop_assert!(!header.starts_with(' ') && !header.ends_with(' '));
        prop_assert!(!header.contains("  "));
    }
}
