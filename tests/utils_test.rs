use homebase::utils::*;

#[test]
fn test_generate_state() {
    let state = generate_state();

    // Should be exactly 32 characters
    assert_eq!(state.len(), 32);

    // Should contain only alphanumeric characters
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated values should be different
    assert_ne!(state, generate_state());
}

#[test]
fn test_fingerprint() {
    let fp = fingerprint("access-token-value");

    // Six bytes encode to eight base64 characters
    assert_eq!(fp.len(), 8);

    // Should be deterministic
    assert_eq!(fp, fingerprint("access-token-value"));

    // Different input should produce different output
    assert_ne!(fp, fingerprint("refresh-token-value"));

    // Should never contain the secret itself
    assert!(!fp.contains("access"));
}

#[test]
fn test_fingerprint_is_url_safe() {
    for secret in ["", "a", "BQD4x~y/z+==", "refresh-1"] {
        let fp = fingerprint(secret);
        assert!(
            fp.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
