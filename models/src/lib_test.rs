use super::*;

#[test]
fn token_error_marker_matches_server_message() {
    assert!(is_token_error("Token error: token expired"));
}

#[test]
fn token_error_marker_is_case_insensitive() {
    assert!(is_token_error("request failed: TOKEN ERROR (revoked)"));
}

#[test]
fn ordinary_errors_are_not_token_errors() {
    assert!(!is_token_error("invalid credentials"));
    assert!(!is_token_error(""));
    assert!(!is_token_error("token"));
}
