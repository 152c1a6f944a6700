use super::*;

const SECRET: &str = "test-secret-test-secret-test-secret";
const NOW: i64 = 1_700_000_000;

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, 86_400)
}

#[test]
fn issued_token_verifies() {
    let sub = Uuid::new_v4();
    let token = issuer().issue(sub, Role::Agent, NOW).unwrap();
    let claims = issuer().verify(&token, NOW + 10).unwrap();
    assert_eq!(claims.sub, sub);
    assert_eq!(claims.role, Role::Agent);
    assert_eq!(claims.iat, NOW);
    assert_eq!(claims.exp, NOW + 86_400);
}

#[test]
fn issued_token_is_readable_without_secret() {
    let token = issuer().issue(Uuid::nil(), Role::User, NOW).unwrap();
    let claims = models::claims::decode_unverified(&token).unwrap();
    assert_eq!(claims.exp, NOW + 86_400);
}

#[test]
fn expired_token_is_rejected() {
    let token = issuer().issue(Uuid::nil(), Role::User, NOW).unwrap();
    assert_eq!(issuer().verify(&token, NOW + 86_400), Err(TokenError::Expired));
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let other = TokenIssuer::new("another-secret-another-secret-1234", 86_400);
    let token = other.issue(Uuid::nil(), Role::Admin, NOW).unwrap();
    assert_eq!(issuer().verify(&token, NOW), Err(TokenError::Signature));
}

#[test]
fn tampered_claims_fail_signature_check() {
    let token = issuer().issue(Uuid::nil(), Role::User, NOW).unwrap();
    let forged_claims = Claims { sub: Uuid::nil(), role: Role::Admin, iat: NOW, exp: NOW + 86_400 };
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged = models::claims::encode_segment(&forged_claims).unwrap();
    parts[1] = &forged;
    let forged_token = parts.join(".");
    assert_eq!(issuer().verify(&forged_token, NOW), Err(TokenError::Signature));
}

#[test]
fn malformed_tokens_are_rejected() {
    assert_eq!(issuer().verify("", NOW), Err(TokenError::Empty));
    assert_eq!(issuer().verify("only.two", NOW), Err(TokenError::Format));
    assert!(issuer().verify("a.b.c", NOW).is_err());
}

#[test]
fn rotate_keeps_identity_and_extends_expiry() {
    let sub = Uuid::new_v4();
    let token = issuer().issue(sub, Role::User, NOW).unwrap();
    let claims = issuer().verify(&token, NOW).unwrap();
    let rotated = issuer().rotate(&claims, NOW + 1_000).unwrap();
    let rotated_claims = issuer().verify(&rotated, NOW + 1_000).unwrap();
    assert_eq!(rotated_claims.sub, sub);
    assert_eq!(rotated_claims.exp, NOW + 1_000 + 86_400);
    assert_eq!(rotated_claims.iat, NOW);
}

#[test]
fn debug_output_hides_secret() {
    let rendered = format!("{:?}", issuer());
    assert!(!rendered.contains(SECRET));
}
