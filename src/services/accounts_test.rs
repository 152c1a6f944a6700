use super::*;
use time::macros::datetime;

fn record(suspended: bool, changed_at: OffsetDateTime) -> AccountRecord {
    AccountRecord {
        profile: Profile::User(MemberProfile {
            id: Uuid::nil(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: None,
            avatar_url: None,
            updated_at: changed_at,
        }),
        password_hash: None,
        suspended,
        credentials_changed_at: changed_at,
    }
}

fn claims_issued_at(iat: i64) -> Claims {
    Claims { sub: Uuid::nil(), role: Role::User, iat, exp: iat + 86_400 }
}

#[test]
fn active_account_accepts_token() {
    let changed = datetime!(2024-01-01 00:00 UTC);
    let rec = record(false, changed);
    assert_eq!(rec.revocation(&claims_issued_at(changed.unix_timestamp())), None);
    assert_eq!(rec.revocation(&claims_issued_at(changed.unix_timestamp() + 60)), None);
}

#[test]
fn suspended_account_revokes_token() {
    let changed = datetime!(2024-01-01 00:00 UTC);
    let rec = record(true, changed);
    assert_eq!(
        rec.revocation(&claims_issued_at(changed.unix_timestamp() + 60)),
        Some(Revocation::Suspended)
    );
}

#[test]
fn token_older_than_credential_change_is_revoked() {
    let changed = datetime!(2024-01-01 00:00 UTC);
    let rec = record(false, changed);
    assert_eq!(
        rec.revocation(&claims_issued_at(changed.unix_timestamp() - 1)),
        Some(Revocation::CredentialsChanged)
    );
}

#[test]
fn revocation_reasons_are_distinct() {
    assert_ne!(Revocation::Suspended.reason(), Revocation::CredentialsChanged.reason());
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL required for live-db-tests");
        let pool = PgPoolOptions::new().connect(&url).await.expect("connect");
        sqlx::migrate!("src/db/migrations").run(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn create_then_find_user_round_trip() {
        let pool = pool().await;
        let email = format!("{}@example.com", Uuid::new_v4());
        let created = create_user(
            &pool,
            &NewUser {
                name: "Live Test".to_owned(),
                email: email.clone(),
                phone: None,
                role: Role::Agent,
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.profile.role(), Role::Agent);

        let found = find_user_by_email(&pool, &email).await.unwrap().unwrap();
        assert_eq!(found.profile.id(), created.profile.id());

        let dup = create_user(
            &pool,
            &NewUser {
                name: "Dup".to_owned(),
                email,
                phone: None,
                role: Role::User,
                password_hash: "x".to_owned(),
            },
        )
        .await;
        assert!(matches!(dup, Err(AccountError::EmailTaken)));
    }

    #[tokio::test]
    async fn suspension_is_persisted() {
        let pool = pool().await;
        let created = create_user(
            &pool,
            &NewUser {
                name: "Suspend Me".to_owned(),
                email: format!("{}@example.com", Uuid::new_v4()),
                phone: None,
                role: Role::User,
                password_hash: "x".to_owned(),
            },
        )
        .await
        .unwrap();
        let updated = set_suspended(&pool, created.profile.id(), true).await.unwrap().unwrap();
        assert!(updated.suspended);
        assert!(set_suspended(&pool, Uuid::new_v4(), true).await.unwrap().is_none());
    }
}
