//! AccountService tests
//!
//! Registration, login, guest sessions and guest → registered migration.

use std::sync::Arc;

use chrono::{Duration, Utc};
use snaplink::errors::SnaplinkError;
use snaplink::services::{
    AccountService, CodeGenerator, CreateLinkRequest, Credentials, LinkService, ListQuery,
    LoginRequest, QuotaPolicy,
};
use snaplink::storage::backend::{SeaOrmStorage, StorageOptions};
use snaplink::storage::{AccountType, RetryConfig};
use tempfile::TempDir;

// =============================================================================
// Test Setup
// =============================================================================

async fn setup() -> (AccountService, LinkService, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("accounts_test.db");
    let options = StorageOptions {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        pool_size: 1,
        retry: RetryConfig::default(),
    };
    let storage = Arc::new(
        SeaOrmStorage::new(&options)
            .await
            .expect("Failed to create storage"),
    );

    let policy = QuotaPolicy::default();
    let accounts = AccountService::new(storage.clone(), policy);
    let links = LinkService::new(storage, CodeGenerator::default(), policy);
    (accounts, links, temp_dir)
}

fn credentials(username: &str, email: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn link(url: &str) -> CreateLinkRequest {
    CreateLinkRequest {
        url: url.to_string(),
        is_private: false,
    }
}

const GUEST_UUID: &str = "3f2c1a9e-7b4d-4c1e-9a6f-2d8b5e0c7a11";

#[cfg(test)]
mod register_login_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_login() {
        let (accounts, _links, _dir) = setup().await;

        let account = accounts
            .register(&credentials("alice", "Alice@Example.com"))
            .await
            .unwrap();
        assert_eq!(account.account_type, AccountType::Registered);
        assert_eq!(account.email.as_deref(), Some("alice@example.com"));
        assert!(account.guest_uuid.is_none());
        assert_ne!(account.password_hash.as_deref(), Some("correct horse"));

        let logged_in = accounts
            .login(&login("ALICE@example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, account.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_username_conflict() {
        let (accounts, _links, _dir) = setup().await;
        accounts
            .register(&credentials("alice", "alice@example.com"))
            .await
            .unwrap();

        let same_email = accounts
            .register(&credentials("alice2", "alice@example.com"))
            .await;
        assert!(matches!(same_email, Err(SnaplinkError::Conflict(_))));

        let same_name = accounts
            .register(&credentials("alice", "other@example.com"))
            .await;
        assert!(matches!(same_name, Err(SnaplinkError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (accounts, _links, _dir) = setup().await;

        let cases = [
            Credentials {
                username: "ab".into(),
                email: "ab@example.com".into(),
                password: "correct horse".into(),
            },
            Credentials {
                username: "alice".into(),
                email: "not-an-email".into(),
                password: "correct horse".into(),
            },
            Credentials {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password: "short".into(),
            },
            Credentials {
                username: "guest_sneaky".into(),
                email: "sneaky@example.com".into(),
                password: "correct horse".into(),
            },
        ];

        for case in &cases {
            let result = accounts.register(case).await;
            assert!(
                matches!(result, Err(SnaplinkError::Validation(_))),
                "{:?} should fail validation",
                case.username
            );
        }
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (accounts, _links, _dir) = setup().await;
        accounts
            .register(&credentials("alice", "alice@example.com"))
            .await
            .unwrap();
        accounts.start_guest(GUEST_UUID).await.unwrap();

        let wrong_password = accounts
            .login(&login("alice@example.com", "wrong password"))
            .await
            .unwrap_err();
        let unknown_email = accounts
            .login(&login("nobody@example.com", "correct horse"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, SnaplinkError::Unauthorized(_)));
        assert!(matches!(unknown_email, SnaplinkError::Unauthorized(_)));
        assert_eq!(wrong_password.message(), unknown_email.message());
    }
}

#[cfg(test)]
mod guest_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_guest_is_idempotent() {
        let (accounts, _links, _dir) = setup().await;

        let first = accounts.start_guest(GUEST_UUID).await.unwrap();
        let again = accounts.start_guest(GUEST_UUID).await.unwrap();
        let uppercase = accounts
            .start_guest(&GUEST_UUID.to_uppercase())
            .await
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.id, uppercase.id);
        assert_eq!(first.account_type, AccountType::Guest);
        assert_eq!(first.username, "guest_3f2c1a9e");
        assert!(first.email.is_none());
        assert!(first.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_distinct_uuids_get_distinct_accounts() {
        let (accounts, _links, _dir) = setup().await;

        let a = accounts.start_guest(GUEST_UUID).await.unwrap();
        // Same 8-character prefix, forces the long username form
        let b = accounts
            .start_guest("3f2c1a9e-0000-4000-8000-000000000000")
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(b.username, "guest_3f2c1a9e000040008000000000000000");
    }

    #[tokio::test]
    async fn test_start_guest_rejects_garbage() {
        let (accounts, _links, _dir) = setup().await;

        let result = accounts.start_guest("not-a-uuid").await;
        assert!(matches!(result, Err(SnaplinkError::Validation(_))));
    }
}

#[cfg(test)]
mod migrate_tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_makes_links_permanent() {
        let (accounts, links, _dir) = setup().await;
        let guest = accounts.start_guest(GUEST_UUID).await.unwrap();

        for i in 0..5 {
            links
                .create(&guest, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }
        let sixth = links.create(&guest, &link("https://example.com/6")).await;
        assert!(matches!(sixth, Err(SnaplinkError::QuotaExceeded(_))));

        let migrated = accounts
            .migrate(guest.id, &credentials("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(migrated.id, guest.id);
        assert_eq!(migrated.account_type, AccountType::Registered);
        assert_eq!(migrated.username, "alice");
        assert!(migrated.guest_uuid.is_none());

        let page = links.list(&migrated, ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 5);
        assert!(page.items.iter().all(|l| l.expires_at.is_none()));

        // Past the old guest ttl nothing is swept
        let removed = links
            .sweep_expired(Utc::now() + Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        links
            .create(&migrated, &link("https://example.com/6"))
            .await
            .unwrap();

        let logged_in = accounts
            .login(&login("alice@example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, guest.id);
    }

    #[tokio::test]
    async fn test_migrated_uuid_starts_fresh_guest() {
        let (accounts, _links, _dir) = setup().await;
        let guest = accounts.start_guest(GUEST_UUID).await.unwrap();
        accounts
            .migrate(guest.id, &credentials("alice", "alice@example.com"))
            .await
            .unwrap();

        let fresh = accounts.start_guest(GUEST_UUID).await.unwrap();
        assert_ne!(fresh.id, guest.id);
        assert_eq!(fresh.account_type, AccountType::Guest);
    }

    #[tokio::test]
    async fn test_registered_account_cannot_migrate() {
        let (accounts, _links, _dir) = setup().await;
        let alice = accounts
            .register(&credentials("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = accounts
            .migrate(alice.id, &credentials("alice2", "alice2@example.com"))
            .await;
        assert!(matches!(result, Err(SnaplinkError::NotGuest(_))));
    }

    #[tokio::test]
    async fn test_second_migration_fails() {
        let (accounts, _links, _dir) = setup().await;
        let guest = accounts.start_guest(GUEST_UUID).await.unwrap();

        accounts
            .migrate(guest.id, &credentials("alice", "alice@example.com"))
            .await
            .unwrap();
        let again = accounts
            .migrate(guest.id, &credentials("bob", "bob@example.com"))
            .await;
        assert!(matches!(again, Err(SnaplinkError::NotGuest(_))));
    }

    #[tokio::test]
    async fn test_failed_migration_leaves_guest_untouched() {
        let (accounts, links, _dir) = setup().await;
        accounts
            .register(&credentials("taken", "taken@example.com"))
            .await
            .unwrap();
        let guest = accounts.start_guest(GUEST_UUID).await.unwrap();
        links
            .create(&guest, &link("https://example.com"))
            .await
            .unwrap();

        let result = accounts
            .migrate(guest.id, &credentials("fresh", "taken@example.com"))
            .await;
        assert!(matches!(result, Err(SnaplinkError::Conflict(_))));

        let still_guest = accounts.get_active_account(guest.id).await.unwrap();
        assert_eq!(still_guest.account_type, AccountType::Guest);
        assert_eq!(still_guest.guest_uuid, guest.guest_uuid);
        assert_eq!(still_guest.username, guest.username);

        let page = links.list(&still_guest, ListQuery::default()).await.unwrap();
        assert!(page.items[0].expires_at.is_some());
    }

    #[tokio::test]
    async fn test_entitlement_tracks_account_type() {
        let (accounts, links, _dir) = setup().await;
        let guest = accounts.start_guest(GUEST_UUID).await.unwrap();
        links
            .create(&guest, &link("https://example.com"))
            .await
            .unwrap();

        let before = accounts.entitlement(&guest).await.unwrap();
        assert_eq!(before.max_links, Some(5));
        assert_eq!(before.current, 1);

        let migrated = accounts
            .migrate(guest.id, &credentials("alice", "alice@example.com"))
            .await
            .unwrap();
        let after = accounts.entitlement(&migrated).await.unwrap();
        assert_eq!(after.account_type, AccountType::Registered);
        assert_eq!(after.max_links, Some(100));
        assert_eq!(after.current, 1);
    }
}

#[cfg(test)]
mod contention_tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_writes_succeed_while_clicks_land() {
        let (accounts, links, _dir) = setup().await;
        let links = Arc::new(links);

        let owner = accounts
            .register(&credentials("owner", "owner@example.com"))
            .await
            .unwrap();
        let target = links.create(&owner, &link("https://example.com")).await.unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let clicker = {
            let links = links.clone();
            let stop = stop.clone();
            let code = target.code.clone();
            tokio::spawn(async move {
                let mut clicks = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    links.resolve(&code, None).await.expect("click");
                    clicks += 1;
                    tokio::task::yield_now().await;
                }
                clicks
            })
        };

        for i in 0..10 {
            let guest = accounts
                .start_guest(&uuid::Uuid::new_v4().to_string())
                .await
                .unwrap();
            let temp = links
                .create(&guest, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
            links
                .create(&guest, &link(&format!("https://example.com/{i}/b")))
                .await
                .unwrap();

            let migrated = accounts
                .migrate(
                    guest.id,
                    &credentials(&format!("user{i}"), &format!("user{i}@example.com")),
                )
                .await
                .unwrap();
            assert_eq!(migrated.account_type, AccountType::Registered);

            links.delete(&migrated, temp.id).await.unwrap();
            let page = links.list(&migrated, ListQuery::default()).await.unwrap();
            assert_eq!(page.total, 1);
            assert!(page.items.iter().all(|l| l.expires_at.is_none()));

            accounts
                .register(&credentials(&format!("other{i}"), &format!("other{i}@example.com")))
                .await
                .unwrap();
        }

        stop.store(true, Ordering::Relaxed);
        let clicks = clicker.await.unwrap();
        assert!(clicks > 0);

        let resolved = links.resolve(&target.code, None).await.unwrap();
        assert_eq!(resolved.click_count as u64, clicks + 1);
    }
}
