//! LinkService tests
//!
//! Exercises link management against a real SQLite database.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use snaplink::errors::SnaplinkError;
use snaplink::services::{
    AccountService, CodeGenerator, CreateLinkRequest, Credentials, LinkService, ListQuery,
    QuotaPolicy, UpdateLinkRequest,
};
use snaplink::storage::backend::{SeaOrmStorage, StorageOptions};
use snaplink::storage::{Account, RetryConfig};
use snaplink::utils::CODE_ALPHABET;
use tempfile::TempDir;

use migration::entities::short_link;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// =============================================================================
// Test Setup
// =============================================================================

struct Fixture {
    storage: Arc<SeaOrmStorage>,
    accounts: AccountService,
    links: LinkService,
    _temp_dir: TempDir,
}

async fn setup_with(generator: CodeGenerator, pool_size: u32) -> Fixture {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("links_test.db");
    let options = StorageOptions {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        pool_size,
        retry: RetryConfig::default(),
    };
    let storage = Arc::new(
        SeaOrmStorage::new(&options)
            .await
            .expect("Failed to create storage"),
    );

    let policy = QuotaPolicy::default();
    Fixture {
        storage: storage.clone(),
        accounts: AccountService::new(storage.clone(), policy),
        links: LinkService::new(storage, generator, policy)
            .with_bulk_max_items(10)
            .with_base_url("https://snap.test/"),
        _temp_dir: temp_dir,
    }
}

async fn setup_with_generator(generator: CodeGenerator) -> Fixture {
    setup_with(generator, 1).await
}

async fn setup() -> Fixture {
    setup_with_generator(CodeGenerator::default()).await
}

impl Fixture {
    async fn guest(&self) -> Account {
        self.accounts
            .start_guest(&uuid::Uuid::new_v4().to_string())
            .await
            .expect("guest start")
    }

    async fn registered(&self, name: &str) -> Account {
        self.accounts
            .register(&Credentials {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password: "correct horse".to_string(),
            })
            .await
            .expect("register")
    }
}

fn link(url: &str) -> CreateLinkRequest {
    CreateLinkRequest {
        url: url.to_string(),
        is_private: false,
    }
}

fn private_link(url: &str) -> CreateLinkRequest {
    CreateLinkRequest {
        url: url.to_string(),
        is_private: true,
    }
}

#[cfg(test)]
mod create_link_tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_link_has_no_expiry() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let created = fx
            .links
            .create(&alice, &link("https://example.com/page"))
            .await
            .unwrap();

        assert_eq!(created.account_id, alice.id);
        assert_eq!(created.target, "https://example.com/page");
        assert_eq!(created.code.len(), 7);
        assert!(created.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(created.expires_at.is_none());
        assert!(created.is_active);
        assert_eq!(created.click_count, 0);
    }

    #[tokio::test]
    async fn test_guest_link_expires_after_ttl() {
        let fx = setup().await;
        let guest = fx.guest().await;
        let before = Utc::now();

        let created = fx
            .links
            .create(&guest, &link("https://example.com"))
            .await
            .unwrap();

        let expires_at = created.expires_at.expect("guest links expire");
        assert!(expires_at >= before + Duration::days(7));
        assert!(expires_at <= Utc::now() + Duration::days(7));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        for bad in ["", "not a url", "javascript:alert(1)", "ftp://example.com"] {
            let result = fx.links.create(&alice, &link(bad)).await;
            assert!(
                matches!(result, Err(SnaplinkError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_guest_cannot_create_private_link() {
        let fx = setup().await;
        let guest = fx.guest().await;

        let result = fx.links.create(&guest, &private_link("https://example.com")).await;
        assert!(matches!(result, Err(SnaplinkError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_guest_quota_is_five() {
        let fx = setup().await;
        let guest = fx.guest().await;

        for i in 0..5 {
            fx.links
                .create(&guest, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }

        let sixth = fx.links.create(&guest, &link("https://example.com/6")).await;
        assert!(matches!(sixth, Err(SnaplinkError::QuotaExceeded(_))));

        let entitlement = fx.accounts.entitlement(&guest).await.unwrap();
        assert_eq!(entitlement.current, 5);
        assert_eq!(entitlement.remaining(), Some(0));
    }

    #[tokio::test]
    async fn test_deactivated_links_free_quota() {
        let fx = setup().await;
        let guest = fx.guest().await;

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(
                fx.links
                    .create(&guest, &link(&format!("https://example.com/{i}")))
                    .await
                    .unwrap()
                    .id,
            );
        }

        fx.links
            .update(
                &guest,
                ids[0],
                &UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        fx.links
            .create(&guest, &link("https://example.com/again"))
            .await
            .unwrap();

        // Re-activation would exceed the quota again
        let reactivate = fx
            .links
            .update(
                &guest,
                ids[0],
                &UpdateLinkRequest {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(reactivate, Err(SnaplinkError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_codes_stay_unique_when_space_is_tiny() {
        // 62 one-character codes, then the generator has to grow
        let fx = setup_with_generator(CodeGenerator::new(1, 2, 4)).await;
        let alice = fx.registered("alice").await;

        let mut codes = HashSet::new();
        for i in 0..80 {
            let created = fx
                .links
                .create(&alice, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
            assert!(codes.insert(created.code));
        }

        assert!(codes.iter().any(|c| c.len() > 1));
        assert!(codes.iter().all(|c| c.len() <= 4));
    }
}

#[cfg(test)]
mod bulk_create_tests {
    use super::*;

    #[tokio::test]
    async fn test_bulk_creates_every_item() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let requests: Vec<_> = (0..4)
            .map(|i| link(&format!("https://example.com/{i}")))
            .collect();
        let created = fx.links.bulk_create(&alice, &requests).await.unwrap();

        assert_eq!(created.len(), 4);
        let codes: HashSet<_> = created.iter().map(|l| l.code.clone()).collect();
        assert_eq!(codes.len(), 4);
    }

    #[tokio::test]
    async fn test_bulk_over_quota_creates_nothing() {
        let fx = setup().await;
        let guest = fx.guest().await;

        fx.links
            .create(&guest, &link("https://example.com/first"))
            .await
            .unwrap();

        let requests: Vec<_> = (0..5)
            .map(|i| link(&format!("https://example.com/{i}")))
            .collect();
        let result = fx.links.bulk_create(&guest, &requests).await;
        assert!(matches!(result, Err(SnaplinkError::QuotaExceeded(_))));

        let entitlement = fx.accounts.entitlement(&guest).await.unwrap();
        assert_eq!(entitlement.current, 1);
    }

    #[tokio::test]
    async fn test_bulk_invalid_item_names_its_index() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let requests = vec![
            link("https://example.com/ok"),
            link("https://example.com/also-ok"),
            link("mailto:someone@example.com"),
        ];
        match fx.links.bulk_create(&alice, &requests).await {
            Err(SnaplinkError::Validation(msg)) => assert!(msg.starts_with("urls[2]"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let page = fx.links.list(&alice, ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_bulk_size_limits() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let empty = fx.links.bulk_create(&alice, &[]).await;
        assert!(matches!(empty, Err(SnaplinkError::Validation(_))));

        let too_many: Vec<_> = (0..11)
            .map(|i| link(&format!("https://example.com/{i}")))
            .collect();
        let result = fx.links.bulk_create(&alice, &too_many).await;
        assert!(matches!(result, Err(SnaplinkError::Validation(_))));
    }
}

#[cfg(test)]
mod update_delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_owner_updates_target_and_visibility() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let created = fx
            .links
            .create(&alice, &link("https://example.com/old"))
            .await
            .unwrap();

        let updated = fx
            .links
            .update(
                &alice,
                created.id,
                &UpdateLinkRequest {
                    url: Some("https://example.com/new".into()),
                    is_private: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.code, created.code);
        assert_eq!(updated.target, "https://example.com/new");
        assert!(updated.is_private);
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let created = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        let result = fx
            .links
            .update(&alice, created.id, &UpdateLinkRequest::default())
            .await;
        assert!(matches!(result, Err(SnaplinkError::Validation(_))));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let mallory = fx.registered("mallory").await;
        let created = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        let update = fx
            .links
            .update(
                &mallory,
                created.id,
                &UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(update, Err(SnaplinkError::Forbidden(_))));

        let delete = fx.links.delete(&mallory, created.id).await;
        assert!(matches!(delete, Err(SnaplinkError::Forbidden(_))));

        assert!(fx.links.resolve(&created.code, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_link_is_not_found() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let delete = fx.links.delete(&alice, 9999).await;
        assert!(matches!(delete, Err(SnaplinkError::NotFound(_))));

        let update = fx
            .links
            .update(
                &alice,
                9999,
                &UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(update, Err(SnaplinkError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_guest_cannot_make_link_private() {
        let fx = setup().await;
        let guest = fx.guest().await;
        let created = fx.links.create(&guest, &link("https://example.com")).await.unwrap();

        let result = fx
            .links
            .update(
                &guest,
                created.id,
                &UpdateLinkRequest {
                    is_private: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(SnaplinkError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_link() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let created = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        fx.links.delete(&alice, created.id).await.unwrap();

        let resolved = fx.links.resolve(&created.code, None).await;
        assert!(matches!(resolved, Err(SnaplinkError::NotFound(_))));
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_counts_clicks() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let created = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        let first = fx.links.resolve(&created.code, None).await.unwrap();
        let second = fx.links.resolve(&created.code, None).await.unwrap();

        assert_eq!(first.target, "https://example.com");
        assert_eq!(first.click_count, 1);
        assert_eq!(second.click_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_codes() {
        let fx = setup().await;

        for code in ["nope123", "bad-code", "", "../etc"] {
            let result = fx.links.resolve(code, None).await;
            assert!(matches!(result, Err(SnaplinkError::NotFound(_))), "{code:?}");
        }
    }

    #[tokio::test]
    async fn test_inactive_link_is_not_found() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let created = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        fx.links
            .update(
                &alice,
                created.id,
                &UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = fx.links.resolve(&created.code, None).await;
        assert!(matches!(result, Err(SnaplinkError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_private_link_viewer_rules() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let bob = fx.registered("bob").await;
        let guest = fx.guest().await;
        let created = fx
            .links
            .create(&alice, &private_link("https://example.com/secret"))
            .await
            .unwrap();

        let anonymous = fx.links.resolve(&created.code, None).await;
        assert!(matches!(anonymous, Err(SnaplinkError::Unauthorized(_))));

        let as_guest = fx.links.resolve(&created.code, Some(&guest)).await;
        assert!(matches!(as_guest, Err(SnaplinkError::Forbidden(_))));

        let as_bob = fx.links.resolve(&created.code, Some(&bob)).await.unwrap();
        assert_eq!(as_bob.click_count, 1);

        // Only the successful visit is recorded
        let page = fx
            .links
            .list(
                &alice,
                ListQuery {
                    with_history: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let history = page.items[0].access_history.as_ref().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].account_email, "bob@example.com");
        assert_eq!(page.items[0].click_count, 1);
    }

    #[tokio::test]
    async fn test_public_link_open_to_everyone() {
        let fx = setup().await;
        let guest = fx.guest().await;
        let created = fx.links.create(&guest, &link("https://example.com")).await.unwrap();

        assert!(fx.links.resolve(&created.code, None).await.is_ok());
        assert!(fx.links.resolve(&created.code, Some(&guest)).await.is_ok());
    }
}

#[cfg(test)]
mod list_export_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_scoped_and_paginated() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;
        let bob = fx.registered("bob").await;

        for i in 0..25 {
            fx.links
                .create(&alice, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }
        fx.links.create(&bob, &link("https://bob.example.com")).await.unwrap();

        let first = fx.links.list(&alice, ListQuery::default()).await.unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.limit, 20);
        assert!(first.items.iter().all(|v| v.short_url.starts_with("https://snap.test/")));

        let second = fx
            .links
            .list(
                &alice,
                ListQuery {
                    offset: 20,
                    limit: 20,
                    with_history: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(second.items.len(), 5);
        assert!(second.items.iter().all(|v| v.access_history.is_none()));

        let bobs = fx.links.list(&bob, ListQuery::default()).await.unwrap();
        assert_eq!(bobs.total, 1);
    }

    #[tokio::test]
    async fn test_list_limit_is_clamped() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        let zero = fx
            .links
            .list(
                &alice,
                ListQuery {
                    limit: 0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(zero.limit, 20);

        let huge = fx
            .links
            .list(
                &alice,
                ListQuery {
                    limit: 10_000,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(huge.limit, 100);
    }

    #[tokio::test]
    async fn test_export_contains_every_link() {
        let fx = setup().await;
        let alice = fx.registered("alice").await;

        for i in 0..3 {
            fx.links
                .create(&alice, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }

        let export = fx.links.export(&alice, false).await.unwrap();
        assert_eq!(export.total, 3);
        assert_eq!(export.links.len(), 3);
        assert_eq!(export.account.username, "alice");
        assert!(export.filename().starts_with("snaplink-export-"));
        assert!(export.filename().ends_with(".json"));
    }
}

#[cfg(test)]
mod sweep_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_deletes_only_expired_links() {
        let fx = setup().await;
        let guest = fx.guest().await;
        let alice = fx.registered("alice").await;

        for i in 0..3 {
            fx.links
                .create(&guest, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }
        let permanent = fx.links.create(&alice, &link("https://example.com")).await.unwrap();

        assert_eq!(fx.links.sweep_expired(Utc::now()).await.unwrap(), 0);

        let removed = fx
            .links
            .sweep_expired(Utc::now() + Duration::days(8))
            .await
            .unwrap();
        assert_eq!(removed, 3);

        // The guest account itself survives the sweep
        let guest_again = fx.accounts.get_active_account(guest.id).await.unwrap();
        assert_eq!(fx.accounts.entitlement(&guest_again).await.unwrap().current, 0);
        assert!(fx.links.resolve(&permanent.code, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_unswept_links_free_quota() {
        let fx = setup().await;
        let guest = fx.guest().await;

        for i in 0..5 {
            fx.links
                .create(&guest, &link(&format!("https://example.com/{i}")))
                .await
                .unwrap();
        }
        assert!(matches!(
            fx.links.create(&guest, &link("https://example.com/6")).await,
            Err(SnaplinkError::QuotaExceeded(_))
        ));

        // Age every link past its expiry without running the sweep
        short_link::Entity::update_many()
            .col_expr(
                short_link::Column::ExpiresAt,
                Expr::value(Some(Utc::now() - Duration::minutes(1))),
            )
            .filter(short_link::Column::AccountId.eq(guest.id))
            .exec(fx.storage.get_db())
            .await
            .unwrap();

        assert_eq!(fx.accounts.entitlement(&guest).await.unwrap().current, 0);
        fx.links
            .create(&guest, &link("https://example.com/6"))
            .await
            .unwrap();
        assert_eq!(fx.accounts.entitlement(&guest).await.unwrap().current, 1);
    }

    #[tokio::test]
    async fn test_sweep_ignores_active_flag() {
        let fx = setup().await;
        let guest = fx.guest().await;
        let created = fx.links.create(&guest, &link("https://example.com")).await.unwrap();

        fx.links
            .update(
                &guest,
                created.id,
                &UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let removed = fx
            .links
            .sweep_expired(Utc::now() + Duration::days(8))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_never_overshoot_guest_quota() {
        let fx = setup_with(CodeGenerator::default(), 8).await;
        let guest = fx.guest().await;
        let links = Arc::new(fx.links);

        let mut tasks = JoinSet::new();
        for i in 0..20 {
            let links = links.clone();
            let guest = guest.clone();
            tasks.spawn(async move {
                links
                    .create(&guest, &link(&format!("https://example.com/single/{i}")))
                    .await
                    .map(|_| 1usize)
            });
        }
        for b in 0..2 {
            let links = links.clone();
            let guest = guest.clone();
            tasks.spawn(async move {
                let batch: Vec<_> = (0..3)
                    .map(|i| link(&format!("https://example.com/bulk/{b}/{i}")))
                    .collect();
                links.bulk_create(&guest, &batch).await.map(|created| created.len())
            });
        }

        let mut created = 0;
        let mut rejected = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.expect("create task panicked") {
                Ok(n) => created += n,
                Err(SnaplinkError::QuotaExceeded(_)) => rejected += 1,
                Err(e) => panic!("unexpected error under contention: {e:?}"),
            }
        }

        assert_eq!(created, 5);
        assert!(rejected >= 15);
        assert_eq!(fx.accounts.entitlement(&guest).await.unwrap().current, 5);

        let page = links.list(&guest, ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 5);
    }
}
