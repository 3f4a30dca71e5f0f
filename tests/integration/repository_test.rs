//! Integration tests for repository CRUD, existence checks and upserts.

use mongodb::bson::doc;

use trove_core::error::ErrorKind;
use trove_core::types::{AccessLevel, ApiQuery};
use trove_entity::{Account, Asset, Bundle, Event};

use crate::helpers::TestDb;

#[tokio::test]
async fn test_update_upserts_then_updates_in_place() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let assets = &ctx.repos.assets;

    let created = assets
        .update(doc! { "address": "0xabc" }, doc! { "title": "X" }, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.address, "0xabc");
    assert_eq!(created.title.as_deref(), Some("X"));

    let updated = assets
        .update(doc! { "address": "0xabc" }, doc! { "title": "Y" }, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title.as_deref(), Some("Y"));
    assert_eq!(assets.count(doc! {}).await.unwrap(), 1);

    let missing = assets
        .update(doc! { "address": "0xdef" }, doc! { "title": "Z" }, false)
        .await
        .unwrap();
    assert!(missing.is_none());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_upsert_by_address() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let mut asset = Asset::new("0x42");
    asset.title = Some("Lighthouse".into());
    let stored = ctx.repos.assets.upsert_by_address(&asset).await.unwrap().unwrap();

    let found = ctx.repos.assets.find_by_address("0x42").await.unwrap().unwrap();
    assert_eq!(found.id, stored.id);
    assert_eq!(found.title.as_deref(), Some("Lighthouse"));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_find_one_or_create_is_stable() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let query = ApiQuery::new(doc! { "address": "0x77" });

    let first = ctx
        .repos
        .accounts
        .find_one_or_create(&query, "tester")
        .await
        .unwrap();
    let second = ctx
        .repos
        .accounts
        .find_one_or_create(&query, "someone-else")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.address, "0x77");
    assert!(first.created_on.is_some());
    assert_eq!(first.created_on, second.created_on);
    assert_eq!(second.created_by.as_deref(), Some("tester"));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_create_bulk_counts() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    assert_eq!(ctx.repos.bundles.create_bulk(&[]).await.unwrap(), 0);

    let bundles = vec![
        Bundle::new("a", vec!["0x1".into()]),
        Bundle::new("b", vec!["0x1".into(), "0x2".into()]),
        Bundle::new("c", vec![]),
    ];
    assert_eq!(ctx.repos.bundles.create_bulk(&bundles).await.unwrap(), 3);

    let page = ctx
        .repos
        .bundles
        .find_containing_asset("0x1", &ApiQuery::default())
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert!(page.results.iter().all(|b| b.contains("0x1")));

    let created = ctx
        .repos
        .bundles
        .create_bundle("d", vec!["0x2".into()], "tester")
        .await
        .unwrap();
    assert!(created.id.is_some());
    assert_eq!(ctx.repos.bundles.count(doc! {}).await.unwrap(), 4);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_exists_and_exists_or() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let accounts = &ctx.repos.accounts;
    let mut account = Account::new("0x01");
    account.name = Some("alice".into());
    accounts.create(&account).await.unwrap();

    assert!(accounts
        .exists(&ApiQuery::new(doc! { "address": "0x01" }))
        .await
        .unwrap());
    assert!(!accounts
        .exists(&ApiQuery::new(doc! { "address": "0x02" }))
        .await
        .unwrap());
    let err = accounts.exists(&ApiQuery::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Repository);

    let mut candidate = Account::new("0x99");
    candidate.name = Some("alice".into());
    assert!(accounts.exists_or(&candidate, &["address", "name"]).await.unwrap());
    assert!(!accounts.exists_or(&candidate, &["address"]).await.unwrap());
    let err = accounts.exists_or(&candidate, &["email"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Repository);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_duplicate_natural_key_is_a_repository_error() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    ctx.repos.accounts.create(&Account::new("0x01")).await.unwrap();
    let err = ctx
        .repos
        .accounts
        .create(&Account::new("0x01"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Repository);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_hidden_fields_follow_access_level() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let mut account = Account::new("0x01");
    account.email = Some("alice@example.com".into());
    ctx.repos.accounts.create(&account).await.unwrap();

    let anonymous = ctx
        .repos
        .accounts
        .find_by_address("0x01", AccessLevel::ANONYMOUS)
        .await
        .unwrap()
        .unwrap();
    assert!(anonymous.email.is_none());

    let admin = ctx
        .repos
        .accounts
        .find_by_address("0x01", AccessLevel::ADMIN)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.email.as_deref(), Some("alice@example.com"));

    let page = ctx.repos.accounts.find(&ApiQuery::default()).await.unwrap();
    assert!(page.results[0].email.is_none());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_delete_distinct_and_event_lookups() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let now = chrono::Utc::now();
    let events = vec![
        Event::new("e1", "0xa", "mint", now),
        Event::new("e2", "0xa", "transfer", now),
        Event::new("e3", "0xb", "mint", now),
    ];
    ctx.repos.events.create_bulk(&events).await.unwrap();

    assert_eq!(ctx.repos.events.count_for_asset("0xa").await.unwrap(), 2);
    let found = ctx.repos.events.find_by_event_id("e3").await.unwrap().unwrap();
    assert_eq!(found.asset, "0xb");

    let mut kinds: Vec<String> = ctx
        .repos
        .events
        .distinct("kind")
        .await
        .unwrap()
        .into_iter()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect();
    kinds.sort();
    assert_eq!(kinds, ["mint", "transfer"]);

    let removed = ctx.repos.events.delete_one(doc! { "eventId": "e1" });
    assert_eq!(removed.await.unwrap(), 1);
    let removed = ctx.repos.events.delete_one(doc! { "eventId": "e1" });
    assert_eq!(removed.await.unwrap(), 0);

    ctx.cleanup().await;
}
