//! Integration tests for cursor pagination, search and aggregation.

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use mongodb::bson::{self, doc};

use trove_core::error::ErrorKind;
use trove_core::types::{ApiQuery, PageCursor};
use trove_database::BaseRepository;
use trove_entity::{Account, Asset, Event, IdentityCounter};

use crate::helpers::TestDb;

async fn seed_accounts(ctx: &TestDb, count: usize) {
    let accounts: Vec<Account> = (1..=count)
        .map(|n| Account::new(format!("0x{n:02}")))
        .collect();
    let inserted = ctx.repos.accounts.create_bulk(&accounts).await.unwrap();
    assert_eq!(inserted, count as u64);
}

fn addresses(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|a| a.address.as_str()).collect()
}

#[tokio::test]
async fn test_forward_and_backward_pages_over_accounts() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    seed_accounts(&ctx, 7).await;

    let query = ApiQuery::builder().limit(3).build().unwrap();
    let first = ctx.repos.accounts.find(&query).await.unwrap();
    assert_eq!(addresses(&first.results), ["0x01", "0x02", "0x03"]);
    assert!(first.has_next);
    assert!(!first.has_previous);
    assert!(first.previous.is_none());

    let second = ctx
        .repos
        .accounts
        .find(&query.with_cursor(PageCursor::After(first.next.clone().unwrap())))
        .await
        .unwrap();
    assert_eq!(addresses(&second.results), ["0x04", "0x05", "0x06"]);
    assert!(second.has_next);
    assert!(second.has_previous);

    let third = ctx
        .repos
        .accounts
        .find(&query.with_cursor(PageCursor::After(second.next.clone().unwrap())))
        .await
        .unwrap();
    assert_eq!(addresses(&third.results), ["0x07"]);
    assert!(!third.has_next);
    assert!(third.next.is_none());
    assert!(third.has_previous);

    let back = ctx
        .repos
        .accounts
        .find(&query.with_cursor(PageCursor::Before(third.previous.clone().unwrap())))
        .await
        .unwrap();
    assert_eq!(addresses(&back.results), ["0x04", "0x05", "0x06"]);
    assert!(back.has_next);
    assert!(back.has_previous);

    let start = ctx
        .repos
        .accounts
        .find(&query.with_cursor(PageCursor::Before(back.previous.clone().unwrap())))
        .await
        .unwrap();
    assert_eq!(addresses(&start.results), ["0x01", "0x02", "0x03"]);
    assert!(!start.has_previous);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_descending_pages_with_tied_timestamps_have_no_gaps() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let events: Vec<Event> = (0..9)
        .map(|n| {
            // three events share each timestamp
            let at = base + Duration::minutes(n / 3);
            Event::new(format!("evt-{n}"), "0xabc", "transfer", at)
        })
        .collect();
    ctx.repos.events.create_bulk(&events).await.unwrap();

    let query = ApiQuery::builder().limit(2).build().unwrap();
    let mut seen = Vec::new();
    let mut cursor = PageCursor::First;
    loop {
        let page = ctx
            .repos
            .events
            .find(&query.with_cursor(cursor))
            .await
            .unwrap();
        assert!(page.len() <= 2);
        seen.extend(page.results.iter().map(|e| (e.timestamp, e.event_id.clone())));
        match page.next {
            Some(next) => cursor = PageCursor::After(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 9);
    let unique: HashSet<_> = seen.iter().map(|(_, id)| id.clone()).collect();
    assert_eq!(unique.len(), 9);
    assert!(seen.windows(2).all(|w| w[0].0 >= w[1].0));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_projection_keeps_pagination_keys() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    seed_accounts(&ctx, 3).await;

    let query = ApiQuery::builder()
        .include("name")
        .limit(2)
        .build()
        .unwrap();
    let page = ctx.repos.accounts.find(&query).await.unwrap();
    assert_eq!(addresses(&page.results), ["0x01", "0x02"]);
    assert!(page.results.iter().all(|a| a.id.is_some()));

    let next = ctx
        .repos
        .accounts
        .find(&query.with_cursor(PageCursor::After(page.next.unwrap())))
        .await
        .unwrap();
    assert_eq!(addresses(&next.results), ["0x03"]);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_search_combines_text_and_filter() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let assets: Vec<Asset> = [
        ("0x01", "Harbor crane", "alice"),
        ("0x02", "Harbor tug", "bob"),
        ("0x03", "Mountain hut", "alice"),
    ]
    .into_iter()
    .map(|(address, title, owner)| Asset {
        title: Some(title.to_string()),
        owner: Some(owner.to_string()),
        created_on: Some(bson::DateTime::now()),
        ..Asset::new(address)
    })
    .collect();
    ctx.repos.assets.create_bulk(&assets).await.unwrap();

    let query = ApiQuery::builder().search("harbor").build().unwrap();
    let page = ctx.repos.assets.search(&query).await.unwrap();
    assert_eq!(page.len(), 2);

    let query = ApiQuery::builder()
        .search("harbor")
        .filter("owner", "alice")
        .build()
        .unwrap();
    let page = ctx.repos.assets.search(&query).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.results[0].address, "0x01");

    let everything = ctx.repos.assets.search(&ApiQuery::default()).await.unwrap();
    assert_eq!(everything.len(), 3);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_aggregate_paging_and_aggregate() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let events: Vec<Event> = (0..5)
        .map(|n| {
            let kind = if n % 2 == 0 { "transfer" } else { "mint" };
            Event::new(format!("evt-{n}"), "0xabc", kind, base + Duration::hours(n))
        })
        .collect();
    ctx.repos.events.create_bulk(&events).await.unwrap();

    let query = ApiQuery::builder()
        .filter("kind", "transfer")
        .limit(2)
        .build()
        .unwrap();
    let page = ctx.repos.events.aggregate_paging::<Event>(&query).await.unwrap();
    let ids: Vec<_> = page.results.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, ["evt-4", "evt-2"]);
    assert!(page.has_next);

    let rest = ctx
        .repos
        .events
        .aggregate_paging::<Event>(&query.with_cursor(PageCursor::After(page.next.unwrap())))
        .await
        .unwrap();
    let ids: Vec<_> = rest.results.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, ["evt-0"]);
    assert!(!rest.has_next);

    let grouped = ApiQuery::builder()
        .stage(doc! { "$group": { "_id": "$kind", "total": { "$sum": 1 } } })
        .stage(doc! { "$sort": { "_id": 1 } })
        .build()
        .unwrap();
    let totals = ctx
        .repos
        .events
        .aggregate::<bson::Document>(&grouped)
        .await
        .unwrap();
    assert_eq!(
        totals,
        vec![
            doc! { "_id": "mint", "total": 2 },
            doc! { "_id": "transfer", "total": 3 },
        ]
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_unpaginated_repository_rejects_find() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let repo = BaseRepository::<IdentityCounter>::new(ctx.db.clone());
    let err = repo.find(&ApiQuery::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Developer);
    assert!(err.is_developer());

    ctx.cleanup().await;
}
