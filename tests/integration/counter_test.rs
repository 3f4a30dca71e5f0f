//! Integration tests for identity counters and organization ids.

use trove_core::error::ErrorKind;
use trove_database::repositories::ORGANIZATION_ID_STEP;

use crate::helpers::TestDb;

#[tokio::test]
async fn test_organization_ids_advance_by_step() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let organizations = &ctx.repos.organizations;

    assert_eq!(ORGANIZATION_ID_STEP, 9);
    assert_eq!(organizations.next_organization_id().await.unwrap(), 9);
    assert_eq!(organizations.next_organization_id().await.unwrap(), 18);
    assert_eq!(ctx.repos.counters.current("organizationId").await.unwrap(), 18);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_create_organization_mints_ids() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    let organizations = &ctx.repos.organizations;

    let acme = organizations
        .create_organization("Acme", "tester")
        .await
        .unwrap();
    let globex = organizations
        .create_organization("Globex", "tester")
        .await
        .unwrap();
    assert_eq!(acme.organization_id, 9);
    assert_eq!(globex.organization_id, 18);

    let found = organizations.find_by_name("Globex").await.unwrap().unwrap();
    assert_eq!(found.id, globex.id);
    assert_eq!(found.created_by.as_deref(), Some("tester"));

    let err = organizations
        .create_organization("Acme", "tester")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Repository);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_concurrent_increments_are_distinct() {
    let Some(ctx) = TestDb::new().await else {
        return;
    };
    assert_eq!(ctx.repos.counters.increment("tickets", 1).await.unwrap(), 1);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let counters = ctx.repos.counters.clone();
        handles.push(tokio::spawn(async move {
            counters.increment("tickets", 1).await.unwrap()
        }));
    }

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap());
    }
    values.sort();
    assert_eq!(values, (2..=9).collect::<Vec<i64>>());
    assert_eq!(ctx.repos.counters.current("unused").await.unwrap(), 0);

    ctx.cleanup().await;
}
