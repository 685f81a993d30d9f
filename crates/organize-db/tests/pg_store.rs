//! `PgEntityStore` against a real PostgreSQL.
//!
//! Skipped unless `TEST_DATABASE_URL` names a database the tests may migrate
//! and write to. Each test works under its own user id, so runs can share
//! one database.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::OnceCell;

use organize_core::category::Category;
use organize_core::model::{EntityFields, EntitySearch, ListQuery, ParentRef};
use organize_db::db::connection::create_pool;
use organize_db::db::migrations::run_migrations;
use organize_db::error::StoreError;
use organize_db::store::{EntityStore, PgEntityStore};

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn store() -> Option<PgEntityStore> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        tracing::warn!("TEST_DATABASE_URL not set, skipping PostgreSQL store test");
        return None;
    };

    MIGRATED
        .get_or_try_init(|| run_migrations(&url))
        .await
        .unwrap();

    let pool = create_pool(&url, 2, Duration::from_secs(5)).await.unwrap();
    Some(PgEntityStore::new(pool))
}

fn unique_user(tag: &str) -> String {
    format!(
        "{tag}-{}-{}",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn fields(name: &str, parent: Option<ParentRef>) -> EntityFields {
    EntityFields {
        name: name.to_string(),
        parent,
        ..EntityFields::default()
    }
}

async fn create(
    store: &PgEntityStore,
    user: &str,
    category: Category,
    name: &str,
    parent: Option<ParentRef>,
) -> ParentRef {
    let id = store
        .create(user, category, &fields(name, parent))
        .await
        .unwrap();
    ParentRef::new(id, category)
}

#[test_log::test(tokio::test)]
async fn second_page_is_a_global_window() {
    let Some(store) = store().await else { return };
    let user = unique_user("page");

    let building = create(&store, &user, Category::Building, "HQ", None).await;
    let room = create(&store, &user, Category::Room, "Store", Some(building)).await;
    for n in 1..=43 {
        create(&store, &user, Category::Item, &format!("Item {n}"), Some(room)).await;
    }

    let query = ListQuery {
        offset: 20,
        limit: 20,
        search: EntitySearch::default(),
    };
    let page = store.list_entities(&user, &query).await.unwrap();
    let names: Vec<String> = page.iter().map(|e| e.name.clone()).collect();
    let expected: Vec<String> = (19..=38).map(|n| format!("Item {n}")).collect();
    assert_eq!(names, expected);
    assert!(page.iter().all(|e| e.category == Category::Item));
    assert!(page.iter().all(|e| e.parent == Some(room)));

    let first = store
        .list_entities(
            &user,
            &ListQuery {
                offset: 0,
                limit: 2,
                search: EntitySearch::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(first[0].category, Category::Building);
    assert_eq!(first[1].category, Category::Room);

    let total = store
        .count_entities(&user, &EntitySearch::default())
        .await
        .unwrap();
    assert_eq!(total, 45);
}

#[test_log::test(tokio::test)]
async fn search_treats_wildcards_literally() {
    let Some(store) = store().await else { return };
    let user = unique_user("search");

    let building = create(&store, &user, Category::Building, "Shop", None).await;
    let room = create(&store, &user, Category::Room, "Floor", Some(building)).await;
    create(&store, &user, Category::Item, "50% off sign", Some(room)).await;
    create(&store, &user, Category::Item, "500 off sign", Some(room)).await;

    let search = EntitySearch::new("50%", [Category::Item]);
    let query = ListQuery {
        offset: 0,
        limit: 20,
        search: search.clone(),
    };
    let page = store.list_entities(&user, &query).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "50% off sign");
    assert_eq!(store.count_entities(&user, &search).await.unwrap(), 1);
}

#[test_log::test(tokio::test)]
async fn children_count_and_soft_delete() {
    let Some(store) = store().await else { return };
    let user = unique_user("delete");

    let building = create(&store, &user, Category::Building, "HQ", None).await;
    let room = create(&store, &user, Category::Room, "Lobby", Some(building)).await;
    let lamp = create(&store, &user, Category::Item, "Lamp", Some(room)).await;
    create(&store, &user, Category::Item, "Chair", Some(room)).await;
    create(&store, &user, Category::Container, "Box", Some(room)).await;

    let deeper = Category::Room.deeper_categories();
    assert_eq!(store.count_children(&user, room, &deeper).await.unwrap(), 3);
    assert_eq!(
        store
            .count_children(&unique_user("other"), room, &deeper)
            .await
            .unwrap(),
        0
    );

    assert!(matches!(
        store
            .soft_delete(&user, room.category, room.id, &deeper)
            .await,
        Err(StoreError::HasChildren { count: 3, .. })
    ));
    assert!(store.get_one(&user, room.category, room.id).await.is_ok());

    store
        .soft_delete(&user, lamp.category, lamp.id, &[])
        .await
        .unwrap();
    assert_eq!(store.count_children(&user, room, &deeper).await.unwrap(), 2);
    assert!(matches!(
        store.soft_delete(&user, lamp.category, lamp.id, &[]).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.get_one(&user, lamp.category, lamp.id).await,
        Err(StoreError::NotFound { .. })
    ));

    let children = store.children(&user, room, &deeper).await.unwrap();
    let categories: Vec<Category> = children.iter().map(|c| c.category).collect();
    assert_eq!(categories, vec![Category::Container, Category::Item]);
}

#[test_log::test(tokio::test)]
async fn parent_candidates_are_live_and_owned() {
    let Some(store) = store().await else { return };
    let user = unique_user("parents");

    let hq = create(&store, &user, Category::Building, "HQ", None).await;
    let annex = create(&store, &user, Category::Building, "Annex", None).await;
    let room = create(&store, &user, Category::Room, "Lobby", Some(hq)).await;
    let unit = create(&store, &user, Category::ShelvingUnit, "Rack", Some(room)).await;
    let shelf = create(&store, &user, Category::Shelf, "Top", Some(unit)).await;

    let buildings = store
        .parent_candidates(&user, &[Category::Building])
        .await
        .unwrap();
    let ids: Vec<i64> = buildings.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![hq.id, annex.id]);

    let for_container = store
        .parent_candidates(&user, Category::Container.legal_parents())
        .await
        .unwrap();
    let labels: Vec<(Category, i64)> = for_container.iter().map(|c| (c.category, c.id)).collect();
    assert_eq!(
        labels,
        vec![(Category::Room, room.id), (Category::Shelf, shelf.id)]
    );

    store
        .soft_delete(&user, annex.category, annex.id, &[])
        .await
        .unwrap();
    let buildings = store
        .parent_candidates(&user, &[Category::Building])
        .await
        .unwrap();
    assert_eq!(buildings.len(), 1);
    assert_eq!(buildings[0].name, "HQ");

    assert!(
        store
            .parent_candidates(&unique_user("stranger"), &[Category::Building])
            .await
            .unwrap()
            .is_empty()
    );
}

#[test_log::test(tokio::test)]
async fn writes_check_the_parent_and_bump_updated_at() {
    let Some(store) = store().await else { return };
    let user = unique_user("write");

    let building = create(&store, &user, Category::Building, "HQ", None).await;
    let room = create(&store, &user, Category::Room, "Lobby", Some(building)).await;

    let updated = store
        .update(&user, room.category, room.id, &fields("Reception", Some(building)))
        .await
        .unwrap();
    assert_eq!(updated.name, "Reception");
    assert!(updated.updated_at >= updated.created_at);

    let gone = create(&store, &user, Category::Building, "Old", None).await;
    store
        .soft_delete(&user, gone.category, gone.id, &[])
        .await
        .unwrap();
    assert!(matches!(
        store
            .create(&user, Category::Room, &fields("Attic", Some(gone)))
            .await,
        Err(StoreError::ParentNotFound { .. })
    ));
    assert!(matches!(
        store
            .update(&user, Category::Room, room.id + 1_000_000, &fields("Ghost", Some(building)))
            .await,
        Err(StoreError::NotFound { .. })
    ));
}
