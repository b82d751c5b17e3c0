//! Database functionality tests
//!
//! Schema creation, cascade deletes, synonym navigation and file-backed stores

use anyhow::Result;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tagstore::database::entities::tags;
use tagstore::database::seed_data::seed_synonym_pair;
use tagstore::database::test_utils::setup_test_store;
use tagstore::{EntityState, StoreConfig, StoreError, Tag, TagStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_schema_created_empty() -> Result<()> {
    let store = setup_test_store().await?;

    let rows = tags::Entity::find().all(store.connection()).await?;
    assert_eq!(rows.len(), 0);

    let context = store.context();
    let rows = tags::Entity::find().all(context.connection()).await?;
    assert!(rows.is_empty());

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_unopenable_store_fails_initialization() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("missing").join("sub").join("tags.db");

    let err = match TagStore::initialize(StoreConfig::file(&path.to_string_lossy())).await {
        Ok(_) => panic!("store in a missing directory should not open"),
        Err(err) => err,
    };

    assert!(matches!(err, StoreError::Initialization(_)));
    assert!(err.is_database_error());
    Ok(())
}

#[tokio::test]
async fn test_foreign_key_rejects_missing_principal() -> Result<()> {
    let store = setup_test_store().await?;

    let orphan = tags::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        name: Set("Orphan".to_string()),
        synonym_for_id: Set(Some(uuid::Uuid::new_v4())),
    };

    assert!(orphan.insert(store.connection()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_to_synonyms() -> Result<()> {
    let store = setup_test_store().await?;
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;

    context.remove(seeded.foo.id)?;
    assert_eq!(context.state_of(seeded.foo.id), EntityState::Deleted);
    assert_eq!(context.save_changes().await?, 1);

    // Bar went with Foo, in the store and in the tracker.
    assert!(context.all_no_tracking().await?.is_empty());
    assert_eq!(context.state_of(seeded.bar.id), EntityState::Detached);
    assert_eq!(context.tracked_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_tracker_drops_dependents_transitively() -> Result<()> {
    let store = setup_test_store().await?;
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;

    let baz_id = context.add(Tag::new("Baz").synonym_of(&seeded.bar))?;
    context.save_changes().await?;
    assert_eq!(context.tracked_count(), 3);

    context.remove(seeded.foo.id)?;
    assert_eq!(context.save_changes().await?, 1);

    assert_eq!(context.tracked_count(), 0);
    assert_eq!(context.state_of(seeded.bar.id), EntityState::Detached);
    assert_eq!(context.state_of(baz_id), EntityState::Detached);
    assert!(context.all_no_tracking().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_transitively() -> Result<()> {
    let store = setup_test_store().await?;
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;

    let baz = Tag::new("Baz").synonym_of(&seeded.bar);
    let unrelated = Tag::new("Unrelated");
    context.add_range([baz.clone(), unrelated.clone()])?;
    context.save_changes().await?;

    let mut other = store.context();
    other.find(seeded.foo.id).await?;
    other.remove(seeded.foo.id)?;
    other.save_changes().await?;

    let remaining = context.all_no_tracking().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, unrelated.id);

    Ok(())
}

#[tokio::test]
async fn test_synonym_navigation() -> Result<()> {
    let store = setup_test_store().await?;
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;

    let synonyms = context.synonyms_of(seeded.foo.id).await?;
    assert_eq!(synonyms, vec![seeded.bar.clone()]);
    assert!(context.synonyms_of(seeded.bar.id).await?.is_empty());

    assert_eq!(
        context.synonym_for(seeded.bar.id).await?,
        Some(seeded.foo.clone())
    );
    assert_eq!(context.synonym_for(seeded.foo.id).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_file_store_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tags.db");
    let config = StoreConfig::file(&path.to_string_lossy());

    let store = TagStore::initialize(config.clone()).await?;
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;
    store.close().await?;

    let reopened = TagStore::initialize(config).await?;
    let mut context = reopened.context();
    let bar = context.single_by_name("Bar").await?;
    assert_eq!(bar.synonym_for_id, Some(seeded.foo.id));

    reopened.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_in_memory_stores_are_isolated() -> Result<()> {
    let first = setup_test_store().await?;
    let second = setup_test_store().await?;

    let mut context = first.context();
    seed_synonym_pair(&mut context).await?;

    assert_eq!(first.context().all_no_tracking().await?.len(), 2);
    assert!(second.context().all_no_tracking().await?.is_empty());

    Ok(())
}
