use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::entry::{Entry, TrackedEntry};
use super::index::SynonymIndex;
use super::state::EntityState;
use crate::database::entities::tags::{self, SynonymForLink};
use crate::errors::{StoreError, StoreResult};

pub type Tag = tags::Model;

/// Unit of work over the `tags` table.
///
/// Tracked queries hand out mutable representations; edits are picked up by
/// snapshot comparison (or immediately, through [`Entry`]) and written in one
/// transaction by [`TagContext::save_changes`]. A save borrows the context
/// mutably, so nothing else can observe or detach a representation while the
/// write is outstanding.
pub struct TagContext {
    db: DatabaseConnection,
    entries: HashMap<Uuid, TrackedEntry>,
}

#[derive(Debug, Default)]
struct SavePlan {
    inserts: Vec<Tag>,
    updates: Vec<(Uuid, tags::ActiveModel)>,
    deletes: Vec<Uuid>,
}

impl SavePlan {
    fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}

impl TagContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            entries: HashMap::new(),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    /// Untracked keys report [`EntityState::Detached`].
    pub fn state_of(&self, id: Uuid) -> EntityState {
        self.entries
            .get(&id)
            .map(TrackedEntry::observed_state)
            .unwrap_or(EntityState::Detached)
    }

    pub fn has_changes(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.observed_state().has_pending_changes())
    }

    pub fn add(&mut self, tag: Tag) -> StoreResult<Uuid> {
        if self.entries.contains_key(&tag.id) {
            return Err(StoreError::AlreadyTracked(tag.id));
        }

        let id = tag.id;
        debug!(tag_id = %id, name = %tag.name, "Tracking new tag");
        self.entries.insert(id, TrackedEntry::added(tag));
        Ok(id)
    }

    /// Adds every tag or none of them.
    pub fn add_range<I>(&mut self, tags: I) -> StoreResult<Vec<Uuid>>
    where
        I: IntoIterator<Item = Tag>,
    {
        let tags: Vec<Tag> = tags.into_iter().collect();

        let mut seen = HashSet::new();
        for tag in &tags {
            if self.entries.contains_key(&tag.id) || !seen.insert(tag.id) {
                return Err(StoreError::AlreadyTracked(tag.id));
            }
        }

        tags.into_iter().map(|tag| self.add(tag)).collect()
    }

    /// Starts tracking a representation that is known to match a stored row,
    /// e.g. one returned earlier by [`TagContext::detach`].
    pub fn attach(&mut self, tag: Tag) -> StoreResult<&mut Tag> {
        if self.entries.contains_key(&tag.id) {
            return Err(StoreError::AlreadyTracked(tag.id));
        }

        debug!(tag_id = %tag.id, "Attaching tag");
        Ok(self.track_row(tag))
    }

    /// Tracked query for the one tag with `name`. When the matching key is
    /// already tracked, the tracked representation is returned as-is.
    pub async fn single_by_name(&mut self, name: &str) -> StoreResult<&mut Tag> {
        let mut rows = tags::Entity::find()
            .filter(tags::Column::Name.eq(name))
            .all(&self.db)
            .await?;

        let row = match rows.len() {
            0 => return Err(StoreError::NotFound(name.to_string())),
            1 => rows.remove(0),
            count => {
                return Err(StoreError::NotUnique {
                    name: name.to_string(),
                    count,
                })
            }
        };

        Ok(self.track_row(row))
    }

    /// Tracked lookup by key. Tracked representations, including ones not
    /// yet saved, are returned without a round trip.
    pub async fn find(&mut self, id: Uuid) -> StoreResult<Option<&mut Tag>> {
        if self.entries.contains_key(&id) {
            return Ok(self.entries.get_mut(&id).map(|entry| &mut entry.current));
        }

        match tags::Entity::find_by_id(id).one(&self.db).await? {
            Some(row) => Ok(Some(self.track_row(row))),
            None => Ok(None),
        }
    }

    /// Direct access to a tracked representation. Edits are found by change
    /// detection.
    pub fn tag_mut(&mut self, id: Uuid) -> Option<&mut Tag> {
        self.entries.get_mut(&id).map(|entry| &mut entry.current)
    }

    pub fn entry(&mut self, id: Uuid) -> StoreResult<Entry<'_>> {
        self.entries
            .get_mut(&id)
            .map(|tracked| Entry::new(id, tracked))
            .ok_or(StoreError::NotTracked(id))
    }

    /// Bulk read that bypasses the tracker entirely.
    pub async fn all_no_tracking(&self) -> StoreResult<Vec<Tag>> {
        let rows = tags::Entity::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await?;

        debug!(rows = rows.len(), "Untracked read of all tags");
        Ok(rows)
    }

    /// Stored synonyms of `id` (the inverse of `synonym_for_id`). Untracked.
    pub async fn synonyms_of(&self, id: Uuid) -> StoreResult<Vec<Tag>> {
        Ok(tags::Entity::find()
            .filter(tags::Column::SynonymForId.eq(id))
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Stored tag that `id` is a synonym for. Untracked.
    pub async fn synonym_for(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        let Some(tag) = tags::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        Ok(tag.find_linked(SynonymForLink).one(&self.db).await?)
    }

    pub fn detect_changes(&mut self) {
        for entry in self.entries.values_mut() {
            entry.detect_changes();
        }
    }

    /// Marks a tracked tag for deletion. Tags that were never saved are
    /// simply dropped from the tracker.
    pub fn remove(&mut self, id: Uuid) -> StoreResult<()> {
        let state = self.state_of(id);
        match state {
            EntityState::Detached => return Err(StoreError::NotTracked(id)),
            EntityState::Added => {
                self.entries.remove(&id);
            }
            EntityState::Deleted => {}
            EntityState::Unchanged | EntityState::Modified => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.mark_deleted();
                }
            }
        }

        debug!(tag_id = %id, from = ?state, "Tag removed");
        Ok(())
    }

    /// Stops tracking `id` and hands back its representation. Only clean
    /// entries can be detached; save first.
    pub fn detach(&mut self, id: Uuid) -> StoreResult<Tag> {
        let state = self.state_of(id);
        if state.has_pending_changes() {
            return Err(StoreError::PendingChanges { id, state });
        }

        let entry = self
            .entries
            .remove(&id)
            .ok_or(StoreError::NotTracked(id))?;

        debug!(tag_id = %id, "Tag detached");
        Ok(entry.current)
    }

    /// Explicit state change for a tracked tag. Untracked keys cannot be
    /// moved to `Added` or `Unchanged` here since there is no representation
    /// to track; use [`TagContext::add`] or [`TagContext::attach`].
    pub fn set_state(&mut self, id: Uuid, state: EntityState) -> StoreResult<()> {
        let from = self.state_of(id);
        if from == state {
            return Ok(());
        }
        if from == EntityState::Detached {
            return Err(StoreError::NotTracked(id));
        }
        if state == EntityState::Detached {
            return self.detach(id).map(|_| ());
        }
        if !from.can_transition_to(state) {
            return Err(StoreError::InvalidTransition { id, from, to: state });
        }
        if state == EntityState::Deleted {
            return self.remove(id);
        }

        let entry = self.entries.get_mut(&id).ok_or(StoreError::NotTracked(id))?;
        if state == EntityState::Unchanged {
            entry.accept_changes();
        } else {
            entry.mark_modified();
        }
        Ok(())
    }

    /// Writes every pending change in one transaction and returns the number
    /// of tags written. On error the transaction is rolled back and tracked
    /// state is left as it was.
    pub async fn save_changes(&mut self) -> StoreResult<usize> {
        self.detect_changes();

        let plan = self.plan_save()?;
        if plan.is_empty() {
            debug!("No pending changes to save");
            return Ok(0);
        }

        self.validate_synonyms(&plan).await?;

        let txn = self.db.begin().await?;
        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        let written = plan.len();
        self.accept_saved(plan);

        info!(written, "Saved tag changes");
        Ok(written)
    }

    fn track_row(&mut self, row: Tag) -> &mut Tag {
        let id = row.id;
        &mut self
            .entries
            .entry(id)
            .or_insert_with(|| TrackedEntry::unchanged(row))
            .current
    }

    fn plan_save(&self) -> StoreResult<SavePlan> {
        let mut plan = SavePlan::default();
        let mut added = Vec::new();

        for (key, entry) in &self.entries {
            if entry.current.id != *key {
                return Err(StoreError::KeyModified {
                    original: *key,
                    current: entry.current.id,
                });
            }

            match entry.observed_state() {
                EntityState::Added => added.push(entry.current.clone()),
                EntityState::Modified => plan.updates.push((*key, update_model(entry))),
                EntityState::Deleted => plan.deletes.push(*key),
                EntityState::Unchanged | EntityState::Detached => {}
            }
        }

        plan.inserts = order_inserts(added);
        plan.updates.sort_by_key(|(id, _)| *id);
        plan.deletes.sort();
        Ok(plan)
    }

    /// Every synonym link written by this save must point at a tag that is
    /// tracked and not deleted, or that already exists in the store.
    async fn validate_synonyms(&self, plan: &SavePlan) -> StoreResult<()> {
        let mut links: Vec<(Uuid, Uuid)> = Vec::new();
        for tag in &plan.inserts {
            if let Some(principal) = tag.synonym_for_id {
                links.push((tag.id, principal));
            }
        }
        for (id, _) in &plan.updates {
            if let Some(principal) = self.entries.get(id).and_then(|e| e.current.synonym_for_id) {
                links.push((*id, principal));
            }
        }

        let mut unknown = HashSet::new();
        for (id, principal) in &links {
            match self.entries.get(principal).map(TrackedEntry::observed_state) {
                Some(EntityState::Deleted) => {
                    return Err(StoreError::DanglingSynonym {
                        id: *id,
                        synonym_for_id: *principal,
                    })
                }
                Some(_) => {}
                None => {
                    unknown.insert(*principal);
                }
            }
        }

        if unknown.is_empty() {
            return Ok(());
        }

        let stored: HashSet<Uuid> = tags::Entity::find()
            .filter(tags::Column::Id.is_in(unknown.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|tag| tag.id)
            .collect();

        match links
            .iter()
            .find(|(_, principal)| unknown.contains(principal) && !stored.contains(principal))
        {
            Some((id, principal)) => Err(StoreError::DanglingSynonym {
                id: *id,
                synonym_for_id: *principal,
            }),
            None => Ok(()),
        }
    }

    fn accept_saved(&mut self, plan: SavePlan) {
        for tag in &plan.inserts {
            if let Some(entry) = self.entries.get_mut(&tag.id) {
                entry.accept_changes();
            }
        }
        for (id, _) in &plan.updates {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.accept_changes();
            }
        }

        if plan.deletes.is_empty() {
            return;
        }

        // The store cascades deletes through synonym links; drop tracked
        // dependents so the tracker agrees with it.
        let index = SynonymIndex::build(self.entries.values().map(|entry| &entry.current));
        let cascaded = index.cascade_from(plan.deletes.iter().copied());

        for id in plan.deletes.iter().chain(cascaded.iter()) {
            self.entries.remove(id);
        }

        if !cascaded.is_empty() {
            debug!(count = cascaded.len(), "Dropped cascade-deleted synonyms from tracker");
        }
    }
}

/// Changed columns only, unless the entry was explicitly marked modified.
fn update_model(entry: &TrackedEntry) -> tags::ActiveModel {
    let current = &entry.current;
    let original = entry.original();
    let force = entry.is_forced() || original.is_none();

    let name = if force || original.map(|o| o.name != current.name).unwrap_or(true) {
        ActiveValue::Set(current.name.clone())
    } else {
        ActiveValue::Unchanged(current.name.clone())
    };

    let synonym_for_id = if force
        || original
            .map(|o| o.synonym_for_id != current.synonym_for_id)
            .unwrap_or(true)
    {
        ActiveValue::Set(current.synonym_for_id)
    } else {
        ActiveValue::Unchanged(current.synonym_for_id)
    };

    tags::ActiveModel {
        id: ActiveValue::Unchanged(current.id),
        name,
        synonym_for_id,
    }
}

/// Principals before their synonyms so immediate foreign-key checks pass.
/// Remaining cycles are emitted in name order and left to the store.
fn order_inserts(mut pending: Vec<Tag>) -> Vec<Tag> {
    pending.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let mut waiting: HashSet<Uuid> = pending.iter().map(|tag| tag.id).collect();
    let mut ordered = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|tag| match tag.synonym_for_id {
            Some(principal) if principal != tag.id => !waiting.contains(&principal),
            _ => true,
        });

        let next = pending.remove(ready.unwrap_or(0));
        waiting.remove(&next.id);
        ordered.push(next);
    }

    ordered
}

async fn apply_plan<C>(db: &C, plan: &SavePlan) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for tag in &plan.inserts {
        tags::Entity::insert(tags::ActiveModel {
            id: ActiveValue::Set(tag.id),
            name: ActiveValue::Set(tag.name.clone()),
            synonym_for_id: ActiveValue::Set(tag.synonym_for_id),
        })
        .exec_without_returning(db)
        .await?;
    }

    for (_, update) in &plan.updates {
        tags::Entity::update(update.clone()).exec(db).await?;
    }

    for id in &plan.deletes {
        tags::Entity::delete_by_id(*id).exec(db).await?;
    }

    debug!(
        inserted = plan.inserts.len(),
        updated = plan.updates.len(),
        deleted = plan.deletes.len(),
        "Applied save plan"
    );
    Ok(())
}
