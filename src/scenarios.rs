//! Clear-and-detach scenarios.
//!
//! Each run opens its own store, seeds `Foo`/`Bar`, clears `Bar`'s synonym
//! link on the tracked representation, saves, detaches `Bar` and reads it
//! back by name. The variants differ only in whether an untracked bulk read
//! happens right before the edit and again right after the detach.

use tracing::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::database::seed_data::{seed_synonym_pair, SeededTags};
use crate::errors::StoreResult;
use crate::store::TagStore;
use crate::tracking::EntityState;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScenarioVariant {
    /// Clear the link by assigning the field on the tracked tag.
    Direct,
    /// Untracked read before the edit and after the detach; the link is
    /// cleared through the property-level entry API.
    InterposedUntrackedRead,
}

impl ScenarioVariant {
    pub fn interposes_untracked_read(self) -> bool {
        matches!(self, ScenarioVariant::InterposedUntrackedRead)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub variant: ScenarioVariant,
    pub seeded: SeededTags,
    /// Tags written by the save that cleared the link.
    pub rows_written: usize,
    pub state_after_detach: EntityState,
    /// `Bar.synonym_for_id` as read back after the detach.
    pub requeried_synonym_for_id: Option<Uuid>,
    /// Row counts returned by each interposed untracked read.
    pub untracked_reads: Vec<usize>,
}

impl ScenarioOutcome {
    pub fn cleared_link_persisted(&self) -> bool {
        self.requeried_synonym_for_id.is_none()
    }
}

pub async fn run(variant: ScenarioVariant) -> StoreResult<ScenarioOutcome> {
    run_with_config(variant, StoreConfig::in_memory()).await
}

/// Runs `variant` against a store built from `config`. The store is closed
/// whether or not the scenario succeeds.
pub async fn run_with_config(
    variant: ScenarioVariant,
    config: StoreConfig,
) -> StoreResult<ScenarioOutcome> {
    let store = TagStore::initialize(config).await?;

    let result = run_on(&store, variant).await;
    let closed = store.close().await;

    let outcome = result?;
    closed?;
    Ok(outcome)
}

async fn run_on(store: &TagStore, variant: ScenarioVariant) -> StoreResult<ScenarioOutcome> {
    let mut context = store.context();
    let seeded = seed_synonym_pair(&mut context).await?;
    let mut untracked_reads = Vec::new();

    if variant.interposes_untracked_read() {
        untracked_reads.push(context.all_no_tracking().await?.len());
    }

    let bar = context.single_by_name("Bar").await?;
    let bar_id = bar.id;
    match variant {
        ScenarioVariant::Direct => bar.synonym_for_id = None,
        ScenarioVariant::InterposedUntrackedRead => {
            context.entry(bar_id)?.set_synonym_for_id(None);
        }
    }

    let rows_written = context.save_changes().await?;

    context.set_state(bar_id, EntityState::Detached)?;
    let state_after_detach = context.state_of(bar_id);

    if variant.interposes_untracked_read() {
        untracked_reads.push(context.all_no_tracking().await?.len());
    }

    let requeried_synonym_for_id = context.single_by_name("Bar").await?.synonym_for_id;

    info!(
        ?variant,
        rows_written,
        cleared = requeried_synonym_for_id.is_none(),
        "Scenario finished"
    );

    Ok(ScenarioOutcome {
        variant,
        seeded,
        rows_written,
        state_after_detach,
        requeried_synonym_for_id,
        untracked_reads,
    })
}
