use tracing::info;

use crate::database::entities::tags;
use crate::errors::StoreResult;
use crate::tracking::TagContext;

/// The two rows every detach scenario starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededTags {
    pub foo: tags::Model,
    pub bar: tags::Model,
}

/// Adds `Foo` and `Bar` (a synonym for `Foo`) and saves both in one call.
pub async fn seed_synonym_pair(context: &mut TagContext) -> StoreResult<SeededTags> {
    let foo = tags::Model::new("Foo");
    let bar = tags::Model::new("Bar").synonym_of(&foo);

    context.add_range([foo.clone(), bar.clone()])?;
    let written = context.save_changes().await?;

    info!(written, foo = %foo.id, bar = %bar.id, "Seeded synonym pair");
    Ok(SeededTags { foo, bar })
}
