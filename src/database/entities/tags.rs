use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub synonym_for_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::SynonymForId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    SynonymFor,
}

/// Follows `synonym_for_id` from a synonym to the tag it stands in for.
pub struct SynonymForLink;

impl Linked for SynonymForLink {
    type FromEntity = Entity;
    type ToEntity = Entity;

    fn link(&self) -> Vec<RelationDef> {
        vec![Relation::SynonymFor.def()]
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A new tag with a fresh v4 identifier and no synonym link.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            synonym_for_id: None,
        }
    }

    /// Marks this tag as a synonym for `principal`.
    pub fn synonym_of(mut self, principal: &Model) -> Self {
        self.synonym_for_id = Some(principal.id);
        self
    }

    pub fn is_synonym(&self) -> bool {
        self.synonym_for_id.is_some()
    }
}
