//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Characters kept by [`Model::short_text`].
pub const SHORT_TEXT_LEN: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    /// Group the post is filed under; cleared when the group goes away
    #[sea_orm(nullable, indexed)]
    pub group_id: Option<String>,

    /// Storage key of the attached image
    #[sea_orm(nullable)]
    pub image: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// The first characters of the text, for labels and titles.
    #[must_use]
    pub fn short_text(&self) -> String {
        self.text.chars().take(SHORT_TEXT_LEN).collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
