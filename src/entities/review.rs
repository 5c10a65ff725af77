use sea_orm::entity::prelude::*;

/// `useful` is a cached sum over `review_reaction`, rewritten on every vote.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub content: String,
    pub is_positive: bool,
    pub user_id: i32,
    pub film_id: i32,
    pub useful: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::film::Entity",
        from = "Column::FilmId",
        to = "super::film::Column::Id"
    )]
    Film,
    #[sea_orm(has_many = "super::review_reaction::Entity")]
    ReviewReaction,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::film::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Film.def()
    }
}

impl Related<super::review_reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewReaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
