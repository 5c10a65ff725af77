use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "film")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    /// ISO `YYYY-MM-DD`. Lexical order matches chronological order only for
    /// four-digit years, which holds for every validated release date.
    pub release_date: String,
    pub duration: i32,
    pub mpa_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mpa::Entity",
        from = "Column::MpaId",
        to = "super::mpa::Column::Id"
    )]
    Mpa,
    #[sea_orm(has_many = "super::film_genre::Entity")]
    FilmGenre,
    #[sea_orm(has_many = "super::film_director::Entity")]
    FilmDirector,
    #[sea_orm(has_many = "super::film_like::Entity")]
    FilmLike,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::mpa::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mpa.def()
    }
}

impl Related<super::film_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmGenre.def()
    }
}

impl Related<super::film_director::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmDirector.def()
    }
}

impl Related<super::film_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmLike.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
