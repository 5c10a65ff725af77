use sea_orm_migration::prelude::*;

use crate::m20220101_000001_create_table::{Genre, Mpa};

/// Genre reference rows, seeded once and never mutated.
pub const GENRES: &[(i32, &str)] = &[
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Cartoon"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

/// MPA rating reference rows.
pub const MPA_RATINGS: &[(i32, &str)] =
    &[(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut genres = Query::insert();
        genres.into_table(Genre::Table).columns([Genre::Id, Genre::Name]);
        for &(id, name) in GENRES {
            genres.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(genres.to_owned()).await?;

        let mut ratings = Query::insert();
        ratings.into_table(Mpa::Table).columns([Mpa::Id, Mpa::Name]);
        for &(id, name) in MPA_RATINGS {
            ratings.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(ratings.to_owned()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.exec_stmt(Query::delete().from_table(Genre::Table).to_owned()).await?;
        manager.exec_stmt(Query::delete().from_table(Mpa::Table).to_owned()).await?;
        Ok(())
    }
}
