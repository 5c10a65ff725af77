use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mpa::Table)
                    .if_not_exists()
                    .col(pk_auto(Mpa::Id))
                    .col(string(Mpa::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::Id))
                    .col(string(Genre::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Director::Table)
                    .if_not_exists()
                    .col(pk_auto(Director::Id))
                    .col(string(Director::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Film::Table)
                    .if_not_exists()
                    .col(pk_auto(Film::Id))
                    .col(string(Film::Name))
                    .col(string_len(Film::Description, 200))
                    .col(string(Film::ReleaseDate))
                    .col(integer(Film::Duration))
                    .col(integer(Film::MpaId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film-mpa_id")
                            .from(Film::Table, Film::MpaId)
                            .to(Mpa::Table, Mpa::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_release_date")
                    .table(Film::Table)
                    .col(Film::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmGenre::Table)
                    .if_not_exists()
                    .col(integer(FilmGenre::FilmId))
                    .col(integer(FilmGenre::GenreId))
                    .primary_key(
                        Index::create()
                            .name("pk-film_genre")
                            .col(FilmGenre::FilmId)
                            .col(FilmGenre::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film_genre-film_id")
                            .from(FilmGenre::Table, FilmGenre::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film_genre-genre_id")
                            .from(FilmGenre::Table, FilmGenre::GenreId)
                            .to(Genre::Table, Genre::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmDirector::Table)
                    .if_not_exists()
                    .col(integer(FilmDirector::FilmId))
                    .col(integer(FilmDirector::DirectorId))
                    .primary_key(
                        Index::create()
                            .name("pk-film_director")
                            .col(FilmDirector::FilmId)
                            .col(FilmDirector::DirectorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film_director-film_id")
                            .from(FilmDirector::Table, FilmDirector::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film_director-director_id")
                            .from(FilmDirector::Table, FilmDirector::DirectorId)
                            .to(Director::Table, Director::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_director_director_id")
                    .table(FilmDirector::Table)
                    .col(FilmDirector::DirectorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmLike::Table)
                    .if_not_exists()
                    .col(integer(FilmLike::FilmId))
                    .col(integer(FilmLike::UserId))
                    .primary_key(
                        Index::create()
                            .name("pk-film_like")
                            .col(FilmLike::FilmId)
                            .col(FilmLike::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-film_like-film_id")
                            .from(FilmLike::Table, FilmLike::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FilmLike::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmDirector::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Film::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Director::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Mpa::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Mpa {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Genre {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Director {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Film {
    Table,
    Id,
    Name,
    Description,
    ReleaseDate,
    Duration,
    MpaId,
}

#[derive(DeriveIden)]
enum FilmGenre {
    Table,
    FilmId,
    GenreId,
}

#[derive(DeriveIden)]
enum FilmDirector {
    Table,
    FilmId,
    DirectorId,
}

#[derive(DeriveIden)]
enum FilmLike {
    Table,
    FilmId,
    UserId,
}
