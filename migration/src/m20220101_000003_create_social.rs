use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email))
                    .col(string(Users::Login))
                    .col(string(Users::Name))
                    .col(string(Users::Birthday))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(pk_auto(Review::Id))
                    .col(string(Review::Content))
                    .col(boolean(Review::IsPositive))
                    .col(integer(Review::UserId))
                    .col(integer(Review::FilmId))
                    .col(integer(Review::Useful).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-review-user_id")
                            .from(Review::Table, Review::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-review-film_id")
                            .from(Review::Table, Review::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-review-film_id")
                    .table(Review::Table)
                    .col(Review::FilmId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReviewReaction::Table)
                    .if_not_exists()
                    .col(integer(ReviewReaction::ReviewId))
                    .col(integer(ReviewReaction::UserId))
                    .col(boolean(ReviewReaction::IsUseful))
                    .primary_key(
                        Index::create()
                            .name("pk-review_reaction")
                            .col(ReviewReaction::ReviewId)
                            .col(ReviewReaction::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-review_reaction-review_id")
                            .from(ReviewReaction::Table, ReviewReaction::ReviewId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-review_reaction-user_id")
                            .from(ReviewReaction::Table, ReviewReaction::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FeedEvent::Table)
                    .if_not_exists()
                    .col(pk_auto(FeedEvent::Id))
                    .col(big_integer(FeedEvent::Timestamp))
                    .col(integer(FeedEvent::UserId))
                    .col(integer(FeedEvent::EventType))
                    .col(integer(FeedEvent::Operation))
                    .col(integer(FeedEvent::EntityId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-feed_event-user_id")
                    .table(FeedEvent::Table)
                    .col(FeedEvent::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FeedEvent::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ReviewReaction::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Login,
    Name,
    Birthday,
}

#[derive(DeriveIden)]
enum Review {
    Table,
    Id,
    Content,
    IsPositive,
    UserId,
    FilmId,
    Useful,
}

#[derive(DeriveIden)]
enum ReviewReaction {
    Table,
    ReviewId,
    UserId,
    IsUseful,
}

#[derive(DeriveIden)]
enum FeedEvent {
    Table,
    Id,
    Timestamp,
    UserId,
    EventType,
    Operation,
    EntityId,
}

#[derive(DeriveIden)]
enum Film {
    Table,
    Id,
}
