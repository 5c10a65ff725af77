pub use sea_orm_migration::prelude::*;

mod m20220101_000001_create_table;
mod m20220101_000002_seed_reference;
mod m20220101_000003_create_social;

pub use m20220101_000002_seed_reference::{GENRES, MPA_RATINGS};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000001_create_table::Migration),
            Box::new(m20220101_000002_seed_reference::Migration),
            Box::new(m20220101_000003_create_social::Migration),
        ]
    }
}
