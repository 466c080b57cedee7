pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20251020_000001_accounts;
mod m20251020_000002_short_links;
mod m20251020_000003_access_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_accounts::Migration),
            Box::new(m20251020_000002_short_links::Migration),
            Box::new(m20251020_000003_access_records::Migration),
        ]
    }
}
