use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(passage_account_migration::Migrator).await;
}
