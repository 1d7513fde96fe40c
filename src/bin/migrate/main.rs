use env_logger::Env;
use forumactor::backfill;
use forumactor::db::{get_db_pool, init_db};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;

    match backfill::run_logged(get_db_pool()).await? {
        None => log::info!("user id columns already migrated to actor columns, nothing to do"),
        Some(summary) => log::info!(
            "done: {} distinct tuples, {} updates touched {} rows, skipped {} zero ids and {} missing users",
            summary.tuples,
            summary.updates,
            summary.rows_touched,
            summary.skipped_zero,
            summary.skipped_missing
        ),
    }
    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is fine when the variables come from the caller.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
