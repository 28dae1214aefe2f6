use crate::commands::{block_on_pool, CommandResult};
use roster_db::migrations;

pub fn run() -> CommandResult {
    let result = block_on_pool("migrate", |pool, _config| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
