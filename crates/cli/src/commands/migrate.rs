use hrdesk_db::migrations;

use crate::commands::{load_config, migrated_pool, runtime, CommandResult, Failure};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        pool.close().await;
        Ok::<(), Failure>(())
    });

    match result {
        Ok(()) => {
            let known = migrations::known_count();
            CommandResult::success(
                "migrate",
                format!("applied pending migrations ({known} known to this build)"),
            )
        }
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
