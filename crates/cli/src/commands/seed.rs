use chrono::Utc;
use serde_json::json;

use hrdesk_db::repositories::SqlHolidayRepository;
use hrdesk_db::{NationalHolidaySeed, SeedResult};

use crate::commands::{load_config, migrated_pool, runtime, CommandResult, Failure};

/// Seeds the requested years, or every year of the built-in table when none are given.
pub fn run(years: &[i32]) -> CommandResult {
    let known = NationalHolidaySeed::years();
    let years = if years.is_empty() { known.clone() } else { years.to_vec() };
    if let Some(unknown) = years.iter().find(|year| !known.contains(year)) {
        return CommandResult::failure(
            "seed",
            "unsupported_year",
            format!("no built-in holidays for {unknown}; available years: {}", join_years(&known)),
            2,
        );
    }

    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let repository = SqlHolidayRepository::new(pool.clone());

        let outcome = async {
            let seeded = NationalHolidaySeed::load(&repository, &years, Utc::now())
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
            let verification = NationalHolidaySeed::verify(&repository, &years)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
            if !verification.all_present {
                return Err(("seed_verification", missing_message(&verification.checks), 6u8));
            }
            Ok::<SeedResult, Failure>(seeded)
        }
        .await;

        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => {
            let details = seeded
                .years_seeded
                .iter()
                .map(|info| {
                    json!({"year": info.year, "inserted": info.inserted, "skipped": info.skipped})
                })
                .collect::<Vec<_>>();
            CommandResult::success_with_details(
                "seed",
                format!(
                    "national holidays seeded for {}: {} inserted, {} already present",
                    join_years(&years),
                    seeded.inserted(),
                    seeded.skipped()
                ),
                Some(json!({"years": details})),
            )
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn join_years(years: &[i32]) -> String {
    years.iter().map(i32::to_string).collect::<Vec<_>>().join(", ")
}

fn missing_message(checks: &[(String, bool)]) -> String {
    let missing = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        "some holidays failed to load".to_string()
    } else {
        format!("holiday verification failed for: {}", missing.join(", "))
    }
}
