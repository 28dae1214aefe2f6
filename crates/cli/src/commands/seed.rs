use crate::commands::{block_on_pool, CommandResult};
use roster_db::{migrations, SeedDataset};

pub fn run() -> CommandResult {
    let result = block_on_pool("seed", |pool, _config| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if verification.all_present {
            Ok(seed_result)
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            let message = if failed_checks.is_empty() {
                "some seed data failed to load".to_string()
            } else {
                format!("seed verification failed for checks: {}", failed_checks.join(", "))
            };
            Err(("seed_verification", message, 6u8))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "seed dataset loaded: {} influencers across {} tiers and {} genres",
                seeded.influencers_seeded, seeded.tiers_seeded, seeded.genres_seeded
            ),
        ),
        Err(failure) => failure,
    }
}
