use std::sync::Arc;

use crate::commands::{block_on_pool, CommandResult};
use roster_agent::{GeminiClient, Orchestrator, SerpApiClient};
use roster_db::repositories::{SqlInfluencerRepository, SqlPendingActionRepository};

pub fn run(text: &str, json_output: bool) -> CommandResult {
    let result = block_on_pool("query", |pool, config| async move {
        let llm = GeminiClient::from_config(&config.llm)
            .map_err(|error| ("llm_client", error.to_string(), 2u8))?;
        let search = SerpApiClient::from_config(&config.search)
            .map_err(|error| ("search_client", error.to_string(), 2u8))?;

        let influencers = Arc::new(SqlInfluencerRepository::new(pool.clone()));
        let actions = Arc::new(SqlPendingActionRepository::new(pool));
        let orchestrator = Orchestrator::new(Arc::new(llm), Arc::new(search), influencers, actions);

        Ok(orchestrator.handle(text).await)
    });

    match result {
        Ok(response) => {
            if json_output {
                match serde_json::to_string_pretty(&response) {
                    Ok(rendered) => CommandResult { exit_code: 0, output: rendered },
                    Err(error) => {
                        CommandResult::failure("query", "serialization", error.to_string(), 1)
                    }
                }
            } else {
                CommandResult { exit_code: 0, output: response.message }
            }
        }
        Err(failure) => failure,
    }
}
