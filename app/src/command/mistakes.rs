use kai_config::Config;
use kai_core::MistakeLog;

const LIMIT: u64 = 50;

#[derive(Debug, Clone)]
pub struct MistakesInput {
    pub user_id: i64,
}

/// Strategy for printing a user's mistake log from the database.
#[derive(Debug, Clone, Copy)]
pub struct MistakesStrategy;

impl super::CommandStrategy for MistakesStrategy {
    type Input = MistakesInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let storage = super::open_storage(&config).await?;

        let entries = storage.recent(input.user_id, LIMIT).await?;
        if entries.is_empty() {
            println!("No mistakes logged for user {}", input.user_id);
            return Ok(());
        }

        println!("=== Mistake log of user {} ===", input.user_id);
        for entry in entries {
            println!();
            println!(
                "{}  {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.summary
            );
            println!("  {}", entry.triggers);
            for (key, answer) in &entry.answers {
                println!("  {}: {answer}", kai_coach::mercedes::title_for(key));
            }
        }

        Ok(())
    }
}
