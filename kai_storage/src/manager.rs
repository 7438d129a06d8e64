use async_trait::async_trait;
use kai_core::{MistakeEntry, MistakeLog, StateStore, UserState};
use kai_entities::{mistakes, user_states};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema,
};
use tracing::{debug, info};

use crate::convert;

/// Database-backed dialogue state and mistake log.
pub struct StateManager {
    db: DatabaseConnection,
}

impl StateManager {
    /// Connect to `database_url` and create missing tables.
    ///
    /// # Arguments
    /// * `database_url` - Any sea-orm connection string (`sqlite://...`, `postgres://...`)
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database for StateManager");
        let db = Database::connect(database_url).await?;

        Self::create_tables(&db).await?;

        info!("StateManager initialized");
        Ok(Self { db })
    }

    async fn create_tables(db: &DatabaseConnection) -> anyhow::Result<()> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        let mut states = schema.create_table_from_entity(user_states::Entity);
        states.if_not_exists();
        db.execute_unprepared(&backend.build(&states).to_string())
            .await?;

        let mut log = schema.create_table_from_entity(mistakes::Entity);
        log.if_not_exists();
        db.execute_unprepared(&backend.build(&log).to_string())
            .await?;

        debug!("Tables user_states and mistakes are present");
        Ok(())
    }

    /// List ids of all users with stored state.
    pub async fn list_users(&self) -> anyhow::Result<Vec<i64>> {
        let models = user_states::Entity::find().all(&self.db).await?;
        Ok(models.into_iter().map(|m| m.user_id).collect())
    }
}

#[async_trait]
impl StateStore for StateManager {
    async fn load(&self, user_id: i64) -> anyhow::Result<UserState> {
        match user_states::Entity::find_by_id(user_id).one(&self.db).await? {
            Some(model) => convert::state_from_model(model),
            None => Ok(UserState::idle(user_id)),
        }
    }

    async fn save(&self, state: &UserState) -> anyhow::Result<()> {
        let active = convert::state_to_active(state)?;

        let exists = user_states::Entity::find_by_id(state.user_id)
            .one(&self.db)
            .await?
            .is_some();

        if exists {
            user_states::Entity::update(active).exec(&self.db).await?;
        } else {
            active.insert(&self.db).await?;
        }

        debug!("Saved state for user {}: intent={}", state.user_id, state.intent);
        Ok(())
    }

    async fn reset(&self, user_id: i64) -> anyhow::Result<()> {
        user_states::Entity::delete_by_id(user_id)
            .exec(&self.db)
            .await?;

        info!("Cleared state for user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl MistakeLog for StateManager {
    async fn record(&self, entry: &MistakeEntry) -> anyhow::Result<()> {
        convert::mistake_to_active(entry)?.insert(&self.db).await?;

        info!("Recorded mistake {} for user {}", entry.id, entry.user_id);
        Ok(())
    }

    async fn recent(&self, user_id: i64, limit: u64) -> anyhow::Result<Vec<MistakeEntry>> {
        mistakes::Entity::find()
            .filter(mistakes::Column::UserId.eq(user_id))
            .order_by_desc(mistakes::Column::CreatedAt)
            .order_by_desc(mistakes::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(convert::mistake_from_model)
            .collect()
    }
}
