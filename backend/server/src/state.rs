use std::sync::Arc;

use crate::{config::Config, database::init_mongo, store::InfluencerStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn InfluencerStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Arc<Self>> {
        let config = Config::load()?;
        let store = init_mongo(&config).await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: Config, store: Arc<dyn InfluencerStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
