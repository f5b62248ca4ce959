use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::quiz::{AttemptEngine, CatalogCurator, QuestionBank, StatsAggregator};
use crate::store::QuizStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub bank: QuestionBank,
    pub engine: AttemptEngine,
    pub curator: CatalogCurator,
    pub stats: StatsAggregator,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn QuizStore>, config: Config) -> Self {
        Self {
            bank: QuestionBank::new(store.clone()),
            engine: AttemptEngine::new(store.clone()),
            curator: CatalogCurator::new(store.clone()),
            stats: StatsAggregator::new(store.clone()),
            store,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
