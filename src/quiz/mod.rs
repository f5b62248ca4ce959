// src/quiz/mod.rs

pub mod bank;
pub mod catalog;
pub mod engine;
pub mod stats;

pub use bank::QuestionBank;
pub use catalog::CatalogCurator;
pub use engine::AttemptEngine;
pub use stats::StatsAggregator;
