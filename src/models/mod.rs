// src/models/mod.rs

pub mod attempt;
pub mod catalog;
pub mod stats;
pub mod user;
