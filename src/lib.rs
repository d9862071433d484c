pub mod config;
pub mod diary;
pub mod github;
pub mod logger;
pub mod schedule;
pub mod typetalk;
pub mod utils;
