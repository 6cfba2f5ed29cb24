pub mod auth;
pub mod cache_stats;
pub mod config;
pub mod list_cache;
pub mod search_input;
pub mod status_lookup;
