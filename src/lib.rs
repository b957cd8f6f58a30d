pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod streak;
