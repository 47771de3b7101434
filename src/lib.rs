pub mod api;
pub mod assembly;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod suggest;
