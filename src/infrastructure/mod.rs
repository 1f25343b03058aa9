#[path = "config/mod.rs"]
pub mod config_mod;
pub use config_mod as config;
pub mod csv;
pub mod db;
pub mod report;
pub mod stats;
pub mod storage;
