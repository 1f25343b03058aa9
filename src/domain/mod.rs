pub mod equipment;
pub mod error;
pub mod history;
