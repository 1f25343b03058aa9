pub mod history;
pub mod upload;
