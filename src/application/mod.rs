pub mod use_cases;

pub use use_cases::history::HistoryUseCase;
pub use use_cases::upload::{UploadOutcome, UploadUseCase};
