pub mod history;

pub use history::HistoryRepository;
