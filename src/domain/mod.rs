pub mod error;
pub mod habit;
pub mod history;
pub mod repository;
pub mod task;
