pub mod aggregate;
pub mod categorizer;
pub mod constants;
pub mod error;
pub mod fetch_guard;
pub mod format;
pub mod spectrum;
pub mod summary;
pub mod table;
