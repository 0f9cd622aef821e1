pub mod connection;
pub mod operations;

pub use operations::{store_recommendations, store_window_summary};
