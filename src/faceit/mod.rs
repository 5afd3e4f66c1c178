pub mod client;
pub mod error;
pub mod models;
pub mod provider;

pub use client::FaceitClient;
pub use error::ApiError;
pub use provider::StatsProvider;
