pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod jobs;
pub mod model;
pub mod reconcile;
pub mod store;

pub use error::{Result, TrackerError};
