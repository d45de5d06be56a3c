//! Utility functions and types for the client.

pub mod error;
pub mod fs;
mod logging;

pub use error::Error;
pub use fs::{load_upload, UploadFile};
pub use logging::{default_filter, init_from_config, init_logging, init_test_logging};
