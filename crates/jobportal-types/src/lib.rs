pub mod api;
pub mod error;
pub mod models;
pub mod status;

pub use error::CoreError;
pub use models::{EmploymentType, JobStatus, Role};
pub use status::{ApplicationStatus, StatusPolicy};
