pub mod applications;
pub mod auth;
pub mod config;
pub mod error;
pub mod jobs;
pub mod mailer;
pub mod middleware;
pub mod password;
pub mod profile;
pub mod router;
pub mod saved;
pub mod session;
pub mod state;
pub mod storage;
pub mod token;

mod convert;

pub use error::{AppError, AppResult};
pub use router::build_router;
pub use state::{AppState, AppStateInner};
