pub mod client;
pub mod comment;
pub mod config;
pub mod course;
pub mod envelope;
pub mod error;
pub mod file;
pub mod session;
pub mod upload;
pub mod user;

pub use client::{ApiClient, ServiceInfo};
pub use comment::{Comment, NewComment};
pub use config::ApiConfig;
pub use course::{Course, CourseQuery};
pub use envelope::{Envelope, Paged, Status};
pub use error::ApiError;
pub use file::FileEntry;
pub use session::{LoadOutcome, ProfileApi, Session};
pub use upload::UploadRequest;
pub use user::{ProfileUpdate, User};
