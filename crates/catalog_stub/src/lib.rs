//! In-memory server for the past exams REST contract: course search with offset/limit
//! paging, a session profile, bookmarks and file listings. Used by the integration tests
//! and for running the picker without the real backend.

pub mod catalog;
pub mod config;
pub mod http_api;
