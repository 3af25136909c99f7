pub mod config;
pub mod course;
pub mod select;

pub use config::SelectorConfig;
pub use course::{course_committer, CourseSearch, CourseSelection};
