//! Multipart bodies for `POST /v1/file` and `POST /v1/user/avatar`.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// One exam file plus the course it belongs to. Form field names are the backend's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub year: String,
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    pub instructor: String,
    /// midterm / final / quiz / other
    pub exam_type: String,
    pub exam_scope: Option<String>,
    pub anonymous: bool,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl UploadRequest {
    pub fn form(&self) -> Form {
        let mut form = Form::new()
            .text("year", self.year.clone())
            .text("course_id", self.course_id.clone())
            .text("course_name", self.course_name.clone())
            .text("course_code", self.course_code.clone())
            .text("instructor", self.instructor.clone())
            .text("exam_type", self.exam_type.clone());
        if let Some(scope) = self.exam_scope.as_ref().filter(|s| !s.is_empty()) {
            form = form.text("exam_scope", scope.clone());
        }
        form.text("anonymous", self.anonymous.to_string())
            .part("upload_file", file_part(&self.file_name, self.content.clone()))
            .text("file_name", self.file_name.clone())
    }
}

pub(crate) fn avatar_form(file_name: &str, content: Vec<u8>) -> Form {
    Form::new()
        .part("upload_file", file_part(file_name, content))
        .text("file_name", file_name.to_string())
}

fn file_part(file_name: &str, content: Vec<u8>) -> Part {
    Part::bytes(content).file_name(file_name.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AvatarUploaded {
    pub avatar_url: String,
}
