use serde::{Deserialize, Serialize};

/// Курс в том виде, в каком его отдаёт `/v1/course/*`. Имена полей как на проводе.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "departmentId")]
    pub department_id: String,
    pub semester: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "attributeCode", default)]
    pub attribute_code: String,
    #[serde(rename = "systemCode", default)]
    pub system_code: String,
    #[serde(rename = "forGrade", default)]
    pub for_grade: String,
    #[serde(rename = "forClass", default)]
    pub for_class: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "courseNote", default)]
    pub course_note: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub credits: String,
    #[serde(default)]
    pub instructors: String,
}

impl Course {
    /// `"{departmentId}-{serialNumber}"`, the code users recognise.
    pub fn code(&self) -> String {
        format!("{}-{}", self.department_id, self.serial_number)
    }
}

/// Query string of `GET /v1/course/search`. Only set filters are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(rename = "departmentId", skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructors: Option<String>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    10
}

impl CourseQuery {
    pub fn text(search_text: impl Into<String>) -> Self {
        Self {
            search_text: Some(search_text.into()),
            limit: default_limit(),
            ..Self::default()
        }
    }

    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}
