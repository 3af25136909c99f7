//! Course pickers: the unscoped and the department-scoped course search are the same
//! control over two configurations of [`CourseSearch`].

use anyhow::Context;
use async_trait::async_trait;
use pastexam_api::{ApiClient, Course, CourseQuery, UploadRequest};

use crate::select::{ResultItem, ResultPage, SearchSource, SelectionCommitter};

impl ResultItem for Course {
    fn identity(&self) -> &str {
        &self.course_id
    }

    fn title(&self) -> &str {
        &self.course_name
    }

    fn subtitle(&self) -> Vec<String> {
        vec![self.code(), self.instructors.clone()]
    }
}

/// What the upload/filter forms store once a course is picked. Empty == nothing selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseSelection {
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    pub instructor: String,
}

impl CourseSelection {
    pub fn is_empty(&self) -> bool {
        self.course_id.is_empty()
    }

    /// Exam upload form for the picked course. Scope and anonymity default to none/off.
    pub fn upload_request(
        &self,
        year: impl Into<String>,
        exam_type: impl Into<String>,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> anyhow::Result<UploadRequest> {
        anyhow::ensure!(!self.is_empty(), "no course selected");
        Ok(UploadRequest {
            year: year.into(),
            course_id: self.course_id.clone(),
            course_name: self.course_name.clone(),
            course_code: self.course_code.clone(),
            instructor: self.instructor.clone(),
            exam_type: exam_type.into(),
            exam_scope: None,
            anonymous: false,
            file_name: file_name.into(),
            content,
        })
    }
}

impl From<&Course> for CourseSelection {
    fn from(c: &Course) -> Self {
        Self {
            course_id: c.course_id.clone(),
            course_name: c.course_name.clone(),
            course_code: c.code(),
            instructor: c.instructors.clone(),
        }
    }
}

/// Committer producing [`CourseSelection`]s.
pub fn course_committer<C>(on_select: C) -> SelectionCommitter<Course, CourseSelection>
where
    C: FnMut(CourseSelection) + Send + 'static,
{
    SelectionCommitter::new(|c: &Course| CourseSelection::from(c), on_select)
}

/// `GET /v1/course/search`, optionally restricted to one department.
pub struct CourseSearch {
    client: ApiClient,
    department: Option<String>,
}

impl CourseSearch {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            department: None,
        }
    }

    pub fn in_department(client: ApiClient, department_id: impl Into<String>) -> Self {
        Self {
            client,
            department: Some(department_id.into()),
        }
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    fn query_for(&self, text: &str, offset: usize, limit: usize) -> CourseQuery {
        let q = CourseQuery::text(text).page(offset as u64, limit as u64);
        match &self.department {
            Some(dept) => q.in_department(dept.clone()),
            None => q,
        }
    }
}

#[async_trait]
impl SearchSource for CourseSearch {
    type Item = Course;

    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<ResultPage<Course>> {
        let page = self
            .client
            .search_courses(&self.query_for(query, offset, limit))
            .await
            .context("course search")?;
        let total = usize::try_from(page.total).context("total out of range")?;
        Ok(ResultPage::new(page.items, total, offset))
    }
}
