use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::Context;
use pastexam_api::Course;

/// Read-only course catalogue kept in insertion order.
#[derive(Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// One JSON course per line; blank lines are skipped.
    pub fn load_jsonl(path: &str) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open catalog {path}"))?;
        let mut courses = Vec::new();
        for (n, line) in BufReader::new(f).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let course: Course = serde_json::from_str(&line)
                .with_context(|| format!("{path}:{}: bad course", n + 1))?;
            courses.push(course);
        }
        Ok(Self { courses })
    }

    pub fn get(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }

    /// Case-insensitive substring match over the text fields; returns the requested window
    /// and the total number of matches.
    pub fn search(
        &self,
        text: Option<&str>,
        department: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> (Vec<Course>, usize) {
        let needle = text.map(str::trim).filter(|t| !t.is_empty()).map(str::to_lowercase);
        let matched: Vec<&Course> = self
            .courses
            .iter()
            .filter(|c| department.map_or(true, |d| c.department_id == d))
            .filter(|c| needle.as_deref().map_or(true, |n| matches_text(c, n)))
            .collect();
        let total = matched.len();
        let page = matched.into_iter().skip(offset).take(limit).cloned().collect();
        (page, total)
    }

    /// Small built-in catalogue for local runs.
    pub fn demo() -> Self {
        let rows = [
            ("MATH", "101", "Calculus I", "Lee"),
            ("MATH", "102", "Calculus II", "Lee"),
            ("MATH", "201", "Advanced Calculus", "Wang"),
            ("MATH", "210", "Linear Algebra", "Chen"),
            ("PHYS", "101", "General Physics", "Lin"),
            ("PHYS", "220", "Electromagnetism", "Huang"),
            ("CSIE", "110", "Data Structures", "Wu"),
            ("CSIE", "210", "Operating Systems", "Tsai"),
            ("CSIE", "230", "Algorithms", "Wu"),
            ("ECON", "101", "Principles of Economics", "Liu"),
            ("ECON", "301", "Econometrics", "Yang"),
            ("CHEM", "101", "General Chemistry", "Kuo"),
        ];
        Self::new(
            rows.iter()
                .map(|(dept, serial, name, who)| course(dept, serial, name, who))
                .collect(),
        )
    }
}

fn matches_text(c: &Course, needle: &str) -> bool {
    [
        c.course_name.as_str(),
        c.course_note.as_str(),
        c.tags.as_str(),
        c.instructors.as_str(),
        c.course_id.as_str(),
        c.category.as_str(),
    ]
    .iter()
    .any(|f| f.to_lowercase().contains(needle))
        || c.code().to_lowercase().contains(needle)
}

/// Builds a course with the fields the picker shows; the rest stay empty.
pub fn course(department: &str, serial: &str, name: &str, instructors: &str) -> Course {
    Course {
        course_id: format!("113-1-{department}-{serial}"),
        course_name: name.to_string(),
        department_id: department.to_string(),
        semester: "113-1".into(),
        serial_number: serial.to_string(),
        attribute_code: String::new(),
        system_code: String::new(),
        for_grade: String::new(),
        for_class: String::new(),
        category: String::new(),
        course_note: String::new(),
        tags: String::new(),
        credits: "3".into(),
        instructors: instructors.to_string(),
    }
}
