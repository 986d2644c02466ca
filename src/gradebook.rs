use crate::error::CommandError;
use crate::model::{new_id, today, Condition, Course, Student};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The whole persisted document: every course plus UI selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradebook {
    #[serde(default)]
    pub courses: BTreeMap<String, Course>,
    #[serde(default)]
    pub selected_course_id: Option<String>,
    #[serde(default = "today", deserialize_with = "lenient_session_date")]
    pub selected_date: NaiveDate,
}

/// The stored session date is never trusted, so a null or malformed value
/// must not sink the whole document.
fn lenient_session_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(today))
}

impl Default for Gradebook {
    fn default() -> Self {
        Self {
            courses: BTreeMap::new(),
            selected_course_id: None,
            selected_date: today(),
        }
    }
}

/// Edit applied by `students.update`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StudentEdit {
    Rename { name: String },
    RenameAndCondition { name: String, condition: Condition },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub ids_assigned: usize,
    pub projections_repaired: Vec<String>,
}

fn required_name(raw: &str, what: &str) -> Result<String, CommandError> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(CommandError::invalid(format!("{} must not be empty", what)));
    }
    Ok(t.to_string())
}

impl Gradebook {
    /// Parses a serialized document and prepares it for use. The session
    /// date is always today, whatever the document says.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let mut book: Gradebook = serde_json::from_str(text)?;
        book.selected_date = today();
        if let Some(sel) = &book.selected_course_id {
            if !book.courses.contains_key(sel) {
                book.selected_course_id = None;
            }
        }
        let report = book.normalize();
        if report.ids_assigned > 0 || !report.projections_repaired.is_empty() {
            tracing::info!(
                ids_assigned = report.ids_assigned,
                projections_repaired = report.projections_repaired.len(),
                "normalized gradebook document"
            );
        }
        Ok(book)
    }

    /// Fills in ids missing from older documents and recomputes any
    /// projection that disagrees with its ledger.
    pub fn normalize(&mut self) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        for course in self.courses.values_mut() {
            for student in course.students.values_mut() {
                for ev in student.history.iter_mut().filter(|ev| ev.id.is_empty()) {
                    ev.id = new_id();
                    report.ids_assigned += 1;
                }
                for g in student.grades.iter_mut().filter(|g| g.id.is_empty()) {
                    g.id = new_id();
                    report.ids_assigned += 1;
                }
                if let Some(expected) = student.drift() {
                    tracing::warn!(
                        student_id = %student.id,
                        stored = ?student.stats,
                        expected = ?expected,
                        "attendance counters disagree with history; recounting"
                    );
                    student.stats = expected;
                    report.projections_repaired.push(student.id.clone());
                }
            }
        }
        report
    }

    pub fn course(&self, course_id: &str) -> Result<&Course, CommandError> {
        self.courses
            .get(course_id)
            .ok_or_else(|| CommandError::CourseNotFound(course_id.to_string()))
    }

    pub fn course_mut(&mut self, course_id: &str) -> Result<&mut Course, CommandError> {
        self.courses
            .get_mut(course_id)
            .ok_or_else(|| CommandError::CourseNotFound(course_id.to_string()))
    }

    pub fn student_mut(
        &mut self,
        course_id: &str,
        student_id: &str,
    ) -> Result<&mut Student, CommandError> {
        self.course_mut(course_id)?
            .students
            .get_mut(student_id)
            .ok_or_else(|| CommandError::StudentNotFound(student_id.to_string()))
    }

    /// Creates a course and selects it.
    pub fn create_course(&mut self, name: &str) -> Result<String, CommandError> {
        let course = Course::new(required_name(name, "course name")?);
        let id = course.id.clone();
        self.courses.insert(id.clone(), course);
        self.selected_course_id = Some(id.clone());
        Ok(id)
    }

    pub fn rename_course(&mut self, course_id: &str, name: &str) -> Result<(), CommandError> {
        let name = required_name(name, "course name")?;
        self.course_mut(course_id)?.name = name;
        Ok(())
    }

    /// Drops the course with all its students.
    pub fn delete_course(&mut self, course_id: &str) -> Result<Course, CommandError> {
        let removed = self
            .courses
            .remove(course_id)
            .ok_or_else(|| CommandError::CourseNotFound(course_id.to_string()))?;
        if self.selected_course_id.as_deref() == Some(course_id) {
            self.selected_course_id = None;
        }
        Ok(removed)
    }

    pub fn select_course(&mut self, course_id: Option<&str>) -> Result<(), CommandError> {
        if let Some(id) = course_id {
            self.course(id)?;
        }
        self.selected_course_id = course_id.map(str::to_string);
        Ok(())
    }

    pub fn set_selected_date(&mut self, date: Option<NaiveDate>) {
        self.selected_date = date.unwrap_or_else(today);
    }

    pub fn add_student(
        &mut self,
        course_id: &str,
        name: &str,
        condition: Condition,
    ) -> Result<String, CommandError> {
        let student = Student::new(required_name(name, "student name")?, condition);
        let id = student.id.clone();
        self.course_mut(course_id)?
            .students
            .insert(id.clone(), student);
        Ok(id)
    }

    pub fn edit_student(
        &mut self,
        course_id: &str,
        student_id: &str,
        edit: StudentEdit,
    ) -> Result<(), CommandError> {
        let (name, condition) = match edit {
            StudentEdit::Rename { name } => (name, None),
            StudentEdit::RenameAndCondition { name, condition } => (name, Some(condition)),
        };
        let name = required_name(&name, "student name")?;
        let student = self.student_mut(course_id, student_id)?;
        student.name = name;
        if let Some(c) = condition {
            student.condition = c;
        }
        Ok(())
    }

    pub fn delete_student(
        &mut self,
        course_id: &str,
        student_id: &str,
    ) -> Result<Student, CommandError> {
        self.course_mut(course_id)?
            .students
            .remove(student_id)
            .ok_or_else(|| CommandError::StudentNotFound(student_id.to_string()))
    }
}
