use crate::error::CommandError;
use crate::model::{new_id, GradeEntry, GradeKind, GradeValue, Student};
use chrono::NaiveDate;

/// Validated input for adding or editing a grade.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeDraft {
    pub label: String,
    pub kind: GradeKind,
    pub date: NaiveDate,
    pub value: f64,
}

impl GradeDraft {
    /// Rejects values that are not finite numbers. Strings are accepted when
    /// they parse as one, matching what a form field submits.
    pub fn parse_value(raw: &serde_json::Value) -> Result<f64, CommandError> {
        let parsed = match raw {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandError::invalid("grade value must be a number"))
    }
}

impl Student {
    pub fn add_grade(&mut self, draft: GradeDraft) -> String {
        let id = new_id();
        self.grades.push(GradeEntry {
            id: id.clone(),
            label: draft.label,
            kind: draft.kind,
            date: Some(draft.date),
            value: GradeValue::Number(draft.value),
        });
        id
    }

    pub fn edit_grade(&mut self, grade_id: &str, draft: GradeDraft) -> Result<(), CommandError> {
        let g = self
            .grades
            .iter_mut()
            .find(|g| g.id == grade_id)
            .ok_or_else(|| CommandError::GradeNotFound(grade_id.to_string()))?;
        g.label = draft.label;
        g.kind = draft.kind;
        g.date = Some(draft.date);
        g.value = GradeValue::Number(draft.value);
        Ok(())
    }

    /// Deleting an unknown id is a no-op; returns whether a grade was removed.
    pub fn delete_grade(&mut self, grade_id: &str) -> bool {
        let before = self.grades.len();
        self.grades.retain(|g| g.id != grade_id);
        self.grades.len() != before
    }

    /// Grades ordered by date, undated last.
    pub fn grades_by_date(&self) -> Vec<&GradeEntry> {
        let mut out: Vec<&GradeEntry> = self.grades.iter().collect();
        out.sort_by_key(|g| (g.date.is_none(), g.date));
        out
    }
}

/// Mean of the numeric grades rounded to two decimals; 0 when none are
/// numeric. Halves round up, toward positive infinity, also for negative
/// means.
pub fn average(grades: &[GradeEntry]) -> f64 {
    let nums: Vec<f64> = grades.iter().filter_map(|g| g.value.as_number()).collect();
    if nums.is_empty() {
        return 0.0;
    }
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    (mean * 100.0 + 0.5).floor() / 100.0
}
