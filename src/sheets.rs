use crate::grades::average;
use crate::model::Course;

/// A tabular export sheet: a header row plus data rows of display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn to_csv(&self) -> String {
        let mut out = self.header.join(",");
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| csv_quote(c)).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn format_average(v: f64) -> String {
    format!("{:.2}", v)
}

pub fn attendance_history_sheet(course: &Course) -> Sheet {
    let mut rows = Vec::new();
    for st in course.sorted_students() {
        for ev in &st.history {
            rows.push(vec![
                st.name.clone(),
                ev.date.to_string(),
                ev.status.as_str().to_string(),
                ev.reason.map(|r| r.as_str().to_string()).unwrap_or_default(),
            ]);
        }
    }
    Sheet {
        name: "history",
        header: vec!["student", "date", "status", "reason"],
        rows,
    }
}

pub fn summary_sheet(course: &Course) -> Sheet {
    let rows = course
        .sorted_students()
        .into_iter()
        .map(|st| {
            vec![
                st.name.clone(),
                st.stats.present.to_string(),
                st.stats.absent.to_string(),
                st.stats.percent_attendance().to_string(),
            ]
        })
        .collect();
    Sheet {
        name: "summary",
        header: vec!["student", "present", "absent", "percent"],
        rows,
    }
}

pub fn grades_sheet(course: &Course) -> Sheet {
    let mut rows = Vec::new();
    for st in course.sorted_students() {
        for g in st.grades_by_date() {
            rows.push(vec![
                st.name.clone(),
                g.date.map(|d| d.to_string()).unwrap_or_default(),
                g.label.clone(),
                g.kind.as_str().to_string(),
                g.value.display(),
            ]);
        }
    }
    Sheet {
        name: "grades",
        header: vec!["student", "date", "label", "type", "value"],
        rows,
    }
}

pub fn averages_sheet(course: &Course) -> Sheet {
    let rows = course
        .sorted_students()
        .into_iter()
        .map(|st| vec![st.name.clone(), format_average(average(&st.grades))])
        .collect();
    Sheet {
        name: "averages",
        header: vec!["student", "average"],
        rows,
    }
}

/// The four export sheets in workbook order.
pub fn course_workbook(course: &Course) -> Vec<Sheet> {
    vec![
        attendance_history_sheet(course),
        summary_sheet(course),
        grades_sheet(course),
        averages_sheet(course),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::GradeDraft;
    use crate::model::{AttendanceStatus, Condition, GradeKind, Student};
    use crate::reclassify::{reclassify, Reclassification};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).expect("date")
    }

    fn sample_course() -> Course {
        let mut c = Course::new("6D");
        let mut bruno = Student::new("Bruno, Luis", Condition::Enrolled);
        bruno.record(day(1), AttendanceStatus::Present);
        let abs = bruno.record(day(2), AttendanceStatus::Absent);
        reclassify(&mut bruno, &abs, Reclassification::Justified);
        bruno.add_grade(GradeDraft {
            label: "TP \"final\"".into(),
            kind: GradeKind::Practical,
            date: day(3),
            value: 9.0,
        });
        let mut ana = Student::new("Ana", Condition::Repeating);
        ana.record(day(1), AttendanceStatus::Later);
        c.students.insert(bruno.id.clone(), bruno);
        c.students.insert(ana.id.clone(), ana);
        c
    }

    #[test]
    fn history_sheet_lists_every_event_in_display_order() {
        let sheet = attendance_history_sheet(&sample_course());
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0], vec!["Ana", "2024-10-01", "later", ""]);
        assert_eq!(sheet.rows[2][2], "absent");
        assert_eq!(sheet.rows[2][3], "justified");
    }

    #[test]
    fn summary_reflects_projection() {
        let sheet = summary_sheet(&sample_course());
        assert_eq!(sheet.rows[0], vec!["Ana", "0", "0", "0"]);
        assert_eq!(sheet.rows[1], vec!["Bruno, Luis", "1", "1", "50"]);
    }

    #[test]
    fn csv_quotes_commas_and_quotes() {
        let c = sample_course();
        let csv = grades_sheet(&c).to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("student,date,label,type,value"));
        assert_eq!(
            lines.next(),
            Some("\"Bruno, Luis\",2024-10-03,\"TP \"\"final\"\"\",practical,9")
        );
        let avgs = averages_sheet(&c);
        assert_eq!(avgs.rows[0], vec!["Ana", "0.00"]);
        assert_eq!(avgs.rows[1], vec!["Bruno, Luis", "9.00"]);
    }
}
