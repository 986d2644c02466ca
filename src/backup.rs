use crate::gradebook::Gradebook;
use crate::model::Course;
use crate::sheets;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const WORKBOOK_FORMAT_V1: &str = "rollbook-workbook-v1";

#[derive(Debug, Clone)]
pub struct WorkbookSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub rows_by_sheet: Vec<(String, usize)>,
}

pub fn sheet_entry_name(sheet_name: &str) -> String {
    format!("sheets/{}.csv", sheet_name)
}

fn create_parent_dir(out_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    Ok(())
}

/// Writes the course's four sheets as CSV entries in a zip bundle, with a
/// manifest that records a SHA-256 per sheet.
pub fn export_course_workbook(course: &Course, out_path: &Path) -> anyhow::Result<WorkbookSummary> {
    create_parent_dir(out_path)?;
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let workbook = sheets::course_workbook(course);
    let mut checksums = serde_json::Map::new();
    let mut rows_by_sheet = Vec::new();
    for sheet in &workbook {
        let entry = sheet_entry_name(sheet.name);
        let csv = sheet.to_csv();
        checksums.insert(entry.clone(), json!(hex_sha256(csv.as_bytes())));
        rows_by_sheet.push((sheet.name.to_string(), sheet.rows.len()));

        zip.start_file(entry.as_str(), opts)
            .with_context(|| format!("failed to start {} entry", entry))?;
        zip.write_all(csv.as_bytes())
            .with_context(|| format!("failed to write {} entry", entry))?;
    }

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": WORKBOOK_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "courseId": course.id,
        "courseName": course.name,
        "sheets": workbook.iter().map(|s| sheet_entry_name(s.name)).collect::<Vec<_>>(),
        "sha256": checksums,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    tracing::info!(
        course_id = %course.id,
        path = %out_path.to_string_lossy(),
        "exported course workbook"
    );
    Ok(WorkbookSummary {
        bundle_format: WORKBOOK_FORMAT_V1.to_string(),
        entry_count: workbook.len() + 1,
        rows_by_sheet,
    })
}

/// Pretty-printed JSON backup of the whole gradebook.
pub fn export_gradebook_json(book: &Gradebook, out_path: &Path) -> anyhow::Result<usize> {
    create_parent_dir(out_path)?;
    let text = serde_json::to_string_pretty(book).context("failed to serialize gradebook")?;
    std::fs::write(out_path, &text)
        .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
    Ok(text.len())
}

/// Reads and validates a JSON backup. Nothing is applied here; the caller
/// swaps the result in only on success.
pub fn read_gradebook_json(in_path: &Path) -> anyhow::Result<Gradebook> {
    let text = std::fs::read_to_string(in_path)
        .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
    if text.trim().is_empty() {
        return Err(anyhow!("backup file is empty"));
    }
    Gradebook::from_json(&text).context("backup is not a valid gradebook document")
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
