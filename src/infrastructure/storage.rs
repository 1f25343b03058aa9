use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn ensure_data_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(data_dir)?;
    Ok(data_dir.to_path_buf())
}

pub fn ensure_reports_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    let reports_dir = data_dir.join("reports");
    ensure_dir(&reports_dir)?;
    Ok(reports_dir)
}

/// Timestamped report filename with a short random suffix so two uploads in
/// the same second still get distinct artifacts.
pub fn report_filename(now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("Equipment_Summary_Report_{}_{}.pdf", stamp, &suffix[..8])
}

/// Reject anything that could escape the report directory when a filename
/// comes back in over the API.
pub fn is_safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.ends_with(".pdf")
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_filenames_are_unique() {
        let now = Utc::now();
        assert_ne!(report_filename(now), report_filename(now));
    }

    #[test]
    fn test_report_filename_shape() {
        let name = report_filename(Utc::now());
        assert!(name.starts_with("Equipment_Summary_Report_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_safe_artifact_names() {
        assert!(is_safe_artifact_name("Equipment_Summary_Report_x.pdf"));
        assert!(!is_safe_artifact_name("../secrets.pdf"));
        assert!(!is_safe_artifact_name("reports/nested.pdf"));
        assert!(!is_safe_artifact_name("windows\\style.pdf"));
        assert!(!is_safe_artifact_name("not_a_pdf.txt"));
        assert!(!is_safe_artifact_name(""));
    }
}
