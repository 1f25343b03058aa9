// ============================================================
// PDF REPORT RENDERER
// ============================================================
// Fixed-layout, text-only summary page written once per upload

use crate::domain::equipment::SummaryStats;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::storage::{ensure_reports_dir, report_filename};
use chrono::{Local, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT_MARGIN: i64 = 40;
const INDENT: i64 = 60;
const TOP_OFFSET: i64 = 50;
const BOTTOM_MARGIN: i64 = 60;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

pub struct PdfReportRenderer {
    reports_dir: PathBuf,
}

impl PdfReportRenderer {
    /// Create a renderer writing into `<data_dir>/reports`, creating the
    /// directory if needed.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let reports_dir = ensure_reports_dir(data_dir)
            .map_err(|e| AppError::IoError(format!("Failed to create reports dir: {}", e)))?;
        Ok(Self { reports_dir })
    }

    /// Render the stats to a new PDF file and return its path relative to
    /// the data directory, with forward slashes so it works in URLs.
    pub fn render(&self, stats: &SummaryStats, original_filename: &str) -> Result<String> {
        let filename = report_filename(Utc::now());
        let full_path = self.reports_dir.join(&filename);

        let doc = build_document(stats, original_filename)?;
        save_document(doc, &full_path)?;

        Ok(format!("reports/{}", filename))
    }
}

fn save_document(mut doc: Document, path: &Path) -> Result<()> {
    doc.compress();
    doc.save(path)
        .map_err(|e| AppError::IoError(format!("Failed to write PDF report: {}", e)))?;
    Ok(())
}

fn build_document(stats: &SummaryStats, original_filename: &str) -> Result<Document> {
    let mut composer = PageComposer::new();

    composer.line(FONT_BOLD, 14, LEFT_MARGIN, "Chemical Equipment Summary Report", 30);
    composer.line(
        FONT_REGULAR,
        10,
        LEFT_MARGIN,
        &format!("Source file: {}", original_filename),
        20,
    );
    composer.line(
        FONT_REGULAR,
        10,
        LEFT_MARGIN,
        &format!("Generated at: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        30,
    );

    composer.line(FONT_BOLD, 12, LEFT_MARGIN, "Summary Statistics", 20);
    composer.line(
        FONT_REGULAR,
        10,
        INDENT,
        &format!("Total equipment count: {}", stats.total_count),
        15,
    );
    composer.line(
        FONT_REGULAR,
        10,
        INDENT,
        &format!("Average flowrate: {:.2}", stats.average_flowrate),
        15,
    );
    composer.line(
        FONT_REGULAR,
        10,
        INDENT,
        &format!("Average pressure: {:.2}", stats.average_pressure),
        15,
    );
    composer.line(
        FONT_REGULAR,
        10,
        INDENT,
        &format!("Average temperature: {:.2}", stats.average_temperature),
        25,
    );

    composer.line(FONT_BOLD, 12, LEFT_MARGIN, "Equipment Type Distribution", 20);
    for (equipment_type, count) in stats.distribution_sorted() {
        composer.line(
            FONT_REGULAR,
            10,
            INDENT,
            &format!("{}: {}", equipment_type, count),
            15,
        );
    }

    assemble(composer.finish())
}

/// Accumulates text operations with a downward-moving cursor, starting a new
/// page whenever the cursor reaches the bottom margin.
struct PageComposer {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl PageComposer {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - TOP_OFFSET,
        }
    }

    fn line(&mut self, font: &str, size: i64, x: i64, text: &str, advance: i64) {
        if self.y < BOTTOM_MARGIN {
            self.break_page();
        }
        self.current.push(Operation::new("BT", vec![]));
        self.current
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.current
            .push(Operation::new("Td", vec![x.into(), self.y.into()]));
        self.current
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.current.push(Operation::new("ET", vec![]));
        self.y -= advance;
    }

    fn break_page(&mut self) {
        let operations = std::mem::take(&mut self.current);
        self.pages.push(operations);
        self.y = PAGE_HEIGHT - TOP_OFFSET;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Turn per-page operation lists into a complete single-catalog document.
fn assemble(pages: Vec<Vec<Operation>>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| AppError::Internal(format!("Failed to encode PDF content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i32;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use uuid::Uuid;

    fn sample_stats() -> SummaryStats {
        let mut distribution = HashMap::new();
        distribution.insert("Pump".to_string(), 2);
        distribution.insert("Valve".to_string(), 1);
        SummaryStats {
            total_count: 3,
            average_flowrate: 100.0,
            average_pressure: 2.0,
            average_temperature: 43.333,
            type_distribution: distribution,
        }
    }

    fn temp_data_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("equipviz-report-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_render_writes_pdf_file() {
        let data_dir = temp_data_dir();
        let renderer = PdfReportRenderer::new(&data_dir).unwrap();

        let path = renderer.render(&sample_stats(), "equipments.csv").unwrap();
        assert!(path.starts_with("reports/"));
        assert!(path.ends_with(".pdf"));

        let bytes = fs::read(data_dir.join(&path)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn test_repeated_renders_get_distinct_paths() {
        let data_dir = temp_data_dir();
        let renderer = PdfReportRenderer::new(&data_dir).unwrap();

        let first = renderer.render(&sample_stats(), "a.csv").unwrap();
        let second = renderer.render(&sample_stats(), "a.csv").unwrap();
        assert_ne!(first, second);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn test_long_distribution_spills_onto_second_page() {
        let mut distribution = HashMap::new();
        for i in 0..80 {
            distribution.insert(format!("Type{:02}", i), 1);
        }
        let stats = SummaryStats {
            total_count: 80,
            average_flowrate: 1.0,
            average_pressure: 1.0,
            average_temperature: 1.0,
            type_distribution: distribution,
        };

        let doc = build_document(&stats, "many_types.csv").unwrap();
        let pages = doc.get_pages();
        assert!(pages.len() >= 2);
    }
}
