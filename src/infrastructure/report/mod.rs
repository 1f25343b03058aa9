mod pdf;

pub use pdf::PdfReportRenderer;
