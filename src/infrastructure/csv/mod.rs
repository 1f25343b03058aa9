mod equipment_csv;

pub use equipment_csv::{EquipmentCsvParser, ParsedUpload, REQUIRED_COLUMNS};
