// ============================================================
// STATISTICS ENGINE
// ============================================================
// Pure aggregation over parsed equipment records

use crate::domain::equipment::{EquipmentRecord, SummaryStats};
use std::collections::HashMap;

/// Compute summary statistics for one upload. Deterministic and side-effect
/// free; averages over the empty set are reported as 0.0.
pub fn summarize(records: &[EquipmentRecord]) -> SummaryStats {
    if records.is_empty() {
        return SummaryStats::empty();
    }

    let total_count = records.len() as i64;
    let n = records.len() as f64;

    let mut flowrate_sum = 0.0;
    let mut pressure_sum = 0.0;
    let mut temperature_sum = 0.0;
    let mut type_distribution: HashMap<String, i64> = HashMap::new();

    for record in records {
        flowrate_sum += record.flowrate;
        pressure_sum += record.pressure;
        temperature_sum += record.temperature;
        *type_distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    SummaryStats {
        total_count,
        average_flowrate: flowrate_sum / n,
        average_pressure: pressure_sum / n,
        average_temperature: temperature_sum / n,
        type_distribution,
    }
}
