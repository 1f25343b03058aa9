use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One line of the uploaded CSV, after validation and numeric coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub name: String,
    /// "Type" column in the CSV (Pump, Valve, Reactor, ...).
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Aggregate metrics for one upload.
///
/// Averages are 0.0 when `total_count` is 0; the same convention is used in
/// the JSON response, the history summary line and the PDF report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_count: i64,
    pub average_flowrate: f64,
    pub average_pressure: f64,
    pub average_temperature: f64,
    pub type_distribution: HashMap<String, i64>,
}

impl SummaryStats {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            average_flowrate: 0.0,
            average_pressure: 0.0,
            average_temperature: 0.0,
            type_distribution: HashMap::new(),
        }
    }

    /// Short human-readable form stored on each history entry.
    pub fn summary_line(&self) -> String {
        format!(
            "Total: {}, Avg Flowrate: {:.2}, Avg Pressure: {:.2}, Avg Temperature: {:.2}",
            self.total_count,
            self.average_flowrate,
            self.average_pressure,
            self.average_temperature
        )
    }

    /// Distribution as `(type, count)` pairs ordered by count descending,
    /// then label. Map iteration order is arbitrary, so anything user-facing
    /// goes through this.
    pub fn distribution_sorted(&self) -> Vec<(String, i64)> {
        let mut pairs: Vec<(String, i64)> = self
            .type_distribution
            .iter()
            .map(|(label, count)| (label.clone(), *count))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_rounds_to_two_decimals() {
        let stats = SummaryStats {
            total_count: 3,
            average_flowrate: 100.0,
            average_pressure: 2.0,
            average_temperature: 43.333333,
            type_distribution: HashMap::new(),
        };
        assert_eq!(
            stats.summary_line(),
            "Total: 3, Avg Flowrate: 100.00, Avg Pressure: 2.00, Avg Temperature: 43.33"
        );
    }

    #[test]
    fn test_distribution_sorted_by_count_then_label() {
        let mut distribution = HashMap::new();
        distribution.insert("Valve".to_string(), 1);
        distribution.insert("Pump".to_string(), 2);
        distribution.insert("Reactor".to_string(), 1);

        let stats = SummaryStats {
            total_count: 4,
            average_flowrate: 0.0,
            average_pressure: 0.0,
            average_temperature: 0.0,
            type_distribution: distribution,
        };
        let sorted = stats.distribution_sorted();
        assert_eq!(
            sorted,
            vec![
                ("Pump".to_string(), 2),
                ("Reactor".to_string(), 1),
                ("Valve".to_string(), 1),
            ]
        );
    }
}
