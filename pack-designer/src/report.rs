use std::fs;
use std::path::{Path, PathBuf};

use crate::designer::SystemDesign;
use crate::error::DesignError;

/// A single report cell. Counts and rounded percentages stay integers,
/// physical quantities are floats printed with two decimals.
enum ReportValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ReportValue {
    fn to_csv(&self) -> String {
        match self {
            ReportValue::Int(value) => value.to_string(),
            ReportValue::Float(value) => format!("{:.2}", value),
            ReportValue::Text(value) => escape_csv(value),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ReportValue::Int(value) => (*value).into(),
            ReportValue::Float(value) => ((value * 100.0).round() / 100.0).into(),
            ReportValue::Text(value) => value.clone().into(),
        }
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One design as an ordered list of (column, value) pairs. The column order
/// is fixed, downstream tooling indexes the report by position.
fn report_row(number: usize, design: &SystemDesign) -> Vec<(String, ReportValue)> {
    use ReportValue::{Float, Int, Text};

    let mech = &design.mechanical;
    let electrics = &design.electrical;
    let layout = &design.layout;
    let volume_without_overhead = mech.width_without_overhead
        * mech.length_without_overhead
        * mech.height_without_overhead;

    let mut row: Vec<(String, ReportValue)> = vec![
        ("Nr.".to_string(), Int(number as i64)),
        (
            "Manufacturer".to_string(),
            Text(design.cell.identification.manufacturer.clone()),
        ),
        (
            "Model".to_string(),
            Text(design.cell.identification.model.clone()),
        ),
        (
            "Format".to_string(),
            Text(design.cell.mechanics.format.to_string()),
        ),
        ("Cooling type".to_string(), Text(design.cooling.to_string())),
        (
            "Cells in parallel".to_string(),
            Int(electrics.cells_in_parallel as i64),
        ),
        (
            "Cells in series".to_string(),
            Int(electrics.cells_in_series as i64),
        ),
        (
            "Min. cell voltage (V)".to_string(),
            Float(electrics.lower_bound_cell_voltage),
        ),
        (
            "Max. cell voltage (V)".to_string(),
            Float(electrics.upper_bound_cell_voltage),
        ),
        (
            "Cell capacity (Ah)".to_string(),
            Float(electrics.used_cell_capacity),
        ),
        (
            "Voltage nom. (V)".to_string(),
            Float(electrics.nominal_system_voltage),
        ),
        ("Energy (Wh)".to_string(), Float(electrics.system_energy)),
        (
            "Max. module voltage (V)".to_string(),
            Float(electrics.max_module_voltage),
        ),
        (
            "Min. module voltage (V)".to_string(),
            Float(electrics.min_module_voltage),
        ),
        (
            "Nom. module voltage (V)".to_string(),
            Float(electrics.nom_module_voltage),
        ),
        (
            "Slave min. workload".to_string(),
            Int(electrics.workload.min as i64),
        ),
        (
            "Slave max. workload".to_string(),
            Int(electrics.workload.max as i64),
        ),
        (
            "Number of slaves per modules".to_string(),
            Int(electrics.workload.slaves as i64),
        ),
        ("Weight (kg)".to_string(), Float(mech.weight)),
        ("Volume (m^3)".to_string(), Float(mech.volume)),
        ("Length (m)".to_string(), Float(mech.length)),
        ("Width (m)".to_string(), Float(mech.width)),
        ("Height (m)".to_string(), Float(mech.height)),
        (
            "Cell orientation".to_string(),
            Text(layout.cell_rotation.to_string()),
        ),
        ("Pack z-dir".to_string(), Int(layout.pack.z as i64)),
        ("Pack y-dir".to_string(), Int(layout.pack.y as i64)),
        ("Pack x-dir".to_string(), Int(layout.pack.x as i64)),
        ("String z-dir".to_string(), Int(layout.string.z as i64)),
        ("String y-dir".to_string(), Int(layout.string.y as i64)),
        ("String x-dir".to_string(), Int(layout.string.x as i64)),
        ("Module y-dir".to_string(), Int(layout.module.y as i64)),
        ("Module x-dir".to_string(), Int(layout.module.x as i64)),
        (
            "Cell block y-dir".to_string(),
            Int(layout.cell_block.y as i64),
        ),
        (
            "Cell block x-dir".to_string(),
            Int(layout.cell_block.x as i64),
        ),
    ];

    let directions = [
        ("height", "m", &mech.height_overhead),
        ("length", "m", &mech.length_overhead),
        ("width", "m", &mech.width_overhead),
        ("weight", "kg", &mech.weight_overhead),
    ];
    for (direction, unit, breakdown) in directions {
        for (level, overhead) in [
            ("cell block", breakdown.cell_block),
            ("module", breakdown.module),
            ("string", breakdown.string),
            ("pack", breakdown.pack),
        ] {
            row.push((
                format!("Overhead {} {} ({})", direction, level, unit),
                Float(overhead.absolute),
            ));
        }
    }
    for (direction, _, breakdown) in directions {
        for (level, overhead) in [
            ("cell block", breakdown.cell_block),
            ("module", breakdown.module),
            ("string", breakdown.string),
            ("pack", breakdown.pack),
        ] {
            row.push((
                format!("Overhead {} {} (%)", direction, level),
                Int(overhead.percent),
            ));
        }
    }
    row.push((
        "Overall volume overhead (%)".to_string(),
        Float(mech.volume / volume_without_overhead * 100.0 - 100.0),
    ));
    row.push((
        "Overall weight overhead (%)".to_string(),
        Float(mech.weight / mech.weight_without_overhead * 100.0 - 100.0),
    ));
    row
}

/// Writes the design report as `<report>.csv` and `<report>.json` with
/// identical content. An empty design list is a hard error, the caller
/// surfaces it with a non-zero exit.
pub fn write_report(designs: &[SystemDesign], report_file: &Path) -> Result<(), DesignError> {
    if designs.is_empty() {
        return Err(DesignError::NoSolutions);
    }
    let rows: Vec<Vec<(String, ReportValue)>> = designs
        .iter()
        .enumerate()
        .map(|(number, design)| report_row(number, design))
        .collect();

    let header: Vec<&str> = rows[0].iter().map(|(column, _)| column.as_str()).collect();
    let mut csv = header.join(",");
    csv.push('\n');
    for row in &rows {
        let values: Vec<String> = row.iter().map(|(_, value)| value.to_csv()).collect();
        csv.push_str(&values.join(","));
        csv.push('\n');
    }
    let csv_path = PathBuf::from(format!("{}.csv", report_file.display()));
    fs::write(&csv_path, csv).map_err(|source| DesignError::Io {
        path: csv_path.clone(),
        source,
    })?;

    let documents: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (column, value) in row {
                object.insert(column.clone(), value.to_json());
            }
            serde_json::Value::Object(object)
        })
        .collect();
    let json = serde_json::to_string_pretty(&serde_json::Value::Array(documents))
        .expect("report rows are serializable");
    let json_path = PathBuf::from(format!("{}.json", report_file.display()));
    fs::write(&json_path, json).map_err(|source| DesignError::Io {
        path: json_path.clone(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::catalog::CellCatalog;
    use crate::designer::SystemDesigns;
    use crate::test_support::{test_cell, test_requirements};

    fn sample_designs() -> Vec<SystemDesign> {
        let catalog = CellCatalog::from_cells(vec![test_cell()]);
        let requirements = test_requirements();
        SystemDesigns::determine(&requirements, &catalog, 10, None, 1)
            .expect("pipeline succeeds")
            .designs
    }

    #[test]
    fn test_empty_report_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = write_report(&[], &dir.path().join("report"));
        assert!(matches!(result, Err(DesignError::NoSolutions)));
    }

    #[test]
    fn test_report_files_are_written() {
        let designs = sample_designs();
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("report");
        write_report(&designs, &report).expect("report written");
        assert!(dir.path().join("report.csv").exists());
        assert!(dir.path().join("report.json").exists());
    }

    #[test]
    fn test_csv_header_and_row_count() {
        let designs = sample_designs();
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("report");
        write_report(&designs, &report).expect("report written");
        let csv = fs::read_to_string(dir.path().join("report.csv")).expect("csv readable");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), designs.len() + 1);
        assert!(lines[0].starts_with(
            "Nr.,Manufacturer,Model,Format,Cooling type,Cells in parallel,Cells in series"
        ));
        assert!(lines[0].ends_with("Overall volume overhead (%),Overall weight overhead (%)"));
        // 34 leading columns, 16 absolute overheads, 16 percentages, 2 totals
        assert_eq!(lines[0].split(',').count(), 68);
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 68);
        }
    }

    #[test]
    fn test_rows_are_numbered_in_order() {
        let designs = sample_designs();
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("report");
        write_report(&designs, &report).expect("report written");
        let json = fs::read_to_string(dir.path().join("report.json")).expect("json readable");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let rows = parsed.as_array().expect("array of rows");
        assert_eq!(rows.len(), designs.len());
        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row["Nr."], serde_json::json!(index));
            assert_eq!(row["Manufacturer"], serde_json::json!("ACME"));
        }
    }

    #[test]
    fn test_floats_are_rounded_to_two_decimals() {
        let designs = sample_designs();
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("report");
        write_report(&designs, &report).expect("report written");
        let json = fs::read_to_string(dir.path().join("report.json")).expect("json readable");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let voltage = parsed[0]["Voltage nom. (V)"].as_f64().expect("float value");
        assert!((voltage - 3.65).abs() < 1e-9);
        let capacity = parsed[0]["Cell capacity (Ah)"].as_f64().expect("float value");
        assert!((capacity - 3.0).abs() < 1e-9);
    }

    /// Identical inputs give byte-identical reports, regardless of the core
    /// count used for the sweep.
    #[test]
    fn test_reports_are_byte_identical_across_core_counts() {
        let catalog = CellCatalog::from_cells(vec![test_cell()]);
        let requirements = test_requirements();
        let single = SystemDesigns::determine(&requirements, &catalog, 100, None, 1)
            .expect("single-core run");
        let parallel = SystemDesigns::determine(&requirements, &catalog, 100, None, 8)
            .expect("multi-core run");
        let dir = tempfile::tempdir().expect("temp dir");
        write_report(&single.designs, &dir.path().join("a")).expect("first report");
        write_report(&parallel.designs, &dir.path().join("b")).expect("second report");
        let first = fs::read(dir.path().join("a.csv")).expect("first csv");
        let second = fs::read(dir.path().join("b.csv")).expect("second csv");
        assert_eq!(first, second);
        let first = fs::read(dir.path().join("a.json")).expect("first json");
        let second = fs::read(dir.path().join("b.json")).expect("second json");
        assert_eq!(first, second);
    }
}
