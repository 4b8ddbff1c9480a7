//! Shared fixtures for the unit tests of the designer pipeline.

use battery_model::cell::{
    BatteryCell, CapacitySpec, CellFormat, ContinuousCurrentSpec, Electrics, Identification,
    Mechanics, VoltageSpec,
};
use battery_model::requirements::{OptimizedBy, Requirements};

/// A cylindrical 21700-style cell with a linear discharge curve from 2.9 V
/// at SOC 0 to 4.25 V at SOC 100.
pub fn test_cell() -> BatteryCell {
    let discharge_curve = (0..=100)
        .map(|soc| 2.9 + (4.25 - 2.9) * soc as f64 / 100.0)
        .collect();
    BatteryCell {
        identification: Identification {
            manufacturer: "ACME".to_string(),
            model: "C-2170".to_string(),
        },
        mechanics: Mechanics {
            weight: 0.068,
            format: CellFormat::Cylindrical,
            height: 0.07,
            length: 0.021,
            width: 0.021,
        },
        electrics: Electrics {
            voltage: VoltageSpec {
                nominal: 3.65,
                minimum: 2.9,
                maximum: 4.25,
            },
            capacity: CapacitySpec { initial: 3.0 },
            continuous_current: ContinuousCurrentSpec {
                charge: 3.0,
                discharge: 10.0,
            },
            discharge_curve,
        },
    }
}

/// The same electrics in a prismatic housing.
pub fn prismatic_cell() -> BatteryCell {
    let mut cell = test_cell();
    cell.identification.model = "P-100".to_string();
    cell.mechanics.format = CellFormat::Prismatic;
    cell.mechanics.height = 0.1;
    cell.mechanics.length = 0.03;
    cell.mechanics.width = 0.15;
    cell.mechanics.weight = 0.5;
    cell
}

/// Generous requirements that a single test cell satisfies.
pub fn test_requirements() -> Requirements {
    Requirements {
        optimized_by: OptimizedBy::Volume,
        only_best: false,
        cooling: None,
        manufacturer: None,
        model: None,
        format: None,
        energy: 10.95,
        nominal_voltage: 3.65,
        minimum_voltage: 2.9,
        maximum_voltage: 4.25,
        cont_max_charge_power: 1.0,
        cont_max_discharge_power: 1.0,
        max_module_voltage: 60.0,
        slave_min: 0,
        slave_max: 12,
        slave_equal: true,
        weight: 1_000.0,
        width: 5.0,
        height: 5.0,
        length: 5.0,
        volume: 125.0,
    }
}
