use battery_model::cell::BatteryCell;
use battery_model::layout::ElectricalConfiguration;
use battery_model::requirements::Requirements;

use crate::error::DesignError;

/// Inverts the discharge curve: returns the SOC in percent at which the cell
/// rests at `voltage`, linearly interpolated between the tabulated points.
/// Voltages outside the tabulated range are a hard error, the requested
/// voltage window cannot be served by this cell.
pub fn soc_at_voltage(cell: &BatteryCell, voltage: f64) -> Result<f64, DesignError> {
    let curve = &cell.electrics.discharge_curve;
    let outside = DesignError::VoltageOutsideCurve {
        identifier: cell.identifier(),
        voltage,
    };
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return Err(outside);
    };
    if !(voltage >= *first && voltage <= *last) {
        return Err(outside);
    }
    for (soc, pair) in curve.windows(2).enumerate() {
        let (low, high) = (pair[0], pair[1]);
        if voltage >= low && voltage <= high {
            // flat curve segments map to their lower SOC index
            let fraction = if high > low {
                (voltage - low) / (high - low)
            } else {
                0.0
            };
            return Ok(soc as f64 + fraction);
        }
    }
    Err(outside)
}

/// Determines all relevant parameters of the electrical configuration for one
/// cell: the minimum series and parallel counts, the usable cell capacity in
/// the clamped voltage window, and the resulting system-level figures.
pub fn size_electrical_configuration(
    cell: &BatteryCell,
    requirements: &Requirements,
) -> Result<ElectricalConfiguration, DesignError> {
    let voltage = &cell.electrics.voltage;
    let current = &cell.electrics.continuous_current;

    let cells_in_series = (requirements.nominal_voltage / voltage.nominal).ceil();
    let nominal_system_voltage = cells_in_series * voltage.nominal;

    // clamp the per-cell voltage window to the system requirement
    let min_system_voltage = cells_in_series * voltage.minimum;
    let lower_bound_cell_voltage = if min_system_voltage < requirements.minimum_voltage {
        requirements.minimum_voltage / cells_in_series
    } else {
        voltage.minimum
    };
    let max_system_voltage = cells_in_series * voltage.maximum;
    let upper_bound_cell_voltage = if max_system_voltage > requirements.maximum_voltage {
        requirements.maximum_voltage / cells_in_series
    } else {
        voltage.maximum
    };

    let lower_soc = soc_at_voltage(cell, lower_bound_cell_voltage)?;
    let upper_soc = soc_at_voltage(cell, upper_bound_cell_voltage)?;
    let used_cell_capacity = (upper_soc - lower_soc) / 100.0 * cell.electrics.capacity.initial;
    if !used_cell_capacity.is_finite() || used_cell_capacity <= 0.0 {
        return Err(DesignError::Numeric {
            identifier: cell.identifier(),
            reason: "usable cell capacity in the requested voltage window is not positive"
                .to_string(),
        });
    }

    let required_system_capacity = requirements.energy / nominal_system_voltage;
    let mut cells_in_parallel = (required_system_capacity / used_cell_capacity).ceil();

    let max_discharge_power = cells_in_parallel * current.discharge * nominal_system_voltage;
    if max_discharge_power <= requirements.cont_max_discharge_power {
        cells_in_parallel =
            (requirements.cont_max_discharge_power / nominal_system_voltage / current.discharge)
                .ceil();
    }
    let max_charge_power = cells_in_parallel * current.charge * nominal_system_voltage;
    if max_charge_power <= requirements.cont_max_charge_power {
        cells_in_parallel =
            (requirements.cont_max_charge_power / nominal_system_voltage / current.charge).ceil();
    }

    if !(cells_in_series.is_finite() && cells_in_parallel.is_finite()) {
        return Err(DesignError::Numeric {
            identifier: cell.identifier(),
            reason: "series or parallel count is not finite".to_string(),
        });
    }

    let system_capacity = cells_in_parallel * used_cell_capacity;
    Ok(ElectricalConfiguration {
        cells_in_parallel: cells_in_parallel as u64,
        cells_in_series: cells_in_series as u64,
        nominal_system_voltage,
        system_capacity,
        lower_bound_cell_voltage,
        upper_bound_cell_voltage,
        used_cell_capacity,
        system_energy: system_capacity * nominal_system_voltage,
    })
}
