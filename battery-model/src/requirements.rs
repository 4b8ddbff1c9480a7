use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::{CellFormat, VoltageSpec};

/// Objective minimized across accepted battery system designs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizedBy {
    Volume,
    Weight,
}

impl Default for OptimizedBy {
    fn default() -> Self {
        OptimizedBy::Volume
    }
}

/// Optional restriction of the considered cells
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CellFilter {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub format: Option<CellFormat>,
}

/// The `[system]` section of a requirements file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SystemSection {
    pub optimized_by: Option<OptimizedBy>,
    pub only_best: bool,
    pub cooling: Option<String>,
    pub cell: CellFilter,
}

/// Slave board constraints in the `[electrical]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlaveSection {
    pub minimum: u32,
    pub maximum: u32,
    pub equal_utilization: bool,
}

impl Default for SlaveSection {
    fn default() -> Self {
        SlaveSection {
            minimum: 0,
            maximum: 100_000,
            equal_utilization: true,
        }
    }
}

/// Continuous maximum power of the battery system
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ContinuousPower {
    pub charge: f64,    // W
    pub discharge: f64, // W
}

/// The `[electrical]` section of a requirements file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElectricalSection {
    pub energy: f64, // Wh
    pub voltage: VoltageSpec,
    pub continuous_power: ContinuousPower,
    pub max_module_voltage: f64, // V
    #[serde(default)]
    pub slave: SlaveSection,
}

/// The `[mechanical]` section of a requirements file
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MechanicalSection {
    pub weight: f64, // kg
    pub width: f64,  // m
    pub height: f64, // m
    pub length: f64, // m
}

/// A requirements file as written by the operator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequirementsConfig {
    #[serde(default)]
    pub system: SystemSection,
    pub electrical: ElectricalSection,
    pub mechanical: MechanicalSection,
}

/// Holds the battery system requirements
#[derive(Debug, Clone, PartialEq)]
pub struct Requirements {
    pub optimized_by: OptimizedBy,
    pub only_best: bool,
    pub cooling: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub format: Option<CellFormat>,

    pub energy: f64,          // Wh
    pub nominal_voltage: f64, // V
    pub minimum_voltage: f64, // V
    pub maximum_voltage: f64, // V
    pub cont_max_charge_power: f64,    // W
    pub cont_max_discharge_power: f64, // W
    pub max_module_voltage: f64,       // V
    pub slave_min: u32,
    pub slave_max: u32,
    pub slave_equal: bool,

    pub weight: f64, // kg
    pub width: f64,  // m
    pub height: f64, // m
    pub length: f64, // m
    pub volume: f64, // m^3, derived from the mechanical bounds
}

impl From<RequirementsConfig> for Requirements {
    fn from(config: RequirementsConfig) -> Self {
        let volume =
            config.mechanical.width * config.mechanical.height * config.mechanical.length;
        Requirements {
            optimized_by: config.system.optimized_by.unwrap_or_default(),
            only_best: config.system.only_best,
            cooling: config.system.cooling,
            manufacturer: config.system.cell.manufacturer,
            model: config.system.cell.model,
            format: config.system.cell.format,
            energy: config.electrical.energy,
            nominal_voltage: config.electrical.voltage.nominal,
            minimum_voltage: config.electrical.voltage.minimum,
            maximum_voltage: config.electrical.voltage.maximum,
            cont_max_charge_power: config.electrical.continuous_power.charge,
            cont_max_discharge_power: config.electrical.continuous_power.discharge,
            max_module_voltage: config.electrical.max_module_voltage,
            slave_min: config.electrical.slave.minimum,
            slave_max: config.electrical.slave.maximum,
            slave_equal: config.electrical.slave.equal_utilization,
            weight: config.mechanical.weight,
            width: config.mechanical.width,
            height: config.mechanical.height,
            length: config.mechanical.length,
            volume,
        }
    }
}

impl Requirements {
    /// Validates that the provided requirements are physically meaningful,
    /// e.g. that the minimum voltage is not higher than the maximum voltage.
    pub fn validate(&self) -> Result<(), String> {
        if self.minimum_voltage >= self.maximum_voltage {
            return Err("minimum voltage must be below maximum voltage".to_string());
        }
        if !(self.minimum_voltage < self.nominal_voltage
            && self.nominal_voltage < self.maximum_voltage)
        {
            return Err(
                "nominal voltage must be between minimum and maximum voltage".to_string(),
            );
        }
        if self.slave_max == 0 {
            return Err("slave maximum must be at least one".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System Requirements:")?;
        writeln!(f, " Optimized by {:?}", self.optimized_by)?;
        writeln!(f, " only_best {}", self.only_best)?;
        writeln!(f, " Cell manufacturer: {:?}", self.manufacturer)?;
        writeln!(f, " Cell model: {:?}", self.model)?;
        writeln!(f, " Cell format: {:?}", self.format)?;
        writeln!(f, "Electrical Requirements:")?;
        writeln!(f, " Energy: {} Wh", self.energy)?;
        writeln!(f, " Nominal voltage {} V", self.nominal_voltage)?;
        writeln!(f, " Minimum voltage {} V", self.minimum_voltage)?;
        writeln!(f, " Maximum voltage {} V", self.maximum_voltage)?;
        writeln!(f, " Continuous maximum charge power {} W", self.cont_max_charge_power)?;
        writeln!(
            f,
            " Continuous maximum discharge power {} W",
            self.cont_max_discharge_power
        )?;
        writeln!(f, " Maximum module voltage {} V", self.max_module_voltage)?;
        writeln!(f, "Mechanical Requirements:")?;
        writeln!(f, " Weight: {} kg", self.weight)?;
        writeln!(f, " Width: {} m", self.width)?;
        writeln!(f, " Height: {} m", self.height)?;
        write!(f, " Length: {} m", self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RequirementsConfig {
        RequirementsConfig {
            system: SystemSection::default(),
            electrical: ElectricalSection {
                energy: 10_950.0,
                voltage: VoltageSpec {
                    nominal: 3.65,
                    minimum: 2.9,
                    maximum: 4.25,
                },
                continuous_power: ContinuousPower {
                    charge: 100.0,
                    discharge: 100.0,
                },
                max_module_voltage: 60.0,
                slave: SlaveSection::default(),
            },
            mechanical: MechanicalSection {
                weight: 500.0,
                width: 2.0,
                height: 0.5,
                length: 2.0,
            },
        }
    }

    #[test]
    fn test_defaults_are_applied() {
        let requirements = Requirements::from(test_config());
        assert_eq!(requirements.optimized_by, OptimizedBy::Volume);
        assert!(!requirements.only_best);
        assert_eq!(requirements.slave_min, 0);
        assert_eq!(requirements.slave_max, 100_000);
        assert!(requirements.slave_equal);
        assert!((requirements.volume - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_valid_requirements_pass() {
        assert!(Requirements::from(test_config()).validate().is_ok());
    }

    #[test]
    fn test_inverted_voltage_window_is_rejected() {
        let mut requirements = Requirements::from(test_config());
        requirements.minimum_voltage = 5.0;
        assert!(requirements.validate().is_err());
    }

    #[test]
    fn test_nominal_voltage_outside_window_is_rejected() {
        let mut requirements = Requirements::from(test_config());
        requirements.nominal_voltage = 4.5;
        assert!(requirements.validate().is_err());
    }
}
