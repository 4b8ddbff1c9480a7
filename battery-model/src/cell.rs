use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of tabulated points in a discharge curve, one per integer SOC
/// from 0 % to 100 %.
pub const DISCHARGE_CURVE_POINTS: usize = 101;

/// Identifies a battery cell within a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identification {
    /// The cell manufacturer name.
    pub manufacturer: String,
    /// The cell model name.
    pub model: String,
}

/// Supported battery cell formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    Prismatic,
    Cylindrical,
    Pouch,
}

impl fmt::Display for CellFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellFormat::Prismatic => "prismatic",
            CellFormat::Cylindrical => "cylindrical",
            CellFormat::Pouch => "pouch",
        };
        write!(f, "{}", name)
    }
}

/// Mechanical properties of a battery cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanics {
    pub weight: f64, // kg
    pub format: CellFormat,
    pub height: f64, // m
    pub length: f64, // m
    pub width: f64,  // m
}

impl Mechanics {
    /// Cell volume in m^3. Cylindrical cells use the established
    /// `height * 3.14 * width^2` figure of merit, the other formats the
    /// bounding box.
    pub fn volume(&self) -> f64 {
        match self.format {
            CellFormat::Cylindrical => self.height * 3.14 * self.width * self.width,
            CellFormat::Prismatic | CellFormat::Pouch => self.height * self.length * self.width,
        }
    }
}

/// Voltage levels of a battery cell or a battery system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageSpec {
    pub nominal: f64, // V
    pub minimum: f64, // V
    pub maximum: f64, // V
}

/// Capacity of a battery cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacitySpec {
    /// Initial capacity of the battery cell in Ah.
    pub initial: f64,
}

/// Continuous current limits of a battery cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousCurrentSpec {
    pub charge: f64,    // A
    pub discharge: f64, // A
}

/// Electrical properties of a battery cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Electrics {
    pub voltage: VoltageSpec,
    pub capacity: CapacitySpec,
    pub continuous_current: ContinuousCurrentSpec,
    /// Discharge curve as 101 voltages indexed by integer SOC 0..=100,
    /// monotonically non-decreasing in SOC.
    pub discharge_curve: Vec<f64>,
}

/// All relevant datasheet information on a battery cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryCell {
    pub identification: Identification,
    pub mechanics: Mechanics,
    pub electrics: Electrics,
}

impl BatteryCell {
    /// The identity of a cell within a catalog.
    pub fn identifier(&self) -> String {
        format!(
            "{}:{}",
            self.identification.manufacturer, self.identification.model
        )
    }

    /// Checks that the datasheet values are physically meaningful.
    pub fn validate(&self) -> Result<(), String> {
        if self.mechanics.weight <= 0.0 {
            return Err("cell weight must be positive".to_string());
        }
        for (name, value) in [
            ("height", self.mechanics.height),
            ("length", self.mechanics.length),
            ("width", self.mechanics.width),
        ] {
            if value <= 0.0 {
                return Err(format!("cell {} must be positive", name));
            }
        }
        let voltage = &self.electrics.voltage;
        if voltage.minimum <= 0.0 {
            return Err("minimum cell voltage must be positive".to_string());
        }
        if !(voltage.minimum < voltage.nominal && voltage.nominal < voltage.maximum) {
            return Err(
                "cell voltages must satisfy minimum < nominal < maximum".to_string(),
            );
        }
        if self.electrics.capacity.initial <= 0.0 {
            return Err("initial cell capacity must be positive".to_string());
        }
        if self.electrics.continuous_current.charge <= 0.0
            || self.electrics.continuous_current.discharge <= 0.0
        {
            return Err("continuous currents must be positive".to_string());
        }
        let curve = &self.electrics.discharge_curve;
        if curve.len() != DISCHARGE_CURVE_POINTS {
            return Err(format!(
                "discharge curve must have {} points, found {}",
                DISCHARGE_CURVE_POINTS,
                curve.len()
            ));
        }
        if curve.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err("discharge curve must be non-decreasing in SOC".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for BatteryCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A valid cylindrical 21700-style test cell.
    fn test_cell() -> BatteryCell {
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

    #[test]
    fn test_valid_cell_passes_validation() {
        assert!(test_cell().validate().is_ok());
    }

    #[test]
    fn test_identifier_format() {
        assert_eq!(test_cell().identifier(), "ACME:C-2170");
    }

    #[test]
    fn test_cylindrical_volume_figure() {
        let cell = test_cell();
        let expected = 0.07 * 3.14 * 0.021 * 0.021;
        assert!((cell.mechanics.volume() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_prismatic_volume_is_bounding_box() {
        let mut cell = test_cell();
        cell.mechanics.format = CellFormat::Prismatic;
        let expected = 0.07 * 0.021 * 0.021;
        assert!((cell.mechanics.volume() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_voltage_ordering_is_checked() {
        let mut cell = test_cell();
        cell.electrics.voltage.nominal = 5.0;
        assert!(cell.validate().is_err());
    }

    #[test]
    fn test_curve_length_is_checked() {
        let mut cell = test_cell();
        cell.electrics.discharge_curve.pop();
        assert!(cell.validate().is_err());
    }

    #[test]
    fn test_decreasing_curve_is_rejected() {
        let mut cell = test_cell();
        cell.electrics.discharge_curve[50] = 5.0;
        assert!(cell.validate().is_err());
    }

    #[test]
    fn test_cell_json_round_trip() {
        let cell = test_cell();
        let json = serde_json::to_string(&cell).expect("serializable cell");
        let parsed: BatteryCell = serde_json::from_str(&json).expect("parsable cell");
        assert_eq!(parsed, cell);
    }
}
