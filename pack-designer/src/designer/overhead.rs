use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use battery_model::cell::CellFormat;
use battery_model::layout::CellRotation;

use crate::designer::parameter_set::ParameterSet;
use crate::error::DesignError;

/// Cooling system variants considered for a battery pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cooling {
    Air,
    Glycol,
    Refrigerant,
    None,
}

impl Cooling {
    pub const ALL: [Cooling; 4] = [
        Cooling::Air,
        Cooling::Glycol,
        Cooling::Refrigerant,
        Cooling::None,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Cooling::Air => "air",
            Cooling::Glycol => "glycol",
            Cooling::Refrigerant => "refrigerant",
            Cooling::None => "none",
        }
    }

    /// Case-insensitive substring match used by the requirements cooling
    /// filter.
    pub fn matches(&self, filter: &str) -> bool {
        self.name().contains(&filter.to_lowercase())
    }
}

impl fmt::Display for Cooling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Capability set the geometry stage requires from an overhead supplier.
///
/// Every operation returns the absolute overhead added on top of `base` for
/// one hierarchy level and direction. Implementations see the full candidate
/// parameter set, so cell format, block counts, rotation and the power
/// requirements can all shape the returned value.
pub trait OverheadModel: Send + Sync {
    fn cooling(&self) -> Cooling;

    /// Minimal outer pack dimensions in meter.
    fn min_height(&self) -> f64 {
        0.1
    }
    fn min_length(&self) -> f64 {
        0.1
    }
    fn min_width(&self) -> f64 {
        0.1
    }

    fn pack_height(&self, set: &ParameterSet<'_>, base_height: f64) -> f64;
    fn pack_length(&self, set: &ParameterSet<'_>, base_length: f64) -> f64;
    fn pack_width(&self, set: &ParameterSet<'_>, base_width: f64) -> f64;
    fn pack_gravimetric(&self, set: &ParameterSet<'_>, base_weight: f64) -> f64;

    fn string_height(&self, set: &ParameterSet<'_>, base_height: f64) -> f64;
    fn string_length(&self, set: &ParameterSet<'_>, base_length: f64) -> f64;
    fn string_width(&self, set: &ParameterSet<'_>, base_width: f64) -> f64;
    fn string_gravimetric(&self, set: &ParameterSet<'_>, base_weight: f64) -> f64;

    fn module_height(&self, set: &ParameterSet<'_>, base_height: f64) -> f64;
    fn module_length(&self, set: &ParameterSet<'_>, base_length: f64) -> f64;
    fn module_width(&self, set: &ParameterSet<'_>, base_width: f64) -> f64;
    fn module_gravimetric(&self, set: &ParameterSet<'_>, base_weight: f64) -> f64;

    fn cell_block_height(&self, set: &ParameterSet<'_>, base_height: f64) -> f64;
    fn cell_block_length(&self, set: &ParameterSet<'_>, base_length: f64) -> f64;
    fn cell_block_width(&self, set: &ParameterSet<'_>, base_width: f64) -> f64;
    fn cell_block_gravimetric(&self, set: &ParameterSet<'_>, base_weight: f64) -> f64;
}

/// Overhead percentage that makes a candidate fail every mechanical bound,
/// used to rule out cell orientations the format cannot be stacked in.
const PROHIBITIVE_PERCENTAGE: f64 = 10_000_000.0;

/// A mirrored and shifted saturation function to fit the overhead.
fn sigmoid(x: f64, k: f64, w: f64, a: f64, b: f64) -> f64 {
    (a - b) / (1.0 + (k * x - w).exp()) + b
}

/// A linear function to fit the overhead.
fn linear(x: f64, m: f64, c: f64) -> f64 {
    m * x + c
}

/// The built-in overhead supplier, fitted to packaging, busbar, casing and
/// cooling data of production packs
#[derive(Debug, Clone)]
pub struct StandardOverheads {
    cooling: Cooling,
    cooling_width: f64,
    cooling_length: f64,
    cooling_height: f64,
    cooling_weight: f64,
}

impl StandardOverheads {
    pub fn new(cooling: Cooling) -> Self {
        let (cooling_width, cooling_length, cooling_height, cooling_weight) = match cooling {
            Cooling::Air => (0.2, 0.2, 0.0, 0.1),
            Cooling::Glycol => (0.07, 0.07, 0.0, 0.25),
            Cooling::Refrigerant => (0.03, 0.03, 0.0, 0.2),
            Cooling::None => (0.0, 0.0, 0.0, 0.0),
        };
        StandardOverheads {
            cooling,
            cooling_width,
            cooling_length,
            cooling_height,
            cooling_weight,
        }
    }

    /// Pack-level dimensional overheads grow with the continuous maximum
    /// power beyond 100 kW.
    fn max_power(set: &ParameterSet<'_>) -> f64 {
        if set.requirements.cont_max_charge_power > set.requirements.cont_max_discharge_power {
            set.requirements.cont_max_charge_power
        } else {
            set.requirements.cont_max_discharge_power
        }
    }
}

impl OverheadModel for StandardOverheads {
    fn cooling(&self) -> Cooling {
        self.cooling
    }

    fn pack_height(&self, set: &ParameterSet<'_>, _base_height: f64) -> f64 {
        0.10 + ((Self::max_power(set) - 1e5) * 0.0003).max(0.0)
    }

    fn pack_length(&self, set: &ParameterSet<'_>, _base_length: f64) -> f64 {
        0.10 + ((Self::max_power(set) - 1e5) * 0.0005).max(0.0)
    }

    fn pack_width(&self, set: &ParameterSet<'_>, _base_width: f64) -> f64 {
        0.10 + ((Self::max_power(set) - 1e5) * 0.0008).max(0.0)
    }

    fn pack_gravimetric(&self, _set: &ParameterSet<'_>, _base_weight: f64) -> f64 {
        4.24
    }

    fn string_height(&self, _set: &ParameterSet<'_>, _base_height: f64) -> f64 {
        0.02
    }

    fn string_length(&self, _set: &ParameterSet<'_>, _base_length: f64) -> f64 {
        0.03
    }

    fn string_width(&self, _set: &ParameterSet<'_>, _base_width: f64) -> f64 {
        0.05
    }

    fn string_gravimetric(&self, _set: &ParameterSet<'_>, _base_weight: f64) -> f64 {
        0.57
    }

    fn module_height(&self, _set: &ParameterSet<'_>, _base_height: f64) -> f64 {
        0.025
    }

    fn module_length(&self, set: &ParameterSet<'_>, _base_length: f64) -> f64 {
        if set.layout.cell_rotation == CellRotation::Ninety {
            0.019
        } else {
            0.029
        }
    }

    fn module_width(&self, set: &ParameterSet<'_>, _base_width: f64) -> f64 {
        if set.layout.cell_rotation == CellRotation::Ninety {
            0.029
        } else {
            0.019
        }
    }

    fn module_gravimetric(&self, _set: &ParameterSet<'_>, _base_weight: f64) -> f64 {
        0.29
    }

    fn cell_block_height(&self, set: &ParameterSet<'_>, base_height: f64) -> f64 {
        let cells = (set.layout.cell_block.x * set.layout.cell_block.y) as f64;
        let percentage = match set.cell.mechanics.format {
            CellFormat::Prismatic => linear(cells, 0.24, 2.0),
            CellFormat::Cylindrical => 1.0,
            CellFormat::Pouch => linear(set.layout.cell_block.y as f64, 0.09, 3.0),
        };
        base_height * (percentage / 100.0 + self.cooling_height)
    }

    fn cell_block_length(&self, set: &ParameterSet<'_>, base_length: f64) -> f64 {
        let rotated = set.layout.cell_rotation == CellRotation::Ninety;
        let y = set.layout.cell_block.y;
        let percentage = match set.cell.mechanics.format {
            CellFormat::Prismatic => {
                if y > 1 && rotated {
                    PROHIBITIVE_PERCENTAGE
                } else {
                    sigmoid(y as f64, 2.0, 8.37, 3.0, 2.0)
                }
            }
            CellFormat::Cylindrical => sigmoid(y as f64, 2.26, 9.82, 4.0, 3.0),
            CellFormat::Pouch => {
                if y > 1 && rotated {
                    PROHIBITIVE_PERCENTAGE
                } else {
                    sigmoid(y as f64, 2.29, 9.98, 5.0, 4.0)
                }
            }
        };
        base_length * (percentage / 100.0 + self.cooling_length)
    }

    fn cell_block_width(&self, set: &ParameterSet<'_>, base_width: f64) -> f64 {
        let upright = set.layout.cell_rotation == CellRotation::Zero;
        let x = set.layout.cell_block.x;
        let percentage = match set.cell.mechanics.format {
            CellFormat::Prismatic => {
                if x > 1 && upright {
                    PROHIBITIVE_PERCENTAGE
                } else {
                    sigmoid(x as f64, 2.0, 8.25, 3.0, 2.0)
                }
            }
            CellFormat::Cylindrical => sigmoid(x as f64, 2.26, 9.82, 4.0, 3.0),
            CellFormat::Pouch => {
                if x > 1 && upright {
                    PROHIBITIVE_PERCENTAGE
                } else {
                    5.0
                }
            }
        };
        base_width * (percentage / 100.0 + self.cooling_width)
    }

    fn cell_block_gravimetric(&self, set: &ParameterSet<'_>, base_weight: f64) -> f64 {
        let cells = (set.layout.cell_block.x * set.layout.cell_block.y) as f64;
        let percentage = match set.cell.mechanics.format {
            CellFormat::Prismatic => linear(cells, 0.21, 6.36),
            CellFormat::Cylindrical => sigmoid(cells, 3.8, 17.9, 27.0, 23.0),
            CellFormat::Pouch => sigmoid(cells, 3.6, 15.3, 24.0, 12.0),
        };
        base_weight * (percentage / 100.0 + self.cooling_weight)
    }
}

/// Builds one provider instance for a cooling variant.
pub type ProviderFactory = fn(Cooling) -> Box<dyn OverheadModel>;

fn standard_provider(cooling: Cooling) -> Box<dyn OverheadModel> {
    Box::new(StandardOverheads::new(cooling))
}

/// Resolves an overhead plug-in by name. `standard` is built in; alternate
/// suppliers register here under their own name.
pub fn provider_factory(name: &str) -> Result<ProviderFactory, DesignError> {
    let registry: IndexMap<&str, ProviderFactory> =
        IndexMap::from([("standard", standard_provider as ProviderFactory)]);
    registry
        .get(name)
        .copied()
        .ok_or_else(|| DesignError::UnknownOverheadPlugin(name.to_string()))
}
