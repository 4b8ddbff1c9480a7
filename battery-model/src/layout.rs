use std::fmt;

use serde::Serialize;

use crate::cell::BatteryCell;

/// Lowest packaging tier, a 2-D grid of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellBlock {
    pub x: u32,
    pub y: u32,
}

impl Default for CellBlock {
    fn default() -> Self {
        CellBlock { x: 1, y: 1 }
    }
}

/// A 2-D grid of cell blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleGrid {
    pub x: u32,
    pub y: u32,
}

impl Default for ModuleGrid {
    fn default() -> Self {
        ModuleGrid { x: 1, y: 1 }
    }
}

/// A 3-D stack of modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringStack {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for StringStack {
    fn default() -> Self {
        StringStack { x: 1, y: 1, z: 1 }
    }
}

/// A 3-D stack of strings, the complete system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackStack {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for PackStack {
    fn default() -> Self {
        PackStack { x: 1, y: 1, z: 1 }
    }
}

/// Orientation of the cells within a cell block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellRotation {
    Zero,
    Ninety,
}

impl Default for CellRotation {
    fn default() -> Self {
        CellRotation::Zero
    }
}

impl fmt::Display for CellRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRotation::Zero => write!(f, "0°"),
            CellRotation::Ninety => write!(f, "90°"),
        }
    }
}

/// The 3-D layout of the cells in a battery system.
///
/// Cells in series = module.x * module.y * string.x * string.y * string.z,
/// cells in parallel = cell_block.x * cell_block.y * pack.x * pack.y * pack.z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub cell_block: CellBlock,
    pub module: ModuleGrid,
    pub string: StringStack,
    pub pack: PackStack,
    pub cell_rotation: CellRotation,
}

impl Layout {
    /// Binds a series factoring to the module and string axes.
    pub fn set_series(&mut self, factors: [u32; 5]) {
        self.module = ModuleGrid {
            x: factors[0],
            y: factors[1],
        };
        self.string = StringStack {
            x: factors[2],
            y: factors[3],
            z: factors[4],
        };
    }

    /// Binds a parallel factoring to the cell block and pack axes.
    pub fn set_parallel(&mut self, factors: [u32; 5]) {
        self.cell_block = CellBlock {
            x: factors[0],
            y: factors[1],
        };
        self.pack = PackStack {
            x: factors[2],
            y: factors[3],
            z: factors[4],
        };
    }

    pub fn cells_in_series(&self) -> u64 {
        self.module.x as u64
            * self.module.y as u64
            * self.string.x as u64
            * self.string.y as u64
            * self.string.z as u64
    }

    pub fn cells_in_parallel(&self) -> u64 {
        self.cell_block.x as u64
            * self.cell_block.y as u64
            * self.pack.x as u64
            * self.pack.y as u64
            * self.pack.z as u64
    }
}

/// One level's packaging overhead as an absolute value and as a rounded
/// percentage of the level's composed dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelOverhead {
    pub absolute: f64,
    pub percent: i64,
}

impl LevelOverhead {
    /// `composed` is the level's dimension after the overhead was added.
    pub fn new(absolute: f64, composed: f64) -> Self {
        LevelOverhead {
            absolute,
            percent: (100.0 * absolute / composed).round() as i64,
        }
    }
}

/// Overhead values of all four hierarchy levels in one direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverheadBreakdown {
    pub cell_block: LevelOverhead,
    pub module: LevelOverhead,
    pub string: LevelOverhead,
    pub pack: LevelOverhead,
}

/// Workload distribution over the battery management slaves of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaveUtilization {
    /// Minimal workload of the slaves.
    pub min: u32,
    /// Maximal workload of the slaves.
    pub max: u32,
    /// Number of slaves per module.
    pub slaves: u32,
}

/// Electrical sizing result for one cell, the lower bound of the searched
/// design space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElectricalConfiguration {
    pub cells_in_parallel: u64,
    pub cells_in_series: u64,
    pub nominal_system_voltage: f64, // V
    pub system_capacity: f64,        // Ah
    pub lower_bound_cell_voltage: f64, // V
    pub upper_bound_cell_voltage: f64, // V
    pub used_cell_capacity: f64,     // Ah
    pub system_energy: f64,          // Wh
}

/// Mechanical properties of a composed battery system
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MechanicalProperties {
    pub height: f64, // m
    pub length: f64, // m
    pub width: f64,  // m
    pub weight: f64, // kg
    pub height_overhead: OverheadBreakdown,
    pub length_overhead: OverheadBreakdown,
    pub width_overhead: OverheadBreakdown,
    pub weight_overhead: OverheadBreakdown,
    pub height_without_overhead: f64,
    pub length_without_overhead: f64,
    pub width_without_overhead: f64,
    pub weight_without_overhead: f64,
    pub volume: f64, // m^3
}

impl MechanicalProperties {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        height: f64,
        length: f64,
        width: f64,
        weight: f64,
        height_overhead: OverheadBreakdown,
        length_overhead: OverheadBreakdown,
        width_overhead: OverheadBreakdown,
        weight_overhead: OverheadBreakdown,
        height_without_overhead: f64,
        length_without_overhead: f64,
        width_without_overhead: f64,
        weight_without_overhead: f64,
    ) -> Self {
        MechanicalProperties {
            height,
            length,
            width,
            weight,
            height_overhead,
            length_overhead,
            width_overhead,
            weight_overhead,
            height_without_overhead,
            length_without_overhead,
            width_without_overhead,
            weight_without_overhead,
            volume: height * length * width,
        }
    }
}

/// Electrical properties of a composed battery system
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElectricalProperties {
    pub cells_in_parallel: u64,
    pub cells_in_series: u64,
    pub nominal_system_voltage: f64, // V
    pub system_capacity: f64,        // Ah
    pub lower_bound_cell_voltage: f64, // V
    pub upper_bound_cell_voltage: f64, // V
    pub used_cell_capacity: f64,     // Ah
    pub system_energy: f64,          // Wh
    pub max_module_voltage: f64,     // V
    pub min_module_voltage: f64,     // V
    pub nom_module_voltage: f64,     // V
    pub workload: SlaveUtilization,
}

impl ElectricalProperties {
    /// Derives the system-level electrics from the actual layout counts,
    /// which meet or exceed the sizing lower bounds.
    pub fn new(
        cell: &BatteryCell,
        layout: &Layout,
        configuration: &ElectricalConfiguration,
        max_module_voltage: f64,
        workload: SlaveUtilization,
    ) -> Self {
        let cells_per_module = (layout.module.x * layout.module.y) as f64;
        let cells_in_series = layout.cells_in_series();
        let cells_in_parallel = layout.cells_in_parallel();
        let nominal_system_voltage = cell.electrics.voltage.nominal * cells_in_series as f64;
        let system_capacity = configuration.used_cell_capacity * cells_in_parallel as f64;
        ElectricalProperties {
            cells_in_parallel,
            cells_in_series,
            nominal_system_voltage,
            system_capacity,
            lower_bound_cell_voltage: configuration.lower_bound_cell_voltage,
            upper_bound_cell_voltage: configuration.upper_bound_cell_voltage,
            used_cell_capacity: configuration.used_cell_capacity,
            system_energy: nominal_system_voltage * system_capacity,
            max_module_voltage,
            min_module_voltage: cell.electrics.voltage.minimum * cells_per_module,
            nom_module_voltage: cell.electrics.voltage.nominal * cells_per_module,
            workload,
        }
    }
}
