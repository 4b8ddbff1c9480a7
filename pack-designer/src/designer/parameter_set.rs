use battery_model::cell::BatteryCell;
use battery_model::layout::{
    CellRotation, Layout, LevelOverhead, OverheadBreakdown, SlaveUtilization,
};
use battery_model::requirements::Requirements;

use crate::designer::overhead::OverheadModel;

/// One candidate battery system layout under evaluation.
///
/// The set references the cell, the requirements and the overhead supplier,
/// it owns only the layout counts. Dimensions and masses compose bottom-up
/// through the packaging hierarchy, adding the supplier's overhead after
/// every level.
pub struct ParameterSet<'a> {
    pub cell: &'a BatteryCell,
    pub requirements: &'a Requirements,
    pub overhead: &'a dyn OverheadModel,
    pub layout: Layout,
}

impl<'a> ParameterSet<'a> {
    pub fn new(
        cell: &'a BatteryCell,
        requirements: &'a Requirements,
        overhead: &'a dyn OverheadModel,
        layout: Layout,
    ) -> Self {
        ParameterSet {
            cell,
            requirements,
            overhead,
            layout,
        }
    }

    /// The highest voltage a module can reach with this layout.
    pub fn max_module_voltage(&self) -> f64 {
        self.cell.electrics.voltage.maximum
            * (self.layout.module.x * self.layout.module.y) as f64
    }

    /// Pack height with per-level overheads. Cell blocks and modules span the
    /// x/y plane only, so the height picks up count factors from the string
    /// and pack z-axes alone. With `bjb` the battery junction box is placed
    /// along this direction, otherwise only the minimum-height shortfall is
    /// added.
    pub fn height(&self, bjb: bool) -> (f64, OverheadBreakdown) {
        let mut cell_block_height = self.cell.mechanics.height;
        let cell_block_overhead = self.overhead.cell_block_height(self, cell_block_height);
        cell_block_height += cell_block_overhead;

        let mut module_height = cell_block_height;
        let module_overhead = self.overhead.module_height(self, module_height);
        module_height += module_overhead;

        let mut string_height = module_height * self.layout.string.z as f64;
        let string_overhead = self.overhead.string_height(self, string_height);
        string_height += string_overhead;

        let mut pack_height = string_height * self.layout.pack.z as f64;
        let pack_overhead = if bjb {
            self.overhead.pack_height(self, pack_height)
        } else if pack_height < self.overhead.min_height() {
            self.overhead.min_height() - pack_height
        } else {
            0.0
        };
        pack_height += pack_overhead;

        (
            pack_height,
            OverheadBreakdown {
                cell_block: LevelOverhead::new(cell_block_overhead, cell_block_height),
                module: LevelOverhead::new(module_overhead, module_height),
                string: LevelOverhead::new(string_overhead, string_height),
                pack: LevelOverhead::new(pack_overhead, pack_height),
            },
        )
    }

    /// Pack length with per-level overheads. A 90° cell rotation swaps the
    /// cell's width into this direction.
    pub fn length(&self, bjb: bool) -> (f64, OverheadBreakdown) {
        let cell_length = match self.layout.cell_rotation {
            CellRotation::Ninety => self.cell.mechanics.width,
            CellRotation::Zero => self.cell.mechanics.length,
        };
        let mut cell_block_length = cell_length * self.layout.cell_block.y as f64;
        let cell_block_overhead = self.overhead.cell_block_length(self, cell_block_length);
        cell_block_length += cell_block_overhead;

        let mut module_length = cell_block_length * self.layout.module.y as f64;
        let module_overhead = self.overhead.module_length(self, module_length);
        module_length += module_overhead;

        let mut string_length = module_length * self.layout.string.y as f64;
        let string_overhead = self.overhead.string_length(self, string_length);
        string_length += string_overhead;

        let mut pack_length = string_length * self.layout.pack.y as f64;
        let pack_overhead = if bjb {
            self.overhead.pack_length(self, pack_length)
        } else if pack_length < self.overhead.min_length() {
            self.overhead.min_length() - pack_length
        } else {
            0.0
        };
        pack_length += pack_overhead;

        (
            pack_length,
            OverheadBreakdown {
                cell_block: LevelOverhead::new(cell_block_overhead, cell_block_length),
                module: LevelOverhead::new(module_overhead, module_length),
                string: LevelOverhead::new(string_overhead, string_length),
                pack: LevelOverhead::new(pack_overhead, pack_length),
            },
        )
    }

    /// Pack width with per-level overheads, mirroring [`Self::length`] on the
    /// x-axes. The minimum-width floor adds no padding in this direction.
    pub fn width(&self, bjb: bool) -> (f64, OverheadBreakdown) {
        let cell_width = match self.layout.cell_rotation {
            CellRotation::Ninety => self.cell.mechanics.length,
            CellRotation::Zero => self.cell.mechanics.width,
        };
        let mut cell_block_width = cell_width * self.layout.cell_block.x as f64;
        let cell_block_overhead = self.overhead.cell_block_width(self, cell_block_width);
        cell_block_width += cell_block_overhead;

        let mut module_width = cell_block_width * self.layout.module.x as f64;
        let module_overhead = self.overhead.module_width(self, module_width);
        module_width += module_overhead;

        let mut string_width = module_width * self.layout.string.x as f64;
        let string_overhead = self.overhead.string_width(self, string_width);
        string_width += string_overhead;

        let mut pack_width = string_width * self.layout.pack.x as f64;
        let pack_overhead = if bjb {
            self.overhead.pack_width(self, pack_width)
        } else if pack_width < self.overhead.min_width() {
            self.overhead.min_width() - self.overhead.min_width()
        } else {
            0.0
        };
        pack_width += pack_overhead;

        (
            pack_width,
            OverheadBreakdown {
                cell_block: LevelOverhead::new(cell_block_overhead, cell_block_width),
                module: LevelOverhead::new(module_overhead, module_width),
                string: LevelOverhead::new(string_overhead, string_width),
                pack: LevelOverhead::new(pack_overhead, pack_width),
            },
        )
    }

    /// Pack weight with per-level gravimetric overheads. Mass picks up every
    /// count axis of the hierarchy.
    pub fn weight(&self) -> (f64, OverheadBreakdown) {
        let mut cell_block_weight = self.cell.mechanics.weight
            * (self.layout.cell_block.y * self.layout.cell_block.x) as f64;
        let cell_block_overhead = self.overhead.cell_block_gravimetric(self, cell_block_weight);
        cell_block_weight += cell_block_overhead;

        let mut module_weight =
            cell_block_weight * (self.layout.module.y * self.layout.module.x) as f64;
        let module_overhead = self.overhead.module_gravimetric(self, module_weight);
        module_weight += module_overhead;

        let mut string_weight = module_weight
            * (self.layout.string.y * self.layout.string.x * self.layout.string.z) as f64;
        let string_overhead = self.overhead.string_gravimetric(self, string_weight);
        string_weight += string_overhead;

        let mut pack_weight =
            string_weight * (self.layout.pack.y * self.layout.pack.x * self.layout.pack.z) as f64;
        let pack_overhead = self.overhead.pack_gravimetric(self, pack_weight);
        pack_weight += pack_overhead;

        (
            pack_weight,
            OverheadBreakdown {
                cell_block: LevelOverhead::new(cell_block_overhead, cell_block_weight),
                module: LevelOverhead::new(module_overhead, module_weight),
                string: LevelOverhead::new(string_overhead, string_weight),
                pack: LevelOverhead::new(pack_overhead, pack_weight),
            },
        )
    }

    /// Workload distribution over the battery management slaves of one
    /// module. With 22 cell blocks and 12 pins per slave, two slaves carry
    /// eleven blocks each.
    pub fn slave_utilization(&self, pins_per_slave: u32) -> SlaveUtilization {
        let number_of_cell_blocks = self.layout.module.x * self.layout.module.y;
        let number_of_slaves = number_of_cell_blocks.div_ceil(pins_per_slave);
        SlaveUtilization {
            min: number_of_cell_blocks / number_of_slaves,
            max: number_of_cell_blocks.div_ceil(number_of_slaves),
            slaves: number_of_slaves,
        }
    }
}
