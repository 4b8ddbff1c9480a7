//! The design enumeration and ranking engine.
//!
//! For every considered cell the electrical sizer derives the minimum series
//! and parallel counts, the factorings enumerator expands both counts into
//! 5-tuples bound to the packaging hierarchy, and the upper-bound filter
//! discards candidates that violate a requirement. The driver fans the
//! per-cell work out over a thread pool and merges the results in catalog
//! order, so reports are reproducible at any core count.

pub mod factoring;
pub mod overhead;
pub mod parameter_set;
pub mod sizing;

use std::collections::HashSet;

use itertools::iproduct;
use log::{debug, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use battery_model::cell::BatteryCell;
use battery_model::layout::{
    CellRotation, ElectricalConfiguration, ElectricalProperties, Layout, MechanicalProperties,
    OverheadBreakdown,
};
use battery_model::requirements::{OptimizedBy, Requirements};

use crate::catalog::CellCatalog;
use crate::designer::factoring::factorings;
use crate::designer::overhead::{Cooling, OverheadModel, provider_factory};
use crate::designer::parameter_set::ParameterSet;
use crate::designer::sizing::size_electrical_configuration;
use crate::error::DesignError;

/// All relevant information about one validated battery system
#[derive(Debug, Clone, PartialEq)]
pub struct SystemDesign {
    pub cell: BatteryCell,
    pub cooling: Cooling,
    pub layout: Layout,
    pub mechanical: MechanicalProperties,
    pub electrical: ElectricalProperties,
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Length,
    Width,
    Height,
}

fn axis_value(set: &ParameterSet<'_>, axis: Axis, bjb: bool) -> (f64, OverheadBreakdown) {
    match axis {
        Axis::Length => set.length(bjb),
        Axis::Width => set.width(bjb),
        Axis::Height => set.height(bjb),
    }
}

/// Checks one candidate against all upper bounds and composes its properties.
///
/// The battery junction box is placed in the first direction that still fits
/// with the box's overhead, tried in the order length, width, height. While
/// the box is unplaced a failing direction gets one retry without it; once
/// placed, any further failing direction discards the candidate.
fn check_upper_bounds(
    set: &ParameterSet<'_>,
    configuration: &ElectricalConfiguration,
) -> Option<SystemDesign> {
    let requirements = set.requirements;
    let module_voltage = set.max_module_voltage();
    if module_voltage >= requirements.max_module_voltage {
        return None;
    }

    let mut bjb = false;
    let mut composed: Vec<(f64, OverheadBreakdown)> = Vec::with_capacity(3);
    for (axis, bound) in [
        (Axis::Length, requirements.length),
        (Axis::Width, requirements.width),
        (Axis::Height, requirements.height),
    ] {
        let (mut value, mut overhead) = axis_value(set, axis, !bjb);
        if value >= bound {
            if bjb {
                return None;
            }
            (value, overhead) = axis_value(set, axis, false);
            if value >= bound {
                return None;
            }
        } else {
            bjb = true;
        }
        composed.push((value, overhead));
    }
    if !bjb {
        warn!("Battery junction box could not be placed in any direction");
        return None;
    }
    let (length, length_overhead) = composed[0];
    let (width, width_overhead) = composed[1];
    let (height, height_overhead) = composed[2];

    let (weight, weight_overhead) = set.weight();
    if weight >= requirements.weight {
        return None;
    }

    let utilization = set.slave_utilization(requirements.slave_max);
    if utilization.min < requirements.slave_min || utilization.max > requirements.slave_max {
        return None;
    }
    if requirements.slave_equal && utilization.min != utilization.max {
        return None;
    }

    let mechanics = &set.cell.mechanics;
    let layout = &set.layout;
    let height_without_overhead =
        mechanics.height * (layout.string.z as u64 * layout.pack.z as u64) as f64;
    let length_without_overhead = mechanics.length
        * (layout.pack.y as u64
            * layout.string.y as u64
            * layout.module.y as u64
            * layout.cell_block.y as u64) as f64;
    let width_without_overhead = mechanics.width
        * (layout.pack.x as u64
            * layout.string.x as u64
            * layout.module.x as u64
            * layout.cell_block.x as u64) as f64;
    let weight_without_overhead = mechanics.weight
        * layout.cells_in_series() as f64
        * layout.cells_in_parallel() as f64;

    let mechanical = MechanicalProperties::new(
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
    );
    let electrical =
        ElectricalProperties::new(set.cell, layout, configuration, module_voltage, utilization);
    Some(SystemDesign {
        cell: set.cell.clone(),
        cooling: set.overhead.cooling(),
        layout: *layout,
        mechanical,
        electrical,
    })
}

/// Determines all valid battery system designs for one cell.
fn system_designs_per_cell(
    cell: &BatteryCell,
    requirements: &Requirements,
    providers: &[Box<dyn OverheadModel>],
) -> Result<Vec<SystemDesign>, DesignError> {
    info!("Process {}", cell);
    let configuration = size_electrical_configuration(cell, requirements)?;
    debug!("{:?}", configuration);
    let series = factorings(configuration.cells_in_series);
    let parallel = factorings(configuration.cells_in_parallel);
    debug!(
        "{} series and {} parallel factorings for {}",
        series.len(),
        parallel.len(),
        cell
    );
    let mut designs = Vec::new();
    for (provider, series_factors, parallel_factors, rotation) in iproduct!(
        providers.iter(),
        series.iter(),
        parallel.iter(),
        [CellRotation::Zero, CellRotation::Ninety]
    ) {
        let mut layout = Layout::default();
        layout.set_series(*series_factors);
        layout.set_parallel(*parallel_factors);
        layout.cell_rotation = rotation;
        let set = ParameterSet::new(cell, requirements, provider.as_ref(), layout);
        if let Some(design) = check_upper_bounds(&set, &configuration) {
            designs.push(design);
        }
    }
    Ok(designs)
}

/// Finds and ranks possible battery system designs across a cell catalog
pub struct SystemDesigns {
    pub designs: Vec<SystemDesign>,
}

impl SystemDesigns {
    /// Runs the whole pipeline: filter the catalog, sweep every cell on a
    /// worker pool, merge in catalog order, sort by the objective, apply the
    /// best-per-cell mode and truncate to the solution limit.
    pub fn determine(
        requirements: &Requirements,
        catalog: &CellCatalog,
        max_number_of_solutions: usize,
        overhead_plugin: Option<&str>,
        cores: usize,
    ) -> Result<Self, DesignError> {
        let factory = provider_factory(overhead_plugin.unwrap_or("standard"))?;
        let coolings: Vec<Cooling> = match &requirements.cooling {
            Some(filter) => Cooling::ALL
                .iter()
                .copied()
                .filter(|cooling| cooling.matches(filter))
                .collect(),
            None => Cooling::ALL.to_vec(),
        };
        let providers: Vec<Box<dyn OverheadModel>> = coolings.into_iter().map(factory).collect();

        let considered: Vec<&BatteryCell> = catalog
            .cells()
            .filter(|cell| {
                requirements
                    .manufacturer
                    .as_ref()
                    .is_none_or(|manufacturer| &cell.identification.manufacturer == manufacturer)
                    && requirements
                        .model
                        .as_ref()
                        .is_none_or(|model| &cell.identification.model == model)
                    && requirements
                        .format
                        .is_none_or(|format| cell.mechanics.format == format)
            })
            .collect();
        if considered.is_empty() {
            warn!(
                "Number of cells considered to build battery systems is zero. \
                 Please check requirement settings and catalog"
            );
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(cores)
            .build()
            .map_err(|error| DesignError::WorkerPool(error.to_string()))?;
        let per_cell: Result<Vec<Vec<SystemDesign>>, DesignError> = pool.install(|| {
            considered
                .par_iter()
                .map(|cell| system_designs_per_cell(cell, requirements, &providers))
                .collect()
        });
        let mut designs: Vec<SystemDesign> = per_cell?.into_iter().flatten().collect();

        // stable sort, ties keep their catalog and candidate order
        match requirements.optimized_by {
            OptimizedBy::Volume => {
                designs.sort_by(|a, b| a.mechanical.volume.total_cmp(&b.mechanical.volume))
            }
            OptimizedBy::Weight => {
                designs.sort_by(|a, b| a.mechanical.weight.total_cmp(&b.mechanical.weight))
            }
        }

        if requirements.only_best {
            let considered_identifiers: HashSet<String> =
                considered.iter().map(|cell| cell.identifier()).collect();
            let mut filtered = Vec::new();
            let mut filtered_identifiers = HashSet::new();
            for design in designs {
                if filtered_identifiers.insert(design.cell.identifier()) {
                    info!("Added best configuration of cell {}", design.cell);
                    filtered.push(design);
                    // cells whose candidates were all filtered out keep this
                    // early exit from firing, the loop then runs to exhaustion
                    if filtered_identifiers == considered_identifiers {
                        break;
                    }
                }
            }
            designs = filtered;
        }
        designs.truncate(max_number_of_solutions);
        Ok(SystemDesigns { designs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{prismatic_cell, test_cell, test_requirements};

    fn catalog_of(cells: Vec<BatteryCell>) -> CellCatalog {
        CellCatalog::from_cells(cells)
    }

    #[test]
    fn test_trivial_single_cell_fit() {
        let catalog = catalog_of(vec![test_cell()]);
        let requirements = test_requirements();
        let result = SystemDesigns::determine(&requirements, &catalog, 100, None, 1)
            .expect("pipeline succeeds");
        assert!(!result.designs.is_empty());
        let best = &result.designs[0];
        assert_eq!(best.electrical.cells_in_series, 1);
        assert_eq!(best.electrical.cells_in_parallel, 1);
    }

    #[test]
    fn test_series_count_meets_lower_bound() {
        let catalog = catalog_of(vec![test_cell()]);
        let mut requirements = test_requirements();
        requirements.nominal_voltage = 10.9;
        requirements.minimum_voltage = 8.0;
        requirements.maximum_voltage = 13.0;
        requirements.energy = 32.85;
        let result = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("pipeline succeeds");
        assert!(!result.designs.is_empty());
        // ceil(10.9 / 3.65) = 3 is the sizing lower bound
        assert!(result
            .designs
            .iter()
            .all(|design| design.electrical.cells_in_series >= 3));
        assert!(result
            .designs
            .iter()
            .any(|design| design.electrical.cells_in_series == 3));
        for design in &result.designs {
            let series_product = design.layout.cells_in_series();
            assert_eq!(series_product, design.electrical.cells_in_series);
        }
    }

    #[test]
    fn test_accepted_designs_respect_bounds() {
        let catalog = catalog_of(vec![test_cell()]);
        let mut requirements = test_requirements();
        requirements.width = 0.5;
        requirements.length = 0.5;
        requirements.height = 0.5;
        requirements.weight = 20.0;
        let result = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("pipeline succeeds");
        for design in &result.designs {
            assert!(design.mechanical.height < requirements.height);
            assert!(design.mechanical.length < requirements.length);
            assert!(design.mechanical.width < requirements.width);
            assert!(design.mechanical.weight < requirements.weight);
        }
    }

    #[test]
    fn test_sorted_by_volume() {
        let catalog = catalog_of(vec![test_cell()]);
        let requirements = test_requirements();
        let result = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("pipeline succeeds");
        for pair in result.designs.windows(2) {
            assert!(pair[0].mechanical.volume <= pair[1].mechanical.volume);
        }
    }

    #[test]
    fn test_sorted_by_weight() {
        let catalog = catalog_of(vec![test_cell()]);
        let mut requirements = test_requirements();
        requirements.optimized_by = OptimizedBy::Weight;
        let result = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("pipeline succeeds");
        for pair in result.designs.windows(2) {
            assert!(pair[0].mechanical.weight <= pair[1].mechanical.weight);
        }
    }

    #[test]
    fn test_only_best_keeps_one_record_per_cell() {
        let mut other = test_cell();
        other.identification.model = "C-4680".to_string();
        other.mechanics.height = 0.08;
        let catalog = catalog_of(vec![test_cell(), other]);
        let mut requirements = test_requirements();
        requirements.only_best = true;
        let result = SystemDesigns::determine(&requirements, &catalog, 100, None, 1)
            .expect("pipeline succeeds");
        let identifiers: Vec<String> = result
            .designs
            .iter()
            .map(|design| design.cell.identifier())
            .collect();
        let unique: HashSet<&String> = identifiers.iter().collect();
        assert_eq!(unique.len(), identifiers.len());
        assert_eq!(identifiers.len(), 2);
    }

    #[test]
    fn test_truncation_to_solution_limit() {
        let catalog = catalog_of(vec![test_cell()]);
        let requirements = test_requirements();
        let result = SystemDesigns::determine(&requirements, &catalog, 3, None, 1)
            .expect("pipeline succeeds");
        assert!(result.designs.len() <= 3);
    }

    #[test]
    fn test_bjb_is_placed_in_some_direction() {
        let catalog = catalog_of(vec![test_cell()]);
        let requirements = test_requirements();
        let result = SystemDesigns::determine(&requirements, &catalog, 100, None, 1)
            .expect("pipeline succeeds");
        // with the low test power every pack-level dimensional overhead from
        // a placed junction box is exactly 0.10 m
        for design in &result.designs {
            let placed = [
                design.mechanical.length_overhead.pack.absolute,
                design.mechanical.width_overhead.pack.absolute,
                design.mechanical.height_overhead.pack.absolute,
            ]
            .iter()
            .any(|overhead| (overhead - 0.10).abs() < 1e-9);
            assert!(placed, "design without a placed battery junction box");
        }
    }

    #[test]
    fn test_cooling_filter_restricts_variants() {
        let catalog = catalog_of(vec![test_cell()]);
        let mut requirements = test_requirements();
        requirements.cooling = Some("air".to_string());
        let result = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("pipeline succeeds");
        assert!(!result.designs.is_empty());
        assert!(result
            .designs
            .iter()
            .all(|design| design.cooling == Cooling::Air));
    }

    #[test]
    fn test_prismatic_rotation_exclusion() {
        let catalog = catalog_of(vec![prismatic_cell()]);
        let mut requirements = test_requirements();
        // two cells worth of energy forces cell blocks with more than one cell
        requirements.energy = 2.0 * 10.95;
        let result = SystemDesigns::determine(&requirements, &catalog, 10_000, None, 1)
            .expect("pipeline succeeds");
        for design in &result.designs {
            if design.layout.cell_rotation == CellRotation::Ninety {
                assert!(design.layout.cell_block.y <= 1);
            }
            if design.layout.cell_rotation == CellRotation::Zero {
                assert!(design.layout.cell_block.x <= 1);
            }
        }
    }

    #[test]
    fn test_identical_results_at_any_core_count() {
        let mut other = test_cell();
        other.identification.model = "C-4680".to_string();
        let catalog = catalog_of(vec![test_cell(), other, prismatic_cell()]);
        let requirements = test_requirements();
        let single = SystemDesigns::determine(&requirements, &catalog, 1000, None, 1)
            .expect("single-core run");
        let parallel = SystemDesigns::determine(&requirements, &catalog, 1000, None, 8)
            .expect("multi-core run");
        assert_eq!(single.designs, parallel.designs);
    }

    #[test]
    fn test_manufacturer_filter() {
        let mut other = test_cell();
        other.identification.manufacturer = "Other".to_string();
        let catalog = catalog_of(vec![test_cell(), other]);
        let mut requirements = test_requirements();
        requirements.manufacturer = Some("Other".to_string());
        let result = SystemDesigns::determine(&requirements, &catalog, 100, None, 1)
            .expect("pipeline succeeds");
        assert!(!result.designs.is_empty());
        assert!(result
            .designs
            .iter()
            .all(|design| design.cell.identification.manufacturer == "Other"));
    }

    #[test]
    fn test_unknown_plugin_aborts() {
        let catalog = catalog_of(vec![test_cell()]);
        let requirements = test_requirements();
        let result =
            SystemDesigns::determine(&requirements, &catalog, 100, Some("missing"), 1);
        assert!(matches!(
            result,
            Err(DesignError::UnknownOverheadPlugin(_))
        ));
    }

    #[test]
    fn test_slave_bounds_reject_large_modules() {
        let catalog = catalog_of(vec![test_cell()]);
        let mut requirements = test_requirements();
        requirements.nominal_voltage = 25.0; // seven cells in series
        requirements.minimum_voltage = 20.0;
        requirements.maximum_voltage = 30.0;
        requirements.slave_max = 2;
        let result = SystemDesigns::determine(&requirements, &catalog, 10_000, None, 1)
            .expect("pipeline succeeds");
        for design in &result.designs {
            assert!(design.electrical.workload.max <= 2);
            let blocks = design.layout.module.x * design.layout.module.y;
            assert_eq!(
                design.electrical.workload.slaves,
                blocks.div_ceil(requirements.slave_max)
            );
        }
    }
}
