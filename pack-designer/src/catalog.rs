use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use battery_model::cell::BatteryCell;

use crate::error::DesignError;

/// An immutable, ordered collection of validated battery cells.
///
/// Loading scans a directory recursively (or takes a single file), parses
/// every JSON document against the cell schema and keeps the validated cells
/// in path order. Entries that fail parsing or validation are logged and
/// skipped, they never abort the run.
pub struct CellCatalog {
    cells: IndexMap<String, BatteryCell>,
    /// Number of files that failed parsing or validation.
    pub skipped: usize,
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|extension| extension == "json") {
            files.push(path);
        }
    }
    Ok(())
}

impl CellCatalog {
    /// Reads a catalog from a single file or a directory tree.
    pub fn load(path: &Path) -> Result<Self, DesignError> {
        let mut files = Vec::new();
        if path.is_dir() {
            collect_json_files(path, &mut files).map_err(|source| DesignError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            // deterministic catalog order independent of directory iteration
            files.sort();
        } else {
            files.push(path.to_path_buf());
        }

        let mut cells = IndexMap::new();
        let mut skipped = 0;
        for file in files {
            let text = fs::read_to_string(&file).map_err(|source| DesignError::Io {
                path: file.clone(),
                source,
            })?;
            let cell: BatteryCell = match serde_json::from_str(&text) {
                Ok(cell) => cell,
                Err(error) => {
                    warn!(
                        "{} is not a valid cell record and will be ignored: {}",
                        file.display(),
                        error
                    );
                    skipped += 1;
                    continue;
                }
            };
            if let Err(reason) = cell.validate() {
                warn!(
                    "{} does not pass the cell schema and will be ignored: {}",
                    file.display(),
                    reason
                );
                skipped += 1;
                continue;
            }
            let identifier = cell.identifier();
            if cells.contains_key(&identifier) {
                warn!(
                    "{} duplicates cell {} and will be ignored",
                    file.display(),
                    identifier
                );
                skipped += 1;
                continue;
            }
            debug!("Adding configuration read from {} to cell list", identifier);
            cells.insert(identifier, cell);
        }
        if cells.is_empty() {
            warn!("Cell catalog is empty");
        }
        Ok(CellCatalog { cells, skipped })
    }

    /// Builds a catalog from already validated cells, keeping their order.
    pub fn from_cells(cells: Vec<BatteryCell>) -> Self {
        CellCatalog {
            cells: cells
                .into_iter()
                .map(|cell| (cell.identifier(), cell))
                .collect(),
            skipped: 0,
        }
    }

    /// The cells in catalog order.
    pub fn cells(&self) -> impl Iterator<Item = &BatteryCell> {
        self.cells.values()
    }

    pub fn get(&self, identifier: &str) -> Option<&BatteryCell> {
        self.cells.get(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
