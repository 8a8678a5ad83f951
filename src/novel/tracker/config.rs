use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::model::SheetKind;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "novel-tracker.json";

/// Static configuration of a tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the manuscript documents.
    pub documents_dir: PathBuf,
    /// Workbook receiving the records.
    pub workbook: PathBuf,
    pub daily: SheetLayout,
    pub hourly: SheetLayout,
    /// Number format applied to written date cells.
    pub date_format: String,
    /// Number format applied to written time cells.
    pub time_format: String,
    pub goals: Goals,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("manuscript"),
            workbook: PathBuf::from("tracker.xlsx"),
            daily: SheetLayout::daily(),
            hourly: SheetLayout::hourly(),
            date_format: "yyyy/mm/dd".to_string(),
            time_format: "hh:mm:ss".to_string(),
            goals: Goals::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`.
    ///
    /// Without an explicit path the default file is read when present and the
    /// built-in defaults are used otherwise. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if !path.exists() => {
                return Err(TrackerError::MissingInput(path.to_path_buf()));
            }
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("no configuration file found, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading configuration");
        let source = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Returns the layout used for the given recording policy.
    pub fn layout(&self, kind: SheetKind) -> &SheetLayout {
        match kind {
            SheetKind::Daily => &self.daily,
            SheetKind::Hourly => &self.hourly,
        }
    }

    /// Rejects layouts the reconciler cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.daily.validate(SheetKind::Daily)?;
        self.hourly.validate(SheetKind::Hourly)?;
        if self.daily.name == self.hourly.name {
            return Err(TrackerError::InvalidConfig(format!(
                "daily and hourly records share the sheet '{}'",
                self.daily.name
            )));
        }
        Ok(())
    }
}

/// Positional column layout of a tracking sheet. Columns are one-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub name: String,
    pub date_column: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column: Option<u16>,
    pub count_column: u16,
    pub difference_column: u16,
}

impl SheetLayout {
    /// `Date | Count | Difference` on a sheet named `Daily`.
    pub fn daily() -> Self {
        Self {
            name: "Daily".to_string(),
            date_column: 1,
            time_column: None,
            count_column: 2,
            difference_column: 3,
        }
    }

    /// `Date | Time | Count | Difference` on a sheet named `Hourly`.
    pub fn hourly() -> Self {
        Self {
            name: "Hourly".to_string(),
            date_column: 1,
            time_column: Some(2),
            count_column: 3,
            difference_column: 4,
        }
    }

    /// Column headers in column order, as written by `init`.
    pub fn headers(&self) -> Vec<(u16, &'static str)> {
        let mut headers = vec![
            (self.date_column, "Date"),
            (self.count_column, "Count"),
            (self.difference_column, "Difference"),
        ];
        if let Some(column) = self.time_column {
            headers.push((column, "Time"));
        }
        headers.sort_by_key(|(column, _)| *column);
        headers
    }

    pub fn validate(&self, kind: SheetKind) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidConfig(format!(
                "{kind} sheet name is empty"
            )));
        }
        if kind == SheetKind::Hourly && self.time_column.is_none() {
            return Err(TrackerError::InvalidConfig(format!(
                "{kind} sheet '{}' needs a time column",
                self.name
            )));
        }

        let mut columns = vec![self.date_column, self.count_column, self.difference_column];
        columns.extend(self.time_column);
        if columns.contains(&0) {
            return Err(TrackerError::InvalidConfig(format!(
                "{kind} sheet '{}' uses column 0; columns are one-based",
                self.name
            )));
        }
        columns.sort_unstable();
        if columns.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(TrackerError::InvalidConfig(format!(
                "{kind} sheet '{}' assigns two fields to the same column",
                self.name
            )));
        }
        Ok(())
    }
}

/// Writing targets reported by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goals {
    /// Characters to write per day.
    pub daily: u64,
    /// Cumulative character targets.
    pub milestones: Vec<Milestone>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily: 3_000,
            milestones: vec![
                Milestone {
                    label: "November".to_string(),
                    target: 100_000,
                },
                Milestone {
                    label: "Next year".to_string(),
                    target: 300_000,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub label: String,
    pub target: u64,
}
