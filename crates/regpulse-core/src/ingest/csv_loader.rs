//! CSV loader producing harmonized record tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::errors::{IngestError, SchemaError};
use crate::types::collections::CountVec;
use crate::types::{Dataset, Family, Record, RecordTable, Region};

/// Column positions resolved from a file header.
struct HeaderLayout {
    date: usize,
    state: usize,
    district: usize,
    pincode: Option<usize>,
    categories: Vec<usize>,
}

impl HeaderLayout {
    fn resolve(headers: &StringRecord, family: Family, source: &str) -> Result<Self, SchemaError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SchemaError::MissingColumn {
                column: name.to_string(),
                source_name: source.to_string(),
            })
        };
        Ok(Self {
            date: require("date")?,
            state: require("state")?,
            district: require("district")?,
            pincode: find("pincode"),
            categories: family
                .categories()
                .iter()
                .map(|&c| require(c))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Loads family CSV files with the header
/// `date,state,district,pincode,<categories...>`.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    date_format: String,
}

impl CsvLoader {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            date_format: config.effective_date_format().to_string(),
        }
    }

    /// Load every configured family, resolving relative paths against `root`.
    pub fn load_dataset(&self, config: &IngestConfig, root: &Path) -> Result<Dataset, IngestError> {
        let resolve = |files: &[String]| -> Vec<std::path::PathBuf> {
            files.iter().map(|f| root.join(f)).collect()
        };
        Ok(Dataset::new(
            self.load_family(Family::Biometric, &resolve(&config.biometric_files))?,
            self.load_family(Family::Demographic, &resolve(&config.demographic_files))?,
            self.load_family(Family::Enrollment, &resolve(&config.enrollment_files))?,
        ))
    }

    /// Load and concatenate several files of one family.
    pub fn load_family<P: AsRef<Path>>(
        &self,
        family: Family,
        paths: &[P],
    ) -> Result<RecordTable, IngestError> {
        let mut records = Vec::new();
        for path in paths {
            records.extend(self.load_file(family, path.as_ref())?);
        }
        info!(%family, files = paths.len(), records = records.len(), "loaded record table");
        Ok(RecordTable::new(family, records)?)
    }

    pub fn load_file(&self, family: Family, path: &Path) -> Result<Vec<Record>, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_reader(family, file, &path.display().to_string())
    }

    /// Parse records from any reader; `source` names it in errors.
    pub fn load_reader<R: Read>(
        &self,
        family: Family,
        reader: R,
        source: &str,
    ) -> Result<Vec<Record>, IngestError> {
        let csv_err = |e: csv::Error| IngestError::Csv {
            path: source.to_string(),
            source: e,
        };

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_err)?.clone();
        let layout = HeaderLayout::resolve(&headers, family, source)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(csv_err)?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            records.push(self.parse_row(&row, &layout, family, source, line)?);
        }
        debug!(%family, source, rows = records.len(), "parsed csv");
        Ok(records)
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        layout: &HeaderLayout,
        family: Family,
        source: &str,
        line: u64,
    ) -> Result<Record, IngestError> {
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let raw_date = field(layout.date);
        let date = NaiveDate::parse_from_str(raw_date, &self.date_format).map_err(|_| {
            IngestError::InvalidDate {
                path: source.to_string(),
                line,
                value: raw_date.to_string(),
                format: self.date_format.clone(),
            }
        })?;

        let pincode = match layout.pincode.map(field) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| IngestError::InvalidPincode {
                path: source.to_string(),
                line,
                value: raw.to_string(),
            })?),
        };

        let counts = layout
            .categories
            .iter()
            .zip(family.categories())
            .map(|(&idx, name)| {
                parse_count(field(idx)).map_err(|value| IngestError::InvalidCount {
                    path: source.to_string(),
                    line,
                    column: (*name).to_string(),
                    value,
                })
            })
            .collect::<Result<CountVec, _>>()?;

        Ok(Record::new(
            Region::new(field(layout.state), field(layout.district)),
            date,
            pincode,
            counts,
        ))
    }
}

/// Empty cells are missing counts. Integral floats (`"12.0"`) are accepted
/// since spreadsheet exports write them; negatives and fractions are not.
fn parse_count(raw: &str) -> Result<Option<u64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(Some(v));
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(Some(v as u64)),
        _ => Err(raw.to_string()),
    }
}
