use crate::data::{DepartmentCount, Roster, RosterSummary, Student};
use crate::error::SeatingError;
use itertools::Itertools;
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Register No", "Department"];

/// Anything that can hand over a roster.
pub trait RosterSource {
    fn load(&self) -> Result<Roster, SeatingError>;
}

/// A roster that is already in memory.
impl RosterSource for Vec<Student> {
    fn load(&self) -> Result<Roster, SeatingError> {
        Ok(self.clone())
    }
}

/// A CSV roster on disk.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFile { path: path.into() }
    }
}

impl RosterSource for CsvFile {
    fn load(&self) -> Result<Roster, SeatingError> {
        info!("Loading roster from {}", self.path.display());
        read_csv(File::open(&self.path)?)
    }
}

/// A CSV roster already read into memory, e.g. an upload body. The bytes
/// are not assumed to be UTF-8.
#[derive(Debug, Clone)]
pub struct CsvUpload(pub Vec<u8>);

impl RosterSource for CsvUpload {
    fn load(&self) -> Result<Roster, SeatingError> {
        read_csv(self.0.as_slice())
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Register No")]
    register_number: String,
    #[serde(rename = "Department")]
    department: String,
}

/// Reads a roster with a header row. Extra columns are ignored and row order is kept.
pub fn read_csv<R: Read>(reader: R) -> Result<Roster, SeatingError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(format_error)?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(SeatingError::Format {
            reason: format!(
                "CSV must contain Name, Register No, and Department columns (missing {})",
                missing.join(", ")
            ),
        });
    }

    let mut roster = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = row.map_err(format_error)?;
        roster.push(Student::new(row.name, row.register_number, row.department));
    }
    debug!("Read {} roster rows", roster.len());
    Ok(roster)
}

// short rows, undecodable fields and bad encoding are Format; only I/O stays Csv
fn format_error(err: csv::Error) -> SeatingError {
    let malformed = matches!(
        err.kind(),
        csv::ErrorKind::UnequalLengths { .. }
            | csv::ErrorKind::Deserialize { .. }
            | csv::ErrorKind::Utf8 { .. }
    );
    if !malformed {
        return SeatingError::Csv(err);
    }
    let reason = match err.position() {
        Some(pos) => format!("malformed row at line {}", pos.line()),
        None => "malformed row".to_string(),
    };
    SeatingError::Format { reason }
}

/// Student counts per department, in first-seen order.
pub fn summarize(roster: &[Student]) -> RosterSummary {
    let counts = roster.iter().map(|s| s.department.as_str()).counts();
    let departments = roster
        .iter()
        .map(|s| s.department.as_str())
        .unique()
        .map(|department| DepartmentCount {
            department: department.to_string(),
            students: counts[department],
        })
        .collect();
    RosterSummary {
        students: roster.len(),
        departments,
    }
}
