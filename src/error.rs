/// Everything that can go wrong between loading a roster and producing a plan.
#[derive(Debug, thiserror::Error)]
pub enum SeatingError {
    #[error("Not enough seats for all students! {students} students, {capacity} seats")]
    Capacity { students: usize, capacity: usize },

    #[error("Please enter a whole number from 1 to {max} for {field} (got {value:?})")]
    Input {
        field: &'static str,
        value: String,
        max: u32,
    },

    #[error("Could not read request: {reason}")]
    Request { reason: String },

    #[error("Invalid roster file: {reason}")]
    Format { reason: String },

    #[error("Please load a student CSV file first!")]
    NoRoster,

    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeatingError {
    /// Stable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            SeatingError::Capacity { .. } => "CAPACITY_ERROR",
            SeatingError::Input { .. } | SeatingError::Request { .. } => "INPUT_ERROR",
            SeatingError::Format { .. } => "FORMAT_ERROR",
            SeatingError::NoRoster => "NO_ROSTER",
            SeatingError::Csv(_) | SeatingError::Io(_) => "INTERNAL_ERROR",
        }
    }
}
