use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SeatingError;

// Type aliases for clarity
pub type HallNumber = u32;
pub type SeatNumber = u32;

/// A single student as read from the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    pub register_number: String,
    pub department: String,
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        register_number: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Student {
            name: name.into(),
            register_number: register_number.into(),
            department: department.into(),
        }
    }
}

/// The complete list of students to be seated, in the order they were read.
pub type Roster = Vec<Student>;

/// Largest hall count accepted. Every hall is materialized in the plan, even empty ones.
pub const MAX_HALLS: u32 = 10_000;

/// Hall count and seats per hall. Both are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueShape {
    hall_count: u32,
    seats_per_hall: u32,
}

impl VenueShape {
    pub fn new(hall_count: u32, seats_per_hall: u32) -> Result<Self, SeatingError> {
        if hall_count == 0 || hall_count > MAX_HALLS {
            return Err(SeatingError::Input {
                field: "halls",
                value: hall_count.to_string(),
                max: MAX_HALLS,
            });
        }
        if seats_per_hall == 0 {
            return Err(SeatingError::Input {
                field: "seatsPerHall",
                value: seats_per_hall.to_string(),
                max: u32::MAX,
            });
        }
        Ok(VenueShape {
            hall_count,
            seats_per_hall,
        })
    }

    /// Validates raw form text for both fields.
    pub fn parse(halls: &str, seats_per_hall: &str) -> Result<Self, SeatingError> {
        let hall_count = parse_positive("halls", halls)?;
        let seats_per_hall = parse_positive("seatsPerHall", seats_per_hall)?;
        Self::new(hall_count, seats_per_hall)
    }

    pub fn hall_count(&self) -> u32 {
        self.hall_count
    }

    pub fn seats_per_hall(&self) -> u32 {
        self.seats_per_hall
    }

    pub fn capacity(&self) -> usize {
        (self.hall_count as usize).saturating_mul(self.seats_per_hall as usize)
    }
}

fn parse_positive(field: &'static str, raw: &str) -> Result<u32, SeatingError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SeatingError::Input {
            field,
            value: raw.to_string(),
            max: if field == "halls" { MAX_HALLS } else { u32::MAX },
        }),
    }
}

/// Reads one form field as text. Numbers are taken as typed; a missing,
/// null or structured value is an input error.
pub fn form_text(field: &'static str, value: Option<&serde_json::Value>) -> Result<String, SeatingError> {
    match value {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        other => Err(SeatingError::Input {
            field,
            value: other.map(|v| v.to_string()).unwrap_or_default(),
            max: if field == "halls" { MAX_HALLS } else { u32::MAX },
        }),
    }
}

/// One occupied seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub seat: SeatNumber,
    #[serde(flatten)]
    pub student: Student,
}

/// A hall and its occupied seats, numbered from 1 with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hall {
    pub hall: HallNumber,
    pub seats: Vec<Seat>,
}

impl Hall {
    pub fn label(&self) -> String {
        format!("Hall {}", self.hall)
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.seats.iter().map(|s| &s.student)
    }
}

/// Every hall of the venue in order 1..=hall_count, including empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingPlan {
    pub halls: Vec<Hall>,
}

impl SeatingPlan {
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.halls.iter().flat_map(Hall::students)
    }

    pub fn seated(&self) -> usize {
        self.students().count()
    }
}

/// Two neighbouring seats in one hall that still share a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyConflict {
    pub hall: HallNumber,
    pub seats: (SeatNumber, SeatNumber),
    pub department: String,
}

impl fmt::Display for AdjacencyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hall {}: seats {} and {} are both {}",
            self.hall, self.seats.0, self.seats.1, self.department
        )
    }
}

/// What the service hands back for a generated plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingOutput {
    pub plan: SeatingPlan,
    pub seated: usize,
    pub capacity: usize,
    pub unresolved_adjacencies: Vec<AdjacencyConflict>,
}

/// Raw form input for the generate action. Fields stay untyped so that
/// a missing or mistyped value surfaces as an input error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub halls: Option<serde_json::Value>,
    #[serde(default)]
    pub seats_per_hall: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn venue_text(&self) -> Result<(String, String), SeatingError> {
        Ok((
            form_text("halls", self.halls.as_ref())?,
            form_text("seatsPerHall", self.seats_per_hall.as_ref())?,
        ))
    }
}

/// Stateless request carrying its own roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub students: Vec<Student>,
    pub halls: u32,
    pub seats_per_hall: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub students: usize,
}

/// Returned after a roster has been loaded into the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub students: usize,
    pub departments: Vec<DepartmentCount>,
}
