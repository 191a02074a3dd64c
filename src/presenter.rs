use crate::data::{Hall, SeatingPlan};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Read-only consumer of a finished plan.
pub trait PlanPresenter {
    type Output;

    fn present(&self, plan: &SeatingPlan) -> Self::Output;
}

/// Seat display row for table output
#[derive(Debug, Tabled)]
struct SeatRow<'a> {
    #[tabled(rename = "Seat")]
    seat: u32,
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Register No")]
    register_number: &'a str,
    #[tabled(rename = "Department")]
    department: &'a str,
}

/// One table per hall, one row per seat.
pub struct TextTablePresenter;

impl TextTablePresenter {
    fn hall_table(hall: &Hall) -> String {
        if hall.seats.is_empty() {
            return "(empty)".to_string();
        }
        let rows = hall.seats.iter().map(|s| SeatRow {
            seat: s.seat,
            name: &s.student.name,
            register_number: &s.student.register_number,
            department: &s.student.department,
        });
        let mut table = Table::new(rows);
        table.with(Style::psql());
        table.to_string()
    }
}

impl PlanPresenter for TextTablePresenter {
    type Output = String;

    fn present(&self, plan: &SeatingPlan) -> String {
        plan.halls
            .iter()
            .map(|hall| format!("{}\n{}\n\n", hall.label(), Self::hall_table(hall)))
            .collect()
    }
}
