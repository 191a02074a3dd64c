use crate::data::{AdjacencyConflict, Hall, Seat, SeatingOutput, SeatingPlan, Student, VenueShape};
use crate::error::SeatingError;
use itertools::Itertools;
use log::{info, trace};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Assigns every student in `roster` a seat in `venue`.
///
/// Students are grouped by department, drawn round-robin from the groups,
/// shuffled with `rng`, then passed once through a forward-swap repair that
/// tries to split same-department neighbours. The repair is best effort: a
/// collision with no differing department left further along stays put.
/// Halls are filled in order, seats from 1.
///
/// Fails before building anything if the roster does not fit.
pub fn assign<R: Rng + ?Sized>(
    roster: &[Student],
    venue: &VenueShape,
    rng: &mut R,
) -> Result<SeatingPlan, SeatingError> {
    let capacity = venue.capacity();
    if roster.len() > capacity {
        return Err(SeatingError::Capacity {
            students: roster.len(),
            capacity,
        });
    }

    let groups = group_by_department(roster);
    trace!("Grouped {} students into {} departments.", roster.len(), groups.len());

    let mut sequence = interleave(groups);
    sequence.shuffle(rng);

    let swaps = repair_adjacency(&mut sequence);
    trace!("Adjacency repair made {} swaps.", swaps);

    Ok(partition(&sequence, venue))
}

/// Runs [`assign`] and reports what the repair could not separate.
pub fn solve<R: Rng + ?Sized>(
    roster: &[Student],
    venue: &VenueShape,
    rng: &mut R,
) -> Result<SeatingOutput, SeatingError> {
    let start_time = Instant::now();
    info!(
        "Seating {} students in {} halls of {} seats...",
        roster.len(),
        venue.hall_count(),
        venue.seats_per_hall()
    );

    let plan = assign(roster, venue, rng)?;
    let unresolved_adjacencies = find_adjacency_conflicts(&plan);
    for conflict in &unresolved_adjacencies {
        trace!("Unresolved: {}", conflict);
    }

    info!(
        "Plan generated in {:.2?} with {} unresolved adjacencies",
        start_time.elapsed(),
        unresolved_adjacencies.len()
    );

    Ok(SeatingOutput {
        seated: plan.seated(),
        capacity: venue.capacity(),
        plan,
        unresolved_adjacencies,
    })
}

// groups keep roster order, and are listed in the order departments first appear
pub(crate) fn group_by_department(roster: &[Student]) -> Vec<VecDeque<&Student>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<VecDeque<&Student>> = Vec::new();
    for student in roster {
        let slot = *index.entry(student.department.as_str()).or_insert_with(|| {
            groups.push(VecDeque::new());
            groups.len() - 1
        });
        groups[slot].push_back(student);
    }
    groups
}

pub(crate) fn interleave(mut groups: Vec<VecDeque<&Student>>) -> Vec<&Student> {
    let total = groups.iter().map(VecDeque::len).sum();
    let mut sequence = Vec::with_capacity(total);
    while sequence.len() < total {
        for group in groups.iter_mut() {
            if let Some(student) = group.pop_front() {
                sequence.push(student);
            }
        }
    }
    sequence
}

/// Single forward pass. Returns the number of swaps made.
pub(crate) fn repair_adjacency(sequence: &mut [&Student]) -> usize {
    let mut swaps = 0;
    for i in 1..sequence.len() {
        if sequence[i].department != sequence[i - 1].department {
            continue;
        }
        let department = &sequence[i].department;
        if let Some(offset) = sequence[i + 1..]
            .iter()
            .position(|s| &s.department != department)
        {
            sequence.swap(i, i + 1 + offset);
            swaps += 1;
        }
    }
    swaps
}

fn partition(sequence: &[&Student], venue: &VenueShape) -> SeatingPlan {
    let mut chunks = sequence.chunks(venue.seats_per_hall() as usize);
    let halls = (1..=venue.hall_count())
        .map(|hall| {
            let seats = chunks
                .next()
                .unwrap_or_default()
                .iter()
                .zip(1..)
                .map(|(student, seat)| Seat {
                    seat,
                    student: (*student).clone(),
                })
                .collect();
            Hall { hall, seats }
        })
        .collect();
    SeatingPlan { halls }
}

/// Neighbouring seats within a hall that share a department.
pub fn find_adjacency_conflicts(plan: &SeatingPlan) -> Vec<AdjacencyConflict> {
    plan.halls
        .iter()
        .flat_map(|hall| {
            hall.seats
                .iter()
                .tuple_windows()
                .filter(|(a, b)| a.student.department == b.student.department)
                .map(|(a, b)| AdjacencyConflict {
                    hall: hall.hall,
                    seats: (a.seat, b.seat),
                    department: a.student.department.clone(),
                })
        })
        .collect()
}
