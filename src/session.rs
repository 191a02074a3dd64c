use crate::data::{GenerateRequest, Roster, RosterSummary, SeatingOutput, VenueShape};
use crate::error::SeatingError;
use crate::roster::{self, RosterSource};
use crate::solver;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The interactive session: at most one loaded roster and the random source
/// used for every plan generated from it.
pub struct Session {
    roster: Option<Roster>,
    rng: ChaCha8Rng,
}

impl Session {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Session { roster: None, rng }
    }

    /// Replaces the loaded roster. The old one is kept if loading fails.
    pub fn load(&mut self, source: &dyn RosterSource) -> Result<RosterSummary, SeatingError> {
        let roster = source.load()?;
        let summary = roster::summarize(&roster);
        info!(
            "Roster loaded: {} students in {} departments",
            summary.students,
            summary.departments.len()
        );
        self.roster = Some(roster);
        Ok(summary)
    }

    pub fn clear(&mut self) {
        self.roster = None;
    }

    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// The generate action: validate the form text, then seat the loaded roster.
    pub fn generate(&mut self, halls: &str, seats_per_hall: &str) -> Result<SeatingOutput, SeatingError> {
        let roster = self.roster.as_ref().ok_or(SeatingError::NoRoster)?;
        let venue = VenueShape::parse(halls, seats_per_hall)?;
        solver::solve(roster, &venue, &mut self.rng)
    }

    /// Same as [`Session::generate`], reading the form fields from a request body.
    pub fn generate_request(&mut self, request: &GenerateRequest) -> Result<SeatingOutput, SeatingError> {
        if self.roster.is_none() {
            return Err(SeatingError::NoRoster);
        }
        let (halls, seats_per_hall) = request.venue_text()?;
        self.generate(&halls, &seats_per_hall)
    }
}
