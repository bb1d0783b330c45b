// One-step opponent trajectory extrapolation
//
// An opponent is assumed to keep its last heading. If that cell is blocked it
// is assumed to turn into the first free side cell; it never reverses.

use log::debug;

use crate::grid::{GridModel, OccupancyView};
use crate::types::{AgentId, Coord, Direction};

/// Predicts opponents' next moves from their traces
pub struct OpponentPredictor<'a> {
    model: &'a GridModel,
}

impl<'a> OpponentPredictor<'a> {
    pub fn new(model: &'a GridModel) -> Self {
        OpponentPredictor { model }
    }

    /// Direction of `agent`'s most recent step, if the last two trace cells
    /// are adjacent on the torus
    pub fn last_heading(&self, agent: AgentId) -> Option<Direction> {
        match self.model.trace(agent) {
            [.., prev, last] => self.model.grid().direction_between(*prev, *last),
            _ => None,
        }
    }

    /// Predicted next direction, or `None` when history is too short or the
    /// agent has no free non-reversing move
    pub fn predict(&self, agent: AgentId) -> Option<Direction> {
        let heading = self.last_heading(agent)?;
        let last = *self.model.trace(agent).last()?;
        let grid = self.model.grid();

        let candidates = std::iter::once(heading).chain(
            Direction::all()
                .into_iter()
                .filter(move |&d| d != heading && !d.is_reverse_of(heading)),
        );

        for dir in candidates {
            if !grid.is_occupied(grid.step(last, dir)) {
                return Some(dir);
            }
        }

        debug!("Agent {} looks trapped, no prediction", agent);
        None
    }

    /// Cell `agent` is predicted to enter next
    pub fn predicted_cell(&self, agent: AgentId) -> Option<Coord> {
        let dir = self.predict(agent)?;
        let last = *self.model.trace(agent).last()?;
        Some(self.model.grid().step(last, dir))
    }
}
