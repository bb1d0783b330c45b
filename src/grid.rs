// Toroidal occupancy grid and per-agent trace bookkeeping
//
// The grid is a torus: every coordinate is normalised modulo width/height, so
// stepping off one edge re-enters from the opposite edge. A cell is occupied
// while any agent's trace covers it.

use log::debug;

use crate::error::EngineError;
use crate::types::{agent_slot, is_valid_agent, AgentId, Coord, Direction, RawPositions, NUM_AGENTS};

/// Read-only occupancy query over a toroidal grid.
///
/// Implemented by the real [`Grid`] and by [`WithBlocked`], which overlays
/// one speculative occupied cell without touching the grid underneath.
pub trait OccupancyView {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Occupancy of `coord` after wrap normalisation
    fn is_occupied(&self, coord: Coord) -> bool;

    fn wrap(&self, coord: Coord) -> Coord {
        Coord {
            x: coord.x.rem_euclid(self.width()),
            y: coord.y.rem_euclid(self.height()),
        }
    }

    /// Cell one step from `coord` in `dir`, wrapped
    fn step(&self, coord: Coord, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        self.wrap(Coord {
            x: coord.x + dx,
            y: coord.y + dy,
        })
    }

    /// Manhattan distance where each axis may take the shorter way round
    fn distance(&self, a: Coord, b: Coord) -> i32 {
        toroidal_distance(a, b, self.width(), self.height())
    }

    /// The direction whose single step leads from `from` to `to`, if any
    fn direction_between(&self, from: Coord, to: Coord) -> Option<Direction> {
        let to = self.wrap(to);
        Direction::all()
            .into_iter()
            .find(|&dir| self.step(from, dir) == to)
    }
}

/// Manhattan distance on a `width` x `height` torus
pub fn toroidal_distance(a: Coord, b: Coord, width: i32, height: i32) -> i32 {
    let dx = (a.x - b.x).rem_euclid(width);
    let dy = (a.y - b.y).rem_euclid(height);
    dx.min(width - dx) + dy.min(height - dy)
}

/// Fixed-size toroidal boolean matrix, `true` = occupied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Grid {
            width,
            height,
            cells: vec![false; (width * height) as usize],
        }
    }

    /// True if `coord` lies inside the grid without wrapping
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> usize {
        let c = self.wrap(coord);
        (c.y * self.width + c.x) as usize
    }

    pub fn occupy(&mut self, coord: Coord) {
        let idx = self.index(coord);
        self.cells[idx] = true;
    }

    pub fn free(&mut self, coord: Coord) {
        let idx = self.index(coord);
        self.cells[idx] = false;
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = false);
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of free cells among the four wrapped neighbours of `coord`
    pub fn free_neighbours(&self, coord: Coord) -> usize {
        Direction::all()
            .iter()
            .filter(|&&dir| !self.is_occupied(self.step(coord, dir)))
            .count()
    }

    /// Iterates all cell coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord { x, y }))
    }

    /// Overlays one extra occupied cell on this grid
    pub fn with_blocked(&self, blocked: Coord) -> WithBlocked<'_, Grid> {
        WithBlocked::new(self, blocked)
    }
}

impl OccupancyView for Grid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_occupied(&self, coord: Coord) -> bool {
        self.cells[self.index(coord)]
    }
}

/// Hypothetical occupancy: the base view plus one speculative occupied cell
#[derive(Debug, Clone, Copy)]
pub struct WithBlocked<'a, V: OccupancyView> {
    base: &'a V,
    blocked: Coord,
}

impl<'a, V: OccupancyView> WithBlocked<'a, V> {
    pub fn new(base: &'a V, blocked: Coord) -> Self {
        WithBlocked {
            blocked: base.wrap(blocked),
            base,
        }
    }
}

impl<'a, V: OccupancyView> OccupancyView for WithBlocked<'a, V> {
    fn width(&self) -> i32 {
        self.base.width()
    }

    fn height(&self) -> i32 {
        self.base.height()
    }

    fn is_occupied(&self, coord: Coord) -> bool {
        self.wrap(coord) == self.blocked || self.base.is_occupied(coord)
    }
}

/// Occupancy grid plus the full trace of every agent this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    grid: Grid,
    traces: [Vec<Coord>; NUM_AGENTS],
    current: [Option<Coord>; NUM_AGENTS],
    absent_sentinel: i32,
}

impl GridModel {
    pub fn new(width: i32, height: i32, absent_sentinel: i32) -> Self {
        GridModel {
            grid: Grid::new(width, height),
            traces: Default::default(),
            current: [None; NUM_AGENTS],
            absent_sentinel,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Full trace of `agent`, oldest cell first
    pub fn trace(&self, agent: AgentId) -> &[Coord] {
        if !is_valid_agent(agent) {
            return &[];
        }
        &self.traces[agent_slot(agent)]
    }

    /// Position reported for `agent` in the most recent update, if present
    pub fn position(&self, agent: AgentId) -> Option<Coord> {
        if !is_valid_agent(agent) {
            return None;
        }
        self.current[agent_slot(agent)]
    }

    /// Agents present in the latest update that still hold a trace
    pub fn living_agents(&self) -> impl Iterator<Item = (AgentId, Coord)> + '_ {
        (1..=NUM_AGENTS as AgentId).filter_map(move |id| {
            let slot = agent_slot(id);
            match self.current[slot] {
                Some(pos) if !self.traces[slot].is_empty() => Some((id, pos)),
                _ => None,
            }
        })
    }

    /// Validates a raw update without mutating anything.
    ///
    /// Coordinates equal to the sentinel on either axis mean "absent".
    pub fn validate(&self, positions: &RawPositions) -> Result<[Option<Coord>; NUM_AGENTS], EngineError> {
        let mut present = [None; NUM_AGENTS];
        for (slot, pos) in positions.iter().enumerate() {
            if pos.x == self.absent_sentinel || pos.y == self.absent_sentinel {
                continue;
            }
            if !self.grid.contains(*pos) {
                return Err(EngineError::CoordinateOutOfRange {
                    agent: (slot + 1) as AgentId,
                    x: pos.x,
                    y: pos.y,
                    width: self.grid.width(),
                    height: self.grid.height(),
                });
            }
            present[slot] = Some(*pos);
        }
        Ok(present)
    }

    /// Applies one state update.
    ///
    /// The grid is cleared and re-marked from every trace after appending each
    /// present agent's new cell, so trace cells stay occupied until released.
    /// Absent agents get no new cell but keep their prior trace. On error the
    /// model is left untouched.
    pub fn rebuild(&mut self, positions: &RawPositions) -> Result<(), EngineError> {
        let present = self.validate(positions)?;

        for (slot, pos) in present.iter().enumerate() {
            if let Some(pos) = pos {
                let trace = &mut self.traces[slot];
                if trace.last() != Some(pos) {
                    trace.push(*pos);
                }
            }
        }
        self.current = present;
        self.remark();
        Ok(())
    }

    fn remark(&mut self) {
        self.grid.clear();
        for trace in &self.traces {
            for cell in trace {
                self.grid.occupy(*cell);
            }
        }
    }

    /// Frees every cell of `agent`'s trace and empties the trace.
    ///
    /// Cells also covered by another agent's trace stay occupied. Returns the
    /// number of distinct cells that became free.
    pub fn release(&mut self, agent: AgentId) -> Result<usize, EngineError> {
        if !is_valid_agent(agent) {
            return Err(EngineError::UnknownAgent(agent));
        }
        let slot = agent_slot(agent);
        let trace = std::mem::take(&mut self.traces[slot]);
        for cell in &trace {
            self.grid.free(*cell);
        }
        for (other, cells) in self.traces.iter().enumerate() {
            if other == slot {
                continue;
            }
            for cell in cells {
                self.grid.occupy(*cell);
            }
        }
        self.current[slot] = None;

        let mut freed: Vec<Coord> = trace
            .into_iter()
            .filter(|c| !self.grid.is_occupied(*c))
            .collect();
        freed.sort_by_key(|c| (c.y, c.x));
        freed.dedup();
        debug!("Released {} cells of agent {}", freed.len(), agent);
        Ok(freed.len())
    }

    /// Clears the grid, every trace, and the latest positions
    pub fn reset(&mut self) {
        self.grid.clear();
        self.traces.iter_mut().for_each(Vec::clear);
        self.current = [None; NUM_AGENTS];
    }
}
