// Move evaluation: scores the four candidate moves and picks one
//
// Score of a move into a free cell:
//   territory_weight  * free area reachable after the move
// + separation_weight * toroidal distance to the nearest living opponent
// + continuity_bonus   if the heading is kept
// + reversal_penalty   if the heading is reversed
// + prediction_penalty per opponent whose predicted next cell is within
//                      prediction_radius of the destination
// Moves into occupied cells get hard_reject_score and nothing else.

use log::{debug, info, warn};

use crate::config::{PrimaryStrategy, ScoresConfig, StrategyConfig};
use crate::grid::{GridModel, OccupancyView};
use crate::pathfinding::{first_step, PathPlanner};
use crate::predictor::OpponentPredictor;
use crate::profile;
use crate::reachability::flood_fill;
use crate::simple_profiler::Category;
use crate::types::{AgentId, Coord, Direction};

/// Result of move selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    Move(Direction),
    /// Every direction is occupied or a reversal; the agent is enclosed
    NoLegalMove,
}

/// Score breakdown for one candidate direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionScore {
    pub direction: Direction,
    pub destination: Coord,
    pub territory: usize,
    pub score: i32,
}

/// Full evaluation of one tick, kept for logging and tests
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub scores: Vec<DirectionScore>,
    pub decision: MoveDecision,
    pub used_fallback: bool,
}

pub struct MoveEvaluator<'a> {
    model: &'a GridModel,
    weights: &'a ScoresConfig,
    self_id: AgentId,
}

impl<'a> MoveEvaluator<'a> {
    pub fn new(model: &'a GridModel, weights: &'a ScoresConfig, self_id: AgentId) -> Self {
        MoveEvaluator {
            model,
            weights,
            self_id,
        }
    }

    /// A move is legal if its destination is free and it does not reverse
    /// the last committed heading
    pub fn is_legal(&self, self_pos: Coord, dir: Direction, last: Option<Direction>) -> bool {
        let grid = self.model.grid();
        if grid.is_occupied(grid.step(self_pos, dir)) {
            return false;
        }
        !matches!(last, Some(prev) if dir.is_reverse_of(prev))
    }

    /// Scores a single direction
    pub fn score_direction(
        &self,
        self_pos: Coord,
        dir: Direction,
        last: Option<Direction>,
    ) -> DirectionScore {
        let grid = self.model.grid();
        let destination = grid.step(self_pos, dir);

        if grid.is_occupied(destination) {
            return DirectionScore {
                direction: dir,
                destination,
                territory: 0,
                score: self.weights.hard_reject_score,
            };
        }

        let territory = flood_fill(destination, &grid.with_blocked(destination));
        let mut score = (self.weights.territory_weight * territory as f32) as i32;

        if let Some(distance) = self.nearest_opponent_distance(destination) {
            score += (self.weights.separation_weight * distance as f32) as i32;
        }

        if let Some(prev) = last {
            if dir == prev {
                score += self.weights.continuity_bonus;
            } else if dir.is_reverse_of(prev) {
                score += self.weights.reversal_penalty;
            }
        }

        let predictor = OpponentPredictor::new(self.model);
        for (agent, _) in self.opponents() {
            if let Some(predicted) = predictor.predicted_cell(agent) {
                if grid.distance(destination, predicted) <= self.weights.prediction_radius {
                    score += self.weights.prediction_penalty;
                }
            }
        }

        DirectionScore {
            direction: dir,
            destination,
            territory,
            score,
        }
    }

    fn opponents(&self) -> impl Iterator<Item = (AgentId, Coord)> + '_ {
        let self_id = self.self_id;
        self.model
            .living_agents()
            .filter(move |(agent, _)| *agent != self_id)
    }

    fn nearest_opponent_distance(&self, from: Coord) -> Option<i32> {
        let grid = self.model.grid();
        self.opponents()
            .map(|(_, pos)| grid.distance(from, pos))
            .min()
    }

    /// Scores all four directions and selects the best.
    ///
    /// Ties go to the earlier direction in UP, RIGHT, DOWN, LEFT order. When
    /// the best score is rejected or below the desperation threshold, the
    /// first legal direction wins regardless of score.
    pub fn evaluate(&self, self_pos: Coord, last: Option<Direction>) -> Evaluation {
        profile!(Category::Evaluation, {
            let scores: Vec<DirectionScore> = Direction::all()
                .iter()
                .map(|&dir| self.score_direction(self_pos, dir, last))
                .collect();

            for s in &scores {
                debug!(
                    "  {:>5}: score {} (territory {})",
                    s.direction.as_str(),
                    s.score,
                    s.territory
                );
            }

            let mut best = scores[0];
            for s in &scores[1..] {
                if s.score > best.score {
                    best = *s;
                }
            }

            let desperate = best.score <= self.weights.hard_reject_score
                || best.score < self.weights.desperation_threshold;

            if !desperate {
                return Evaluation {
                    scores,
                    decision: MoveDecision::Move(best.direction),
                    used_fallback: false,
                };
            }

            let fallback = Direction::all()
                .into_iter()
                .find(|&dir| self.is_legal(self_pos, dir, last));

            let decision = match fallback {
                Some(dir) => {
                    warn!("Desperation fallback: best score {} -> {}", best.score, dir.as_str());
                    MoveDecision::Move(dir)
                }
                None => {
                    warn!("No legal move from ({}, {})", self_pos.x, self_pos.y);
                    MoveDecision::NoLegalMove
                }
            };

            Evaluation {
                scores,
                decision,
                used_fallback: true,
            }
        })
    }

    pub fn select_move(&self, self_pos: Coord, last: Option<Direction>) -> MoveDecision {
        self.evaluate(self_pos, last).decision
    }

    /// Long-range goal seeking with A*.
    ///
    /// Free cells are ranked by `free_neighbours - goal_distance_weight *
    /// distance`; up to `goal_candidates` are probed in rank order and the
    /// first reachable one whose first step is legal is steered toward.
    pub fn select_goal_move(
        &self,
        planner: &mut PathPlanner,
        self_pos: Coord,
        last: Option<Direction>,
        strategy: &StrategyConfig,
    ) -> Option<Direction> {
        let grid = self.model.grid();

        let mut ranked: Vec<(Coord, f32)> = grid
            .coords()
            .filter(|&c| c != self_pos && !grid.is_occupied(c))
            .map(|c| {
                let openness = grid.free_neighbours(c) as f32;
                let distance = grid.distance(self_pos, c) as f32;
                (c, openness - strategy.goal_distance_weight * distance)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (goal, rank) in ranked.into_iter().take(strategy.goal_candidates) {
            let path = planner.find_path(grid, self_pos, goal);
            match first_step(grid, &path) {
                Some(dir) if self.is_legal(self_pos, dir, last) => {
                    debug!(
                        "Goal ({}, {}) rank {:.1}, path length {} ({} expanded)",
                        goal.x,
                        goal.y,
                        rank,
                        path.len(),
                        planner.last_expanded()
                    );
                    return Some(dir);
                }
                _ => continue,
            }
        }

        None
    }

    /// Chooses a move with the configured primary strategy
    pub fn decide(
        &self,
        planner: &mut PathPlanner,
        self_pos: Coord,
        last: Option<Direction>,
        strategy: &StrategyConfig,
    ) -> MoveDecision {
        if strategy.primary == PrimaryStrategy::GoalSeeking {
            if let Some(dir) = self.select_goal_move(planner, self_pos, last, strategy) {
                return MoveDecision::Move(dir);
            }
            info!("No reachable goal, falling back to territory evaluation");
        }
        self.select_move(self_pos, last)
    }
}
