// Engine controller: owns all mutable engine state and drives one tick end to end
//
// Lifecycle: Joining -> Alive -> Dead -> (session finish) -> Joining -> ...
// Moves are only chosen while Alive. The controller is not reentrant; hosts
// that may deliver events concurrently must wrap it in a mutex.

use log::{debug, info, warn};
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::SessionEvent;
use crate::error::EngineError;
use crate::evaluator::{MoveDecision, MoveEvaluator};
use crate::grid::GridModel;
use crate::pathfinding::PathPlanner;
use crate::profile;
use crate::simple_profiler::{self, Category};
use crate::types::{
    is_valid_agent, AgentId, Direction, FinalScore, Outgoing, RawPositions, ServerErrorCode,
};

/// Outbound side of the game connection, supplied by the host
pub trait Transport {
    /// Delivers a move. Only a successful send commits the direction.
    fn send_move(&mut self, player_id: AgentId, direction: Direction) -> Result<(), String>;

    /// Asks the server to (re)join the next session
    fn send_join(&mut self) -> Result<(), String>;
}

/// Transport that queues outgoing messages for the host to deliver
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Outbox::default()
    }

    pub fn pending(&self) -> &[Outgoing] {
        &self.pending
    }

    /// Takes every queued message, oldest first
    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.pending)
    }
}

impl Transport for Outbox {
    fn send_move(&mut self, player_id: AgentId, direction: Direction) -> Result<(), String> {
        self.pending.push(Outgoing::Move {
            player_id,
            direction,
        });
        Ok(())
    }

    fn send_join(&mut self) -> Result<(), String> {
        self.pending.push(Outgoing::Join);
        Ok(())
    }
}

/// Session phase of the controlled agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Joining,
    Alive,
    Dead,
}

/// Result of one state-update tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A move was chosen and handed to the transport
    Moved(Direction),
    /// The agent is enclosed; nothing was sent
    NoLegalMove,
    /// Our own slot carried the absent sentinel; the grid was updated only
    SelfAbsent,
    /// Not alive; the update was ignored entirely
    Ignored,
}

/// Everything the engine remembers between ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub model: GridModel,
    pub last_direction: Option<Direction>,
    pub alive: bool,
}

impl EngineState {
    pub fn new(config: &Config) -> Self {
        EngineState {
            model: GridModel::new(
                config.grid.width,
                config.grid.height,
                config.grid.absent_sentinel,
            ),
            last_direction: None,
            alive: true,
        }
    }

    pub fn reset(&mut self) {
        self.model.reset();
        self.last_direction = None;
        self.alive = true;
    }
}

pub struct EngineController<T: Transport> {
    config: Config,
    state: EngineState,
    phase: Phase,
    self_id: Option<AgentId>,
    planner: PathPlanner,
    transport: T,
    tick: u64,
}

impl<T: Transport> EngineController<T> {
    pub fn new(config: Config, transport: T) -> Self {
        simple_profiler::set_enabled(config.profiling.enabled);
        EngineController {
            state: EngineState::new(&config),
            config,
            phase: Phase::Joining,
            self_id: None,
            planner: PathPlanner::new(),
            transport,
            tick: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn self_id(&self) -> Option<AgentId> {
        self.self_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sends the initial join request
    pub fn join(&mut self) -> Result<(), EngineError> {
        info!("Requesting to join");
        self.transport.send_join().map_err(EngineError::Transport)
    }

    /// A game starts with `self_id` as our externally assigned identity
    pub fn on_game_start(&mut self, self_id: AgentId) -> Result<(), EngineError> {
        if !is_valid_agent(self_id) {
            return Err(EngineError::UnknownAgent(self_id));
        }
        if let Some(current) = self.self_id {
            if current != self_id && self.phase == Phase::Alive {
                warn!("Identity changed mid-session: {} -> {}", current, self_id);
            }
        }
        info!("GAME START as player {}", self_id);
        if self.phase != Phase::Alive {
            // A new life has no heading yet
            self.state.last_direction = None;
        }
        self.self_id = Some(self_id);
        self.state.alive = true;
        self.phase = Phase::Alive;
        self.tick = 0;
        Ok(())
    }

    /// Processes one state update and, while alive, chooses and sends a move.
    ///
    /// Malformed updates are rejected before any state changes.
    pub fn on_state_update(&mut self, positions: &RawPositions) -> Result<TickOutcome, EngineError> {
        if self.phase != Phase::Alive {
            debug!("Ignoring state update while {:?}", self.phase);
            return Ok(TickOutcome::Ignored);
        }
        let self_id = self.self_id.ok_or(EngineError::IdentityNotAssigned)?;

        profile!(Category::Tick, {
            let start_time = Instant::now();
            self.state.model.rebuild(positions)?;
            self.tick += 1;

            let Some(self_pos) = self.state.model.position(self_id) else {
                debug!("Tick {}: own position absent", self.tick);
                return Ok(TickOutcome::SelfAbsent);
            };

            let last = self.state.last_direction;
            let evaluator = MoveEvaluator::new(&self.state.model, &self.config.scores, self_id);
            let decision = evaluator.decide(&mut self.planner, self_pos, last, &self.config.strategy);

            let direction = match decision {
                MoveDecision::Move(dir) => dir,
                MoveDecision::NoLegalMove => {
                    warn!(
                        "Tick {}: no legal move from ({}, {})",
                        self.tick, self_pos.x, self_pos.y
                    );
                    return Ok(TickOutcome::NoLegalMove);
                }
            };

            if !evaluator.is_legal(self_pos, direction, last) {
                warn!(
                    "Tick {}: refusing to send illegal move {}",
                    self.tick,
                    direction.as_str()
                );
                return Ok(TickOutcome::NoLegalMove);
            }

            self.transport
                .send_move(self_id, direction)
                .map_err(EngineError::Transport)?;
            self.state.last_direction = Some(direction);

            info!(
                "Tick {}: at ({}, {}) chose {} ({}µs)",
                self.tick,
                self_pos.x,
                self_pos.y,
                direction.as_str(),
                start_time.elapsed().as_micros()
            );
            Ok(TickOutcome::Moved(direction))
        })
    }

    /// Processes a death notice. Frees the dead agent's trace whoever it is.
    pub fn on_death_notice(&mut self, agent: AgentId) -> Result<(), EngineError> {
        let freed = self.state.model.release(agent)?;
        info!("Player {} died, {} cells freed", agent, freed);

        if Some(agent) == self.self_id {
            info!("We died");
            self.state.alive = false;
            self.state.last_direction = None;
            self.phase = Phase::Dead;
        }
        Ok(())
    }

    /// Resets all engine state at the end of a session and requests a rejoin
    pub fn on_session_finish(&mut self, results: &[FinalScore]) -> Result<(), EngineError> {
        info!("GAME OVER after {} ticks", self.tick);
        for result in results {
            info!("  Player {}: {} points", result.player_id, result.points);
        }
        simple_profiler::print_report();
        simple_profiler::reset();

        self.state.reset();
        self.phase = Phase::Joining;
        self.self_id = None;
        self.tick = 0;

        info!("Rejoining");
        self.transport.send_join().map_err(EngineError::Transport)
    }

    /// Dispatches one recorded or received event to its handler.
    ///
    /// State updates yield their tick outcome; every other event yields `None`.
    pub fn apply(&mut self, event: &SessionEvent) -> Result<Option<TickOutcome>, EngineError> {
        match event {
            SessionEvent::Start { player_id } => self.on_game_start(*player_id).map(|_| None),
            SessionEvent::State { positions, .. } => self.on_state_update(positions).map(Some),
            SessionEvent::Die { player_id } => self.on_death_notice(*player_id).map(|_| None),
            SessionEvent::Finish { scores } => self.on_session_finish(scores).map(|_| None),
            SessionEvent::Error { player_id, code } => {
                self.on_error_notice(*player_id, *code).map(|_| None)
            }
        }
    }

    /// Handles an error notice from the server; only an invalid-id error
    /// triggers a rejoin
    pub fn on_error_notice(&mut self, player_id: AgentId, code: u8) -> Result<(), EngineError> {
        let error = ServerErrorCode::from_code(code);
        warn!(
            "Server error for player {}: code {} ({})",
            player_id,
            code,
            error.describe()
        );
        if error == ServerErrorCode::InvalidPlayerId {
            return self.join();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<Outgoing>,
        fail_moves: bool,
    }

    impl Transport for Recorder {
        fn send_move(&mut self, player_id: AgentId, direction: Direction) -> Result<(), String> {
            if self.fail_moves {
                return Err("bus off".to_string());
            }
            self.sent.push(Outgoing::Move {
                player_id,
                direction,
            });
            Ok(())
        }

        fn send_join(&mut self) -> Result<(), String> {
            self.sent.push(Outgoing::Join);
            Ok(())
        }
    }

    const ABSENT: Coord = Coord { x: 255, y: 255 };

    fn controller() -> EngineController<Recorder> {
        EngineController::new(Config::with_grid_size(8, 8), Recorder::default())
    }

    #[test]
    fn test_updates_ignored_until_game_start() {
        let mut engine = controller();
        let raw = [Coord::new(1, 1), ABSENT, ABSENT, ABSENT];
        assert_eq!(engine.on_state_update(&raw), Ok(TickOutcome::Ignored));
        assert_eq!(engine.state().model.grid().occupied_count(), 0);
        assert!(engine.transport().sent.is_empty());
    }

    #[test]
    fn test_tick_sends_and_commits_move() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        let raw = [Coord::new(1, 1), Coord::new(5, 5), ABSENT, ABSENT];
        let outcome = engine.on_state_update(&raw).unwrap();

        let TickOutcome::Moved(dir) = outcome else {
            panic!("expected a move, got {:?}", outcome);
        };
        assert_eq!(engine.state().last_direction, Some(dir));
        assert_eq!(
            engine.transport().sent,
            vec![Outgoing::Move {
                player_id: 1,
                direction: dir
            }]
        );
    }

    #[test]
    fn test_failed_send_does_not_commit_direction() {
        let mut engine = controller();
        engine.transport_mut().fail_moves = true;
        engine.on_game_start(1).unwrap();
        let raw = [Coord::new(1, 1), ABSENT, ABSENT, ABSENT];
        let err = engine.on_state_update(&raw).unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
        assert_eq!(engine.state().last_direction, None);
    }

    #[test]
    fn test_malformed_update_leaves_state_unchanged() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        engine
            .on_state_update(&[Coord::new(1, 1), ABSENT, ABSENT, ABSENT])
            .unwrap();
        let before = engine.state().clone();

        let err = engine
            .on_state_update(&[Coord::new(1, 2), Coord::new(-3, 0), ABSENT, ABSENT])
            .unwrap_err();
        assert!(matches!(err, EngineError::CoordinateOutOfRange { .. }));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_self_absent_updates_grid_without_moving() {
        let mut engine = controller();
        engine.on_game_start(2).unwrap();
        let raw = [Coord::new(1, 1), ABSENT, ABSENT, ABSENT];
        assert_eq!(engine.on_state_update(&raw), Ok(TickOutcome::SelfAbsent));
        assert_eq!(engine.state().model.grid().occupied_count(), 1);
        assert!(engine.transport().sent.is_empty());
    }

    #[test]
    fn test_own_death_stops_moves() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        engine
            .on_state_update(&[Coord::new(1, 1), Coord::new(4, 4), ABSENT, ABSENT])
            .unwrap();
        engine.on_death_notice(1).unwrap();

        assert_eq!(engine.phase(), Phase::Dead);
        assert!(!engine.state().alive);
        assert!(engine.state().model.trace(1).is_empty());
        assert_eq!(
            engine.on_state_update(&[ABSENT, Coord::new(4, 5), ABSENT, ABSENT]),
            Ok(TickOutcome::Ignored)
        );
    }

    #[test]
    fn test_new_life_does_not_inherit_heading() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        // Only up is free in the first life
        let outcome = engine
            .on_state_update(&[
                Coord::new(1, 1),
                Coord::new(2, 1),
                Coord::new(1, 2),
                Coord::new(0, 1),
            ])
            .unwrap();
        assert_eq!(outcome, TickOutcome::Moved(Direction::Up));

        engine.on_death_notice(1).unwrap();
        assert_eq!(engine.state().last_direction, None);
        engine.on_game_start(1).unwrap();

        // Only down is free in the second life
        let outcome = engine
            .on_state_update(&[
                Coord::new(5, 5),
                Coord::new(5, 4),
                Coord::new(6, 5),
                Coord::new(4, 5),
            ])
            .unwrap();
        assert_eq!(outcome, TickOutcome::Moved(Direction::Down));
        assert_eq!(engine.state().last_direction, Some(Direction::Down));
    }

    #[test]
    fn test_repeated_start_while_alive_keeps_heading() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        let outcome = engine
            .on_state_update(&[
                Coord::new(1, 1),
                Coord::new(2, 1),
                Coord::new(1, 2),
                Coord::new(0, 1),
            ])
            .unwrap();
        assert_eq!(outcome, TickOutcome::Moved(Direction::Up));
        engine.on_game_start(1).unwrap();
        assert_eq!(engine.state().last_direction, Some(Direction::Up));
    }

    #[test]
    fn test_death_notice_for_unknown_agent_is_rejected() {
        let mut engine = controller();
        engine.on_game_start(1).unwrap();
        engine
            .on_state_update(&[Coord::new(1, 1), ABSENT, ABSENT, ABSENT])
            .unwrap();
        let before = engine.state().clone();
        assert_eq!(engine.on_death_notice(7), Err(EngineError::UnknownAgent(7)));
        assert_eq!(engine.state(), &before);
        assert_eq!(engine.phase(), Phase::Alive);
    }

    #[test]
    fn test_session_finish_resets_and_rejoins_once() {
        let mut engine = controller();
        engine.on_game_start(3).unwrap();
        engine
            .on_state_update(&[Coord::new(1, 1), Coord::new(2, 2), Coord::new(3, 3), ABSENT])
            .unwrap();
        engine
            .on_session_finish(&[FinalScore {
                player_id: 3,
                points: 10,
            }])
            .unwrap();

        assert_eq!(engine.phase(), Phase::Joining);
        assert_eq!(engine.self_id(), None);
        assert_eq!(engine.state(), &EngineState::new(engine.config()));
        let joins = engine
            .transport()
            .sent
            .iter()
            .filter(|m| **m == Outgoing::Join)
            .count();
        assert_eq!(joins, 1);
    }

    #[test]
    fn test_outbox_queues_and_drains() {
        let mut engine = EngineController::new(Config::with_grid_size(8, 8), Outbox::new());
        engine.join().unwrap();
        engine.on_game_start(1).unwrap();
        engine
            .on_state_update(&[Coord::new(1, 1), ABSENT, ABSENT, ABSENT])
            .unwrap();
        assert_eq!(engine.transport().pending().len(), 2);

        let drained = engine.transport_mut().drain();
        assert_eq!(drained[0], Outgoing::Join);
        assert!(matches!(drained[1], Outgoing::Move { player_id: 1, .. }));
        assert!(engine.transport().pending().is_empty());
    }

    #[test]
    fn test_invalid_player_error_triggers_rejoin() {
        let mut engine = controller();
        engine.on_error_notice(1, 2).unwrap();
        assert!(engine.transport().sent.is_empty());
        engine.on_error_notice(1, 1).unwrap();
        assert_eq!(engine.transport().sent, vec![Outgoing::Join]);
    }

    #[test]
    fn test_game_start_rejects_bad_identity() {
        let mut engine = controller();
        assert_eq!(engine.on_game_start(0), Err(EngineError::UnknownAgent(0)));
        assert_eq!(engine.phase(), Phase::Joining);
    }
}
