// Shared engine host used by the HTTP server
//
// One controller behind a parking_lot mutex, so at most one event is processed
// at a time. Each event is recorded in the session log while the lock is held,
// which keeps the log in processing order even under concurrent requests.

use parking_lot::Mutex;

use crate::debug_logger::{DebugLogger, SessionEvent};
use crate::engine::{EngineController, Outbox, TickOutcome};
use crate::error::EngineError;
use crate::types::{Direction, Outgoing};

/// What one handled event produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    /// Tick outcome for state updates, `None` for every other event
    pub outcome: Option<TickOutcome>,
    /// Messages queued for the game server during this event
    pub messages: Vec<Outgoing>,
}

impl Handled {
    pub fn chosen_move(&self) -> Option<Direction> {
        match self.outcome {
            Some(TickOutcome::Moved(dir)) => Some(dir),
            _ => None,
        }
    }
}

pub struct SessionHost {
    engine: Mutex<EngineController<Outbox>>,
    logger: DebugLogger,
}

impl SessionHost {
    pub fn new(engine: EngineController<Outbox>, logger: DebugLogger) -> Self {
        SessionHost {
            engine: Mutex::new(engine),
            logger,
        }
    }

    pub fn logger(&self) -> &DebugLogger {
        &self.logger
    }

    /// Applies one event and records it, chosen move included.
    ///
    /// Rejected events are recorded too, so a replay sees exactly what the
    /// live engine saw. Messages queued before a rejection are discarded.
    pub fn handle(&self, event: SessionEvent) -> Result<Handled, EngineError> {
        let mut engine = self.engine.lock();
        let result = engine.apply(&event);
        let messages = engine.transport_mut().drain();

        let recorded = match event {
            SessionEvent::State { positions, .. } => SessionEvent::State {
                positions,
                chosen_move: match &result {
                    Ok(Some(TickOutcome::Moved(dir))) => Some(*dir),
                    _ => None,
                },
            },
            other => other,
        };
        self.logger.log(recorded);

        result.map(|outcome| Handled { outcome, messages })
    }

    /// Runs `f` with exclusive access to the controller
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut EngineController<Outbox>) -> R) -> R {
        let mut engine = self.engine.lock();
        f(&mut *engine)
    }
}
