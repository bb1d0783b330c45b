use std::fmt;

use crate::types::AgentId;

/// Contract violations and delivery failures reported by the engine.
///
/// Decision-quality outcomes ("no path", "no prediction", "no legal move")
/// are ordinary values and never show up here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    CoordinateOutOfRange {
        agent: AgentId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    UnknownAgent(AgentId),
    IdentityNotAssigned,
    Transport(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoordinateOutOfRange {
                agent,
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "agent {} reported ({}, {}) outside the {}x{} grid",
                agent, x, y, width, height
            ),
            Self::UnknownAgent(id) => write!(f, "unknown agent id {}", id),
            Self::IdentityNotAssigned => write!(f, "no player identity has been assigned"),
            Self::Transport(reason) => write!(f, "transport rejected message: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {}
