// Core value types shared by every engine component
// Coordinates, directions, agent ids, and the wire-level payloads exchanged
// with the transport collaborator.

use serde::{Deserialize, Serialize};

/// Number of agent slots in every state update
pub const NUM_AGENTS: usize = 4;

/// Agent identifier, 1..=4, stable for a game session
pub type AgentId = u8;

/// Returns true if `id` names one of the four agent slots
pub fn is_valid_agent(id: AgentId) -> bool {
    (1..=NUM_AGENTS as u8).contains(&id)
}

/// Converts an agent id into its 0-based slot index
pub fn agent_slot(id: AgentId) -> usize {
    (id as usize) - 1
}

/// 2D cell coordinate on the toroidal grid
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }
}

/// Raw positions of all four agents as broadcast in one state update,
/// indexed by `agent_id - 1`. Sentinel coordinates mark absent agents.
pub type RawPositions = [Coord; NUM_AGENTS];

/// The four cardinal moves, numbered the way the game server encodes them
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Returns all directions in wire-code order (1..=4)
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left]
    }

    /// Wire code: 1=UP, 2=RIGHT, 3=DOWN, 4=LEFT
    pub fn code(&self) -> u8 {
        match self {
            Direction::Up => 1,
            Direction::Right => 2,
            Direction::Down => 3,
            Direction::Left => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Direction> {
        match code {
            1 => Some(Direction::Up),
            2 => Some(Direction::Right),
            3 => Some(Direction::Down),
            4 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Converts direction to its lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }

    /// Unit vector of this direction; y grows downwards
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// True if `self` would drive straight back into the previous cell
    pub fn is_reverse_of(&self, other: Direction) -> bool {
        self.opposite() == other
    }
}

/// Points awarded to one agent when a session finishes
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub player_id: AgentId,
    pub points: u8,
}

/// Error codes the game server reports back to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorCode {
    InvalidPlayerId,
    UnallowedRename,
    YouAreNotPlaying,
    UnknownMove,
    Unknown(u8),
}

impl ServerErrorCode {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ServerErrorCode::InvalidPlayerId,
            2 => ServerErrorCode::UnallowedRename,
            3 => ServerErrorCode::YouAreNotPlaying,
            4 => ServerErrorCode::UnknownMove,
            other => ServerErrorCode::Unknown(other),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ServerErrorCode::InvalidPlayerId => "invalid player id",
            ServerErrorCode::UnallowedRename => "rename not allowed",
            ServerErrorCode::YouAreNotPlaying => "player is not in the game",
            ServerErrorCode::UnknownMove => "invalid move direction",
            ServerErrorCode::Unknown(_) => "unknown error",
        }
    }
}

/// Messages the engine asks the transport to deliver
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outgoing {
    Move {
        player_id: AgentId,
        direction: Direction,
    },
    Join,
}
