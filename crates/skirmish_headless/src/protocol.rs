//! JSON protocol for headless sessions.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Tick summaries, state snapshots and responses
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"protected_id":1}
//! -> {"cmd":"tick","count":10}
//! <- {"type":"ticked","tick":10,"spawned":[2,3,4,5],"deaths":[],"attacks":0}
//! -> {"cmd":"goal","x":600.0,"y":300.0}
//! <- {"type":"ack","cmd":"goal"}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":10,"elapsed_ms":1000,"units":[...],"hash":...}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use serde::{Deserialize, Serialize};
use skirmish_core::math::{Fixed, Vec2Fixed};
use skirmish_core::render::UnitFrame;
use skirmish_core::units::UnitId;

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Send the protected unit towards a point.
    Goal { x: f64, y: f64 },

    /// Apply direct damage to a unit.
    Damage { unit_id: UnitId, amount: i32 },

    /// Query current state without advancing time.
    Query,

    /// Report the state hash (for determinism verification).
    Hash,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        tick: u64,
        protected_id: UnitId,
    },

    /// Summary of one or more ticks.
    Ticked {
        tick: u64,
        spawned: Vec<UnitId>,
        deaths: Vec<UnitId>,
        attacks: usize,
    },

    /// Full snapshot of every live unit.
    State {
        tick: u64,
        elapsed_ms: u64,
        units: Vec<UnitFrame>,
        hash: u64,
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64, protected_id: UnitId) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
            protected_id,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Goal { .. } => "goal",
            Self::Damage { .. } => "damage",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

/// Convert wire coordinates to a fixed-point point.
///
/// Returns `None` for non-finite or out-of-range values.
#[must_use]
pub fn point_from_wire(x: f64, y: f64) -> Option<Vec2Fixed> {
    Some(Vec2Fixed::new(
        Fixed::checked_from_num(x)?,
        Fixed::checked_from_num(y)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tick_command() {
        let cmd = Command::from_json(r#"{"cmd":"tick","count":60}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 60 });
    }

    #[test]
    fn test_default_tick_count() {
        let cmd = Command::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 1 });
    }

    #[test]
    fn test_parse_goal_and_damage() {
        let goal = Command::from_json(r#"{"cmd":"goal","x":120.5,"y":40}"#).unwrap();
        assert_eq!(goal, Command::Goal { x: 120.5, y: 40.0 });

        let damage = Command::from_json(r#"{"cmd":"damage","unit_id":3,"amount":7}"#).unwrap();
        assert_eq!(
            damage,
            Command::Damage {
                unit_id: 3,
                amount: 7
            }
        );
        assert_eq!(damage.name(), "damage");
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::from_json(r#"{"cmd":"teleport","x":1}"#).is_err());
        assert!(Command::from_json("not json").is_err());
    }

    #[test]
    fn test_serialize_ticked_response() {
        let resp = Response::Ticked {
            tick: 12,
            spawned: vec![2, 3],
            deaths: vec![],
            attacks: 4,
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"ticked""#));
        assert!(json.contains(r#""spawned":[2,3]"#));
    }

    #[test]
    fn test_ready_carries_version() {
        let json = Response::ready(0, 1).to_json_line();
        assert!(json.contains(r#""version":"1.0""#));
        assert!(json.contains(r#""protected_id":1"#));
    }

    #[test]
    fn test_point_from_wire() {
        assert_eq!(
            point_from_wire(10.0, 20.0),
            Some(Vec2Fixed::from_ints(10, 20))
        );
        assert_eq!(point_from_wire(f64::NAN, 0.0), None);
        assert_eq!(point_from_wire(0.0, 1e300), None);
    }
}
