//! Headless session runner.
//!
//! Owns one [`Simulation`] and drives it from protocol commands. The session
//! is synchronous: each input line is parsed, applied, and answered before
//! the next line is read.

use std::io::{self, BufRead, Write};

use skirmish_core::config::SimConfig;
use skirmish_core::error::SimError;
use skirmish_core::simulation::Simulation;
use tracing::{debug, error, info, warn};

use crate::protocol::{point_from_wire, Command, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick command (vs only on query).
    pub auto_state_output: bool,
}

/// Headless runner for scripted control.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    sim: Simulation,
    /// Set once a tick fails. The simulation must not advance afterwards.
    halted: Option<SimError>,
}

impl HeadlessRunner {
    /// Create a runner with default session options.
    pub fn new(sim_config: SimConfig) -> Result<Self, SimError> {
        Self::with_config(sim_config, HeadlessConfig::default())
    }

    /// Create a runner with custom session options.
    pub fn with_config(sim_config: SimConfig, config: HeadlessConfig) -> Result<Self, SimError> {
        Ok(Self {
            config,
            sim: Simulation::new(sim_config)?,
            halted: None,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Whether an invariant violation stopped the simulation.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Run a session: write `ready`, then answer every command line.
    ///
    /// Returns when `quit` is received or the input ends.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_response(
            &mut output,
            &Response::ready(self.sim.get_tick(), self.sim.protected_id()),
        )?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let cmd = match Command::from_json(line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    warn!(error = %e, "Unparseable command");
                    write_response(&mut output, &Response::error(format!("Parse error: {e}"), None))?;
                    continue;
                }
            };

            let quit = cmd == Command::Quit;
            for response in self.handle(&cmd) {
                write_response(&mut output, &response)?;
            }
            if quit {
                info!(tick = self.sim.get_tick(), "Session ended by controller");
                return Ok(());
            }
        }

        info!(tick = self.sim.get_tick(), "Input closed");
        Ok(())
    }

    /// Apply one command, returning the responses to send.
    pub fn handle(&mut self, cmd: &Command) -> Vec<Response> {
        debug!(cmd = cmd.name(), "Handling command");
        match *cmd {
            Command::Tick { count } => self.handle_tick(count),
            Command::Goal { x, y } => match point_from_wire(x, y) {
                Some(goal) if self.sim.config().field.contains(goal) => {
                    self.sim.queue_goal(goal);
                    vec![Response::ack(cmd.name())]
                }
                _ => vec![Response::error(
                    format!("Goal ({x}, {y}) is off the field"),
                    Some(cmd.name()),
                )],
            },
            Command::Damage { unit_id, amount } => match self.sim.damage_unit(unit_id, amount) {
                Ok(_) => vec![Response::ack(cmd.name())],
                Err(e) => vec![Response::error(e.to_string(), Some(cmd.name()))],
            },
            Command::Query => match self.state() {
                Ok(state) => vec![state],
                Err(e) => vec![Response::error(e.to_string(), Some(cmd.name()))],
            },
            Command::Hash => vec![Response::StateHash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            }],
            Command::Quit => vec![Response::Bye],
        }
    }

    fn handle_tick(&mut self, count: u32) -> Vec<Response> {
        if let Some(e) = &self.halted {
            return vec![Response::error(
                format!("Simulation halted: {e}"),
                Some("tick"),
            )];
        }

        let mut spawned = Vec::new();
        let mut deaths = Vec::new();
        let mut attacks = 0;

        for _ in 0..count {
            match self.sim.tick() {
                Ok(events) => {
                    spawned.extend(events.spawned);
                    deaths.extend(events.deaths);
                    attacks += events.attacks.len();
                }
                Err(e) => {
                    error!(tick = self.sim.get_tick(), error = %e, "Tick failed, halting");
                    let message = format!("Tick failed: {e}");
                    self.halted = Some(e);
                    return vec![Response::error(message, Some("tick"))];
                }
            }
        }

        let mut responses = vec![Response::Ticked {
            tick: self.sim.get_tick(),
            spawned,
            deaths,
            attacks,
        }];
        if self.config.auto_state_output {
            match self.state() {
                Ok(state) => responses.push(state),
                Err(e) => responses.push(Response::error(e.to_string(), Some("tick"))),
            }
        }
        responses
    }

    fn state(&self) -> Result<Response, SimError> {
        Ok(Response::State {
            tick: self.sim.get_tick(),
            elapsed_ms: self.sim.elapsed_ms(),
            units: self.sim.frame()?,
            hash: self.sim.state_hash(),
        })
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_test_utils::fixtures::quiet_config;

    fn session(config: SimConfig, options: HeadlessConfig, input: &str) -> Vec<Response> {
        let mut runner = HeadlessRunner::with_config(config, options).unwrap();
        let mut output = Vec::new();
        runner.run(input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_session_starts_ready_and_ends_with_bye() {
        let responses = session(
            quiet_config(),
            HeadlessConfig::default(),
            "{\"cmd\":\"quit\"}\n{\"cmd\":\"tick\"}\n",
        );
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], Response::ready(0, 1));
        assert_eq!(responses[1], Response::Bye);
    }

    #[test]
    fn test_multi_tick_is_one_summary() {
        let responses = session(
            SimConfig::default(),
            HeadlessConfig::default(),
            "{\"cmd\":\"tick\",\"count\":5}\n",
        );
        match &responses[1] {
            Response::Ticked { tick, spawned, .. } => {
                assert_eq!(*tick, 5);
                assert_eq!(spawned.len(), 12);
            }
            other => panic!("expected ticked, got {other:?}"),
        }
        assert_eq!(responses.len(), 2);
    }

    #[test]
    fn test_parse_error_keeps_session_alive() {
        let responses = session(
            quiet_config(),
            HeadlessConfig::default(),
            "garbage\n\n{\"cmd\":\"hash\"}\n",
        );
        assert!(matches!(&responses[1], Response::Error { cmd: None, .. }));
        assert!(matches!(&responses[2], Response::StateHash { tick: 0, .. }));
    }

    #[test]
    fn test_goal_reaches_protected_unit() {
        let mut runner = HeadlessRunner::new(quiet_config()).unwrap();
        let ack = runner.handle(&Command::Goal { x: 600.0, y: 300.0 });
        assert_eq!(ack, vec![Response::ack("goal")]);

        runner.handle(&Command::Tick { count: 1 });
        let hero = runner.simulation().protected_id();
        let unit = runner.simulation().unit(hero).unwrap();
        assert_eq!(unit.goal, skirmish_core::math::Vec2Fixed::from_ints(600, 300));
    }

    #[test]
    fn test_goal_out_of_range_is_error() {
        let mut runner = HeadlessRunner::new(quiet_config()).unwrap();
        let responses = runner.handle(&Command::Goal { x: f64::INFINITY, y: 0.0 });
        assert!(matches!(&responses[0], Response::Error { cmd: Some(c), .. } if c == "goal"));
    }

    #[test]
    fn test_goal_off_field_is_rejected() {
        let mut runner = HeadlessRunner::new(quiet_config()).unwrap();
        let responses = runner.handle(&Command::Goal {
            x: 100_000.0,
            y: 300.0,
        });
        assert!(matches!(&responses[0], Response::Error { cmd: Some(c), .. } if c == "goal"));

        let responses = runner.handle(&Command::Tick { count: 3 });
        assert!(matches!(&responses[0], Response::Ticked { tick: 3, .. }));
        let hero = runner.simulation().protected_id();
        assert_eq!(
            runner.simulation().unit(hero).unwrap().goal,
            skirmish_core::math::Vec2Fixed::from_ints(400, 300)
        );
    }

    #[test]
    fn test_damage_unknown_unit_is_error() {
        let mut runner = HeadlessRunner::new(quiet_config()).unwrap();
        let responses = runner.handle(&Command::Damage {
            unit_id: 99,
            amount: 5,
        });
        assert!(matches!(&responses[0], Response::Error { cmd: Some(c), .. } if c == "damage"));

        let hero = runner.simulation().protected_id();
        let responses = runner.handle(&Command::Damage {
            unit_id: hero,
            amount: 5,
        });
        assert_eq!(responses, vec![Response::ack("damage")]);
        assert_eq!(runner.simulation().unit(hero).unwrap().health, 95);
    }

    #[test]
    fn test_auto_state_follows_each_tick() {
        let responses = session(
            quiet_config(),
            HeadlessConfig {
                auto_state_output: true,
            },
            "{\"cmd\":\"tick\"}\n{\"cmd\":\"tick\"}\n",
        );
        assert_eq!(responses.len(), 5);
        match &responses[4] {
            Response::State {
                tick,
                elapsed_ms,
                units,
                ..
            } => {
                assert_eq!(*tick, 2);
                assert_eq!(*elapsed_ms, 200);
                assert_eq!(units.len(), 1);
                assert!(units[0].highlighted);
            }
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn test_query_hash_matches_state_hash() {
        let mut runner = HeadlessRunner::new(SimConfig::default()).unwrap();
        runner.handle(&Command::Tick { count: 3 });
        let state_hash = match &runner.handle(&Command::Query)[0] {
            Response::State { hash, .. } => *hash,
            other => panic!("expected state, got {other:?}"),
        };
        assert_eq!(
            runner.handle(&Command::Hash),
            vec![Response::StateHash {
                tick: 3,
                hash: state_hash
            }]
        );
        assert!(!runner.is_halted());
    }
}
