//! Reference avoidance oracle.
//!
//! A deterministic separation solver. Each agent keeps its preferred
//! velocity, clamped to its speed cap, plus a push-out term for every
//! overlapping neighbour. It does not look ahead the way velocity-obstacle
//! solvers do; it only guarantees that overlaps are resolved over the
//! following steps and that agents stay inside the field.

use tracing::error;

use super::{AvoidanceOracle, SlotHandle};
use crate::config::{AvoidanceConfig, FieldConfig};
use crate::math::{Fixed, Vec2Fixed};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Agent {
    position: Vec2Fixed,
    velocity: Vec2Fixed,
    preferred_velocity: Vec2Fixed,
    max_speed: Fixed,
    radius: Fixed,
}

impl Agent {
    fn new(position: Vec2Fixed, radius: Fixed) -> Self {
        Self {
            position,
            velocity: Vec2Fixed::ZERO,
            preferred_velocity: Vec2Fixed::ZERO,
            max_speed: Fixed::ZERO,
            radius,
        }
    }
}

/// Separation-based [`AvoidanceOracle`].
#[derive(Debug, Clone)]
pub struct LocalAvoidance {
    agents: Vec<Agent>,
    params: AvoidanceConfig,
    bounds: Option<FieldConfig>,
    default_radius: Fixed,
    steps: u64,
}

impl LocalAvoidance {
    /// Create an empty oracle.
    ///
    /// `bounds` is ignored unless `params.enforce_bounds` is set.
    #[must_use]
    pub fn new(params: AvoidanceConfig, bounds: FieldConfig, default_radius: Fixed) -> Self {
        Self {
            agents: Vec::new(),
            params,
            bounds: params.enforce_bounds.then_some(bounds),
            default_radius,
            steps: 0,
        }
    }

    /// Number of completed [`step`](AvoidanceOracle::step) calls.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Position the oracle holds for `slot`.
    #[must_use]
    pub fn agent_position(&self, slot: SlotHandle) -> Option<Vec2Fixed> {
        self.agents.get(slot.index()).map(|a| a.position)
    }

    fn agent_mut(&mut self, slot: SlotHandle) -> Option<&mut Agent> {
        let count = self.agents.len();
        let agent = self.agents.get_mut(slot.index());
        if agent.is_none() {
            error!(slot = slot.index(), count, "Oracle access to vacant slot");
        }
        agent
    }

    /// Velocity for agent `i` computed from the pre-step state.
    fn solve(&self, i: usize) -> Vec2Fixed {
        let agent = &self.agents[i];
        let mut velocity = agent.preferred_velocity.clamp_length(agent.max_speed);
        let neighbor_dist_sq = self.params.neighbor_dist.saturating_mul(self.params.neighbor_dist);
        let mut considered = 0;

        for (j, other) in self.agents.iter().enumerate() {
            if i == j {
                continue;
            }
            if considered >= self.params.max_neighbors {
                break;
            }
            let offset = agent.position - other.position;
            let dist_sq = offset.length_squared();
            if dist_sq >= neighbor_dist_sq {
                continue;
            }
            considered += 1;

            let combined = agent.radius + other.radius;
            if dist_sq >= combined.saturating_mul(combined) {
                continue;
            }

            // Coincident agents separate along x, lower slot going left
            let (direction, depth) = if dist_sq == Fixed::ZERO {
                let sign = if i < j { -Fixed::ONE } else { Fixed::ONE };
                (Vec2Fixed::new(sign, Fixed::ZERO), combined)
            } else {
                let dist = offset.length();
                (offset.normalize(), combined - dist)
            };
            // Each agent resolves half the overlap within one step
            let push = depth / (self.params.time_step * Fixed::from_num(2));
            velocity += direction.scale(push);
        }

        let velocity = velocity.clamp_length(agent.max_speed);
        self.keep_inside(agent, velocity)
    }

    fn keep_inside(&self, agent: &Agent, mut velocity: Vec2Fixed) -> Vec2Fixed {
        let Some(bounds) = self.bounds else {
            return velocity;
        };
        let next = agent.position + velocity.scale(self.params.time_step);
        let (min_x, max_x) = (agent.radius, bounds.width - agent.radius);
        let (min_y, max_y) = (agent.radius, bounds.height - agent.radius);

        if (next.x < min_x && velocity.x < Fixed::ZERO) || (next.x > max_x && velocity.x > Fixed::ZERO)
        {
            velocity.x = Fixed::ZERO;
        }
        if (next.y < min_y && velocity.y < Fixed::ZERO) || (next.y > max_y && velocity.y > Fixed::ZERO)
        {
            velocity.y = Fixed::ZERO;
        }
        velocity
    }
}

impl AvoidanceOracle for LocalAvoidance {
    fn add_agent(&mut self, position: Vec2Fixed) -> SlotHandle {
        self.agents.push(Agent::new(position, self.default_radius));
        SlotHandle::new(self.agents.len() - 1)
    }

    fn remove_agent(&mut self, slot: SlotHandle) -> Option<SlotHandle> {
        let index = slot.index();
        if index >= self.agents.len() {
            error!(slot = index, count = self.agents.len(), "Removal of vacant slot");
            return None;
        }
        let last = self.agents.len() - 1;
        self.agents.swap_remove(index);
        (index != last).then_some(SlotHandle::new(last))
    }

    fn set_agent_position(&mut self, slot: SlotHandle, position: Vec2Fixed) {
        if let Some(agent) = self.agent_mut(slot) {
            agent.position = position;
        }
    }

    fn set_agent_preferred_velocity(&mut self, slot: SlotHandle, velocity: Vec2Fixed) {
        if let Some(agent) = self.agent_mut(slot) {
            agent.preferred_velocity = velocity;
        }
    }

    fn set_agent_max_speed(&mut self, slot: SlotHandle, speed: Fixed) {
        if let Some(agent) = self.agent_mut(slot) {
            agent.max_speed = speed;
        }
    }

    fn set_agent_radius(&mut self, slot: SlotHandle, radius: Fixed) {
        if let Some(agent) = self.agent_mut(slot) {
            agent.radius = radius;
        }
    }

    fn agent_velocity(&self, slot: SlotHandle) -> Vec2Fixed {
        self.agents
            .get(slot.index())
            .map_or(Vec2Fixed::ZERO, |a| a.velocity)
    }

    fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn step(&mut self) {
        let velocities: Vec<Vec2Fixed> = (0..self.agents.len()).map(|i| self.solve(i)).collect();
        let dt = self.params.time_step;
        for (agent, velocity) in self.agents.iter_mut().zip(velocities) {
            agent.velocity = velocity;
            agent.position += velocity.scale(dt);
        }
        self.steps += 1;
    }
}
