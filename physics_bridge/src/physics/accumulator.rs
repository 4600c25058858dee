//! Physics accumulator for fixed timestep physics updates
//!
//! Frame deltas are accumulated and turned into a bounded number of fixed
//! steps. Time beyond `max_substeps` fixed steps is dropped.

use tracing::debug;

/// Physics accumulator for managing fixed timestep updates
#[derive(Debug, Clone)]
pub struct PhysicsAccumulator {
    /// Accumulated time since last physics update
    accumulator: f32,
    /// Fixed timestep for physics updates
    pub fixed_timestep: f32,
    /// Maximum number of fixed steps run for a single frame
    pub max_substeps: u32,
}

impl PhysicsAccumulator {
    /// Create a new physics accumulator with the given fixed timestep
    pub fn new(fixed_timestep: f32, max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_timestep,
            max_substeps: max_substeps.max(1),
        }
    }

    /// Add delta time to the accumulator
    /// Returns the number of physics steps to perform
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        if delta_time <= 0.0 || self.fixed_timestep <= 0.0 {
            return 0;
        }

        self.accumulator += delta_time;

        let limit = self.fixed_timestep * self.max_substeps as f32;
        if self.accumulator > limit {
            debug!(
                accumulated = self.accumulator,
                limit, "Physics accumulator over substep limit, dropping excess time"
            );
            self.accumulator = limit;
        }

        // Absorb rounding so that accumulating exactly one timestep yields one step
        let steps = ((self.accumulator / self.fixed_timestep) + 1e-4) as u32;
        let steps = steps.min(self.max_substeps);
        self.accumulator = (self.accumulator - steps as f32 * self.fixed_timestep).max(0.0);

        steps
    }

    /// Get the interpolation alpha value for rendering
    /// Alpha is in range [0, 1] representing how far between physics frames we are
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator / self.fixed_timestep
    }

    /// Reset the accumulator to zero
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Get the current accumulated time
    pub fn accumulated_time(&self) -> f32 {
        self.accumulator
    }
}

impl Default for PhysicsAccumulator {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 1)
    }
}
