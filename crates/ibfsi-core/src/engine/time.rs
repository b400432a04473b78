use super::config::{ConfigError, TimeConfig};

/// Remaining time below which a run counts as finished.
pub const END_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeState {
    Running,
    Finished,
}

/// Discrete clock advancing from `t = 0` to the end time in fixed steps.
///
/// The last step is shortened so that the current time never exceeds the end
/// time. Once the remaining time drops to [`END_TOLERANCE`] or less the clock
/// snaps to the end time and stops.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeController {
    end: f64,
    delta_t: f64,
    current: f64,
    timestep: usize,
    output_interval: usize,
    refinement_interval: usize,
    state: TimeState,
}

impl TimeController {
    pub fn new(config: &TimeConfig) -> Result<Self, ConfigError> {
        if !(config.end_time.is_finite() && config.end_time > 0.0) {
            return Err(ConfigError::Invalid {
                parameter: "end_time",
                reason: format!("must be positive, got {}", config.end_time),
            });
        }
        if !(config.time_step.is_finite() && config.time_step > 0.0) {
            return Err(ConfigError::Invalid {
                parameter: "time_step",
                reason: format!("must be positive, got {}", config.time_step),
            });
        }
        if config.output_interval == 0 || config.refinement_interval == 0 {
            return Err(ConfigError::Invalid {
                parameter: "output_interval/refinement_interval",
                reason: "intervals must be at least 1".to_string(),
            });
        }
        Ok(Self {
            end: config.end_time,
            delta_t: config.time_step,
            current: 0.0,
            timestep: 0,
            output_interval: config.output_interval,
            refinement_interval: config.refinement_interval,
            state: TimeState::Running,
        })
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Number of completed increments.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn state(&self) -> TimeState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimeState::Finished
    }

    /// Number of increments needed to reach the end time from `t = 0`.
    pub fn total_steps(&self) -> usize {
        let steps = ((self.end - END_TOLERANCE) / self.delta_t).ceil();
        (steps.max(1.0)) as usize
    }

    pub fn time_to_output(&self) -> bool {
        self.timestep % self.output_interval == 0
    }

    pub fn time_to_refine(&self) -> bool {
        self.timestep % self.refinement_interval == 0
    }

    /// Advances by one step. Has no effect once finished.
    pub fn increment(&mut self) {
        if self.is_finished() {
            return;
        }
        self.current = (self.current + self.delta_t).min(self.end);
        self.timestep += 1;
        if self.end - self.current <= END_TOLERANCE {
            self.current = self.end;
            self.state = TimeState::Finished;
        }
    }
}
