//! Simulator: owns the memory controller and drives it cycle by cycle.
//!
//! All simulated state is owned here and passed explicitly; there are no
//! process-wide components. The simulator also runs the deadlock heartbeat:
//! if requests are pending but none completes for a whole threshold window,
//! the controller dumps its per-channel state and the run aborts.

use crate::common::constants::HANG_DETECTION_THRESHOLD;
use crate::common::error::{ConfigError, SimError};
use crate::config::MemoryConfig;
use crate::mem::controller::MemoryController;

/// Top-level simulator: the memory controller plus the shared cycle base.
#[derive(Debug)]
pub struct Simulator {
    /// The memory system under simulation.
    pub memory: MemoryController,
    hang_threshold: u64,
    last_completed: u64,
    last_progress_cycle: u64,
}

impl Simulator {
    /// Creates a simulator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is inconsistent.
    pub fn new(config: &MemoryConfig) -> Result<Self, ConfigError> {
        Self::with_hang_threshold(config, HANG_DETECTION_THRESHOLD)
    }

    /// Creates a simulator with a custom deadlock-heartbeat window.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is inconsistent.
    pub fn with_hang_threshold(
        config: &MemoryConfig,
        hang_threshold: u64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            memory: MemoryController::new(config)?,
            hang_threshold,
            last_completed: 0,
            last_progress_cycle: 0,
        })
    }

    /// The cycle the next tick will simulate.
    pub const fn cycle(&self) -> u64 {
        self.memory.cycle()
    }

    /// Advances the simulation by one cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Deadlock`] when requests are pending but none has
    /// completed within the heartbeat window.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.memory.operate();
        let now = self.memory.cycle();

        let completed = self.memory.completed_requests();
        if completed != self.last_completed || self.memory.pending_requests() == 0 {
            self.last_completed = completed;
            self.last_progress_cycle = now;
            return Ok(());
        }

        let stalled = now - self.last_progress_cycle;
        if stalled >= self.hang_threshold {
            self.memory.dump_state();
            return Err(SimError::Deadlock {
                cycle: now,
                stalled,
                pending: self.memory.pending_requests(),
            });
        }
        Ok(())
    }

    /// Runs for the given number of cycles.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Deadlock`] when the heartbeat fires.
    pub fn run(&mut self, cycles: u64) -> Result<(), SimError> {
        for _ in 0..cycles {
            self.tick()?;
        }
        Ok(())
    }

    /// Runs until no request is pending, up to `max_cycles`.
    ///
    /// Returns the cycle count reached.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Deadlock`] when the heartbeat fires before the
    /// queues drain.
    pub fn run_until_idle(&mut self, max_cycles: u64) -> Result<u64, SimError> {
        while self.memory.pending_requests() > 0 && self.cycle() < max_cycles {
            self.tick()?;
        }
        Ok(self.cycle())
    }
}
