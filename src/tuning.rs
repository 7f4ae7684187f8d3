//! # Tuning Controller
//!
//! Calibrates assigned note blocks to their keys using sound feedback.
//!
//! ## State Machine
//! ```text
//! Idle ──> Probing ──> Confirming ──┬──> Tuned
//!             │            │        └──> Incrementing ──> ... ──> Tuned
//!             └────────────┴──────────────────┴─────────> Failed
//! ```
//! - **Idle**: key known, current step unknown. Stale observations are dropped.
//! - **Probing**: play the block once.
//! - **Confirming**: wait for a sound from the same position and family, then
//!   compute how many increments reach the target step.
//! - **Incrementing**: one increment, then the settle delay, until none remain.
//!
//! Any rejected action, an expired probe, or a closed observation stream ends
//! in **Failed**. Nothing is retried.
//!
//! ## Sequential Tuning
//! Observations carry no request id, so only one block may be probed at a time.
//! [`Tuner::tune_all`] tunes blocks one after another and stops at the first
//! failure, leaving already tuned blocks as they are.

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::{NoteblockError, Result};
use crate::instrument::{tuning_step_of, STEP_COUNT};
use crate::world::{Observations, PhysicalBlock, World};

/// Where a block is in its calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuningState {
    Idle,
    Probing,
    Confirming,
    Incrementing { remaining: u8 },
    Tuned,
    Failed(String),
}

impl fmt::Display for TuningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningState::Idle => f.write_str("idle"),
            TuningState::Probing => f.write_str("probing"),
            TuningState::Confirming => f.write_str("confirming"),
            TuningState::Incrementing { remaining } => write!(f, "incrementing ({} left)", remaining),
            TuningState::Tuned => f.write_str("tuned"),
            TuningState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of a successful calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuneReport {
    /// Step the block reported when probed.
    pub reported: u8,
    /// Step required by the assigned key.
    pub target: u8,
    /// Increment actions issued.
    pub increments: u8,
}

/// Increments needed to move a block from `reported` to `target` on the cyclic dial.
///
/// # Example
/// ```
/// use noteblock::tuning::tuning_distance;
///
/// assert_eq!(tuning_distance(10, 5), 5);
/// assert_eq!(tuning_distance(5, 10), 20); // wraps past step 24
/// assert_eq!(tuning_distance(7, 7), 0);
/// ```
pub fn tuning_distance(target: u8, reported: u8) -> u8 {
    (target as i16 - reported as i16).rem_euclid(STEP_COUNT as i16) as u8
}

/// Drives the tuning state machine against a world.
pub struct Tuner<'a, W: World + ?Sized> {
    world: &'a mut W,
    observations: &'a mut Observations,
    settle_delay: Duration,
    probe_timeout: Duration,
}

impl<'a, W: World + ?Sized> Tuner<'a, W> {
    pub fn new(world: &'a mut W, observations: &'a mut Observations, config: &PlayerConfig) -> Self {
        Self {
            world,
            observations,
            settle_delay: config.settle_delay(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Tune every block in order, stopping at the first failure.
    pub async fn tune_all(&mut self, blocks: &mut [PhysicalBlock]) -> Result<Vec<TuneReport>> {
        let mut reports = Vec::with_capacity(blocks.len());
        for block in blocks.iter_mut() {
            reports.push(self.tune(block).await?);
        }
        info!("Tuned {} note blocks", reports.len());
        Ok(reports)
    }

    /// Bring one block to the step its assigned key needs.
    ///
    /// On success `block.tone` holds the target step.
    pub async fn tune(&mut self, block: &mut PhysicalBlock) -> Result<TuneReport> {
        let position = block.position;
        let target = match block.assigned_key {
            Some(key) => tuning_step_of(key).ok_or(NoteblockError::Unplayable(key))?,
            None => {
                return Err(NoteblockError::Tuning {
                    position,
                    reason: "no key assigned".to_string(),
                });
            }
        };

        let mut state = TuningState::Idle;
        let mut reported = 0u8;
        let mut increments = 0u8;

        loop {
            debug!("Block at {}: {}", position, state);
            state = match state {
                TuningState::Idle => {
                    self.drain_stale();
                    TuningState::Probing
                }
                TuningState::Probing => match self.world.dispatch_play(position) {
                    Ok(()) => TuningState::Confirming,
                    Err(e) => TuningState::Failed(e.to_string()),
                },
                TuningState::Confirming => match self.await_observation(block).await {
                    Ok(step) => {
                        reported = step;
                        match tuning_distance(target, step) {
                            0 => TuningState::Tuned,
                            remaining => TuningState::Incrementing { remaining },
                        }
                    }
                    Err(reason) => TuningState::Failed(reason),
                },
                TuningState::Incrementing { remaining } => {
                    match self.world.dispatch_increment(position) {
                        Ok(()) => {
                            increments += 1;
                            sleep(self.settle_delay).await;
                            match remaining - 1 {
                                0 => TuningState::Tuned,
                                remaining => TuningState::Incrementing { remaining },
                            }
                        }
                        Err(e) => TuningState::Failed(e.to_string()),
                    }
                }
                TuningState::Tuned => {
                    block.tone = Some(target);
                    info!(
                        "Tuned {} block at {} for key {:?}: step {} -> {} in {} increments",
                        block.family, position, block.assigned_key, reported, target, increments
                    );
                    return Ok(TuneReport {
                        reported,
                        target,
                        increments,
                    });
                }
                TuningState::Failed(reason) => {
                    warn!("Tuning failed for block at {}: {}", position, reason);
                    return Err(NoteblockError::Tuning { position, reason });
                }
            };
        }
    }

    /// Drop observations left over from earlier plays so they cannot be
    /// mistaken for the answer to the next probe.
    fn drain_stale(&mut self) {
        let mut dropped = 0;
        while self.observations.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Dropped {} stale observations", dropped);
        }
    }

    /// Wait for a sound from `block`, ignoring every other block.
    async fn await_observation(&mut self, block: &PhysicalBlock) -> std::result::Result<u8, String> {
        let deadline = Instant::now() + self.probe_timeout;
        loop {
            let heard = match timeout_at(deadline, self.observations.recv()).await {
                Ok(Some(heard)) => heard,
                Ok(None) => return Err("observation stream closed".to_string()),
                Err(_) => {
                    return Err(format!(
                        "no matching sound within {} ms",
                        self.probe_timeout.as_millis()
                    ))
                }
            };

            if heard.position != block.position || heard.family() != Some(block.family) {
                debug!(
                    "Ignoring '{}' at {} while waiting on {}",
                    heard.sound, heard.position, block.position
                );
                continue;
            }
            if heard.step >= STEP_COUNT {
                return Err(format!("block reported step {} outside the dial", heard.step));
            }
            return Ok(heard.step);
        }
    }
}
