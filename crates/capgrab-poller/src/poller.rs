//! Poll driver — cycles over zones until one launch succeeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use capgrab_core::{AvailabilityZone, LaunchedInstance, ProvisionRequest};
use capgrab_oci::ComputeProvider;

use crate::attempt::attempt_zone;
use crate::outcome::AttemptOutcome;
use crate::pacing::PacingState;
use crate::zones::enumerate_zones;

/// A successful launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub instance: LaunchedInstance,
    pub zone: AvailabilityZone,
    /// Time since the poller was created.
    pub elapsed: Duration,
}

/// Result of one pass over the zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Launched(Launch),
    /// Every zone was tried and none had room.
    Exhausted { attempts: usize },
    Cancelled,
}

/// Result of [`Poller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Launched(Launch),
    Cancelled,
    /// The configured cycle limit was reached.
    GaveUp { cycles: u32 },
}

/// Drives launch attempts, one zone at a time.
pub struct Poller {
    provider: Arc<dyn ComputeProvider>,
    request: ProvisionRequest,
    pacing: PacingState,
    max_cycles: Option<u32>,
    started: Instant,
    shutdown: watch::Receiver<bool>,
}

impl Poller {
    /// Create a poller. Setting `shutdown` to `true` aborts in-flight
    /// calls and sleeps.
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        request: ProvisionRequest,
        pacing: PacingState,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            provider,
            request,
            pacing,
            max_cycles: None,
            started: Instant::now(),
            shutdown,
        }
    }

    /// Stop after this many cycles. `None` retries forever.
    pub fn with_max_cycles(mut self, max_cycles: Option<u32>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn pacing(&self) -> &PacingState {
        &self.pacing
    }

    /// Attempt every zone once, in order.
    ///
    /// Sleeps the current zone interval after each failed attempt. Returns
    /// as soon as a launch succeeds.
    pub async fn run_cycle(&mut self, zones: &[AvailabilityZone]) -> CycleOutcome {
        let provider = Arc::clone(&self.provider);
        let mut attempts = 0;

        for zone in zones {
            let outcome = tokio::select! {
                biased;
                _ = cancelled(&mut self.shutdown) => return CycleOutcome::Cancelled,
                outcome = attempt_zone(provider.as_ref(), &self.request, zone, &mut self.pacing) => outcome,
            };
            attempts += 1;

            if let AttemptOutcome::Launched(instance) = outcome {
                let elapsed = self.started.elapsed();
                info!(
                    instance_id = %instance.id,
                    zone_id = %zone.id,
                    zone = %zone.name,
                    elapsed = ?elapsed,
                    attempts,
                    "instance launched"
                );
                return CycleOutcome::Launched(Launch {
                    instance,
                    zone: zone.clone(),
                    elapsed,
                });
            }

            debug!(
                zone_interval_secs = self.pacing.zone_interval_secs(),
                cycle_interval_secs = self.pacing.cycle_interval_secs(),
                "current pacing"
            );
            if !self.pause(self.pacing.zone_interval()).await {
                return CycleOutcome::Cancelled;
            }
        }

        CycleOutcome::Exhausted { attempts }
    }

    /// Poll until success, cancellation, or the cycle limit.
    ///
    /// A failed zone enumeration skips the cycle; it is retried after the
    /// cycle interval like any other unsuccessful pass.
    pub async fn run(&mut self) -> PollOutcome {
        let provider = Arc::clone(&self.provider);
        let mut cycles: u32 = 0;

        info!(
            zone_interval_secs = self.pacing.zone_interval_secs(),
            cycle_interval_secs = self.pacing.cycle_interval_secs(),
            max_cycles = ?self.max_cycles,
            "poller started"
        );

        if self.max_cycles == Some(0) {
            warn!("cycle limit is zero, nothing to do");
            return PollOutcome::GaveUp { cycles };
        }

        loop {
            cycles += 1;

            let enumerated = tokio::select! {
                biased;
                _ = cancelled(&mut self.shutdown) => return PollOutcome::Cancelled,
                zones = enumerate_zones(provider.as_ref(), &self.request.compartment_id) => zones,
            };

            match enumerated {
                Ok(zones) => {
                    if zones.is_empty() {
                        warn!(cycle = cycles, "provider returned no availability zones");
                    }
                    match self.run_cycle(&zones).await {
                        CycleOutcome::Launched(launch) => return PollOutcome::Launched(launch),
                        CycleOutcome::Cancelled => return PollOutcome::Cancelled,
                        CycleOutcome::Exhausted { attempts } => {
                            info!(cycle = cycles, attempts, "no zone had capacity this cycle");
                        }
                    }
                }
                Err(e) => {
                    error!(cycle = cycles, error = %e, "zone enumeration failed");
                }
            }

            if self.max_cycles.is_some_and(|max| cycles >= max) {
                warn!(cycles, "cycle limit reached, giving up");
                return PollOutcome::GaveUp { cycles };
            }

            if !self.pause(self.pacing.cycle_interval()).await {
                return PollOutcome::Cancelled;
            }
        }
    }

    /// Sleep unless shut down first. Returns `false` on shutdown.
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Resolve once shutdown is requested. Pends forever if the sender is gone.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
