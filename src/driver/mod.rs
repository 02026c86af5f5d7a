//! Host-side mining loop
//!
//! Drives a [`RegisterBank`] through one search: reset pulse, program the
//! nonce and target, start, then poll STATUS until a solution latches or the
//! wall-clock budget runs out.

use std::time::{Duration, Instant};

use serde::Serialize;
use sha3_miner_core::{MinerStatus, Register};
use tracing::{debug, info, warn};

use crate::config::MinerConfig;
use crate::device::RegisterBank;
use crate::error::DeviceError;

/// Process exit code when a solution was found
pub const EXIT_FOUND: i32 = 0;

/// Process exit code when the run timed out
pub const EXIT_TIMED_OUT: i32 = 1;

/// Process exit code when the device could not be driven
pub const EXIT_DEVICE_ERROR: i32 = 2;

/// Upper bound on STATUS reads while waiting for the block to settle
const STOP_WAIT_POLLS: u32 = 1000;

/// Time source for timeouts and rate reporting
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningOutcome {
    Found { nonce: u32 },
    TimedOut,
}

/// Result of one mining run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningReport {
    pub outcome: MiningOutcome,
    /// Hashes the device reports having compared
    pub hash_count: u64,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl MiningReport {
    /// Winning nonce, if any
    pub fn solution(&self) -> Option<u32> {
        match self.outcome {
            MiningOutcome::Found { nonce } => Some(nonce),
            MiningOutcome::TimedOut => None,
        }
    }

    /// Hashes per second over the run
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.hash_count as f64 / secs
        } else {
            0.0
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            MiningOutcome::Found { .. } => EXIT_FOUND,
            MiningOutcome::TimedOut => EXIT_TIMED_OUT,
        }
    }
}

/// Polling driver for one miner device
pub struct MiningDriver<B, C = SystemClock> {
    bank: B,
    config: MinerConfig,
    clock: C,
}

impl<B: RegisterBank> MiningDriver<B> {
    pub fn new(bank: B, config: MinerConfig) -> Self {
        Self::with_clock(bank, config, SystemClock)
    }
}

impl<B: RegisterBank, C: Clock> MiningDriver<B, C> {
    pub fn with_clock(bank: B, config: MinerConfig, clock: C) -> Self {
        Self {
            bank,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Run one search to completion or timeout
    pub async fn run(&self) -> Result<MiningReport, DeviceError> {
        let cfg = &self.config;

        self.pulse_stop().await?;
        let status = self.settle(|s| s == MinerStatus::Idle).await?;
        if status != MinerStatus::Idle {
            warn!(%status, "miner not idle after reset");
        }

        self.bank.write_register(Register::InitialNonce, cfg.initial_nonce)?;
        self.bank.write_register(Register::Target, cfg.target)?;
        self.bank.write_register(Register::Start, 1)?;

        info!(
            initial_nonce = cfg.initial_nonce,
            threshold = cfg.target,
            timeout = ?cfg.timeout,
            "mining started"
        );

        let started = self.clock.now();
        let mut polls: u64 = 0;

        loop {
            let status = self.bank.status()?;
            match status {
                MinerStatus::Found => return self.collect_solution(started).await,
                MinerStatus::Unknown(raw) => warn!(raw, "unrecognized miner status"),
                _ => {}
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= cfg.timeout {
                return self.stop_after_timeout(started).await;
            }

            polls += 1;
            if cfg.status_report_every > 0 && polls % cfg.status_report_every as u64 == 0 {
                let hashes = self.bank.hash_count()?;
                info!(%status, hashes, elapsed = ?elapsed, "mining");
            }

            tokio::time::sleep(cfg.poll_interval).await;
        }
    }

    /// STOP=1, wait, STOP=0: clears any latched result from a previous run
    async fn pulse_stop(&self) -> Result<(), DeviceError> {
        self.bank.write_register(Register::Stop, 1)?;
        tokio::time::sleep(self.config.poll_interval).await;
        self.bank.write_register(Register::Stop, 0)
    }

    /// Poll STATUS until `done` holds or the poll budget runs out
    async fn settle(&self, done: impl Fn(MinerStatus) -> bool) -> Result<MinerStatus, DeviceError> {
        let mut status = self.bank.status()?;
        for _ in 0..STOP_WAIT_POLLS {
            if done(status) {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
            status = self.bank.status()?;
        }
        Ok(status)
    }

    async fn collect_solution(&self, started: Instant) -> Result<MiningReport, DeviceError> {
        let nonce = self.bank.read_register(Register::ResultNonce)?;
        let hash_count = self.bank.hash_count()?;
        let elapsed = self.clock.now().saturating_duration_since(started);

        self.pulse_stop().await?;

        info!(nonce, hash_count, ?elapsed, "solution found");
        Ok(MiningReport {
            outcome: MiningOutcome::Found { nonce },
            hash_count,
            elapsed,
        })
    }

    async fn stop_after_timeout(&self, started: Instant) -> Result<MiningReport, DeviceError> {
        self.bank.write_register(Register::Stop, 1)?;

        let status = self.settle(|s| s != MinerStatus::Running).await?;
        if status == MinerStatus::Running {
            warn!("miner still running after stop request");
        }

        // A solution can latch between the last poll and the stop request
        let found = if status == MinerStatus::Found {
            Some(self.bank.read_register(Register::ResultNonce)?)
        } else {
            None
        };
        let hash_count = self.bank.hash_count()?;
        let elapsed = self.clock.now().saturating_duration_since(started);

        self.bank.write_register(Register::Stop, 0)?;

        let outcome = match found {
            Some(nonce) => {
                info!(nonce, hash_count, "solution latched while stopping");
                MiningOutcome::Found { nonce }
            }
            None => {
                debug!(%status, "miner halted");
                info!(hash_count, ?elapsed, "timed out without a solution");
                MiningOutcome::TimedOut
            }
        };

        Ok(MiningReport {
            outcome,
            hash_count,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha3_miner_core::RegisterLayout;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Bank that replays scripted STATUS values and records every write
    struct ScriptedBank {
        statuses: Mutex<VecDeque<u32>>,
        last_status: u32,
        writes: Mutex<Vec<(Register, u32)>>,
        result_nonce: u32,
        hash_count: u64,
    }

    impl ScriptedBank {
        fn new(statuses: &[u32], last_status: u32) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                last_status,
                writes: Mutex::new(Vec::new()),
                result_nonce: 0xCAFE,
                hash_count: 0x1_0000_0002,
            }
        }

        fn writes(&self) -> Vec<(Register, u32)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl RegisterBank for ScriptedBank {
        fn layout(&self) -> RegisterLayout {
            RegisterLayout::Canonical
        }

        fn read(&self, offset: u32) -> Result<u32, DeviceError> {
            let register = RegisterLayout::Canonical.decode(offset).unwrap();
            Ok(match register {
                Register::Status => self
                    .statuses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(self.last_status),
                Register::ResultNonce => self.result_nonce,
                Register::HashCountLow => self.hash_count as u32,
                Register::HashCountHigh => (self.hash_count >> 32) as u32,
                _ => 0,
            })
        }

        fn write(&self, offset: u32, value: u32) -> Result<(), DeviceError> {
            let register = RegisterLayout::Canonical.decode(offset).unwrap();
            self.writes.lock().unwrap().push((register, value));
            Ok(())
        }
    }

    /// Advances by a fixed step on every reading
    struct StepClock {
        now: Mutex<Instant>,
        step: Duration,
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            let mut now = self.now.lock().unwrap();
            *now += self.step;
            *now
        }
    }

    fn quick_config() -> MinerConfig {
        MinerConfig {
            initial_nonce: 5,
            target: 77,
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
            status_report_every: 2,
            ..MinerConfig::default()
        }
    }

    const IDLE: u32 = 0;
    const RUNNING: u32 = 1;
    const FOUND: u32 = 2;
    const STOPPED: u32 = 3;

    #[tokio::test]
    async fn test_found_run_writes_protocol() {
        let bank = ScriptedBank::new(&[IDLE, IDLE, RUNNING, RUNNING, FOUND], FOUND);
        let driver = MiningDriver::new(&bank, quick_config());

        let report = driver.run().await.unwrap();
        assert_eq!(report.outcome, MiningOutcome::Found { nonce: 0xCAFE });
        assert_eq!(report.solution(), Some(0xCAFE));
        assert_eq!(report.hash_count, 0x1_0000_0002);
        assert_eq!(report.exit_code(), EXIT_FOUND);

        assert_eq!(
            bank.writes(),
            vec![
                (Register::Stop, 1),
                (Register::Stop, 0),
                (Register::InitialNonce, 5),
                (Register::Target, 77),
                (Register::Start, 1),
                (Register::Stop, 1),
                (Register::Stop, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_stops_device() {
        let bank = ScriptedBank::new(&[IDLE, RUNNING, RUNNING, RUNNING, RUNNING], STOPPED);
        let clock = StepClock {
            now: Mutex::new(Instant::now()),
            step: Duration::from_millis(1),
        };
        let config = MinerConfig {
            timeout: Duration::from_millis(3),
            ..quick_config()
        };
        let driver = MiningDriver::with_clock(&bank, config, clock);

        let report = driver.run().await.unwrap();
        assert_eq!(report.outcome, MiningOutcome::TimedOut);
        assert_eq!(report.exit_code(), EXIT_TIMED_OUT);
        assert_eq!(report.solution(), None);

        let writes = bank.writes();
        assert_eq!(&writes[writes.len() - 2..], &[(Register::Stop, 1), (Register::Stop, 0)]);
    }

    #[tokio::test]
    async fn test_solution_latched_during_stop_is_reported() {
        let bank = ScriptedBank::new(&[IDLE, RUNNING], FOUND);
        let config = MinerConfig {
            timeout: Duration::ZERO,
            ..quick_config()
        };
        let driver = MiningDriver::new(&bank, config);

        let report = driver.run().await.unwrap();
        assert_eq!(report.outcome, MiningOutcome::Found { nonce: 0xCAFE });
        assert_eq!(report.exit_code(), EXIT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_status_is_not_fatal() {
        let bank = ScriptedBank::new(&[IDLE, RUNNING, 7, 0xFFFF_FFFF, RUNNING], FOUND);
        let driver = MiningDriver::new(&bank, quick_config());

        let report = driver.run().await.unwrap();
        assert_eq!(report.solution(), Some(0xCAFE));
    }

    #[test]
    fn test_hash_rate() {
        let report = MiningReport {
            outcome: MiningOutcome::TimedOut,
            hash_count: 5_000,
            elapsed: Duration::from_millis(500),
        };
        assert!((report.hash_rate() - 10_000.0).abs() < 1e-9);

        let instant = MiningReport {
            elapsed: Duration::ZERO,
            ..report
        };
        assert_eq!(instant.hash_rate(), 0.0);
    }

    #[test]
    fn test_report_json() {
        let report = MiningReport {
            outcome: MiningOutcome::Found { nonce: 42 },
            hash_count: 43,
            elapsed: Duration::from_secs(2),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["found"]["nonce"], 42);
        assert_eq!(json["elapsed"], "2s");
    }
}
