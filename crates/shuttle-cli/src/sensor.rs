//! Simulated sensor: the unit of work the demo loop polls.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use shuttle_core::{Fault, LoopBody};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub seq: u64,
    pub celsius: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SensorFault {
    #[error("transient glitch on read {0}")]
    Glitch(u64),

    #[error("sensor disconnected after {0} reads")]
    Disconnected(u64),
}

pub struct SimulatedSensor {
    rng: StdRng,
    seq: u64,
    celsius: f64,
    glitch_rate: f64,
    disconnect_rate: f64,
    offline: bool,
}

impl SimulatedSensor {
    pub fn new(seed: Option<u64>, glitch_rate: f64, disconnect_rate: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            seq: 0,
            celsius: 21.0,
            glitch_rate,
            disconnect_rate,
            offline: false,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

#[async_trait]
impl LoopBody for SimulatedSensor {
    type Item = Reading;

    async fn setup(&mut self) -> bool {
        if self.offline {
            tracing::warn!("sensor not found");
            return false;
        }
        tracing::info!(celsius = self.celsius, "sensor connected");
        true
    }

    async fn step(&mut self) -> Result<Reading, Fault> {
        self.seq += 1;

        let roll: f64 = self.rng.gen_range(0.0..1.0);
        if roll < self.disconnect_rate {
            return Err(SensorFault::Disconnected(self.seq).into());
        }
        if roll < self.disconnect_rate + self.glitch_rate {
            return Err(SensorFault::Glitch(self.seq).into());
        }

        // ランダムウォーク
        self.celsius += self.rng.gen_range(-0.25..0.25);
        Ok(Reading {
            seq: self.seq,
            celsius: (self.celsius * 100.0).round() / 100.0,
        })
    }

    async fn handle_error(&mut self, fault: Fault) -> Result<(), Fault> {
        if matches!(fault.downcast_ref::<SensorFault>(), Some(SensorFault::Glitch(_))) {
            Ok(())
        } else {
            Err(fault)
        }
    }
}
