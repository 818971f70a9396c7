//! Command-line arguments for the demo host.

use std::time::Duration;

use clap::Parser;
use shuttle_core::LoopConfig;

use crate::CliError;

/// Poll a simulated sensor on a worker loop and print readings as JSON lines
#[derive(Parser, Debug)]
#[command(name = "shuttle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loop name (shows up in logs and the final report)
    #[arg(long, default_value = "sensor")]
    pub name: String,

    /// Stop after this many polls
    #[arg(short = 'n', long)]
    pub iterations: Option<u64>,

    /// Maximum polls per second (0 = as fast as possible)
    #[arg(short, long, default_value_t = LoopConfig::FALLBACK_MAX_RATE)]
    pub rate: u32,

    /// Stop after this many milliseconds
    #[arg(short, long)]
    pub duration_ms: Option<u64>,

    /// Probability that a poll hits a recoverable glitch
    #[arg(long, default_value_t = 0.1)]
    pub glitch_rate: f64,

    /// Probability that a poll finds the sensor disconnected (fatal)
    #[arg(long, default_value_t = 0.0)]
    pub disconnect_rate: f64,

    /// Bound on the handoff queue (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub capacity: usize,

    /// Seed for the simulated sensor
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulate a sensor that is not plugged in (setup fails)
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    pub fn validate(&self) -> Result<(), CliError> {
        for (flag, value) in [
            ("--glitch-rate", self.glitch_rate),
            ("--disconnect-rate", self.disconnect_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CliError::InvalidArgument(format!(
                    "{flag} must be within 0..=1, got {value}"
                )));
            }
        }
        if self.glitch_rate + self.disconnect_rate > 1.0 {
            return Err(CliError::InvalidArgument(
                "--glitch-rate + --disconnect-rate must not exceed 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn loop_config(&self) -> LoopConfig {
        let config = LoopConfig::new(self.name.clone())
            .with_max_rate(self.rate)
            .with_queue_capacity(self.capacity);
        match self.iterations {
            Some(n) => config.with_max_iterations(n),
            None => config,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("shuttle").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_map_to_paced_unbounded_loop() {
        let cli = parse(&[]);
        let config = cli.loop_config();

        assert_eq!(config.name, "sensor");
        assert_eq!(config.max_rate.map(|r| r.get()), Some(LoopConfig::FALLBACK_MAX_RATE));
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.queue_capacity, None);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = parse(&["-n", "5", "--rate", "0", "--capacity", "4", "--name", "probe"]);
        let config = cli.loop_config();

        assert_eq!(config.name, "probe");
        assert_eq!(config.max_rate, None);
        assert_eq!(config.max_iterations, Some(5));
        assert_eq!(config.queue_capacity.map(|c| c.get()), Some(4));
    }

    #[test]
    fn rejects_out_of_range_rates() {
        assert!(parse(&["--glitch-rate", "1.5"]).validate().is_err());
        assert!(
            parse(&["--glitch-rate", "0.6", "--disconnect-rate", "0.6"])
                .validate()
                .is_err()
        );
    }
}
