//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::RangedU64ValueParser;

use crate::trend;

const DEFAULT_POLL_MS: u64 = 5_000;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_FRONTEND: &str = "frontend";

/// Rockfall risk dashboard server. Every flag can also be set through its
/// `ROCKVIEW_*` environment variable. Mesh constants (extent, elevation
/// scale, bands) live in `mesh`.
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(name = "server")]
#[command(about = "Serves rockfall risk terrain, trend and sensor status")]
pub struct Params {
    /// Samples kept in the trend window
    #[arg(
        long,
        env = "ROCKVIEW_TREND_CAPACITY",
        default_value_t = trend::CAPACITY,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub trend_capacity: usize,

    /// Sensor poll interval in milliseconds
    #[arg(
        long,
        env = "ROCKVIEW_POLL_MS",
        default_value_t = DEFAULT_POLL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_ms: u64,

    /// Seed for the sensor simulator
    #[arg(long, env = "ROCKVIEW_SEED", default_value_t = DEFAULT_SEED)]
    pub sensor_seed: u64,

    /// Address to listen on
    #[arg(long, env = "ROCKVIEW_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Path to the static frontend
    #[arg(long, env = "ROCKVIEW_FRONTEND", default_value = DEFAULT_FRONTEND)]
    pub frontend_dir: PathBuf,

    /// Terrain JSON to load at startup
    #[arg(long, env = "ROCKVIEW_TERRAIN")]
    pub terrain_path: Option<PathBuf>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            trend_capacity: trend::CAPACITY,
            poll_ms: DEFAULT_POLL_MS,
            sensor_seed: DEFAULT_SEED,
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            frontend_dir: PathBuf::from(DEFAULT_FRONTEND),
            terrain_path: None,
        }
    }
}

impl Params {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let p = Params::try_parse_from(["server", "--poll-ms", "250", "--bind", "0.0.0.0:8080"])
            .unwrap();
        assert_eq!(p.poll_interval(), Duration::from_millis(250));
        assert_eq!(p.trend_capacity, 24);
        assert_eq!(p.bind.port(), 8080);
    }

    #[test]
    fn defaults_match_parser() {
        let parsed = Params::try_parse_from(["server"]).unwrap();
        assert_eq!(parsed, Params::default());
        assert_eq!(parsed.bind.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(Params::try_parse_from(["server", "--poll-ms", "0"]).is_err());
        assert!(Params::try_parse_from(["server", "--trend-capacity", "0"]).is_err());
        assert!(Params::try_parse_from(["server", "--trend-capacity", "many"]).is_err());
        assert!(Params::try_parse_from(["server", "--bind", "nowhere"]).is_err());
    }
}
