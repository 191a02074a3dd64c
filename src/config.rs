use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Settings read once from the environment at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub seed: Option<u64>,
    /// Roster loaded into the session before the first request.
    pub roster: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let mut config =
            Self::from_vars(env::var("SEATING_ADDR").ok(), env::var("SEATING_SEED").ok())?;
        config.roster = env::var_os("SEATING_ROSTER").map(PathBuf::from);
        Ok(config)
    }

    fn from_vars(addr: Option<String>, seed: Option<String>) -> Result<Self, String> {
        let addr = addr.as_deref().unwrap_or(DEFAULT_ADDR);
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("invalid SEATING_ADDR {addr:?}: {e}"))?;
        let seed = seed
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| format!("invalid SEATING_SEED {s:?}: {e}"))
            })
            .transpose()?;
        Ok(Config {
            addr,
            seed,
            roster: None,
        })
    }
}
