//! Environment-driven service settings.

use std::net::SocketAddr;

/// Service configuration, read from `WINDROSE_*` environment variables with
/// sensible defaults. CLI flags on the binary override the bind address.
#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub default_aep_num_sim: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            default_aep_num_sim: 60,
        }
    }
}

impl Settings {
    /// Read settings from the environment. Malformed values fall back to the
    /// defaults rather than aborting startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_addr = std::env::var("WINDROSE_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);
        let default_aep_num_sim = std::env::var("WINDROSE_DEFAULT_AEP_NUM_SIM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_aep_num_sim);
        Self {
            bind_addr,
            default_aep_num_sim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 8000);
        assert_eq!(settings.default_aep_num_sim, 60);
    }
}
