pub const SID_ENV: &str = "CONFIGURATOR_SID";
pub const OUTBOUND_QUEUE_CAP_ENV: &str = "CONFIGURATOR_OUTBOUND_QUEUE_CAP";
pub const LOG_ENV: &str = "CONFIGURATOR_LOG";

pub const DEFAULT_SID: &str = "S1";
pub const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub sid: String,
    pub outbound_queue_cap: usize,
    pub log_filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sid: DEFAULT_SID.to_string(),
            outbound_queue_cap: DEFAULT_OUTBOUND_QUEUE_CAP,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or unusable values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let sid = lookup(SID_ENV)
            .map(|raw| raw.trim().to_string())
            .filter(|sid| !sid.is_empty())
            .unwrap_or(defaults.sid);

        let outbound_queue_cap = lookup(OUTBOUND_QUEUE_CAP_ENV)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.outbound_queue_cap);

        let log_filter = lookup(LOG_ENV)
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Self {
            sid,
            outbound_queue_cap,
            log_filter,
        }
    }
}
