/// Number of input lines kept by `history`; the oldest is evicted first.
pub const HISTORY_CAPACITY: usize = 100;

/// Number of background jobs the registry can track. Jobs launched once it
/// is full keep running but are not managed.
pub const JOB_CAPACITY: usize = 100;

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "MINISHELL_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub history_capacity: usize,
    pub job_capacity: usize,
    pub log_filter: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            job_capacity: JOB_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self::from_log_var(std::env::var(LOG_ENV).ok())
    }

    fn from_log_var(value: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = value.filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_capacities() {
        let config = ShellConfig::default();
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.job_capacity, 100);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn log_filter_from_variable() {
        let config = ShellConfig::from_log_var(Some("minishell=debug".into()));
        assert_eq!(config.log_filter, "minishell=debug");
    }

    #[test]
    fn blank_log_variable_keeps_default() {
        let config = ShellConfig::from_log_var(Some("  ".into()));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(ShellConfig::from_log_var(None), ShellConfig::default());
    }
}
