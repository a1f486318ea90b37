use crate::execution::SettlementPolicy;
use crate::queue::OrderingPolicy;
use crate::utils::{
    BridgeConfigSection, LoadConfigError, load_from_file, load_from_file_sync, DEFAULT_MAX_PENDING, GAS_PER_PAYLOAD_BYTE,
    L1_TX_INTRINSIC_GAS, MAX_CALLDATA_BYTES, MAX_EXECUTION_LIMIT, MAX_FACTORY_DEPS, MAX_FACTORY_DEP_BYTES,
    MAX_PAYLOAD_LENGTH, PRIORITY_EXPIRATION_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Pricing parameters for the base cost of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Gas charged for every request regardless of its execution limit
    pub intrinsic_gas: u64,
    /// Gas charged per byte of calldata and dependency bytecode
    pub gas_per_payload_byte: u64,
    /// Largest payload length the calculator accepts
    pub max_payload_length: usize,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            intrinsic_gas: L1_TX_INTRINSIC_GAS,
            gas_per_payload_byte: GAS_PER_PAYLOAD_BYTE,
            max_payload_length: MAX_PAYLOAD_LENGTH,
        }
    }
}

impl BridgeConfigSection for FeeConfig {
    const SECTION: &'static str = "fee";
}

/// Size and execution limits enforced when a request is submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub max_calldata_bytes: usize,
    pub max_factory_dep_bytes: usize,
    pub max_factory_deps: usize,
    pub max_execution_limit: u64,
    /// Seconds after submission at which a pending request counts as overdue
    pub priority_expiration_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_calldata_bytes: MAX_CALLDATA_BYTES,
            max_factory_dep_bytes: MAX_FACTORY_DEP_BYTES,
            max_factory_deps: MAX_FACTORY_DEPS,
            max_execution_limit: MAX_EXECUTION_LIMIT,
            priority_expiration_secs: PRIORITY_EXPIRATION_SECS,
        }
    }
}

impl IntakeConfig {
    /// Largest payload (calldata plus every dependency) intake can let through
    pub fn max_accepted_payload(&self) -> usize {
        self.max_calldata_bytes.saturating_add(self.max_factory_deps.saturating_mul(self.max_factory_dep_bytes))
    }
}

impl BridgeConfigSection for IntakeConfig {
    const SECTION: &'static str = "intake";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub ordering: OrderingPolicy,
    pub max_pending: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { ordering: OrderingPolicy::Fifo, max_pending: DEFAULT_MAX_PENDING }
    }
}

impl BridgeConfigSection for QueueConfig {
    const SECTION: &'static str = "queue";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of requests taken from the queue per tick
    pub batch_size: usize,
    pub poll_interval_ms: u64,
    /// What happens to escrowed value when execution fails
    pub settlement: SettlementPolicy,
    /// Capacity of the outcome broadcast channel
    pub subscriber_buffer: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            poll_interval_ms: 500,
            settlement: SettlementPolicy::RefundValueOnFailure,
            subscriber_buffer: 1024,
        }
    }
}

impl ExecutorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BridgeConfigSection for ExecutorConfig {
    const SECTION: &'static str = "executor";
}

/// Full configuration of the priority bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub fee: FeeConfig,
    pub intake: IntakeConfig,
    pub queue: QueueConfig,
    pub executor: ExecutorConfig,
}

impl BridgeConfig {
    pub async fn load(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let config: Self = load_from_file(file_name).await?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_sync(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let config: Self = load_from_file_sync(file_name)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        override_from_env("BRIDGE_INTRINSIC_GAS", &mut config.fee.intrinsic_gas)?;
        override_from_env("BRIDGE_GAS_PER_PAYLOAD_BYTE", &mut config.fee.gas_per_payload_byte)?;
        override_from_env("BRIDGE_MAX_PAYLOAD_LENGTH", &mut config.fee.max_payload_length)?;

        override_from_env("BRIDGE_MAX_CALLDATA_BYTES", &mut config.intake.max_calldata_bytes)?;
        override_from_env("BRIDGE_MAX_FACTORY_DEP_BYTES", &mut config.intake.max_factory_dep_bytes)?;
        override_from_env("BRIDGE_MAX_FACTORY_DEPS", &mut config.intake.max_factory_deps)?;
        override_from_env("BRIDGE_MAX_EXECUTION_LIMIT", &mut config.intake.max_execution_limit)?;
        override_from_env("BRIDGE_PRIORITY_EXPIRATION_SECS", &mut config.intake.priority_expiration_secs)?;

        override_from_env("BRIDGE_QUEUE_ORDERING", &mut config.queue.ordering)?;
        override_from_env("BRIDGE_QUEUE_MAX_PENDING", &mut config.queue.max_pending)?;

        override_from_env("BRIDGE_EXECUTOR_BATCH_SIZE", &mut config.executor.batch_size)?;
        override_from_env("BRIDGE_EXECUTOR_POLL_INTERVAL_MS", &mut config.executor.poll_interval_ms)?;
        override_from_env("BRIDGE_SETTLEMENT_POLICY", &mut config.executor.settlement)?;

        config.validate().map_err(|e| eyre::eyre!("Invalid bridge configuration: {}", e))?;
        Ok(config)
    }

    /// Reject limits that contradict each other
    pub fn validate(&self) -> Result<(), LoadConfigError> {
        if self.fee.intrinsic_gas == 0 {
            return Err(LoadConfigError::ConfigError("fee.intrinsic_gas must be positive".to_string()));
        }
        if self.fee.gas_per_payload_byte == 0 {
            return Err(LoadConfigError::ConfigError("fee.gas_per_payload_byte must be positive".to_string()));
        }
        if self.fee.max_payload_length < self.intake.max_accepted_payload() {
            return Err(LoadConfigError::ConfigError(format!(
                "fee.max_payload_length ({}) is smaller than the largest payload intake accepts ({})",
                self.fee.max_payload_length,
                self.intake.max_accepted_payload()
            )));
        }
        if self.intake.max_execution_limit == 0 {
            return Err(LoadConfigError::ConfigError("intake.max_execution_limit must be positive".to_string()));
        }
        if self.queue.max_pending == 0 {
            return Err(LoadConfigError::ConfigError("queue.max_pending must be positive".to_string()));
        }
        if self.executor.batch_size == 0 {
            return Err(LoadConfigError::ConfigError("executor.batch_size must be positive".to_string()));
        }
        if self.executor.subscriber_buffer == 0 {
            return Err(LoadConfigError::ConfigError("executor.subscriber_buffer must be positive".to_string()));
        }
        Ok(())
    }
}

fn override_from_env<T>(key: &str, target: &mut T) -> eyre::Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *target = raw.parse().map_err(|e| eyre::eyre!("Invalid {}: {}", key, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_config;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.fee.intrinsic_gas, 21_000);
        assert_eq!(config.queue.ordering, OrderingPolicy::Fifo);
        assert_eq!(config.executor.settlement, SettlementPolicy::RefundValueOnFailure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = ExecutorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_partial_toml() {
        let raw = r#"
            [fee]
            gas_per_payload_byte = 800

            [queue]
            ordering = "tip_heap"

            [executor]
            settlement = "burn_all"
            batch_size = 8
        "#;
        let config: BridgeConfig = parse_config(raw).unwrap();
        assert_eq!(config.fee.gas_per_payload_byte, 800);
        assert_eq!(config.fee.intrinsic_gas, 21_000);
        assert_eq!(config.queue.ordering, OrderingPolicy::TipHeap);
        assert_eq!(config.executor.settlement, SettlementPolicy::BurnAll);
        assert_eq!(config.executor.batch_size, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inconsistent_payload_limits() {
        let mut config = BridgeConfig::default();
        config.fee.max_payload_length = config.intake.max_calldata_bytes;
        assert!(matches!(config.validate(), Err(LoadConfigError::ConfigError(_))));
    }

    #[test]
    fn test_load_section_from_file() {
        let path = std::env::temp_dir().join(format!("priority-bridge-fee-{}.toml", std::process::id()));
        std::fs::write(&path, "[fee]\nintrinsic_gas = 30000\n").unwrap();

        let fee = FeeConfig::load_section_from_file_sync(&path).unwrap();
        assert_eq!(fee.intrinsic_gas, 30_000);
        assert_eq!(fee.gas_per_payload_byte, GAS_PER_PAYLOAD_BYTE);
        assert!(QueueConfig::load_section_from_file_sync(&path).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
