//! Contract configuration.

use chainbatch_types::{Address, ChannelId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default namespace for pending calls.
pub const DEFAULT_BATCH_PREFIX: &str = "batchTransactions";

/// How long a user-created swap stays locked before its owner may cancel it.
pub const DEFAULT_USER_SIDE_TIMEOUT: u64 = 10_800;

/// Lifetime of a swap mirrored by the channel-transfer service.
pub const DEFAULT_ROBOT_SIDE_TIMEOUT: u64 = 300;

/// Upper bound accepted for every duration setting, in seconds (about 100 years).
pub const MAX_DURATION_SECS: u64 = 3_153_600_000;

/// Which namespace nonce records are stored under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePrefix {
    #[default]
    Default,
    Passed,
}

impl NoncePrefix {
    pub fn object_type(&self) -> &'static str {
        match self {
            Self::Default => "nonce",
            Self::Passed => "passed_nonce",
        }
    }
}

/// Errors loading a [`ContractConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid contract config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid contract config: {0}")]
    Invalid(String),
}

/// Configuration of one contract instance on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// This channel. Also the base symbol of its native token.
    pub channel: ChannelId,

    /// Channel administrator.
    pub admin: Option<Address>,

    /// Identity digest of the channel-transfer service, hex encoded in config.
    #[serde(with = "opt_hex")]
    pub robot_ski: Option<Vec<u8>>,

    /// Methods the registry refuses to resolve.
    pub disabled_functions: Vec<String>,

    pub disable_swaps: bool,
    pub disable_multi_swaps: bool,
    pub disable_channel_transfers: bool,

    /// Pending-call lifetime in seconds. 0 disables expiry.
    pub tx_ttl: u64,

    /// Namespace for pending calls.
    pub batch_prefix: String,

    /// Nonce window in seconds. 0 selects the submit-time nonce check.
    pub nonce_ttl: u64,

    pub nonce_prefix: NoncePrefix,

    /// Seconds.
    pub user_side_timeout: u64,

    /// Seconds.
    pub robot_side_timeout: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            channel: ChannelId::default(),
            admin: None,
            robot_ski: None,
            disabled_functions: Vec::new(),
            disable_swaps: false,
            disable_multi_swaps: false,
            disable_channel_transfers: false,
            tx_ttl: 0,
            batch_prefix: DEFAULT_BATCH_PREFIX.to_string(),
            nonce_ttl: 0,
            nonce_prefix: NoncePrefix::Default,
            user_side_timeout: DEFAULT_USER_SIDE_TIMEOUT,
            robot_side_timeout: DEFAULT_ROBOT_SIDE_TIMEOUT,
        }
    }
}

impl ContractConfig {
    /// Config for `channel` with everything else defaulted.
    pub fn for_channel(channel: impl Into<ChannelId>) -> Self {
        Self {
            channel: channel.into(),
            ..Default::default()
        }
    }

    pub fn with_admin(mut self, admin: Address) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn with_robot_ski(mut self, ski: Vec<u8>) -> Self {
        self.robot_ski = Some(ski);
        self
    }

    pub fn with_tx_ttl(mut self, seconds: u64) -> Self {
        self.tx_ttl = seconds;
        self
    }

    pub fn with_nonce_ttl(mut self, seconds: u64) -> Self {
        self.nonce_ttl = seconds;
        self
    }

    pub fn with_batch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.batch_prefix = prefix.into();
        self
    }

    pub fn with_disabled_function(mut self, name: impl Into<String>) -> Self {
        self.disabled_functions.push(name.into());
        self
    }

    pub fn with_swaps_disabled(mut self) -> Self {
        self.disable_swaps = true;
        self
    }

    pub fn with_multi_swaps_disabled(mut self) -> Self {
        self.disable_multi_swaps = true;
        self
    }

    pub fn with_channel_transfers_disabled(mut self) -> Self {
        self.disable_channel_transfers = true;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// `user_side_timeout` as a signed offset for ledger timestamps.
    pub fn user_side_timeout_secs(&self) -> i64 {
        i64::try_from(self.user_side_timeout).unwrap_or(i64::MAX)
    }

    /// `robot_side_timeout` as a signed offset for ledger timestamps.
    pub fn robot_side_timeout_secs(&self) -> i64 {
        i64::try_from(self.robot_side_timeout).unwrap_or(i64::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.as_str().is_empty() {
            return Err(ConfigError::Invalid("channel must be set".into()));
        }
        if self.batch_prefix.is_empty() {
            return Err(ConfigError::Invalid("batch_prefix must not be empty".into()));
        }
        if self.batch_prefix.contains('\u{0}') {
            return Err(ConfigError::Invalid(
                "batch_prefix must not contain NUL".into(),
            ));
        }
        for (name, value) in [
            ("tx_ttl", self.tx_ttl),
            ("nonce_ttl", self.nonce_ttl),
            ("user_side_timeout", self.user_side_timeout),
            ("robot_side_timeout", self.robot_side_timeout),
        ] {
            if value > MAX_DURATION_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not exceed {MAX_DURATION_SECS} seconds"
                )));
            }
        }
        Ok(())
    }
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
