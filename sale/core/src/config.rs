// Copyright (c) 2024 The Botho Foundation

//! Sale configuration.
//!
//! Everything here is fixed at construction time and never mutated by the
//! ledger.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    address::Address,
    membership::{hash_hex, Hash32},
    Amount,
};

/// Basis points denominator (100% = 10 000).
pub const BPS: u32 = 10_000;

/// One whole unit of the native currency in base units.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main sale configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Pricing and identities
    pub sale: SaleSettings,

    /// Allow-list commitments
    pub allowlist: AllowListRoots,

    /// Supply limits
    #[serde(default)]
    pub caps: SupplyCaps,

    /// Claim and settlement settings
    #[serde(default)]
    pub claims: ClaimSettings,
}

/// Pricing, identities and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Identity allowed to run administrative operations
    pub admin: Address,

    /// Receives the settlement sweep and royalties
    pub recipient: Address,

    /// Price per item in base units, written as a decimal string
    #[serde(default = "default_price", with = "amount_dec")]
    pub price: Amount,

    /// Metadata base URI; an item's URI is this followed by its id
    #[serde(default)]
    pub base_uri: String,

    /// Secondary-sale royalty in basis points
    #[serde(default = "default_royalty_bps")]
    pub royalty_bps: u32,
}

fn default_price() -> Amount {
    UNIT
}

/// Serde adapter for amounts, which outgrow TOML's 64-bit integers.
///
/// Serializes as a decimal string; accepts a string or a non-negative
/// integer.
pub mod amount_dec {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl de::Visitor<'_> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative amount as a decimal string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.trim()
                .parse()
                .map_err(|e| E::custom(format!("invalid amount {:?}: {}", v, e)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u64::try_from(v)
                .map(Amount::from)
                .map_err(|_| E::custom(format!("amount must not be negative: {}", v)))
        }
    }
}

fn default_royalty_bps() -> u32 {
    1_000 // 10%
}

/// Roots of the two allow-lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListRoots {
    #[serde(with = "hash_hex")]
    pub member_root: Hash32,

    #[serde(with = "hash_hex")]
    pub follower_root: Hash32,
}

/// Supply limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyCaps {
    /// Open-tier user mints may not bring total supply to this value
    #[serde(default = "default_user_cap")]
    pub user_cap: u32,

    /// Items issuable through the follower allow-list
    #[serde(default = "default_follower_cap")]
    pub follower_cap: u32,

    /// Items issuable through the member allow-list
    #[serde(default = "default_member_cap")]
    pub member_cap: u32,

    /// Identifiers run from 0 to `total_capacity - 1`
    #[serde(default = "default_total_capacity")]
    pub total_capacity: u32,

    /// Items a single wallet may mint across all tiers
    #[serde(default = "default_wallet_cap")]
    pub wallet_cap: u32,
}

fn default_user_cap() -> u32 {
    400
}

fn default_follower_cap() -> u32 {
    245
}

fn default_member_cap() -> u32 {
    90
}

fn default_total_capacity() -> u32 {
    444
}

fn default_wallet_cap() -> u32 {
    10
}

impl Default for SupplyCaps {
    fn default() -> Self {
        Self {
            user_cap: default_user_cap(),
            follower_cap: default_follower_cap(),
            member_cap: default_member_cap(),
            total_capacity: default_total_capacity(),
            wallet_cap: default_wallet_cap(),
        }
    }
}

/// Claim and settlement settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSettings {
    /// Share of the pool kept for holders when claims open, in basis
    /// points; the rest goes to the recipient at activation
    #[serde(default = "default_holder_share_bps")]
    pub holder_share_bps: u32,

    /// Seconds after claim activation before the final sweep is allowed
    #[serde(default = "default_withdraw_cooldown_secs")]
    pub withdraw_cooldown_secs: u64,

    /// Absolute time before which the final sweep is never allowed
    #[serde(default)]
    pub withdraw_not_before: Option<DateTime<Utc>>,
}

fn default_holder_share_bps() -> u32 {
    BPS
}

fn default_withdraw_cooldown_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            holder_share_bps: default_holder_share_bps(),
            withdraw_cooldown_secs: default_withdraw_cooldown_secs(),
            withdraw_not_before: None,
        }
    }
}

impl SaleConfig {
    /// Reference configuration with the given identities and roots.
    pub fn new(
        admin: Address,
        recipient: Address,
        member_root: Hash32,
        follower_root: Hash32,
    ) -> Self {
        Self {
            sale: SaleSettings {
                admin,
                recipient,
                price: default_price(),
                base_uri: String::new(),
                royalty_bps: default_royalty_bps(),
            },
            allowlist: AllowListRoots {
                member_root,
                follower_root,
            },
            caps: SupplyCaps::default(),
            claims: ClaimSettings::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SaleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let caps = &self.caps;
        if self.sale.admin == Address::ZERO {
            return Err(ConfigError::Invalid("admin must not be the zero address".into()));
        }
        if caps.wallet_cap == 0 {
            return Err(ConfigError::Invalid("wallet_cap must be at least 1".into()));
        }
        for (name, cap) in [
            ("user_cap", caps.user_cap),
            ("follower_cap", caps.follower_cap),
            ("member_cap", caps.member_cap),
        ] {
            if cap > caps.total_capacity {
                return Err(ConfigError::Invalid(format!(
                    "{} ({}) exceeds total_capacity ({})",
                    name, cap, caps.total_capacity
                )));
            }
        }
        if self.claims.holder_share_bps > BPS {
            return Err(ConfigError::Invalid(format!(
                "holder_share_bps must be at most {}",
                BPS
            )));
        }
        if self.sale.royalty_bps > BPS {
            return Err(ConfigError::Invalid(format!(
                "royalty_bps must be at most {}",
                BPS
            )));
        }
        Ok(())
    }

    /// Exact payment required for `count` items, `None` on overflow.
    pub fn mint_cost(&self, count: usize) -> Option<Amount> {
        self.sale.price.checked_mul(Amount::try_from(count).ok()?)
    }

    /// Royalty owed on a secondary sale, and who receives it.
    pub fn royalty_info(&self, sale_price: Amount) -> (Address, Amount) {
        let amount = sale_price / Amount::from(BPS) * Amount::from(self.sale.royalty_bps)
            + sale_price % Amount::from(BPS) * Amount::from(self.sale.royalty_bps)
                / Amount::from(BPS);
        (self.sale.recipient, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[sale]
admin = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
recipient = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"
base_uri = "ipfs://CID/"

[allowlist]
member_root = "0x1111111111111111111111111111111111111111111111111111111111111111"
follower_root = "0x2222222222222222222222222222222222222222222222222222222222222222"

[claims]
withdraw_not_before = "2023-07-29T13:03:44Z"
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = SaleConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.sale.price, UNIT);
        assert_eq!(config.sale.royalty_bps, 1_000);
        assert_eq!(config.caps, SupplyCaps::default());
        assert_eq!(config.caps.user_cap, 400);
        assert_eq!(config.caps.total_capacity, 444);
        assert_eq!(config.claims.holder_share_bps, BPS);
        assert_eq!(
            config.claims.withdraw_not_before.map(|t| t.timestamp()),
            Some(1_690_635_824)
        );
        assert_eq!(config.allowlist.member_root, [0x11; 32]);
    }

    #[test]
    fn test_price_outgrows_toml_integers() {
        let text = SAMPLE.replace("base_uri", "price = \"20000000000000000000\"\nbase_uri");
        let config = SaleConfig::from_toml(&text).unwrap();
        assert_eq!(config.sale.price, 20 * UNIT);

        let text = SAMPLE.replace("base_uri", "price = 2000000000000000000\nbase_uri");
        assert_eq!(SaleConfig::from_toml(&text).unwrap().sale.price, 2 * UNIT);

        for bad in ["price = -1", "price = \"1.5\""] {
            let text = SAMPLE.replace("base_uri", &format!("{}\nbase_uri", bad));
            assert!(matches!(
                SaleConfig::from_toml(&text),
                Err(ConfigError::Parse(_))
            ));
        }

        // Written back out, the price survives as a string.
        let written = toml::to_string(&config).unwrap();
        assert!(written.contains("price = \"20000000000000000000\""));
        assert_eq!(SaleConfig::from_toml(&written).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = SaleConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sale.base_uri, "ipfs://CID/");

        assert!(matches!(
            SaleConfig::from_file("/nonexistent/sale.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = SaleConfig::from_toml(SAMPLE).unwrap();
        config.caps.member_cap = 500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SaleConfig::from_toml(SAMPLE).unwrap();
        config.claims.holder_share_bps = BPS + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SaleConfig::from_toml(SAMPLE).unwrap();
        config.caps.wallet_cap = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        assert!(matches!(
            SaleConfig::from_toml("[sale]\nadmin = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_mint_cost_and_royalty() {
        let config = SaleConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.mint_cost(3), Some(3 * UNIT));
        assert_eq!(config.mint_cost(0), Some(0));

        let (recipient, royalty) = config.royalty_info(2 * UNIT);
        assert_eq!(recipient, config.sale.recipient);
        assert_eq!(royalty, UNIT / 5);
        assert_eq!(config.royalty_info(15).1, 1);
    }
}
