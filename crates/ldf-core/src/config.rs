//! # Pool Configuration
//!
//! Per-pool LDF settings loaded from TOML. The parameter record is written as
//! a hex string so configs stay byte-compatible with stored records:
//!
//! ```toml
//! name = "eth-usdc"
//! tick_spacing = 60
//! twap_seconds_ago = 0
//! ldf_kind = "geometric"
//! ldf_params = "0x03fffda80014055d4a80"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CoreResult, LdfCoreError};
use crate::ldf::{LdfContext, LiquidityDensityFunction};
use crate::types::{LdfKind, LdfParams, LdfState};

/// LDF configuration of a single pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Pool name for logging
    #[serde(default)]
    pub name: String,

    /// Tick spacing of the pool
    pub tick_spacing: i32,

    /// TWAP window feeding the reference tick, zero for spot-only pools
    #[serde(default)]
    pub twap_seconds_ago: u32,

    /// Distribution family
    pub ldf_kind: LdfKind,

    /// Packed parameter record, hex encoded
    pub ldf_params: LdfParams,
}

impl PoolConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LdfCoreError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(pool = %config.name, kind = ?config.ldf_kind, "loaded pool config");
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: PoolConfig = toml::from_str(content)
            .map_err(|e| LdfCoreError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|e| {
            LdfCoreError::config(format!("failed to write config file {}: {}", path.display(), e))
        })
    }

    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LdfCoreError::config(format!("failed to serialize config: {}", e)))
    }

    /// Validate the parameter record against the pool settings
    pub fn validate(&self) -> CoreResult<()> {
        self.ldf().validate(self.tick_spacing, self.twap_seconds_ago)
    }

    pub fn ldf(&self) -> LiquidityDensityFunction {
        LiquidityDensityFunction::new(self.ldf_kind, self.ldf_params)
    }

    /// Evaluation context at `reference_tick` with the given persisted state
    pub fn context(&self, reference_tick: i32, state: LdfState) -> LdfContext {
        LdfContext {
            tick_spacing: self.tick_spacing,
            reference_tick,
            state,
        }
    }
}
