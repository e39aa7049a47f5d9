//! # Dispatch Configuration
//!
//! Loaded once, before the first frame.
//!
//! ```toml
//! log_unknown_kinds = true
//!
//! [wire]
//! byte_order = "little"
//! pointer_width = 8
//! ```
//!
//! Without a `[wire]` table the bridge's own layout is adopted.

use std::path::Path;

use serde::Deserialize;
use steamworks_bridge::WireLayout;

use crate::error::{ConfigError, DispatchError, DispatchResult};

/// Settings for a [`Dispatch`](crate::Dispatch).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Expected record layout. `None` adopts the bridge's layout.
    pub wire: Option<WireLayout>,
    /// Log records of kinds missing from the decode table.
    pub log_unknown_kinds: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            wire: None,
            log_unknown_kinds: true,
        }
    }
}

impl DispatchConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Pins the expected layout.
    #[must_use]
    pub fn with_wire(mut self, layout: WireLayout) -> Self {
        self.wire = Some(layout);
        self
    }

    /// Layout to decode with, given what the bridge writes.
    ///
    /// # Errors
    ///
    /// [`DispatchError::LayoutMismatch`] if a configured layout differs
    /// from `native`.
    pub fn resolve_layout(&self, native: WireLayout) -> DispatchResult<WireLayout> {
        match self.wire {
            Some(configured) if configured != native => {
                Err(DispatchError::LayoutMismatch { configured, native })
            }
            _ => Ok(native),
        }
    }
}
