//! Bridge settings.
//!
//! ```toml
//! # gamepad.toml
//! release_on_shutdown = true
//! ```
//!
//! Every field has a default, so an empty file is valid.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Invalidate and evict every cached [`Gamepad`](crate::gamepad::Gamepad) before
    /// shutting the backend down.
    ///
    /// Off by default: `shutdown()` leaves the cache alone and callers wanting a
    /// clean slate call `clear_device_cache()` themselves.
    pub release_on_shutdown: bool,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading bridge settings");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn reads_release_flag() {
        let settings = Settings::from_toml_str("release_on_shutdown = true").unwrap();
        assert!(settings.release_on_shutdown);
    }

    #[test]
    fn wrong_type_is_a_config_error() {
        assert!(matches!(
            Settings::from_toml_str("release_on_shutdown = \"yes\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Settings::load("/nonexistent/gamepad.toml"),
            Err(Error::Io(_))
        ));
    }
}
