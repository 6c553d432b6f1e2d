/*! Library configuration.

A plain value the application threads through to the pieces that
need it: the local identity, the reflector target, client timings,
optional crypto material, and protocol limits. Loadable from JSON;
every section has serde defaults so a config file only needs the
fields it changes. The library keeps no on-disk state of its own.
 */

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_PORT;
use crate::{Error, Result};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local callsign; required for the reflector client.
    pub callsign: String,
    /// Reflector connection target.
    pub reflector: ReflectorConfig,
    /// Client timings.
    pub timeouts: Timeouts,
    /// Optional crypto material.
    pub crypto: CryptoConfig,
    /// Protocol limits.
    pub limits: Limits,
}

/// Where to connect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    /// Hostname or IP.
    pub host: String,
    /// UDP port.
    pub port: u16,
    /// Module letter A-Z.
    pub module: char,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            module: 'A',
        }
    }
}

/// Client timings, all in milliseconds on the wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound on awaiting ACKN.
    pub connect_ms: u64,
    /// Poll interval for the blocking receive loop.
    pub poll_interval_ms: u64,
    /// Advisory bound on reflector silence before the application
    /// should worry; the client itself never drops on silence.
    pub keepalive_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_ms: 5000,
            poll_interval_ms: 100,
            keepalive_ms: 30_000,
        }
    }
}

impl Timeouts {
    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Optional crypto material, hex-encoded in config files.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Scrambler seed, 1..3 bytes.
    pub scrambler_seed: Option<Vec<u8>>,
    /// AES key, 16/24/32 bytes.
    pub aes_key: Option<Vec<u8>>,
    /// ECDSA P-256 private key, 32 bytes.
    pub signing_key: Option<Vec<u8>>,
}

/// Protocol limits, exposed so applications can surface them without
/// hard-coding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Blocks per text META message.
    pub max_text_blocks: u8,
    /// Characters per callsign.
    pub max_callsign_chars: u8,
    /// Payload bytes per stream frame.
    pub payload_bytes: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_blocks: 15,
            max_callsign_chars: 9,
            payload_bytes: 16,
        }
    }
}

impl Config {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            log::debug!("config parse error: {e}");
            Error::WireFormat("invalid config JSON")
        })
    }

    /// Serialize to pretty JSON.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.reflector.port, 17000);
        assert_eq!(c.reflector.module, 'A');
        assert_eq!(c.timeouts.connect(), Duration::from_secs(5));
        assert_eq!(c.limits.max_text_blocks, 15);
        assert_eq!(c.limits.max_callsign_chars, 9);
        assert!(c.crypto.aes_key.is_none());
    }

    #[test]
    fn partial_json() -> crate::Result<()> {
        let c = Config::from_json_str(
            r#"{
                "callsign": "W2FBI",
                "reflector": {"host": "ref.example.org", "module": "C"}
            }"#,
        )?;
        assert_eq!(c.callsign, "W2FBI");
        assert_eq!(c.reflector.host, "ref.example.org");
        assert_eq!(c.reflector.module, 'C');
        // Unspecified sections keep their defaults.
        assert_eq!(c.reflector.port, 17000);
        assert_eq!(c.timeouts.connect_ms, 5000);
        Ok(())
    }

    #[test]
    fn round_trip() -> crate::Result<()> {
        let mut c = Config::default();
        c.callsign = "SP5WWP".into();
        c.crypto.scrambler_seed = Some(vec![0x12, 0x34, 0x56]);
        let parsed = Config::from_json_str(&c.to_json_string())?;
        assert_eq!(parsed, c);
        Ok(())
    }

    #[test]
    fn garbage_rejected() {
        assert!(Config::from_json_str("not json").is_err());
    }
}
