//! Server configuration
//!
//! The only runtime knob is the listen port, given as the first
//! command-line argument.

use crate::error::AppError;

/// Port used when none is given
pub const DEFAULT_PORT: u16 = 9001;

/// Interface the listener binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Lines queued per client before further lines are dropped
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Longest inbound line accepted, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub outbound_buffer: usize,
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl Config {
    /// Build from program arguments, excluding the program name
    pub fn from_args<I>(mut args: I) -> Result<Self, AppError>
    where
        I: Iterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(port) = args.next() {
            config.port = port
                .parse()
                .map_err(|_| AppError::InvalidPort(port.clone()))?;
        }
        Ok(config)
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
