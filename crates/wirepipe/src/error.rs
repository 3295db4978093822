//! Error types for the wirepipe relay.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias using the relay [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal relay errors.
///
/// Every variant is unrecoverable: the process reports it on stderr and
/// exits with [`Error::exit_code`]. End-of-stream on a forwarding path is
/// not an error; it is a normal shutdown trigger handled by the shutdown
/// coordinator.
#[derive(Debug, Error)]
pub enum Error {
    /// Hostname lookup failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Lookup succeeded but returned no usable address.
    #[error("no address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    /// TCP connection to the resolved target failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Installing the SIGINT/SIGTERM watchers failed.
    #[error("failed to install signal handler: {source}")]
    SignalSetup {
        #[source]
        source: std::io::Error,
    },

    /// Unrecoverable I/O failure on a forwarding path's sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this failure: the failing call's OS error code
    /// when one exists and fits, otherwise 1.
    pub fn exit_code(&self) -> u8 {
        let source = match self {
            Self::Resolve { source, .. }
            | Self::Connect { source, .. }
            | Self::SignalSetup { source } => source,
            Self::Io(source) => source,
            Self::NoAddress { .. } => return 1,
        };
        source
            .raw_os_error()
            .and_then(|code| u8::try_from(code).ok())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn exit_code_uses_os_error_when_present() {
        let err = Error::Connect {
            addr: "127.0.0.1:12345".parse().unwrap(),
            source: std::io::Error::from_raw_os_error(111), // ECONNREFUSED
        };
        assert_eq!(err.exit_code(), 111);
    }

    #[test]
    fn exit_code_falls_back_to_one() {
        let err = Error::NoAddress {
            host: "localhost".to_string(),
            port: 12345,
        };
        assert_eq!(err.exit_code(), 1);

        let err = Error::Io(std::io::Error::other("no os code"));
        assert_eq!(err.exit_code(), 1);
    }
}
