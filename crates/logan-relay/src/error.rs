use thiserror::Error;

/// Relay startup and serving failures
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no free port in {start}..={end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Emission failures. The convenience methods swallow these.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay responded with {0}")]
    Status(reqwest::StatusCode),
}
