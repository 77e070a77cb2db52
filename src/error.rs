use thiserror::Error;

/// Failure to build a form URL. Logged by the bridge, never surfaced to hosts.
#[derive(Error, Debug)]
pub enum FormUrlError {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("could not serialize form styles: {0}")]
    Styles(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown vPOS mode `{0}`, expected `sandbox` or `production`")]
pub struct ParseModeError(pub String);
