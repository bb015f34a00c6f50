//! Declare our error types using `thiserror`.

use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io;
use std::result;
use thiserror::Error;
use url::Url;

/// A custom `Result`, for convenience.
pub type Result<T, E = Error> = result::Result<T, E>;

/// A QDS-related error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// We could not access the specified URL.
    #[non_exhaustive]
    #[error("error accessing '{url}': {source}")]
    CouldNotAccessUrl {
        /// The URL we tried to reach.
        url: Url,
        /// The underlying transport error.
        source: Box<Error>,
    },

    /// We could not parse the API endpoint the caller configured.
    #[non_exhaustive]
    #[error("could not parse endpoint '{endpoint}': {source}")]
    CouldNotParseEndpoint {
        /// The endpoint string that failed to parse.
        endpoint: String,
        /// The underlying parse error.
        source: Box<url::ParseError>,
    },

    /// A cluster id or label turned out to be empty.
    #[non_exhaustive]
    #[error("cluster id or label must not be empty")]
    EmptyClusterIdLabel {},

    /// A value was outside a closed choice set.
    #[non_exhaustive]
    #[error("expected one of {expected}, found '{found}'")]
    InvalidChoice {
        /// The allowed values, `|`-separated.
        expected: &'static str,
        /// The value we actually saw.
        found: String,
    },

    /// The user must specify the environment variable `var`.
    #[non_exhaustive]
    #[error("must specify {var}")]
    MissingEnvVar {
        /// The name of the missing variable.
        var: String,
    },

    /// The remote service rejected an operation. `message` is passed through
    /// from the service verbatim, so `Display` shows exactly what QDS said.
    #[non_exhaustive]
    #[error("{message}")]
    OperationFailed {
        /// The URL of the failed request.
        url: Url,
        /// The HTTP status we received.
        status: StatusCode,
        /// The service's error message.
        message: String,
    },

    /// Another kind of error occurred.
    #[non_exhaustive]
    #[error("{source}")]
    Other {
        /// The original error.
        ///
        /// We add `Send + Sync` to make it easy to use in the presence of threads, and
        /// `'static` to make sure it depends on no borrowed data.
        #[from]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl Error {
    /// Construct an `Error::CouldNotAccessUrl` value.
    pub(crate) fn could_not_access_url<E>(url: &Url, error: E) -> Error
    where
        E: Into<Error>,
    {
        Error::CouldNotAccessUrl {
            url: url.to_owned(),
            source: Box::new(error.into()),
        }
    }

    /// Construct an `Error::CouldNotParseEndpoint` value.
    pub(crate) fn could_not_parse_endpoint<S>(
        endpoint: S,
        error: url::ParseError,
    ) -> Error
    where
        S: Into<String>,
    {
        Error::CouldNotParseEndpoint {
            endpoint: endpoint.into(),
            source: Box::new(error),
        }
    }

    /// Construct a `MissingEnvVar` value.
    pub fn missing_env_var<S: Into<String>>(var: S) -> Self {
        Error::MissingEnvVar { var: var.into() }
    }

    /// Is this error likely to be temporary?
    pub fn might_be_temporary(&self) -> bool {
        match self {
            Error::CouldNotAccessUrl { source, .. } => source.might_be_temporary(),
            // Some HTTP status codes tend to correspond to temporary errors.
            Error::OperationFailed { status, .. } => matches!(
                *status,
                StatusCode::INTERNAL_SERVER_ERROR
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            _ => false,
        }
    }

    /// Return the original `qds::Error` that caused this error, without any
    /// wrapper errors.
    pub fn original_qds_error(&self) -> &Error {
        match self {
            Error::CouldNotAccessUrl { source, .. } => source.original_qds_error(),

            Error::CouldNotParseEndpoint { .. }
            | Error::EmptyClusterIdLabel { .. }
            | Error::InvalidChoice { .. }
            | Error::MissingEnvVar { .. }
            | Error::OperationFailed { .. }
            | Error::Other { .. } => self,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Other {
            source: error.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Error {
        Error::Other {
            source: error.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Other {
            source: error.into(),
        }
    }
}

#[test]
fn operation_failed_displays_the_remote_message_verbatim() {
    let err = Error::OperationFailed {
        url: Url::parse("https://us.qubole.com/api/v1.3/clusters").unwrap(),
        status: StatusCode::UNPROCESSABLE_ENTITY,
        message: "quota exceeded".to_owned(),
    };
    assert_eq!(format!("{}", err), "quota exceeded");
}

#[test]
fn server_side_statuses_are_temporary() {
    let url = Url::parse("https://us.qubole.com/api/v1.3/clusters").unwrap();
    let err = Error::OperationFailed {
        url: url.clone(),
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "down for maintenance".to_owned(),
    };
    assert!(err.might_be_temporary());

    let err = Error::OperationFailed {
        url,
        status: StatusCode::UNAUTHORIZED,
        message: "invalid token".to_owned(),
    };
    assert!(!err.might_be_temporary());
}
