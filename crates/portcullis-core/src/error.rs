//! Error types for the Portcullis gateway.
//!
//! Three layers of error vocabulary live here:
//!
//! - [`ValidationError`] with its ordered [`Issue`]s is what a schema raises
//!   when input does not conform.
//! - [`GatewayError`] is the failure value carried through the middleware
//!   chain: either a validation failure or a handler/runtime failure.
//! - [`ResponseError`] is the normalized wire envelope every failure is
//!   converted into before it reaches a client.
//!
//! The mapping between the three is fixed:
//!
//! | Failure | Status | Message |
//! |---|---|---|
//! | `Validation` | 400 | first issue rendered as `"<path> <message>"` |
//! | `Handler` | 500 | the error's own message, verbatim |
//! | panic (classified by the normalizer) | 500 | [`FALLBACK_MESSAGE`] |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Message used when a failure carries no usable message of its own.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// One segment of an [`IssuePath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key (e.g. `name` in `user.name`).
    Key(String),
    /// An array index (e.g. `0` in `items.0`).
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a validation issue within the offending value.
///
/// Rendered as dot-joined segments: `name`, `user.name`, `items.0.name`.
/// The empty path addresses the value itself (e.g. "expected an object").
///
/// # Example
///
/// ```
/// use portcullis_core::IssuePath;
///
/// let path = IssuePath::key("user").with_key("name");
/// assert_eq!(path.to_string(), "user.name");
/// assert!(!path.is_root());
/// assert!(IssuePath::root().is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePath(Vec<PathSegment>);

impl IssuePath {
    /// Creates the empty path addressing the whole value.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Creates a single-key path.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Creates a single-index path.
    #[must_use]
    pub fn index(index: usize) -> Self {
        Self(vec![PathSegment::Index(index)])
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Returns a new path with `index` appended.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Returns a new path with `segment` prepended.
    ///
    /// Used by container schemas to relocate issues raised by their element
    /// schemas under the container's own key.
    #[must_use]
    pub fn prefixed(self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.push(segment.into());
        segments.extend(self.0);
        Self(segments)
    }

    /// Returns `true` if this path addresses the whole value.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for IssuePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A single validation failure: where it happened and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the offending field within the validated value.
    pub path: IssuePath,
    /// Human-readable description of the mismatch.
    pub message: String,
}

impl Issue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(path: IssuePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Renders the issue as `"<path> <message>"`.
    ///
    /// A root-path issue renders the message alone.
    #[must_use]
    pub fn render(&self) -> String {
        if self.path.is_root() {
            self.message.clone()
        } else {
            format!("{} {}", self.path, self.message)
        }
    }
}

/// Structured failure raised by a schema when input does not conform.
///
/// Carries an ordered, non-empty sequence of [`Issue`]s. Created
/// synchronously during validation and consumed immediately by the error
/// normalizer; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    /// Creates a validation error from a list of issues.
    ///
    /// An empty list is replaced by a single root-path issue so the error
    /// always renders something meaningful.
    #[must_use]
    pub fn new(issues: Vec<Issue>) -> Self {
        if issues.is_empty() {
            return Self::single(IssuePath::root(), "Invalid input");
        }
        Self { issues }
    }

    /// Creates a validation error with a single issue.
    #[must_use]
    pub fn single(path: IssuePath, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(path, message)],
        }
    }

    /// Returns the first issue.
    #[must_use]
    pub fn first(&self) -> &Issue {
        // Non-empty by construction.
        &self.issues[0]
    }

    /// Returns all issues in order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns a new error with every issue path prefixed by `segment`.
    #[must_use]
    pub fn prefixed(self, segment: impl Into<PathSegment> + Clone) -> Self {
        Self {
            issues: self
                .issues
                .into_iter()
                .map(|issue| Issue {
                    path: issue.path.prefixed(segment.clone()),
                    message: issue.message,
                })
                .collect(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.first().render())
    }
}

impl std::error::Error for ValidationError {}

/// The failure value carried through the middleware chain.
///
/// The validator raises `Validation`; handlers and everything downstream of
/// them raise `Handler`. Panics are not represented here — the error
/// normalizer catches them at the chain boundary and classifies them as
/// unknown failures.
///
/// # Example
///
/// ```
/// use portcullis_core::{GatewayError, IssuePath, ValidationError};
/// use http::StatusCode;
///
/// let err = GatewayError::from(ValidationError::single(IssuePath::key("name"), "Required"));
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.to_response_error().message, "name Required");
///
/// let err = GatewayError::handler("boom");
/// assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(err.to_response_error().message, "boom");
/// ```
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A schema rejected one of the request slots.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A handler (or other downstream code) failed with an error value.
    ///
    /// The message is exposed verbatim to the client.
    #[error("{message}")]
    Handler {
        /// The error's own message.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl GatewayError {
    /// Creates a handler failure from a bare message.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler failure wrapping a source error.
    ///
    /// The source's own message becomes the client-visible message.
    pub fn handler_from(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::Handler {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns the HTTP status code for this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts this failure into the normalized wire envelope.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        match self {
            Self::Validation(err) => {
                ResponseError::new(StatusCode::BAD_REQUEST, err.first().render())
            }
            Self::Handler { message, .. } => {
                ResponseError::new(StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        Self::handler_from(err)
    }
}

/// The normalized error envelope sent to clients.
///
/// Always exactly these three fields, serialized in camelCase:
///
/// ```json
/// { "statusCode": 400, "message": "name Required", "errorCode": "Bad Request" }
/// ```
///
/// `errorCode` is the standard reason phrase for `statusCode`, never a
/// free-form code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    /// HTTP status code, duplicated in the response body.
    pub status_code: u16,
    /// Human-readable failure description.
    pub message: String,
    /// Reason phrase for `status_code` (e.g. `"Bad Request"`).
    pub error_code: String,
}

impl ResponseError {
    /// Creates an envelope for `status` with the given message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            error_code: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
        }
    }

    /// Creates a 404 envelope for an unmatched route.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates the 500 envelope used when a failure carries no message.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_MESSAGE)
    }

    /// Returns the status code as an [`http::StatusCode`].
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.error_code, self.message)
    }
}
