use tyrann_schema::ValidationErrors;

use crate::encoding::EncodeError;
use crate::endpoint::Method;
use crate::transport::{TransportError, TransportRequest, TransportResponse};

/// Errors from making a call.
///
/// The two response-side failures keep the request that was sent and the
/// response that came back, so callers can inspect both.
#[derive(Debug, thiserror::Error)]
pub enum TyrannError {
    /// The response status has no declared schema.
    #[error("status {status} is not handled for {method} {url}", method = .request.method, url = .request.url)]
    StatusNotHandled {
        status: u16,
        request: Box<TransportRequest>,
        response: Box<TransportResponse>,
    },

    /// The response body failed its status's schema.
    #[error("invalid response data: {errors}")]
    BadResponse {
        errors: ValidationErrors,
        request: Box<TransportRequest>,
        response: Box<TransportResponse>,
    },

    /// No response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no {method} operation is declared for endpoint {name}")]
    OperationNotDeclared { method: Method, name: String },

    #[error("failed to encode request: {0}")]
    Encode(#[from] EncodeError),

    #[error("result has status {actual}, expected {expected}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("failed to deserialize result: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TyrannError {
    /// Whether the failure happened before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Status of the response involved, for response-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::StatusNotHandled { status, .. } => Some(*status),
            Self::BadResponse { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// The response involved, for response-side failures.
    pub fn response(&self) -> Option<&TransportResponse> {
        match self {
            Self::StatusNotHandled { response, .. } | Self::BadResponse { response, .. } => {
                Some(&**response)
            }
            _ => None,
        }
    }

    /// The request that was sent, for response-side failures.
    pub fn request(&self) -> Option<&TransportRequest> {
        match self {
            Self::StatusNotHandled { request, .. } | Self::BadResponse { request, .. } => {
                Some(&**request)
            }
            _ => None,
        }
    }
}
