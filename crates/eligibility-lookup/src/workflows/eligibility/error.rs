use std::fmt;

/// Remote collaborator named in upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    AddressValidation,
    GeoOverlay,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::AddressValidation => f.write_str("address validation"),
            Collaborator::GeoOverlay => f.write_str("geographic overlay"),
        }
    }
}

/// Failure reported by a collaborator implementation before any normalization.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Classified failure of a single lookup.
///
/// Callers retry transport failures, correct client input, and accept
/// `NoMatch` as a negative result.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{0}")]
    ClientInput(String),
    #[error("no match found")]
    NoMatch,
    #[error("{service} returned an unusable response: {detail}")]
    UpstreamFormat {
        service: Collaborator,
        detail: String,
    },
    #[error("{service} request failed: {source}")]
    UpstreamTransport {
        service: Collaborator,
        #[source]
        source: TransportError,
    },
    #[error("failed to save notification: {0}")]
    Notification(#[from] NotificationError),
}

impl LookupError {
    pub(crate) fn client(message: impl Into<String>) -> Self {
        Self::ClientInput(message.into())
    }

    pub(crate) fn format(service: Collaborator, detail: impl Into<String>) -> Self {
        Self::UpstreamFormat {
            service,
            detail: detail.into(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ClientInput(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFormat { .. } | Self::UpstreamTransport { .. }
        )
    }
}

/// Storage failure while appending to the notification log.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification log unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("notification log write failed: {0}")]
    Csv(#[from] csv::Error),
}
