//! Address to program eligibility: validation, geographic overlay, and the
//! tract/region decision, plus batch processing and notification sign-ups.

pub mod address;
pub mod admission;
pub mod batch;
pub mod decision;
pub mod domain;
pub mod error;
pub mod notify;
pub mod overlay;
pub mod reference;
mod router;
mod service;
pub mod upstream;

pub use address::AddressValidator;
pub use admission::AdmissionLimiter;
pub use batch::{parse_addresses, BatchReport, BatchRow};
pub use decision::{DecisionEngine, DecisionPolicy, IneligibleAction};
pub use domain::{
    AddressCandidate, EligibilityAction, EligibilityOutcome, NotificationRecord, OverlayResult,
};
pub use error::{Collaborator, LookupError, NotificationError, TransportError};
pub use notify::{CsvNotificationLog, NotificationLog};
pub use overlay::OverlayProvider;
pub use reference::{ReferenceData, ReferenceDataError};
pub use router::{eligibility_router, lookup_error_response};
pub use service::{Assessment, EligibilityLookupService, LookupReport};
pub use upstream::{ArcGisOverlayClient, SmartyStreetClient};

#[cfg(test)]
mod tests;
