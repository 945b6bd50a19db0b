use crate::workflows::eligibility::domain::{Region, TractRecord};

/// Decision branches in evaluation order. Each later branch assumes every
/// earlier one did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionBranch<'a> {
    /// No tract row exists for the normalized tract.
    TractNotFound,
    /// The tract belongs to a region the program does not serve.
    OutsideRegion(&'a Region),
    /// Primary region, but the tract is flagged ineligible.
    AwaitingExpansion,
    Eligible,
}

pub fn classify(record: Option<&TractRecord>) -> DecisionBranch<'_> {
    let Some(record) = record else {
        return DecisionBranch::TractNotFound;
    };

    if !record.region.is_primary() {
        return DecisionBranch::OutsideRegion(&record.region);
    }

    if !record.eligible {
        return DecisionBranch::AwaitingExpansion;
    }

    DecisionBranch::Eligible
}
