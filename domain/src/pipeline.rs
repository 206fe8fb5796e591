//! Quote lifecycle: sales pipeline stage and approval status.
//!
//! The two axes are independent. `status` tracks the document (draft,
//! approval, delivery, expiry) while `pipeline_stage` tracks the sales
//! conversation with the client.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::permissions::Role;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("unknown pipeline stage: {0}")]
    UnknownStage(String),
    #[error("unknown quote status: {0}")]
    UnknownStatus(String),
    #[error("cannot move pipeline stage from {from} to {to}")]
    Stage { from: PipelineStage, to: PipelineStage },
    #[error("cannot change quote status from {from} to {to}")]
    Status { from: QuoteStatus, to: QuoteStatus },
}

// =============================================================================
// PIPELINE STAGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    #[default]
    #[serde(alias = "In-Flight")]
    Active,
    #[serde(rename = "At Risk")]
    AtRisk,
    Actioned,
    Closed,
    Won,
}

impl PipelineStage {
    /// Pipeline order used for funnels and dropdowns.
    pub const ALL: [PipelineStage; 5] = [Self::Active, Self::AtRisk, Self::Actioned, Self::Closed, Self::Won];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::AtRisk => "At Risk",
            Self::Actioned => "Actioned",
            Self::Closed => "Closed",
            Self::Won => "Won",
        }
    }

    /// Still being worked by the sales rep.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::AtRisk | Self::Actioned)
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Active | Self::AtRisk | Self::Actioned => true,
            Self::Closed => next == Self::Active,
            Self::Won => false,
        }
    }

    /// Validate a move and return the new stage.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Stage`] when the move is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) { Ok(next) } else { Err(TransitionError::Stage { from: self, to: next }) }
    }
}

impl FromStr for PipelineStage {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "active" | "inflight" => Ok(Self::Active),
            "atrisk" => Ok(Self::AtRisk),
            "actioned" => Ok(Self::Actioned),
            "closed" => Ok(Self::Closed),
            "won" => Ok(Self::Won),
            _ => Err(TransitionError::UnknownStage(s.to_owned())),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// QUOTE STATUS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Draft,
    Pending,
    #[default]
    Approved,
    Rejected,
    Expired,
    Sent,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 6] =
        [Self::Draft, Self::Pending, Self::Approved, Self::Rejected, Self::Expired, Self::Sent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Sent => "sent",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use QuoteStatus::{Approved, Draft, Expired, Pending, Rejected, Sent};

        if self == next {
            return true;
        }
        match (self, next) {
            (Draft, Pending | Sent | Approved)
            | (Pending, Approved | Rejected)
            | (Approved | Sent, Sent | Approved)
            | (Rejected, Draft) => true,
            (from, Expired) => !matches!(from, Rejected),
            _ => false,
        }
    }

    /// Validate a status change and return the new status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Status`] when the change is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) { Ok(next) } else { Err(TransitionError::Status { from: self, to: next }) }
    }

    /// Quote document can no longer be edited.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, Self::Rejected | Self::Expired)
    }
}

impl FromStr for QuoteStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_owned()))
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RULES
// =============================================================================

/// A quote past its validity date that has not already been closed out.
#[must_use]
pub fn is_expired(valid_until: OffsetDateTime, now: OffsetDateTime, status: QuoteStatus) -> bool {
    now > valid_until && !status.is_final()
}

/// Status a freshly created quote starts in.
///
/// Sales reps need a sales leader's sign-off for quotes at or above the
/// approval threshold; everything else is approved on creation.
#[must_use]
pub fn initial_status(total: Decimal, approval_threshold: Decimal, created_by: Role) -> QuoteStatus {
    if created_by == Role::SalesRep && total >= approval_threshold {
        QuoteStatus::Pending
    } else {
        QuoteStatus::Approved
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
