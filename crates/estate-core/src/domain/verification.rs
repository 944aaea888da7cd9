// ============================================================================
// Estate Core - Verification Workflow
// File: crates/estate-core/src/domain/verification.rs
// Description: Property verification state machine (admin + council review)
// ============================================================================
//! The verification state of a property is not stored as a single field; it
//! is derived from the workflow flags on the record. Transitions are pure:
//! they check the current state and the actor's role and produce the merge
//! patch that moves the record to the next state.

use std::fmt;

use estate_shared::Timestamp;
use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::property::{Property, PropertyPatch};
use crate::error::DomainError;

/// Stored `verificationStatus` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    None,
    ForwardedToGovernment,
    ApprovedByGovernment,
    RejectedByGovernment,
    Rejected,
    WithdrawnFromGovernment,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::None => "none",
            VerificationStatus::ForwardedToGovernment => "forwarded_to_government",
            VerificationStatus::ApprovedByGovernment => "approved_by_government",
            VerificationStatus::RejectedByGovernment => "rejected_by_government",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::WithdrawnFromGovernment => "withdrawn_from_government",
        }
    }
}

/// Who issued the final verification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verifier {
    Admin,
    Government,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Draft,
    Submitted,
    Rejected,
    ForwardedToGovernment,
    ApprovedByGovernment,
    Verified,
    RejectedByGovernment,
    WithdrawnFromGovernment,
}

impl VerificationState {
    /// Derives the workflow state from the flags on a stored record.
    pub fn of(property: &Property) -> Self {
        if property.is_verified {
            return VerificationState::Verified;
        }
        if property.government_rejected {
            return VerificationState::RejectedByGovernment;
        }
        match property.verification_status {
            VerificationStatus::RejectedByGovernment => VerificationState::RejectedByGovernment,
            VerificationStatus::Rejected => VerificationState::Rejected,
            VerificationStatus::ApprovedByGovernment => VerificationState::ApprovedByGovernment,
            VerificationStatus::WithdrawnFromGovernment => {
                VerificationState::WithdrawnFromGovernment
            }
            VerificationStatus::ForwardedToGovernment if property.government_requested => {
                VerificationState::ForwardedToGovernment
            }
            _ if property.verification_requested => VerificationState::Submitted,
            _ => VerificationState::Draft,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationState::Verified | VerificationState::RejectedByGovernment
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationState::Draft => "draft",
            VerificationState::Submitted => "submitted",
            VerificationState::Rejected => "rejected",
            VerificationState::ForwardedToGovernment => "forwarded_to_government",
            VerificationState::ApprovedByGovernment => "approved_by_government",
            VerificationState::Verified => "verified",
            VerificationState::RejectedByGovernment => "rejected_by_government",
            VerificationState::WithdrawnFromGovernment => "withdrawn_from_government",
        }
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAction {
    Submit,
    Reject,
    Forward,
    Withdraw,
    Approve,
    GovernmentReject,
    /// Admin override that lists the property without a council decision.
    Verify,
    /// Admin override that takes a verified property off the listings.
    Unverify,
}

impl VerificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationAction::Submit => "submit",
            VerificationAction::Reject => "reject",
            VerificationAction::Forward => "forward",
            VerificationAction::Withdraw => "withdraw",
            VerificationAction::Approve => "approve",
            VerificationAction::GovernmentReject => "government_reject",
            VerificationAction::Verify => "verify",
            VerificationAction::Unverify => "unverify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submit" => Some(VerificationAction::Submit),
            "reject" => Some(VerificationAction::Reject),
            "forward" => Some(VerificationAction::Forward),
            "withdraw" => Some(VerificationAction::Withdraw),
            "approve" => Some(VerificationAction::Approve),
            "government_reject" | "government-reject" => Some(VerificationAction::GovernmentReject),
            "verify" => Some(VerificationAction::Verify),
            "unverify" => Some(VerificationAction::Unverify),
            _ => None,
        }
    }

    /// Role gate. Ownership of the property is checked separately for
    /// landlord submissions.
    pub fn permitted_for(&self, role: AccountType) -> bool {
        match self {
            VerificationAction::Submit => {
                matches!(role, AccountType::Landlord | AccountType::Admin)
            }
            VerificationAction::Reject
            | VerificationAction::Forward
            | VerificationAction::Withdraw
            | VerificationAction::Verify
            | VerificationAction::Unverify => role == AccountType::Admin,
            VerificationAction::Approve | VerificationAction::GovernmentReject => role.is_government(),
        }
    }

    /// Target state for this action from `from`, if the edge exists.
    pub fn target(&self, from: VerificationState) -> Option<VerificationState> {
        use VerificationState as S;
        match (self, from) {
            (VerificationAction::Submit, S::Draft | S::Rejected) => Some(S::Submitted),
            (VerificationAction::Reject, S::Submitted | S::WithdrawnFromGovernment) => Some(S::Rejected),
            (VerificationAction::Forward, S::Submitted | S::WithdrawnFromGovernment) => {
                Some(S::ForwardedToGovernment)
            }
            (VerificationAction::Withdraw, S::ForwardedToGovernment) => Some(S::WithdrawnFromGovernment),
            (VerificationAction::Approve, S::ForwardedToGovernment | S::ApprovedByGovernment) => {
                Some(S::Verified)
            }
            (VerificationAction::GovernmentReject, S::ForwardedToGovernment) => {
                Some(S::RejectedByGovernment)
            }
            // A forwarded property waits for the council; a government
            // rejection stays final.
            (
                VerificationAction::Verify,
                S::Draft | S::Submitted | S::Rejected | S::WithdrawnFromGovernment | S::ApprovedByGovernment,
            ) => Some(S::Verified),
            (VerificationAction::Unverify, S::Verified) => Some(S::Draft),
            _ => None,
        }
    }

    /// Field changes that realise this action. Each transition is one patch.
    pub fn patch(&self, now: Timestamp) -> PropertyPatch {
        match self {
            VerificationAction::Submit => PropertyPatch {
                is_verified: Some(false),
                verification_requested: Some(true),
                verification_requested_at: Some(now),
                verification_status: Some(VerificationStatus::None),
                ..Default::default()
            },
            VerificationAction::Reject => PropertyPatch {
                is_verified: Some(false),
                verification_status: Some(VerificationStatus::Rejected),
                verified_at: Some(now),
                verified_by: Some(Verifier::Admin),
                verification_requested: Some(false),
                ..Default::default()
            },
            VerificationAction::Forward => PropertyPatch {
                verification_status: Some(VerificationStatus::ForwardedToGovernment),
                forwarded_at: Some(now),
                forwarded_by: Some(AccountType::Admin.as_str().to_string()),
                government_requested: Some(true),
                government_requested_at: Some(now),
                ..Default::default()
            },
            VerificationAction::Withdraw => PropertyPatch {
                verification_status: Some(VerificationStatus::WithdrawnFromGovernment),
                verification_requested: Some(true),
                government_requested: Some(false),
                withdrawn_at: Some(now),
                ..Default::default()
            },
            VerificationAction::Approve => PropertyPatch {
                government_approved: Some(true),
                government_approved_at: Some(now),
                verification_status: Some(VerificationStatus::ApprovedByGovernment),
                is_verified: Some(true),
                verified_at: Some(now),
                verified_by: Some(Verifier::Government),
                ..Default::default()
            },
            VerificationAction::GovernmentReject => PropertyPatch {
                government_approved: Some(false),
                government_rejected: Some(true),
                government_rejected_at: Some(now),
                verification_status: Some(VerificationStatus::RejectedByGovernment),
                ..Default::default()
            },
            VerificationAction::Verify => PropertyPatch {
                is_verified: Some(true),
                verified_at: Some(now),
                verified_by: Some(Verifier::Admin),
                ..Default::default()
            },
            VerificationAction::Unverify => PropertyPatch {
                is_verified: Some(false),
                verification_requested: Some(false),
                verification_status: Some(VerificationStatus::None),
                government_requested: Some(false),
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for VerificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated transition ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: VerificationState,
    pub to: VerificationState,
    pub patch: PropertyPatch,
}

/// Checks `action` against the property's current state and the actor role.
pub fn plan_transition(
    property: &Property,
    action: VerificationAction,
    role: AccountType,
    now: Timestamp,
) -> Result<Transition, DomainError> {
    if !action.permitted_for(role) {
        return Err(DomainError::denied(format!(
            "{} cannot {} a property",
            role.as_str(),
            action
        )));
    }
    let from = VerificationState::of(property);
    let to = action
        .target(from)
        .ok_or(DomainError::InvalidTransition { from, action })?;
    Ok(Transition {
        from,
        to,
        patch: action.patch(now).stamped(now, role),
    })
}
