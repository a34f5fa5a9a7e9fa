//! Error taxonomy of the domain layer.
//!
//! [`RuleViolation`] comes out of the pure rules engine, [`ActionError`] is
//! what a page controller returns for a rejected user action. Every
//! [`ActionError`] knows the toast severity and the message shown to the
//! child or parent.

use shared::ToastSeverity;
use thiserror::Error;

use super::validation::ValidationError;
use crate::storage::StoreError;

/// A transition the domain rules refuse to make
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("\"{task_name}\" is already done, come back later!")]
    TaskAlreadyCompleted { task_name: String },
    #[error("Not enough points: need {needed}, you have {available}.")]
    InsufficientPoints { needed: i64, available: i64 },
    #[error("\"{task_name}\" cannot add any more points.")]
    PointsLimitReached { task_name: String },
    #[error("Egg {slot} has already hatched.")]
    EggAlreadyHatched { slot: usize },
    #[error("No egg is ready to hatch yet. Earn {points_to_next} more points!")]
    NoHatchAvailable { points_to_next: i64 },
    #[error("There is no egg slot {slot}.")]
    SlotOutOfRange { slot: usize },
    #[error("Egg {slot} has not hatched yet.")]
    EggNotHatched { slot: usize },
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no active child selected")]
    NoActiveChild,
    #[error("child not found: {0}")]
    ChildNotFound(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("reward not found: {0}")]
    RewardNotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl ActionError {
    pub fn severity(&self) -> ToastSeverity {
        match self {
            ActionError::NoActiveChild => ToastSeverity::Info,
            _ => ToastSeverity::Danger,
        }
    }

    /// Text shown in the toast for this failure
    pub fn user_message(&self) -> String {
        match self {
            ActionError::NoActiveChild => "Please add or pick a child first.".to_string(),
            ActionError::ChildNotFound(_) => "That child no longer exists.".to_string(),
            ActionError::TaskNotFound(_) => "That task no longer exists.".to_string(),
            ActionError::RewardNotFound(_) => "That reward no longer exists.".to_string(),
            ActionError::Validation(e) => e.to_string(),
            ActionError::Rule(e) => e.to_string(),
            ActionError::PermissionDenied(_) => {
                "Permission denied, the change was not saved.".to_string()
            }
            ActionError::WriteFailed(_) => "Saving failed, please try again.".to_string(),
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied(reason) => ActionError::PermissionDenied(reason),
            // Transactions abort with the domain error that stopped them
            StoreError::Aborted(source) => match source.downcast::<ActionError>() {
                Ok(action_error) => action_error,
                Err(source) => match source.downcast::<RuleViolation>() {
                    Ok(rule) => ActionError::Rule(rule),
                    Err(source) => ActionError::WriteFailed(source.to_string()),
                },
            },
            other => ActionError::WriteFailed(other.to_string()),
        }
    }
}
