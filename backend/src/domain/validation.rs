//! Form validation for settings requests. Runs before any write.

use shared::{
    CreateChildRequest, CreateRewardRequest, CreateTaskRequest, TaskCycle, UpdateChildRequest,
    UpdateRewardRequest, UpdateTaskRequest,
};
use thiserror::Error;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_AGE: u32 = 18;
pub const MAX_POINTS: i64 = 10_000;
pub const MAX_COST: i64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a nickname.")]
    EmptyNickname,
    #[error("Please enter a name.")]
    EmptyName,
    #[error("{field} cannot exceed {max} characters.")]
    TooLong { field: &'static str, max: usize },
    #[error("Points must be greater than zero.")]
    NonPositivePoints,
    #[error("Cost must be greater than zero.")]
    NonPositiveCost,
    #[error("A task can give at most {max} points.")]
    TooManyPoints { max: i64 },
    #[error("A reward can cost at most {max} points.")]
    CostTooHigh { max: i64 },
    #[error("Age must be between 1 and 18.")]
    AgeOutOfRange,
    #[error("Cycle must be daily, weekly or once.")]
    UnknownCycle,
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.trim().is_empty() {
        return Err(ValidationError::EmptyNickname);
    }
    check_length("Nickname", nickname.trim(), MAX_NAME_LENGTH)
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    check_length("Name", name.trim(), MAX_NAME_LENGTH)
}

fn check_age(age: Option<u32>) -> Result<(), ValidationError> {
    match age {
        Some(age) if age == 0 || age > MAX_AGE => Err(ValidationError::AgeOutOfRange),
        _ => Ok(()),
    }
}

fn check_points(points: i64) -> Result<(), ValidationError> {
    if points <= 0 {
        return Err(ValidationError::NonPositivePoints);
    }
    if points > MAX_POINTS {
        return Err(ValidationError::TooManyPoints { max: MAX_POINTS });
    }
    Ok(())
}

fn check_cost(cost: i64) -> Result<(), ValidationError> {
    if cost <= 0 {
        return Err(ValidationError::NonPositiveCost);
    }
    if cost > MAX_COST {
        return Err(ValidationError::CostTooHigh { max: MAX_COST });
    }
    Ok(())
}

fn check_cycle(cycle: TaskCycle) -> Result<(), ValidationError> {
    if cycle == TaskCycle::Unknown {
        return Err(ValidationError::UnknownCycle);
    }
    Ok(())
}

pub fn validate_create_child(request: &CreateChildRequest) -> Result<(), ValidationError> {
    check_nickname(&request.nickname)?;
    check_age(request.age)
}

pub fn validate_update_child(request: &UpdateChildRequest) -> Result<(), ValidationError> {
    if let Some(nickname) = &request.nickname {
        check_nickname(nickname)?;
    }
    check_age(request.age)
}

pub fn validate_create_task(request: &CreateTaskRequest) -> Result<(), ValidationError> {
    check_name(&request.name)?;
    check_length("Description", &request.description, MAX_DESCRIPTION_LENGTH)?;
    check_points(request.points)?;
    check_cycle(request.cycle)
}

pub fn validate_update_task(request: &UpdateTaskRequest) -> Result<(), ValidationError> {
    if let Some(name) = &request.name {
        check_name(name)?;
    }
    if let Some(description) = &request.description {
        check_length("Description", description, MAX_DESCRIPTION_LENGTH)?;
    }
    if let Some(points) = request.points {
        check_points(points)?;
    }
    match request.cycle {
        Some(cycle) => check_cycle(cycle),
        None => Ok(()),
    }
}

pub fn validate_create_reward(request: &CreateRewardRequest) -> Result<(), ValidationError> {
    check_name(&request.name)?;
    if let Some(description) = &request.description {
        check_length("Description", description, MAX_DESCRIPTION_LENGTH)?;
    }
    check_cost(request.cost)
}

pub fn validate_update_reward(request: &UpdateRewardRequest) -> Result<(), ValidationError> {
    if let Some(name) = &request.name {
        check_name(name)?;
    }
    if let Some(description) = &request.description {
        check_length("Description", description, MAX_DESCRIPTION_LENGTH)?;
    }
    match request.cost {
        Some(cost) => check_cost(cost),
        None => Ok(()),
    }
}
