//! Request validation. Everything here runs before a domain call.

use simactive_shared::constants::{SERVICE_NAME_MAX_LEN, SIM_NUMBER_MAX_LEN, SIM_NUMBER_MIN_LEN};
use simactive_shared::EntityId;

use crate::error::ServerError;

pub fn id(id: EntityId) -> Result<EntityId, ServerError> {
    if id <= 0 {
        return Err(ServerError::BadRequest(format!("id must be positive, got {id}")));
    }
    Ok(id)
}

pub fn sim_number(number: &str) -> Result<(), ServerError> {
    let len = number.len();
    if !(SIM_NUMBER_MIN_LEN..=SIM_NUMBER_MAX_LEN).contains(&len)
        || !number.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ServerError::BadRequest(format!(
            "sim number must be {SIM_NUMBER_MIN_LEN} to {SIM_NUMBER_MAX_LEN} digits, got {number:?}"
        )));
    }
    Ok(())
}

pub fn provider_name(name: &str) -> Result<(), ServerError> {
    if name.trim().is_empty() {
        return Err(ServerError::BadRequest("provider name must not be empty".into()));
    }
    Ok(())
}

pub fn service_name(name: &str) -> Result<(), ServerError> {
    if name.trim().is_empty() {
        return Err(ServerError::BadRequest("service name must not be empty".into()));
    }
    if name.chars().count() > SERVICE_NAME_MAX_LEN {
        return Err(ServerError::BadRequest(format!(
            "service name must be at most {SERVICE_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}
