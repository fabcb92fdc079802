use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::AuthUser, error::{is_unique_violation, ApiError}, state::AppState};

use super::dto::{
    HouseholdCheck, HouseholdListItem, HouseholdMemberItem, HouseholdNameBody, MyHousehold,
};
use super::repo;

fn validate_household_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < 1 || len > 100 {
        return Err(ApiError::Validation(
            "Household name must be between 1 and 100 characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}

fn already_member() -> ApiError {
    ApiError::Conflict("You already belong to a household".into())
}

fn no_household() -> ApiError {
    ApiError::State("You don't belong to any household".into())
}

#[instrument(skip(state))]
pub async fn get_my_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Option<MyHousehold>>, ApiError> {
    let household = repo::my_household(&state.db, &user_id).await?;
    if household.is_some() {
        state.guard.mark(&user_id);
    }
    Ok(Json(household.map(|h| MyHousehold {
        id: h.id,
        name: h.name,
    })))
}

/// No membership check here: household metadata is discoverable so that
/// non-members can browse households in the join flow.
#[instrument(skip(state))]
pub async fn get_household_members(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<HouseholdMemberItem>>, ApiError> {
    let members = repo::list_members(&state.db, household_id).await?;
    let items = members
        .into_iter()
        .map(|m| HouseholdMemberItem {
            membership_id: m.membership_id,
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            image: m.image,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn list_households(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<HouseholdListItem>>, ApiError> {
    let households = repo::list_with_counts(&state.db).await?;
    let items = households
        .into_iter()
        .map(|h| HouseholdListItem {
            id: h.id,
            name: h.name,
            member_count: h.member_count,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, body))]
pub async fn create_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<HouseholdNameBody>,
) -> Result<(StatusCode, Json<Uuid>), ApiError> {
    let name = validate_household_name(&body.name)?;

    if repo::find_membership(&state.db, &user_id).await?.is_some() {
        return Err(already_member());
    }

    let household_id = repo::create_with_member(&state.db, &name, &user_id)
        .await
        .map_err(|e| {
            // Lost the race against a concurrent create/join from the same
            // user; the unique constraint on user_id is the arbiter.
            if is_unique_violation(&e) {
                already_member()
            } else {
                e.into()
            }
        })?;

    state.guard.mark(&user_id);
    info!(%user_id, %household_id, "household created");
    Ok((StatusCode::CREATED, Json(household_id)))
}

#[instrument(skip(state))]
pub async fn join_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(household_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if repo::find_membership(&state.db, &user_id).await?.is_some() {
        return Err(already_member());
    }

    if repo::find_household(&state.db, household_id).await?.is_none() {
        return Err(ApiError::NotFound("Household not found".into()));
    }

    repo::insert_member(&state.db, &user_id, household_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                already_member()
            } else {
                e.into()
            }
        })?;

    state.guard.mark(&user_id);
    info!(%user_id, %household_id, "household joined");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn leave_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    let membership = repo::find_membership(&state.db, &user_id)
        .await?
        .ok_or_else(no_household)?;

    let household_deleted =
        repo::remove_member_cascade(&state.db, membership.id, membership.household_id).await?;

    state.guard.reset(&user_id);
    info!(
        %user_id,
        household_id = %membership.household_id,
        household_deleted,
        "household left"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, body))]
pub async fn update_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<HouseholdNameBody>,
) -> Result<StatusCode, ApiError> {
    let name = validate_household_name(&body.name)?;

    let membership = repo::find_membership(&state.db, &user_id)
        .await?
        .ok_or_else(no_household)?;

    repo::rename(&state.db, membership.household_id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Guard endpoint for the client routing layer: consults the session cache
/// before touching the database.
#[instrument(skip(state))]
pub async fn check_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HouseholdCheck>, ApiError> {
    if state.guard.is_marked(&user_id) {
        return Ok(Json(HouseholdCheck {
            has_household: true,
        }));
    }

    let has_household = repo::find_membership(&state.db, &user_id).await?.is_some();
    if has_household {
        state.guard.mark(&user_id);
    }
    Ok(Json(HouseholdCheck { has_household }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rejects_empty_and_whitespace() {
        for name in ["", "   ", "\t\n"] {
            let err = validate_household_name(name).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Household name must be between 1 and 100 characters"
            );
        }
    }

    #[test]
    fn test_name_length_boundaries() {
        assert_eq!(validate_household_name("a").unwrap(), "a");
        assert!(validate_household_name(&"a".repeat(100)).is_ok());
        assert!(validate_household_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(validate_household_name("  Our Home  ").unwrap(), "Our Home");
        // 100 chars after trimming is still valid
        let padded = format!("  {}  ", "a".repeat(100));
        assert!(validate_household_name(&padded).is_ok());
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // 100 multibyte characters must pass the limit
        let name = "ä".repeat(100);
        assert!(validate_household_name(&name).is_ok());
    }
}
