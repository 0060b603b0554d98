use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use trip_planner_data_management::DataManagerError;
use trip_planner_lib::{
    error::TripError,
    membership::MembershipList,
    place::{NewPlace, PlacePatch},
    trip::TripPatch,
};

use crate::auth_endpoint::authenticate;
use crate::server_state::ServerState;

/// Stable error-kind to status mapping; the body carries the display text
/// for the UI.
pub fn error_response(err: DataManagerError) -> Response {
    let status = match &err {
        DataManagerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DataManagerError::EmailTaken => StatusCode::CONFLICT,
        DataManagerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DataManagerError::Trip(trip_err) => match trip_err {
            TripError::Unauthorized => StatusCode::FORBIDDEN,
            TripError::TripNotFound | TripError::PlaceNotFound | TripError::UserNotFound => StatusCode::NOT_FOUND,
            TripError::InvalidTarget | TripError::AlreadyPresent => StatusCode::CONFLICT,
            TripError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        },
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Request failed: {err}");
        return status.into_response();
    }

    (status, Json(json!({ "message": err.to_string() }))).into_response()
}

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub list: MembershipList,
}

#[derive(Serialize)]
pub struct ParticipantsResponse {
    pub owner: String,
    pub collaborators: String,
    pub members: String,
}

pub async fn get_trips(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.get_authorized_trips(&user).await {
        Ok(trips) => Json(trips).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn create_trip(State(state): State<Arc<ServerState>>, headers: HeaderMap, Json(request): Json<CreateTripRequest>) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager
        .create_trip(&user, request.title, request.description, request.start_date, request.end_date)
        .await
    {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.get_trip_for(&user, trip_id).await {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn update_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap, Json(patch): Json<TripPatch>) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.update_trip_details(&user, trip_id, patch).await {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn delete_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.delete_trip(&user, trip_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_participants(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let trip = match state.data_manager.get_trip_for(&user, trip_id).await {
        Ok(trip) => trip,
        Err(err) => return error_response(err),
    };

    let owner = state.data_manager.format_user_list(&[trip.owner_id]).await;
    let collaborators = state.data_manager.format_user_list(&trip.collaborator_ids).await;
    let members = state.data_manager.format_user_list(&trip.member_ids).await;

    match (owner, collaborators, members) {
        (Ok(owner), Ok(collaborators), Ok(members)) => Json(ParticipantsResponse {
            owner,
            collaborators,
            members,
        }).into_response(),
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => error_response(err),
    }
}

/// The invite form sends an email; resolve it to a user before the add.
pub async fn add_member(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap, Json(request): Json<AddMemberRequest>) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let target = match state.data_manager.lookup_user_by_email(&request.email).await {
        Ok(Some(target)) => target,
        Ok(None) => return error_response(TripError::UserNotFound.into()),
        Err(err) => return error_response(err),
    };

    match state.data_manager.add_user_to_list(&user, trip_id, target.user_id, request.list).await {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn remove_member(State(state): State<Arc<ServerState>>, Path((trip_id, user_id)): Path<(i64, i64)>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.remove_user_from_trip(&user, trip_id, user_id).await {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_places(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.get_trip_places(&user, trip_id).await {
        Ok(places) => Json(places).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn get_places_by_day(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.get_places_by_day(&user, trip_id).await {
        Ok(by_day) => Json(by_day).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn add_place(State(state): State<Arc<ServerState>>, Path(trip_id): Path<i64>, headers: HeaderMap, Json(data): Json<NewPlace>) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.add_place(&user, trip_id, data).await {
        Ok(place) => Json(place).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn update_place(State(state): State<Arc<ServerState>>, Path((trip_id, place_id)): Path<(i64, i64)>, headers: HeaderMap, Json(patch): Json<PlacePatch>) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.update_place(&user, trip_id, place_id, patch).await {
        Ok(place) => Json(place).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn delete_place(State(state): State<Arc<ServerState>>, Path((trip_id, place_id)): Path<(i64, i64)>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.data_manager.delete_place(&user, trip_id, place_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}
