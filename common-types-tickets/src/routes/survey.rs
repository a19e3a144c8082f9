use axum::{
    extract::State,
    http::StatusCode,
    Json
};
use chrono::Utc;
use serde::Serialize;
use garde::Validate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use common_types::Mail::Message;
use common_types::Notify::EventKind;

use crate::{
    Schema::{tickets, surveys},
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    Email,
    Constants,
};

pub mod db;
use db::{RequestPayload, InsertableSurvey};

#[derive(Serialize)]
pub struct SurveyResponse {
    pub warning: Option<String>,
}

// POST API endpoint
#[tracing::instrument(skip(appstate, user_request), fields(request="POST /survey",ticket_id=%user_request.ticket_id))]
pub async fn request(State(appstate): State<AppState>, Json(user_request): Json<RequestPayload>) -> Result<Json<SurveyResponse>, ServerResponse> {
    let validation_result = user_request.validate(&());
    if let Err(err) = validation_result {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }

    let mut conn = appstate.postgres.get().await.map_err(|err| {
        tracing::error!("Failed to fetch Postgres connection, {err}");
        internal_server_error("Internal Service Error")
    })?;

    let ticket_exists: i64 = tickets::table
        .filter(tickets::id.eq(user_request.ticket_id))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to look up ticket for survey, {err}");
            internal_server_error("Internal Service Error")
        })?;
    if ticket_exists == 0 {
        return Err(status_response(StatusCode::NOT_FOUND, "Ticket not found"));
    }

    // One survey per ticket, written once at closure time.
    let existing_surveys: i64 = surveys::table
        .filter(surveys::ticket_id.eq(user_request.ticket_id))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to count surveys, {err}");
            internal_server_error("Internal Service Error")
        })?;
    if existing_surveys > 0 {
        return Err(status_response(StatusCode::CONFLICT, "A survey has already been submitted for this ticket"));
    }

    let utc = Utc::now().naive_utc();
    let surveys_added = diesel::insert_into(surveys::table)
        .values(&InsertableSurvey {
            ticket_id: user_request.ticket_id,
            ease_of_use: user_request.ease_of_use,
            response_time: user_request.response_time,
            resolution_quality: user_request.resolution_quality,
            overall_satisfaction: user_request.overall_satisfaction,
            comments: &user_request.comments,
            submitted_at: utc,
        })
        .execute(&mut conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert survey, {err}");
            internal_server_error("Internal Service Error")
        })?;
    if surveys_added != 1 {
        tracing::error!("Expected 1 survey record to be inserted, instead got {surveys_added}");
        return Err(internal_server_error("Internal Service Error"));
    }

    let mut warning = None;
    let message = Message {
        to: Constants::SUPPORT_EMAIL.clone(),
        subject: format!("Survey Results - Ticket #{}", user_request.ticket_id),
        html: Email::render_survey_summary(
            user_request.ticket_id,
            [
                ("Ease of Use", user_request.ease_of_use),
                ("Response Time", user_request.response_time),
                ("Resolution Quality", user_request.resolution_quality),
                ("Overall Satisfaction", user_request.overall_satisfaction),
            ],
            &user_request.comments,
        ),
    };
    if let Err(err) = Email::dispatch(&appstate, EventKind::SurveySummary, message).await {
        tracing::warn!("Failed to send survey summary for ticket {}, {err}", user_request.ticket_id);
        warning = Some("Survey was recorded but the summary email could not be sent".to_string());
    }

    Ok(Json(SurveyResponse { warning }))
}
