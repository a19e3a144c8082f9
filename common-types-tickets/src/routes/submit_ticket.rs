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
    Schema::tickets,
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    DB,
    db_schema::hooked_sql_types::TicketStatus,
    Lifecycle,
    Email,
    Constants,
};

pub mod db;
use db::{RequestPayload, InsertableTicket};

#[derive(Serialize)]
pub struct SubmitTicketResponse {
    #[serde(rename = "issueId")]
    pub issue_id: String,
    pub warning: Option<String>,
}

// POST API endpoint
#[tracing::instrument(skip(appstate, user_request), fields(request="POST /submit-ticket"))]
pub async fn request(State(appstate): State<AppState>, Json(user_request): Json<RequestPayload>) -> Result<Json<SubmitTicketResponse>, ServerResponse> {
    let validation_result = user_request.validate(&());
    if let Err(err) = validation_result {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }

    let mut conn = appstate.postgres.get().await.map_err(|err| {
        tracing::error!("Failed to fetch Postgres connection, {err}");
        internal_server_error("Internal Service Error")
    })?;

    // The sequence number comes from the live row count. A failed count is a
    // hard error; minting ids from a guessed sequence would hand two
    // customers the same issue id far more often than the race below does.
    let ticket_count: i64 = tickets::table
        .count()
        .get_result(&mut conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to count tickets for issue id generation, {err}");
            internal_server_error("Internal Service Error")
        })?;
    let issue_id = Lifecycle::issue_id(&user_request.name, ticket_count);

    let utc = Utc::now().naive_utc();
    let ticket: DB::Ticket = diesel::insert_into(tickets::table)
        .values(&InsertableTicket {
            issue_id: &issue_id,
            name: &user_request.name,
            email: &user_request.email,
            problem_statement: &user_request.problem_statement,
            priority: user_request.priority,
            status: TicketStatus::default(),
            area: &user_request.area,
            tool_id: &user_request.tool_id,
            wiings_order: &user_request.wiings_order,
            part_number: &user_request.part_number,
            supplier: &user_request.supplier,
            fab_submitted_as: &user_request.fab_submitted_as,
            created_at: utc,
            updated_at: utc,
        })
        .returning(DB::Ticket::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(|err| match err {
            // Two concurrent submissions can read the same count and mint
            // the same id; the unique constraint catches the loser.
            diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _) => {
                tracing::warn!("Issue id collision on {issue_id}, concurrent submission");
                status_response(StatusCode::CONFLICT, "Ticket submission collided, please retry")
            },
            _ => {
                tracing::error!("Failed to insert ticket, {err}");
                internal_server_error("Internal Service Error")
            },
        })?;

    let mut warning = None;
    let support_mail = Message {
        to: Constants::SUPPORT_EMAIL.clone(),
        subject: "New Support Ticket Submitted".to_string(),
        html: Email::render_new_ticket_support(&ticket),
    };
    if let Err(err) = Email::dispatch(&appstate, EventKind::NewTicket, support_mail).await {
        tracing::warn!("Failed to notify support of new ticket {}, {err}", ticket.issue_id);
        warning = Some("Ticket was created but the support notification could not be sent".to_string());
    }
    let customer_mail = Message {
        to: ticket.email.clone(),
        subject: format!("Ticket Received: {}", ticket.issue_id),
        html: Email::render_new_ticket_customer(&*Constants::APP_BASE_URL, &ticket),
    };
    if let Err(err) = Email::dispatch(&appstate, EventKind::NewTicket, customer_mail).await {
        tracing::warn!("Failed to send confirmation for ticket {}, {err}", ticket.issue_id);
        warning = Some("Ticket was created but the confirmation email could not be sent".to_string());
    }

    Ok(Json(SubmitTicketResponse {
        issue_id: ticket.issue_id,
        warning,
    }))
}
