use ::std::sync::Arc;
use ::tokio::sync::Mutex;
use axum::{
    extract::{
        Extension,
        State,
    },
    http::StatusCode,
    Json
};
use chrono::Utc;
use serde::Serialize;
use garde::Validate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use common_types::Mail::Message;
use common_types::Notify::EventKind;

use crate::{
    Schema::{tickets, comments},
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    Middleware::actor::ActorDescription,
    DB::Ticket,
    db_schema::hooked_sql_types::TicketStatus,
    Lifecycle,
    Email,
    Constants,
};

pub mod db;
use db::{RequestPayload, InsertableComment};

#[derive(Serialize)]
pub struct UpdateTicketResponse {
    pub updated: bool,
    pub warning: Option<String>,
}

// PUT API endpoint
#[tracing::instrument(skip(actor, appstate, user_request), fields(request="PUT /ticket/status",issue_id=%user_request.issue_id))]
pub async fn request(Extension(actor): Extension<ActorDescription>, State(appstate): State<AppState>, Json(user_request): Json<RequestPayload>) -> Result<Json<UpdateTicketResponse>, ServerResponse> {
    let validation_result = user_request.validate(&());
    if let Err(err) = validation_result {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }
    // Entering Closed is gated on the closure fields, which this route does
    // not carry. The close endpoint is the only way in.
    if let TicketStatus::Closed = user_request.status {
        return Err(status_response(StatusCode::BAD_REQUEST, "Closing a ticket requires closure details, use the close operation"));
    }

    struct TransactionSuccess {
        ticket: Ticket,
        deltas: Vec<String>,
    }

    enum TransactionCommand {
        None,
        NoChange,
        UnexpectedUpdatedRows,
        Success(TransactionSuccess),
    }

    let actor_name = actor.audit_name().to_string();
    let new_status = user_request.status;
    let new_priority = user_request.priority;

    let transaction_command = Arc::new(Mutex::new(TransactionCommand::None));
    {
        let mut conn = appstate.postgres.get().await.map_err(|err| {
            tracing::error!("Failed to fetch Postgres connection, {err}");
            internal_server_error("Internal Service Error")
        })?;

        let issue_id = user_request.issue_id.clone();
        let transaction_command = Arc::clone(&transaction_command);
        let result = conn.build_transaction()
                    .serializable()
                    .run::<_, diesel::result::Error, _>(|conn| async move {
                        let utc = Utc::now().naive_utc();
                        let mut ticket = tickets::table.filter(tickets::issue_id.eq(&issue_id))
                                                            .select(Ticket::as_select())
                                                            .for_update()
                                                            .first(conn)
                                                            .await?;

                        let deltas = Lifecycle::audit_deltas(ticket.status, new_status, ticket.priority, new_priority);
                        if deltas.is_empty() {
                            *transaction_command.lock().await = TransactionCommand::NoChange;
                            return Ok(());
                        }

                        // The audit trail commits with the ticket write or
                        // not at all, so the comment store never shows a
                        // change the ticket store lacks.
                        {
                            let audit_rows = deltas.iter().map(|text| InsertableComment {
                                    ticket_id: ticket.id,
                                    text,
                                    commenter_name: &actor_name,
                                    image_url: None,
                                    created_at: utc,
                                }).collect::<Vec<InsertableComment>>();
                            let comments_added = diesel::insert_into(comments::table)
                                .values(&audit_rows)
                                .execute(conn).await?;
                            if comments_added != audit_rows.len() {
                                *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                                return Err(diesel::result::Error::RollbackTransaction);
                            }
                        }

                        let tickets_updated = diesel::update(tickets::table.filter(tickets::id.eq(ticket.id)))
                                        .set((
                                                tickets::status.eq(new_status),
                                                tickets::priority.eq(new_priority),
                                                tickets::updated_at.eq(utc)
                                        ))
                                        .execute(conn)
                                        .await?;
                        if tickets_updated != 1 {
                            *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                            return Err(diesel::result::Error::RollbackTransaction);
                        }

                        ticket.status = new_status;
                        ticket.priority = new_priority;
                        ticket.updated_at = utc;
                        *transaction_command.lock().await = TransactionCommand::Success(TransactionSuccess {
                            ticket,
                            deltas,
                        });

                        Ok::<(),_>(())
                    }.scope_boxed()).await;

        match result {
            Ok(_) => (),
            Err(err) => match err {
                diesel::result::Error::RollbackTransaction => (),
                diesel::result::Error::NotFound => return Err(status_response(StatusCode::NOT_FOUND, "Ticket not found")),
                _ => {
                    tracing::error!("Transaction error: {err}");
                    return Err(internal_server_error("Internal Service Error"));
                },
            },
        }
    }

    let command = &*transaction_command.lock().await;
    match command {
        TransactionCommand::None => Err(internal_server_error("None")),
        TransactionCommand::UnexpectedUpdatedRows => {
            tracing::error!("Failed to update ticket because received unexpected number of updated rows");
            Err(internal_server_error("Internal Service Error"))
        },
        TransactionCommand::NoChange => Ok(Json(UpdateTicketResponse { updated: false, warning: None })),
        TransactionCommand::Success(info) => {
            let mut warning = None;
            let message = Message {
                to: info.ticket.email.clone(),
                subject: format!("Ticket Update: {}", info.ticket.issue_id),
                html: Email::render_status_update(&*Constants::APP_BASE_URL, &info.ticket, &info.deltas),
            };
            if let Err(err) = Email::dispatch(&appstate, EventKind::StatusUpdate, message).await {
                tracing::warn!("Failed to send status update for {}, {err}", info.ticket.issue_id);
                warning = Some("Ticket was updated but the notification email could not be sent".to_string());
            }
            Ok(Json(UpdateTicketResponse { updated: true, warning }))
        },
    }
}
