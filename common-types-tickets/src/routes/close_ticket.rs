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
use db::RequestPayload;
use super::update_ticket::db::InsertableComment;

#[derive(Serialize)]
pub struct CloseTicketResponse {
    pub closed: bool,
    pub warning: Option<String>,
}

// PUT API endpoint
#[tracing::instrument(skip(actor, appstate, user_request), fields(request="PUT /ticket/close",issue_id=%user_request.issue_id))]
pub async fn request(Extension(actor): Extension<ActorDescription>, State(appstate): State<AppState>, Json(user_request): Json<RequestPayload>) -> Result<Json<CloseTicketResponse>, ServerResponse> {
    let validation_result = user_request.validate(&());
    if let Err(err) = validation_result {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }

    enum TransactionCommand {
        None,
        AlreadyClosed,
        UnexpectedUpdatedRows,
        Success(Ticket),
    }

    let actor_name = actor.audit_name().to_string();

    let transaction_command = Arc::new(Mutex::new(TransactionCommand::None));
    {
        let mut conn = appstate.postgres.get().await.map_err(|err| {
            tracing::error!("Failed to fetch Postgres connection, {err}");
            internal_server_error("Internal Service Error")
        })?;

        let issue_id = user_request.issue_id.clone();
        let reason = user_request.reason.clone();
        let subreason = user_request.subreason.clone();
        let close_message = user_request.message.clone();
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

                        if let TicketStatus::Closed = ticket.status {
                            *transaction_command.lock().await = TransactionCommand::AlreadyClosed;
                            return Ok(());
                        }

                        {
                            let summary = Lifecycle::close_summary(&reason, &subreason, &close_message);
                            let comments_added = diesel::insert_into(comments::table)
                                .values(&InsertableComment {
                                        ticket_id: ticket.id,
                                        text: &summary,
                                        commenter_name: &actor_name,
                                        image_url: None,
                                        created_at: utc,
                                    })
                                .execute(conn).await?;
                            if comments_added != 1 {
                                *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                                return Err(diesel::result::Error::RollbackTransaction);
                            }
                        }

                        let tickets_updated = diesel::update(tickets::table.filter(tickets::id.eq(ticket.id)))
                                        .set((
                                                tickets::status.eq(TicketStatus::Closed),
                                                tickets::closed_reason.eq(&reason),
                                                tickets::closed_subreason.eq(&subreason),
                                                tickets::closed_message.eq(&close_message),
                                                tickets::updated_at.eq(utc)
                                        ))
                                        .execute(conn)
                                        .await?;
                        if tickets_updated != 1 {
                            *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                            return Err(diesel::result::Error::RollbackTransaction);
                        }

                        ticket.status = TicketStatus::Closed;
                        ticket.closed_reason = Some(reason);
                        ticket.closed_subreason = Some(subreason);
                        ticket.closed_message = Some(close_message);
                        ticket.updated_at = utc;
                        *transaction_command.lock().await = TransactionCommand::Success(ticket);

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
            tracing::error!("Failed to close ticket because received unexpected number of updated rows");
            Err(internal_server_error("Internal Service Error"))
        },
        // Closing a closed ticket changes nothing and sends nothing.
        TransactionCommand::AlreadyClosed => Ok(Json(CloseTicketResponse { closed: true, warning: None })),
        TransactionCommand::Success(ticket) => {
            let mut warning = None;
            let message = Message {
                to: ticket.email.clone(),
                subject: format!("Ticket Closed: {}", ticket.issue_id),
                html: Email::render_closed(&*Constants::APP_BASE_URL, ticket),
            };
            if let Err(err) = Email::dispatch(&appstate, EventKind::Closed, message).await {
                tracing::warn!("Failed to send closure notification for {}, {err}", ticket.issue_id);
                warning = Some("Ticket was closed but the notification email could not be sent".to_string());
            }
            Ok(Json(CloseTicketResponse { closed: true, warning }))
        },
    }
}
