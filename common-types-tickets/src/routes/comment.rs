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
use base64::prelude::*;
use chrono::Utc;
use serde::Serialize;
use garde::Validate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use common_types::Mail::Message;
use common_types::Notify::{CommentRow, EventKind};

use crate::{
    Schema::{tickets, comments},
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    Middleware::actor::ActorDescription,
    DB::{Ticket, Comment},
    Email,
    Uploads,
    Constants,
};

pub mod db;
use db::RequestPayload;
use super::update_ticket::db::InsertableComment;

#[derive(Serialize)]
pub struct AddCommentResponse {
    pub warning: Option<String>,
}

// POST API endpoint
#[tracing::instrument(skip(actor, appstate, user_request), fields(request="POST /ticket/comment",issue_id=%user_request.issue_id))]
pub async fn request(Extension(actor): Extension<ActorDescription>, State(appstate): State<AppState>, Json(user_request): Json<RequestPayload>) -> Result<Json<AddCommentResponse>, ServerResponse> {
    let validation_result = user_request.validate(&());
    if let Err(err) = validation_result {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }
    if !user_request.has_content() {
        return Err(status_response(StatusCode::BAD_REQUEST, "Comment requires text or an image"));
    }

    let mut conn = appstate.postgres.get().await.map_err(|err| {
        tracing::error!("Failed to fetch Postgres connection, {err}");
        internal_server_error("Internal Service Error")
    })?;

    let ticket = match tickets::table.filter(tickets::issue_id.eq(&user_request.issue_id))
                                    .select(Ticket::as_select())
                                    .first(&mut conn)
                                    .await {
                                        Ok(ticket) => ticket,
                                        Err(err) => match err {
                                            diesel::result::Error::NotFound => return Err(status_response(StatusCode::NOT_FOUND, "Ticket not found")),
                                            _ => {
                                                tracing::error!("Failed to fetch ticket record due to {err}");
                                                return Err(internal_server_error("Internal Service Error"));
                                            },
                                        },
                                    };

    // The attachment is stored before the comment row exists so the insert
    // already carries its public URL. A failed upload degrades to a plain
    // comment instead of failing the whole operation.
    let mut warning = None;
    let mut image_url = None;
    if let Some(ref image) = user_request.image {
        let bytes = BASE64_STANDARD.decode(&image.content_base64).map_err(|err| {
            tracing::info!("Image payload failed base64 decode, {err}");
            status_response(StatusCode::BAD_REQUEST, "Image payload is not valid base64")
        })?;
        match Uploads::store_comment_image(&appstate, ticket.id, &image.file_name, bytes).await {
            Ok(url) => image_url = Some(url),
            Err(err) => {
                tracing::warn!("Image upload failed for ticket {}, {err}", ticket.issue_id);
                warning = Some("Image upload failed, comment was posted without the attachment".to_string());
            },
        }
    }

    enum TransactionCommand {
        None,
        UnexpectedUpdatedRows,
        Success,
    }

    let transaction_command = Arc::new(Mutex::new(TransactionCommand::None));
    {
        let ticket_id = ticket.id;
        let text = user_request.text.clone();
        let commenter_name = actor.commenter_name().to_string();
        let image_url = image_url.clone();
        let transaction_command = Arc::clone(&transaction_command);
        let result = conn.build_transaction()
                    .serializable()
                    .run::<_, diesel::result::Error, _>(|conn| async move {
                        let utc = Utc::now().naive_utc();
                        let comments_added = diesel::insert_into(comments::table)
                            .values(&InsertableComment {
                                    ticket_id,
                                    text: &text,
                                    commenter_name: &commenter_name,
                                    image_url: image_url.as_deref(),
                                    created_at: utc,
                                })
                            .execute(conn).await?;
                        if comments_added != 1 {
                            *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                            return Err(diesel::result::Error::RollbackTransaction);
                        }

                        let tickets_updated = diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                                        .set(tickets::updated_at.eq(utc))
                                        .execute(conn)
                                        .await?;
                        if tickets_updated != 1 {
                            *transaction_command.lock().await = TransactionCommand::UnexpectedUpdatedRows;
                            return Err(diesel::result::Error::RollbackTransaction);
                        }

                        *transaction_command.lock().await = TransactionCommand::Success;
                        Ok::<(),_>(())
                    }.scope_boxed()).await;

        match result {
            Ok(_) => (),
            Err(err) => match err {
                diesel::result::Error::RollbackTransaction => (),
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
            tracing::error!("Failed to add comment because received unexpected number of updated rows");
            Err(internal_server_error("Internal Service Error"))
        },
        TransactionCommand::Success => {
            let rows = comments::table.filter(comments::ticket_id.eq(ticket.id))
                                    .select(Comment::as_select())
                                    .order(comments::created_at.desc())
                                    .load(&mut conn)
                                    .await
                                    .unwrap_or_else(|err| {
                                        tracing::warn!("Failed to fetch comments for notification on {}, {err}", ticket.issue_id);
                                        Vec::new()
                                    })
                                    .into_iter()
                                    .map(|comment: Comment| CommentRow {
                                        commenter_name: comment.commenter_name,
                                        text: comment.text,
                                        created_at: comment.created_at,
                                    })
                                    .collect::<Vec<CommentRow>>();

            let message = Message {
                to: ticket.email.clone(),
                subject: format!("Ticket Update: {}", ticket.issue_id),
                html: Email::render_new_comment(&*Constants::APP_BASE_URL, &ticket, &rows),
            };
            if let Err(err) = Email::dispatch(&appstate, EventKind::NewComment, message).await {
                tracing::warn!("Failed to send comment notification for {}, {err}", ticket.issue_id);
                warning = Some("Comment was posted but the notification email could not be sent".to_string());
            }
            Ok(Json(AddCommentResponse { warning }))
        },
    }
}
