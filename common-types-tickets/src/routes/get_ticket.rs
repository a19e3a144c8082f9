use axum::{
    extract::{
        State,
        Query,
    },
    http::StatusCode,
    Json
};
use chrono::NaiveDateTime;
use serde::Serialize;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{
    Schema::{tickets, comments},
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    DB::{Ticket, Comment},
    db_schema::hooked_sql_types::{TicketPriority, TicketStatus},
};

pub mod db;
use db::TicketRequest;

#[derive(Serialize)]
pub struct CommentPayload {
    #[serde(rename = "commentId")]
    comment_id: i32,
    text: String,
    #[serde(rename = "commenterName")]
    commenter_name: String,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
}

impl Into<CommentPayload> for Comment {
    fn into(self) -> CommentPayload {
        CommentPayload {
            comment_id: self.id,
            text: self.text,
            commenter_name: self.commenter_name,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct TicketPayload {
    #[serde(rename = "ticketId")]
    ticket_id: i32,
    #[serde(rename = "issueId")]
    issue_id: String,
    name: String,
    email: String,
    #[serde(rename = "problemStatement")]
    problem_statement: String,
    priority: TicketPriority,
    status: TicketStatus,
    area: String,
    #[serde(rename = "toolId")]
    tool_id: String,
    #[serde(rename = "wiingsOrder")]
    wiings_order: String,
    #[serde(rename = "partNumber")]
    part_number: String,
    supplier: String,
    #[serde(rename = "fabSubmittedAs")]
    fab_submitted_as: String,
    #[serde(rename = "closedReason")]
    closed_reason: Option<String>,
    #[serde(rename = "closedSubreason")]
    closed_subreason: Option<String>,
    #[serde(rename = "closedMessage")]
    closed_message: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
    comments: Vec<CommentPayload>,
}

impl TicketPayload {
    fn new(ticket: Ticket, ticket_comments: Vec<Comment>) -> Self {
        Self {
            ticket_id: ticket.id,
            issue_id: ticket.issue_id,
            name: ticket.name,
            email: ticket.email,
            problem_statement: ticket.problem_statement,
            priority: ticket.priority,
            status: ticket.status,
            area: ticket.area,
            tool_id: ticket.tool_id,
            wiings_order: ticket.wiings_order,
            part_number: ticket.part_number,
            supplier: ticket.supplier,
            fab_submitted_as: ticket.fab_submitted_as,
            closed_reason: ticket.closed_reason,
            closed_subreason: ticket.closed_subreason,
            closed_message: ticket.closed_message,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            comments: ticket_comments.into_iter().map(|v| v.into()).collect(),
        }
    }
}

// GET API endpoint
#[tracing::instrument(skip(appstate, ticket_request), fields(request="GET /ticket",issue_id=%ticket_request.issue_id))]
pub async fn request(State(appstate): State<AppState>, Query(ticket_request): Query<TicketRequest>) -> Result<Json<TicketPayload>, ServerResponse> {
    let mut conn = appstate.postgres.get().await.map_err(|err| {
        tracing::error!("Failed to fetch Postgres connection, {err}");
        internal_server_error("Internal Service Error")
    })?;

    let ticket = match tickets::table.filter(tickets::issue_id.eq(&ticket_request.issue_id))
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

    // Newest first, the order the views display them in.
    let ticket_comments = comments::table.filter(comments::ticket_id.eq(ticket.id))
                                    .select(Comment::as_select())
                                    .order(comments::created_at.desc())
                                    .load(&mut conn)
                                    .await
                                    .map_err(|err| {
                                        tracing::error!("Failed to fetch comments for {} due to {err}", ticket.issue_id);
                                        internal_server_error("Internal Service Error")
                                    })?;

    Ok(Json(TicketPayload::new(ticket, ticket_comments)))
}
