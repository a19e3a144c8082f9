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
use diesel::sql_types::{Integer, Text};
use diesel::prelude::*;
use diesel::sql_query;
use diesel_async::RunQueryDsl;

use crate::{
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    DB::Ticket,
    db_schema::hooked_sql_types::{TicketPriority, TicketStatus},
    Lifecycle::{SortColumn, SortDirection},
    Constants,
};

pub mod db;
use db::{DashboardQuery, CountRow, escape_like_pattern};

#[derive(Serialize)]
pub struct TicketPayload {
    #[serde(rename = "ticketId")]
    ticket_id: i32,
    #[serde(rename = "issueId")]
    issue_id: String,
    name: String,
    #[serde(rename = "toolId")]
    tool_id: String,
    #[serde(rename = "wiingsOrder")]
    wiings_order: String,
    #[serde(rename = "problemStatement")]
    problem_statement: String,
    status: TicketStatus,
    priority: TicketPriority,
    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl Into<TicketPayload> for Ticket {
    fn into(self) -> TicketPayload {
        TicketPayload {
            ticket_id: self.id,
            issue_id: self.issue_id,
            name: self.name,
            tool_id: self.tool_id,
            wiings_order: self.wiings_order,
            problem_statement: self.problem_statement,
            status: self.status,
            priority: self.priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct GroupPayload {
    content: Vec<TicketPayload>,
    total_pages: Option<usize>,
}

// Everything the dashboard can ask for is pushed into this WHERE clause so
// the store does the filtering instead of the view. `New` / `Open` /
// `Closed` here must stay in lockstep with Lifecycle::StatusFilter.
const FILTER_SQL: &str = "($1 = 'All' \
        OR ($1 = 'New' AND status = 'New Request') \
        OR ($1 = 'Open' AND status NOT IN ('Closed', 'Canceled by User')) \
        OR ($1 = 'Closed' AND status = 'Closed')) \
    AND ($2 = 'All' OR priority::text = $2) \
    AND ($3 = '' \
        OR issue_id ILIKE $3 \
        OR tool_id ILIKE $3 \
        OR wiings_order ILIKE $3 \
        OR problem_statement ILIKE $3 \
        OR status::text ILIKE $3 \
        OR priority::text ILIKE $3)";

// GET API endpoint
#[tracing::instrument(skip(appstate, dashboard_query), fields(request="GET /tickets",page=%dashboard_query.page))]
pub async fn request(State(appstate): State<AppState>, Query(dashboard_query): Query<DashboardQuery>) -> Result<Json<GroupPayload>, ServerResponse> {
    if dashboard_query.page == 0 {
        return Err(status_response(StatusCode::BAD_REQUEST, "Pages are numbered from 1"));
    }

    let status_label = dashboard_query.status.as_str();
    let priority_label = dashboard_query.priority.map(|priority| priority.as_str()).unwrap_or("All");
    let search_pattern = dashboard_query.search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", escape_like_pattern(term)))
        .unwrap_or_default();
    let (sort_column, sort_direction) = (
        dashboard_query.sort_by.unwrap_or(SortColumn::UpdatedAt),
        dashboard_query.sort_dir.unwrap_or(SortDirection::Desc),
    );
    let page_size = *Constants::DASHBOARD_PAGE_SIZE;

    let tickets: Vec<Ticket>;
    let mut total_tickets = None;
    {
        let mut conn = appstate.postgres.get().await.map_err(|err| {
            tracing::error!("Failed to fetch Postgres connection, {err}");
            internal_server_error("Internal Service Error")
        })?;

        // sql_name() values are a fixed whitelist, the only strings ever
        // spliced into this query; user input travels through binds.
        let page_sql = format!(
            "SELECT id, issue_id, name, email, problem_statement, priority, status, area, tool_id, wiings_order, part_number, supplier, fab_submitted_as, closed_reason, closed_subreason, closed_message, created_at, updated_at \
             FROM (SELECT *, ROW_NUMBER() OVER (ORDER BY {column} {direction}, id ASC) AS row_num FROM tickets WHERE {filter}) AS subquery \
             WHERE row_num BETWEEN (($4 - 1) * $5 + 1) AND ($4 * $5)",
            column = sort_column.sql_name(),
            direction = sort_direction.sql_name(),
            filter = FILTER_SQL,
        );
        tickets = sql_query(page_sql)
                .bind::<Text, _>(status_label)
                .bind::<Text, _>(priority_label)
                .bind::<Text, _>(&search_pattern)
                .bind::<Integer, _>(dashboard_query.page as i32)
                .bind::<Integer, _>(page_size)
                .load(&mut conn)
                .await.map_err(|err| {
                    tracing::error!("Failed to query page {}, with page size, {page_size}, due to {err}", dashboard_query.page);
                    internal_server_error("Internal Service Error")
                })?;

        if dashboard_query.get_total_pages {
            let count_sql = format!("SELECT COUNT(*) AS count FROM tickets WHERE {filter}", filter = FILTER_SQL);
            let count: CountRow = sql_query(count_sql)
                        .bind::<Text, _>(status_label)
                        .bind::<Text, _>(priority_label)
                        .bind::<Text, _>(&search_pattern)
                        .get_result(&mut conn)
                        .await.map_err(|err| {
                            tracing::error!("Failed to query total page size due to {err}");
                            internal_server_error("Internal Service Error")
                        })?;
            total_tickets = Some(count.count as usize);
        }
    }

    let tickets_payload = tickets.into_iter().map(|ticket| {
        ticket.into()
    }).collect::<Vec<TicketPayload>>();

    Ok(Json(GroupPayload {
        total_pages: match total_tickets {
            None => None,
            Some(total_tickets) => {
                Some((total_tickets as f64 / page_size as f64).ceil() as usize)
            }
        },
        content: tickets_payload,
    }))
}
