use axum::{
    extract::State,
    Json
};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{
    Schema::tickets,
    Response::{ServerResponse, internal_server_error},
    State::AppState,
    db_schema::hooked_sql_types::{TicketPriority, TicketStatus},
    Lifecycle,
};

#[derive(Serialize)]
pub struct StatsPayload {
    #[serde(rename = "factoryConstraintOpen")]
    factory_constraint_open: i64,
    #[serde(rename = "totalOpenTickets")]
    total_open_tickets: i64,
    #[serde(rename = "newTickets")]
    new_tickets: i64,
    #[serde(rename = "past24Hours")]
    past_24_hours: i64,
    #[serde(rename = "past7Days")]
    past_7_days: i64,
    #[serde(rename = "factoryPast7Days")]
    factory_past_7_days: i64,
    #[serde(rename = "closed24Hours")]
    closed_24_hours: i64,
    #[serde(rename = "closed7Days")]
    closed_7_days: i64,
    #[serde(rename = "totalTickets")]
    total_tickets: i64,
    #[serde(rename = "avgCloseTime24h")]
    avg_close_time_24h: String,
    #[serde(rename = "avgCloseTime7d")]
    avg_close_time_7d: String,
    #[serde(rename = "avgCloseTimeOverall")]
    avg_close_time_overall: String,
}

fn close_spans(pairs: &[(NaiveDateTime, NaiveDateTime)]) -> Vec<TimeDelta> {
    pairs.iter().map(|(created_at, updated_at)| *updated_at - *created_at).collect()
}

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="GET /tickets/stats"))]
pub async fn request(State(appstate): State<AppState>) -> Result<Json<StatsPayload>, ServerResponse> {
    let mut conn = appstate.postgres.get().await.map_err(|err| {
        tracing::error!("Failed to fetch Postgres connection, {err}");
        internal_server_error("Internal Service Error")
    })?;

    let utc = Utc::now().naive_utc();
    let past_day = utc - TimeDelta::days(1);
    let past_week = utc - TimeDelta::days(7);

    let query_error = |err| {
        tracing::error!("Failed to query dashboard stats, {err}");
        internal_server_error("Internal Service Error")
    };

    let total_open_tickets: i64 = tickets::table
        .filter(tickets::status.ne(TicketStatus::Closed))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let factory_constraint_open: i64 = tickets::table
        .filter(tickets::priority.eq(TicketPriority::FactoryConstraint).and(tickets::status.ne(TicketStatus::Closed)))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let new_tickets: i64 = tickets::table
        .filter(tickets::status.eq(TicketStatus::NewRequest))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let past_24_hours: i64 = tickets::table
        .filter(tickets::created_at.ge(past_day))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let past_7_days: i64 = tickets::table
        .filter(tickets::created_at.ge(past_week))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let factory_past_7_days: i64 = tickets::table
        .filter(tickets::priority.eq(TicketPriority::FactoryConstraint).and(tickets::created_at.ge(past_week)))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;
    let total_tickets: i64 = tickets::table
        .count()
        .get_result(&mut conn)
        .await
        .map_err(query_error)?;

    // Close spans come back as raw timestamp pairs; the averaging itself is
    // Lifecycle's job.
    let closed_past_day: Vec<(NaiveDateTime, NaiveDateTime)> = tickets::table
        .filter(tickets::status.eq(TicketStatus::Closed).and(tickets::updated_at.ge(past_day)))
        .select((tickets::created_at, tickets::updated_at))
        .load(&mut conn)
        .await
        .map_err(query_error)?;
    let closed_past_week: Vec<(NaiveDateTime, NaiveDateTime)> = tickets::table
        .filter(tickets::status.eq(TicketStatus::Closed).and(tickets::updated_at.ge(past_week)))
        .select((tickets::created_at, tickets::updated_at))
        .load(&mut conn)
        .await
        .map_err(query_error)?;
    let closed_all_time: Vec<(NaiveDateTime, NaiveDateTime)> = tickets::table
        .filter(tickets::status.eq(TicketStatus::Closed))
        .select((tickets::created_at, tickets::updated_at))
        .load(&mut conn)
        .await
        .map_err(query_error)?;

    Ok(Json(StatsPayload {
        factory_constraint_open,
        total_open_tickets,
        new_tickets,
        past_24_hours,
        past_7_days,
        factory_past_7_days,
        closed_24_hours: closed_past_day.len() as i64,
        closed_7_days: closed_past_week.len() as i64,
        total_tickets,
        avg_close_time_24h: Lifecycle::average_close_time(&close_spans(&closed_past_day)),
        avg_close_time_7d: Lifecycle::average_close_time(&close_spans(&closed_past_week)),
        avg_close_time_overall: Lifecycle::average_close_time(&close_spans(&closed_all_time)),
    }))
}

#[cfg(test)]
mod tests {
    use super::close_spans;
    use chrono::NaiveDate;

    #[test]
    fn close_spans_subtract_creation_from_last_update() {
        let created = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let updated = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap().and_hms_opt(10, 1, 1).unwrap();
        let spans = close_spans(&[(created, updated)]);
        assert_eq!(spans[0].num_seconds(), 3661);
    }
}
