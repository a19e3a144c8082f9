use serde::Deserialize;
use garde::Validate;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use crate::Schema::comments;
use crate::db_schema::hooked_sql_types::{TicketPriority, TicketStatus};

#[derive(Deserialize, Debug, Validate)]
pub struct RequestPayload {
    #[garde(length(min=1, max=40))]
    pub issue_id: String,
    #[garde(skip)]
    pub status: TicketStatus,
    #[garde(skip)]
    pub priority: TicketPriority,
}

/// Shared by the update, close, and comment routes: audit comments and user
/// comments land in the same table, distinguished only by authorship.
#[derive(Insertable)]
#[diesel(table_name = comments)]
pub struct InsertableComment<'a> {
    pub ticket_id: i32,
    pub text: &'a str,
    pub commenter_name: &'a str,
    pub image_url: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::RequestPayload;
    use crate::db_schema::hooked_sql_types::{TicketPriority, TicketStatus};
    use garde::Validate;

    #[test]
    fn payload_parses_human_facing_enum_strings() {
        let payload: RequestPayload = serde_json::from_value(serde_json::json!({
            "issue_id": "Doe-00042",
            "status": "Waiting on IT",
            "priority": "Factory Constraint",
        }))
        .unwrap();
        assert!(payload.validate(&()).is_ok());
        assert_eq!(payload.status, TicketStatus::WaitingOnIt);
        assert_eq!(payload.priority, TicketPriority::FactoryConstraint);
    }

    #[test]
    fn blank_issue_id_is_rejected() {
        let payload: RequestPayload = serde_json::from_value(serde_json::json!({
            "issue_id": "",
            "status": "In Progress",
            "priority": "Low",
        }))
        .unwrap();
        assert!(payload.validate(&()).is_err());
    }
}
