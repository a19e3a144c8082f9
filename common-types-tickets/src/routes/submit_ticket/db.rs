use serde::Deserialize;
use garde::Validate;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use crate::Schema::tickets;
use crate::db_schema::hooked_sql_types::{TicketPriority, TicketStatus};

#[derive(Deserialize, Debug, Validate)]
pub struct RequestPayload {
    #[garde(length(min=1, max=120))]
    pub name: String,
    #[garde(email, length(max=320))]
    pub email: String,
    #[garde(length(min=1, max=2000))]
    pub problem_statement: String,
    #[serde(default)]
    #[garde(skip)]
    pub priority: TicketPriority,
    #[serde(default)]
    #[garde(length(max=200))]
    pub area: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub tool_id: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub wiings_order: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub part_number: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub supplier: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub fab_submitted_as: String,
}

#[derive(Insertable)]
#[diesel(table_name = tickets)]
pub struct InsertableTicket<'a> {
    pub issue_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub problem_statement: &'a str,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub area: &'a str,
    pub tool_id: &'a str,
    pub wiings_order: &'a str,
    pub part_number: &'a str,
    pub supplier: &'a str,
    pub fab_submitted_as: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::RequestPayload;
    use garde::Validate;

    fn payload(name: &str, email: &str, problem: &str) -> RequestPayload {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "email": email,
            "problem_statement": problem,
        }))
        .unwrap()
    }

    #[test]
    fn minimal_payload_passes_and_defaults_priority() {
        let payload = payload("Jane Doe", "jane@example.com", "pump is down");
        assert!(payload.validate(&()).is_ok());
        assert_eq!(payload.priority.as_str(), "Not Assigned");
        assert_eq!(payload.area, "");
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        assert!(payload("", "jane@example.com", "pump is down").validate(&()).is_err());
        assert!(payload("Jane Doe", "not-an-email", "pump is down").validate(&()).is_err());
        assert!(payload("Jane Doe", "jane@example.com", "").validate(&()).is_err());
    }
}
