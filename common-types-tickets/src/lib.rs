use common_types;
use db_schema;

pub type E = Box<dyn ::std::error::Error + Send + Sync + 'static>;

mod routes;
mod middleware;

#[allow(non_snake_case)]
pub mod Routes {
    pub use crate::routes::*;
}

#[allow(non_snake_case)]
pub mod Middleware {
    pub use crate::middleware::*;
}

#[allow(non_snake_case)]
pub mod Schema {
    pub use crate::db_schema::*;
}

#[allow(non_snake_case)]
pub mod Lifecycle {
    //! The ticket lifecycle rules, kept free of I/O so every rule is
    //! testable on its own. Route handlers call in here and persist
    //! whatever comes back.

    use chrono::TimeDelta;
    use serde::Deserialize;

    use crate::db_schema::hooked_sql_types::{TicketPriority, TicketStatus};

    /// Derives the human-facing issue id from the submitter's surname and
    /// the current ticket count: `Doe-00042` for count 41.
    ///
    /// The count must come from a successful store query. A failed count is
    /// an error at the call site, never a silent `00001`; two concurrent
    /// submissions can still read the same count and mint the same id,
    /// which the store's unique constraint turns into an insert error.
    pub fn issue_id(name: &str, ticket_count: i64) -> String {
        let surname = name.split_whitespace().last().unwrap_or("User");
        format!("{}-{:05}", surname, ticket_count + 1)
    }

    /// One audit comment line per changed field, status first.
    pub fn audit_deltas(
        old_status: TicketStatus,
        new_status: TicketStatus,
        old_priority: TicketPriority,
        new_priority: TicketPriority,
    ) -> Vec<String> {
        let mut deltas = Vec::new();
        if old_status != new_status {
            deltas.push(format!("status updated to {}", new_status));
        }
        if old_priority != new_priority {
            deltas.push(format!("priority updated to {}", new_priority));
        }
        deltas
    }

    /// The single audit comment recorded when a ticket is closed.
    pub fn close_summary(reason: &str, subreason: &str, message: &str) -> String {
        format!(
            "ticket closed. Reason: {}, Sub-Reason: {}, Notes: {}",
            reason, subreason, message
        )
    }

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StatusFilter {
        All,
        New,
        Open,
        Closed,
    }

    impl Default for StatusFilter {
        fn default() -> Self {
            StatusFilter::All
        }
    }

    impl StatusFilter {
        pub fn as_str(&self) -> &'static str {
            match self {
                StatusFilter::All => "All",
                StatusFilter::New => "New",
                StatusFilter::Open => "Open",
                StatusFilter::Closed => "Closed",
            }
        }

        /// `Open` means anything a rep still has to look at, so cancelled
        /// tickets are excluded along with closed ones.
        pub fn matches(&self, status: TicketStatus) -> bool {
            match self {
                StatusFilter::All => true,
                StatusFilter::New => status == TicketStatus::NewRequest,
                StatusFilter::Open => {
                    status != TicketStatus::Closed && status != TicketStatus::CanceledByUser
                }
                StatusFilter::Closed => status == TicketStatus::Closed,
            }
        }
    }

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum SortColumn {
        IssueId,
        ToolId,
        WiingsOrder,
        ProblemStatement,
        Status,
        Priority,
        CreatedAt,
        UpdatedAt,
    }

    impl SortColumn {
        /// Whitelisted column name spliced into ORDER BY. Never interpolate
        /// anything else into that position.
        pub fn sql_name(&self) -> &'static str {
            match self {
                SortColumn::IssueId => "issue_id",
                SortColumn::ToolId => "tool_id",
                SortColumn::WiingsOrder => "wiings_order",
                SortColumn::ProblemStatement => "problem_statement",
                SortColumn::Status => "status",
                SortColumn::Priority => "priority",
                SortColumn::CreatedAt => "created_at",
                SortColumn::UpdatedAt => "updated_at",
            }
        }
    }

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum SortDirection {
        Asc,
        Desc,
    }

    impl SortDirection {
        pub fn sql_name(&self) -> &'static str {
            match self {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            }
        }

        pub fn toggled(&self) -> SortDirection {
            match self {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            }
        }
    }

    /// Column-header click semantics: same column toggles direction, a new
    /// column starts ascending.
    pub fn next_sort(
        current: Option<(SortColumn, SortDirection)>,
        selected: SortColumn,
    ) -> (SortColumn, SortDirection) {
        match current {
            Some((column, direction)) if column == selected => (column, direction.toggled()),
            _ => (selected, SortDirection::Asc),
        }
    }

    /// Arithmetic mean of close spans formatted `HH:MM:SS`, truncated to
    /// whole seconds. An empty set reads as zero, not an error.
    pub fn average_close_time(spans: &[TimeDelta]) -> String {
        if spans.is_empty() {
            return "00:00:00".to_string();
        }
        let total_ms: i64 = spans.iter().map(|span| span.num_milliseconds()).sum();
        let avg_secs = (total_ms / spans.len() as i64) / 1000;
        format!(
            "{:02}:{:02}:{:02}",
            avg_secs / 3600,
            (avg_secs % 3600) / 60,
            avg_secs % 60
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn issue_id_uses_surname_and_next_sequence() {
            assert_eq!(issue_id("Jane Doe", 41), "Doe-00042");
            assert_eq!(issue_id("Cher", 0), "Cher-00001");
        }

        #[test]
        fn issue_id_falls_back_for_blank_names() {
            assert_eq!(issue_id("", 7), "User-00008");
            assert_eq!(issue_id("   ", 7), "User-00008");
        }

        #[test]
        fn issue_id_matches_expected_shape() {
            let id = issue_id("Grace Hopper", 123);
            let (surname, seq) = id.split_once('-').unwrap();
            assert!(surname.chars().all(|c| c.is_ascii_alphabetic()));
            assert_eq!(seq.len(), 5);
            assert!(seq.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn audit_deltas_cover_only_changed_fields() {
            let both = audit_deltas(
                TicketStatus::NewRequest,
                TicketStatus::InProgress,
                TicketPriority::NotAssigned,
                TicketPriority::High,
            );
            assert_eq!(
                both,
                vec![
                    "status updated to In Progress".to_string(),
                    "priority updated to High".to_string(),
                ]
            );

            let priority_only = audit_deltas(
                TicketStatus::InProgress,
                TicketStatus::InProgress,
                TicketPriority::Medium,
                TicketPriority::FactoryConstraint,
            );
            assert_eq!(priority_only, vec![
                "priority updated to Factory Constraint".to_string(),
            ]);
            assert!(!priority_only[0].contains("status"));

            assert!(audit_deltas(
                TicketStatus::WaitingCustomer,
                TicketStatus::WaitingCustomer,
                TicketPriority::Low,
                TicketPriority::Low,
            )
            .is_empty());
        }

        #[test]
        fn open_filter_excludes_closed_and_cancelled() {
            assert!(!StatusFilter::Open.matches(TicketStatus::Closed));
            assert!(!StatusFilter::Open.matches(TicketStatus::CanceledByUser));
            assert!(StatusFilter::Open.matches(TicketStatus::NewRequest));
            assert!(StatusFilter::Open.matches(TicketStatus::ReOpened));
            assert!(StatusFilter::Open.matches(TicketStatus::WaitingStores));

            assert!(StatusFilter::New.matches(TicketStatus::NewRequest));
            assert!(!StatusFilter::New.matches(TicketStatus::InProgress));
            assert!(StatusFilter::Closed.matches(TicketStatus::Closed));
            assert!(StatusFilter::All.matches(TicketStatus::CanceledByUser));
        }

        #[test]
        fn sort_toggles_on_repeat_and_resets_on_new_column() {
            let first = next_sort(None, SortColumn::Priority);
            assert_eq!(first, (SortColumn::Priority, SortDirection::Asc));

            let toggled = next_sort(Some(first), SortColumn::Priority);
            assert_eq!(toggled, (SortColumn::Priority, SortDirection::Desc));

            let reset = next_sort(Some(toggled), SortColumn::UpdatedAt);
            assert_eq!(reset, (SortColumn::UpdatedAt, SortDirection::Asc));
        }

        #[test]
        fn average_close_time_formats_and_truncates() {
            assert_eq!(average_close_time(&[]), "00:00:00");
            assert_eq!(
                average_close_time(&[TimeDelta::milliseconds(3_661_000)]),
                "01:01:01"
            );
            // 1.5 s and 2.4 s average to 1.95 s, which truncates down.
            assert_eq!(
                average_close_time(&[
                    TimeDelta::milliseconds(1_500),
                    TimeDelta::milliseconds(2_400),
                ]),
                "00:00:01"
            );
        }
    }
}

#[allow(non_snake_case)]
pub mod Response {
    use axum::http::StatusCode;

    pub type ServerResponse = (StatusCode, String);

    pub fn status_response<E: ToString>(status: StatusCode, error: E) -> ServerResponse {
        (status, error.to_string())
    }

    pub fn internal_server_error<E: ToString>(err: E) -> ServerResponse {
        status_response(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

#[allow(non_snake_case)]
pub mod DB {
    use chrono::naive::NaiveDateTime;
    use diesel::prelude::*;
    use serde::Serialize;

    use crate::db_schema::hooked_sql_types::{TicketPriority, TicketStatus};
    use crate::db_schema::{comments, tickets};

    #[derive(QueryableByName, Selectable, Queryable, Serialize, Debug)]
    #[diesel(table_name = tickets)]
    pub struct Ticket {
        pub id: i32,
        pub issue_id: String,
        pub name: String,
        pub email: String,
        pub problem_statement: String,
        pub priority: TicketPriority,
        pub status: TicketStatus,
        pub area: String,
        pub tool_id: String,
        pub wiings_order: String,
        pub part_number: String,
        pub supplier: String,
        pub fab_submitted_as: String,
        pub closed_reason: Option<String>,
        pub closed_subreason: Option<String>,
        pub closed_message: Option<String>,
        pub created_at: NaiveDateTime,
        pub updated_at: NaiveDateTime,
    }

    #[derive(Queryable, Selectable, Serialize, Debug)]
    #[diesel(table_name = comments)]
    pub struct Comment {
        pub id: i32,
        pub ticket_id: i32,
        pub text: String,
        pub commenter_name: String,
        pub image_url: Option<String>,
        pub created_at: NaiveDateTime,
    }
}

#[allow(non_snake_case)]
pub mod Email {
    //! Notification dispatcher: renders a fixed HTML document per event
    //! kind and hands `{to, subject, html}` to whichever mail provider the
    //! deployment configured. A send failure never rolls back the store
    //! mutation that triggered it; callers log and surface a warning.

    use thiserror::Error;

    use common_types::Mail::{Message, Provider, ProviderKind};
    use common_types::Notify::{CommentRow, EventKind};

    use crate::{Constants, DB::Ticket, State::AppState};

    #[derive(Error, Debug)]
    pub enum MailError {
        #[error("mail provider misconfigured: {0}")]
        Config(String),
        #[error("mail transport failure: {0}")]
        Transport(#[from] reqwest::Error),
        #[error("mail provider rejected message with HTTP {0}")]
        Rejected(u16),
    }

    pub fn provider_from_env() -> Result<Provider, MailError> {
        let kind = Constants::MAIL_PROVIDER
            .parse::<ProviderKind>()
            .map_err(MailError::Config)?;
        Ok(match kind {
            ProviderKind::Mailgun => Provider::Mailgun {
                api_base: Constants::MAILGUN_API_BASE.clone(),
                domain: Constants::MAILGUN_DOMAIN.clone(),
                api_key: Constants::MAILGUN_API_KEY.clone(),
                from: Constants::MAILGUN_FROM.clone(),
            },
            ProviderKind::Resend => Provider::Resend {
                api_base: Constants::RESEND_API_BASE.clone(),
                api_key: Constants::RESEND_API_KEY.clone(),
                from: Constants::RESEND_FROM.clone(),
            },
        })
    }

    pub async fn dispatch(
        appstate: &AppState,
        kind: EventKind,
        message: Message,
    ) -> Result<(), MailError> {
        let provider = provider_from_env()?;
        tracing::info!("Dispatching {kind} notification to {}", message.to);
        let response = match &provider {
            Provider::Mailgun {
                api_base,
                domain,
                api_key,
                from,
            } => {
                appstate
                    .http_client
                    .post(format!("{api_base}/v3/{domain}/messages"))
                    .basic_auth("api", Some(api_key))
                    .form(&[
                        ("from", from.as_str()),
                        ("to", message.to.as_str()),
                        ("subject", message.subject.as_str()),
                        ("html", message.html.as_str()),
                    ])
                    .send()
                    .await?
            }
            Provider::Resend {
                api_base,
                api_key,
                from,
            } => {
                appstate
                    .http_client
                    .post(format!("{api_base}/emails"))
                    .bearer_auth(api_key)
                    .json(&serde_json::json!({
                        "from": from,
                        "to": message.to,
                        "subject": message.subject,
                        "html": message.html,
                    }))
                    .send()
                    .await?
            }
        };
        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }

    fn detail_block(ticket: &Ticket) -> String {
        format!(
            "<p><strong>Issue ID:</strong> {}</p>\
             <p><strong>Problem Statement:</strong> {}</p>\
             <p><strong>Priority:</strong> {}</p>\
             <p><strong>Status:</strong> {}</p>\
             <p><strong>Tool ID:</strong> {}</p>\
             <p><strong>Area:</strong> {}</p>\
             <p><strong>Supplier:</strong> {}</p>",
            ammonia::clean_text(&ticket.issue_id),
            ammonia::clean_text(&ticket.problem_statement),
            ticket.priority,
            ticket.status,
            ammonia::clean_text(&ticket.tool_id),
            ammonia::clean_text(&ticket.area),
            ammonia::clean_text(&ticket.supplier),
        )
    }

    fn comment_table(rows: &[CommentRow]) -> String {
        let body: String = rows
            .iter()
            .map(|row| {
                format!(
                    "<tr><td style=\"padding:10px;border:1px solid #ddd;\">{}</td>\
                     <td style=\"padding:10px;border:1px solid #ddd;\">{}</td>\
                     <td style=\"padding:10px;border:1px solid #ddd;\">{}</td></tr>",
                    ammonia::clean_text(&row.commenter_name),
                    ammonia::clean_text(&row.text),
                    row.created_at.format("%Y-%m-%d %H:%M:%S"),
                )
            })
            .collect();
        format!(
            "<table style=\"width:100%;border-collapse:collapse;\">\
             <thead><tr style=\"background:#0073e6;color:white;\">\
             <th style=\"padding:10px;border:1px solid #ddd;\">Commenter</th>\
             <th style=\"padding:10px;border:1px solid #ddd;\">Message</th>\
             <th style=\"padding:10px;border:1px solid #ddd;\">Date</th>\
             </tr></thead><tbody>{}</tbody></table>",
            body
        )
    }

    fn ticket_button(base_url: &str, issue_id: &str) -> String {
        format!(
            "<a href=\"{base_url}/submit-ticket?issue_id={issue_id}\" target=\"_blank\" rel=\"noopener noreferrer\">\
             <button style=\"background-color: #007bff; color: white; padding: 10px 20px; \
             border: none; border-radius: 6px; font-size: 16px; cursor: pointer;\">\
             Open My Ticket</button></a>"
        )
    }

    pub fn survey_link(base_url: &str, ticket_id: i32) -> String {
        format!("{base_url}/survey?ticket_id={ticket_id}")
    }

    fn document(inner: String) -> String {
        format!(
            "<div style=\"font-family: Arial, sans-serif; padding: 20px;\">{}</div>",
            inner
        )
    }

    /// Confirmation sent to the submitter right after the ticket insert.
    pub fn render_new_ticket_customer(base_url: &str, ticket: &Ticket) -> String {
        document(format!(
            "<h2 style=\"color: #007bff;\">Fetch Ticket Confirmation</h2>\
             <p>Hi <strong>{}</strong>,</p>\
             <p>Your support ticket has been submitted successfully. Below are the details:</p>\
             <hr>{}<hr>{}\
             <p>Thank you for using Fetch Ticket System!</p>",
            ammonia::clean_text(&ticket.name),
            detail_block(ticket),
            ticket_button(base_url, &ticket.issue_id),
        ))
    }

    /// Heads-up sent to the support inbox for every new ticket.
    pub fn render_new_ticket_support(ticket: &Ticket) -> String {
        document(format!(
            "<p><strong>New Ticket Created</strong></p>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             {}\
             <p><strong>Order #:</strong> {}</p>\
             <p><strong>Part Number:</strong> {}</p>\
             <p><strong>Fab Submitted As:</strong> {}</p>",
            ammonia::clean_text(&ticket.name),
            ammonia::clean_text(&ticket.email),
            detail_block(ticket),
            ammonia::clean_text(&ticket.wiings_order),
            ammonia::clean_text(&ticket.part_number),
            ammonia::clean_text(&ticket.fab_submitted_as),
        ))
    }

    pub fn render_status_update(base_url: &str, ticket: &Ticket, deltas: &[String]) -> String {
        let changes: String = deltas
            .iter()
            .map(|delta| format!("<p>{}</p>", ammonia::clean_text(delta)))
            .collect();
        document(format!(
            "<h2 style=\"color: #007bff;\">Fetch Ticket Update</h2>\
             <p>Hi <strong>{}</strong>,</p>\
             <p>Your support ticket has been updated. Below are the details:</p>\
             <hr>{}<h3>Changes Made</h3>{}<hr>{}\
             <p>Thank you for using Fetch Ticket System!</p>",
            ammonia::clean_text(&ticket.name),
            detail_block(ticket),
            changes,
            ticket_button(base_url, &ticket.issue_id),
        ))
    }

    pub fn render_new_comment(base_url: &str, ticket: &Ticket, rows: &[CommentRow]) -> String {
        document(format!(
            "<h2 style=\"color: #007bff;\">Fetch Ticket Update</h2>\
             <p>Hi <strong>{}</strong>,</p>\
             <p>Your support ticket has received a new comment. Below are the details:</p>\
             <hr>{}<h3>New Comments</h3>{}<hr>{}\
             <p>Thank you for using Fetch Ticket System!</p>",
            ammonia::clean_text(&ticket.name),
            detail_block(ticket),
            comment_table(rows),
            ticket_button(base_url, &ticket.issue_id),
        ))
    }

    pub fn render_closed(base_url: &str, ticket: &Ticket) -> String {
        document(format!(
            "<h2 style=\"color: #007bff;\">Fetch Ticket Update - Ticket Closed</h2>\
             <p>Hi <strong>{}</strong>,</p>\
             <p>Your support ticket has been closed. Below are the details:</p>\
             <hr>{}<hr>\
             <h3>Closure Details</h3>\
             <p><strong>Reason:</strong> {}</p>\
             <p><strong>Sub-Reason:</strong> {}</p>\
             <p><strong>Additional Notes:</strong> {}</p>\
             <hr>\
             <h3>We'd Love Your Feedback!</h3>\
             <p>Help us improve by taking a quick survey about your experience:</p>\
             <a href=\"{}\" target=\"_blank\">\
             <button style=\"background-color: #28a745; color: white; padding: 10px 20px; \
             border: none; border-radius: 6px; font-size: 16px; cursor: pointer;\">\
             Take the Survey</button></a>\
             <hr>\
             <p>Thank you for using Fetch Ticket System!</p>",
            ammonia::clean_text(&ticket.name),
            detail_block(ticket),
            ammonia::clean_text(ticket.closed_reason.as_deref().unwrap_or("")),
            ammonia::clean_text(ticket.closed_subreason.as_deref().unwrap_or("")),
            ammonia::clean_text(ticket.closed_message.as_deref().unwrap_or("")),
            survey_link(base_url, ticket.id),
        ))
    }

    pub fn render_survey_summary(
        ticket_id: i32,
        ratings: [(&str, i32); 4],
        comments: &str,
    ) -> String {
        let rating_lines: String = ratings
            .iter()
            .map(|(label, value)| format!("<p><strong>{}:</strong> {} / 5</p>", label, value))
            .collect();
        let comments = match comments.trim().is_empty() {
            true => "N/A".to_string(),
            false => ammonia::clean_text(comments),
        };
        document(format!(
            "<h2 style=\"color: #007bff;\">Survey Feedback for Ticket #{}</h2>\
             <p>Below are the responses:</p>\
             <hr>{}<p><strong>Additional Comments:</strong> {}</p>\
             <hr><p>Thank you for your feedback!</p>",
            ticket_id, rating_lines, comments,
        ))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn sample_ticket() -> Ticket {
            let utc = NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap();
            Ticket {
                id: 7,
                issue_id: "Doe-00042".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                problem_statement: "Pump <script>alert(1)</script> is down".to_string(),
                priority: crate::db_schema::hooked_sql_types::TicketPriority::High,
                status: crate::db_schema::hooked_sql_types::TicketStatus::InProgress,
                area: "Buyer/Planner".to_string(),
                tool_id: "TL-9".to_string(),
                wiings_order: "WO-1".to_string(),
                part_number: "PN-2".to_string(),
                supplier: "AMAT".to_string(),
                fab_submitted_as: "F1".to_string(),
                closed_reason: Some("Resolved".to_string()),
                closed_subreason: Some("Issue Fixed".to_string()),
                closed_message: Some("done".to_string()),
                created_at: utc,
                updated_at: utc,
            }
        }

        #[test]
        fn user_text_is_escaped_before_interpolation() {
            let html = render_new_ticket_customer("http://app.test", &sample_ticket());
            assert!(!html.contains("<script>"));
            assert!(html.contains("Doe-00042"));
        }

        #[test]
        fn closed_mail_carries_survey_link_and_closure_fields() {
            let html = render_closed("http://app.test", &sample_ticket());
            assert!(html.contains("http://app.test/survey?ticket_id=7"));
            assert!(html.contains("Resolved"));
            assert!(html.contains("Issue Fixed"));
            assert!(html.contains("Additional Notes:</strong> done"));
        }

        #[test]
        fn comment_table_renders_one_row_per_comment() {
            let rows = vec![
                CommentRow {
                    commenter_name: "Rep".to_string(),
                    text: "looking into it".to_string(),
                    created_at: sample_ticket().created_at,
                },
                CommentRow {
                    commenter_name: "Jane".to_string(),
                    text: "thanks & regards".to_string(),
                    created_at: sample_ticket().created_at,
                },
            ];
            let html = render_new_comment("http://app.test", &sample_ticket(), &rows);
            assert_eq!(html.matches("<tr><td").count(), 2);
            assert!(html.contains("thanks &amp; regards"));
        }

        #[test]
        fn survey_summary_defaults_empty_comments() {
            let html = render_survey_summary(
                3,
                [
                    ("Ease of Use", 4),
                    ("Response Time", 5),
                    ("Resolution Quality", 3),
                    ("Overall Satisfaction", 4),
                ],
                "  ",
            );
            assert!(html.contains("Survey Feedback for Ticket #3"));
            assert!(html.contains("Response Time:</strong> 5 / 5"));
            assert!(html.contains("N/A"));
        }
    }
}

#[allow(non_snake_case)]
pub mod Uploads {
    //! Comment image attachments. The upload happens before the comment
    //! insert so the stored row already carries its public URL; an upload
    //! failure degrades to a comment without an image.

    use thiserror::Error;
    use uuid::Uuid;

    use crate::{Constants, State::AppState};

    #[derive(Error, Debug)]
    pub enum UploadError {
        #[error("object store rejected upload: {0}")]
        Store(String),
    }

    fn object_key(ticket_id: i32, file_name: &str) -> String {
        let ext = match file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "bin",
        };
        format!("tickets/{}/{}.{}", ticket_id, Uuid::new_v4(), ext)
    }

    pub async fn store_comment_image(
        appstate: &AppState,
        ticket_id: i32,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        let key = object_key(ticket_id, file_name);
        appstate
            .s3_client
            .put_object()
            .bucket(&*Constants::UPLOAD_BUCKET_NAME)
            .key(&key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| UploadError::Store(err.to_string()))?;
        Ok(format!("{}/{}", &*Constants::UPLOAD_PUBLIC_BASE_URL, key))
    }

    #[cfg(test)]
    mod tests {
        use super::object_key;

        #[test]
        fn object_key_keeps_extension_and_scopes_by_ticket() {
            let key = object_key(12, "broken pump.jpeg");
            assert!(key.starts_with("tickets/12/"));
            assert!(key.ends_with(".jpeg"));
        }

        #[test]
        fn object_key_defaults_extension() {
            assert!(object_key(3, "README").ends_with(".bin"));
            assert!(object_key(3, "archive.").ends_with(".bin"));
        }
    }
}

#[allow(non_snake_case)]
pub mod State {
    use ::std::sync::Arc;
    use aws_config::BehaviorVersion;
    use diesel::{ConnectionError, ConnectionResult};
    use diesel_async::pooled_connection::deadpool::Pool as PostgresPool;
    use reqwest::Client;
    use diesel_async::{
        pooled_connection::{
            ManagerConfig,
            AsyncDieselConnectionManager,
            deadpool::Pool,
        },
        AsyncPgConnection,
    };
    use futures_util::{future::BoxFuture, FutureExt};
    use crate::Constants::*;

    pub struct InternalAppState {
        pub postgres: PostgresPool<AsyncPgConnection>,
        pub http_client: Client,
        pub s3_client: aws_sdk_s3::Client,
    }
    pub type AppState = Arc<InternalAppState>;

    pub async fn make_state() -> Result<AppState, crate::E> {
        tracing::info!("Setting up Postgres connection pool");
        let mut config = ManagerConfig::default();
        config.custom_setup = Box::new(establish_connection);
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(&*DATABASE_URL, config);
        let pool = Pool::builder(config).build()?;

        tracing::info!("Setting up object store client");
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let s3_client = aws_sdk_s3::Client::new(&config);

        tracing::info!("Creating AppState");
        Ok(Arc::new(InternalAppState {
            postgres: pool,
            http_client: reqwest::Client::new(),
            s3_client,
        }))
    }

    pub fn establish_connection(config: &str) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
        let fut = async {
            // We first set up the way we want rustls to work.
            let rustls_config = rustls::ClientConfig::builder()
                .with_safe_defaults()
                .with_root_certificates(root_certs())
                .with_no_client_auth();
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_config);
            let (client, conn) = tokio_postgres::connect(config, tls)
                .await
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    eprintln!("Database connection: {e}");
                }
            });
            AsyncPgConnection::try_from(client).await
        };
        fut.boxed()
    }

    pub fn root_certs() -> rustls::RootCertStore {
        let mut roots = rustls::RootCertStore::empty();
        let certs = rustls_native_certs::load_native_certs().expect("Certs not loadable!");
        let certs: Vec<_> = certs.into_iter().map(|cert| cert.0).collect();
        roots.add_parsable_certificates(&certs);
        roots
    }
}

#[allow(non_snake_case)]
pub mod Constants {
    use lazy_static::lazy_static;

    // WARNING: These are global variables that get
    // initialised at the entry point, and should not
    // be written to after
    lazy_static!{
        pub static ref DATABASE_URL: String = {
            dotenvy::var("DATABASE_URL").expect("No environment variable for DATABASE_URL").to_owned()
        };
        pub static ref ORIGIN_URL: String = {
            dotenvy::var("ORIGIN_URL").expect("No environment variable for ORIGIN_URL").to_owned()
        };
        pub static ref APP_BASE_URL: String = {
            dotenvy::var("APP_BASE_URL").expect("No environment variable for APP_BASE_URL").to_owned()
        };
        pub static ref SUPPORT_EMAIL: String = {
            dotenvy::var("SUPPORT_EMAIL").expect("No environment variable for SUPPORT_EMAIL").to_owned()
        };
        pub static ref MAIL_PROVIDER: String = {
            dotenvy::var("MAIL_PROVIDER").expect("No environment variable for MAIL_PROVIDER").to_owned()
        };
        pub static ref MAILGUN_API_KEY: String = {
            dotenvy::var("MAILGUN_API_KEY").expect("No environment variable for MAILGUN_API_KEY").to_owned()
        };
        pub static ref MAILGUN_DOMAIN: String = {
            dotenvy::var("MAILGUN_DOMAIN").expect("No environment variable for MAILGUN_DOMAIN").to_owned()
        };
        pub static ref MAILGUN_FROM: String = {
            dotenvy::var("MAILGUN_FROM").expect("No environment variable for MAILGUN_FROM").to_owned()
        };
        pub static ref MAILGUN_API_BASE: String = {
            dotenvy::var("MAILGUN_API_BASE").unwrap_or("https://api.mailgun.net".to_owned())
        };
        pub static ref RESEND_API_KEY: String = {
            dotenvy::var("RESEND_API_KEY").expect("No environment variable for RESEND_API_KEY").to_owned()
        };
        pub static ref RESEND_FROM: String = {
            dotenvy::var("RESEND_FROM").expect("No environment variable for RESEND_FROM").to_owned()
        };
        pub static ref RESEND_API_BASE: String = {
            dotenvy::var("RESEND_API_BASE").unwrap_or("https://api.resend.com".to_owned())
        };
        pub static ref UPLOAD_BUCKET_NAME: String = {
            dotenvy::var("UPLOAD_BUCKET_NAME").expect("No environment variable for UPLOAD_BUCKET_NAME").to_owned()
        };
        pub static ref UPLOAD_PUBLIC_BASE_URL: String = {
            dotenvy::var("UPLOAD_PUBLIC_BASE_URL").expect("No environment variable for UPLOAD_PUBLIC_BASE_URL").to_owned()
        };
        pub static ref SERVER_BIND_ADDR: String = {
            dotenvy::var("SERVER_BIND_ADDR").unwrap_or("0.0.0.0:8080".to_owned())
        };
        pub static ref DASHBOARD_PAGE_SIZE: i32 = {
            let maybe = dotenvy::var("DASHBOARD_PAGE_SIZE");
            let mut size = 10;
            match maybe {
                Ok(raw) => {
                    if let Ok(new_size) = raw.parse() {
                        size = new_size;
                        tracing::info!("Using custom DASHBOARD_PAGE_SIZE: {size}");
                    } else {
                        tracing::info!("Failed to parse DASHBOARD_PAGE_SIZE, using default, {size}");
                    }
                }
                _ => ()
            }
            size
        };
    }
}
