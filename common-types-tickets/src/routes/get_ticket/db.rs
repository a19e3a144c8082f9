use serde::Deserialize;

#[derive(Deserialize)]
pub struct TicketRequest {
    pub issue_id: String,
}
