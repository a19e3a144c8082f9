use serde::Deserialize;
use garde::Validate;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use crate::Schema::surveys;

#[derive(Deserialize, Debug, Validate)]
pub struct RequestPayload {
    #[garde(skip)]
    pub ticket_id: i32,
    #[garde(range(min=1, max=5))]
    pub ease_of_use: i32,
    #[garde(range(min=1, max=5))]
    pub response_time: i32,
    #[garde(range(min=1, max=5))]
    pub resolution_quality: i32,
    #[garde(range(min=1, max=5))]
    pub overall_satisfaction: i32,
    #[serde(default)]
    #[garde(length(max=2000))]
    pub comments: String,
}

#[derive(Insertable)]
#[diesel(table_name = surveys)]
pub struct InsertableSurvey<'a> {
    pub ticket_id: i32,
    pub ease_of_use: i32,
    pub response_time: i32,
    pub resolution_quality: i32,
    pub overall_satisfaction: i32,
    pub comments: &'a str,
    pub submitted_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::RequestPayload;
    use garde::Validate;

    fn payload(rating: i32) -> RequestPayload {
        serde_json::from_value(serde_json::json!({
            "ticket_id": 7,
            "ease_of_use": rating,
            "response_time": rating,
            "resolution_quality": rating,
            "overall_satisfaction": rating,
            "comments": "quick turnaround",
        }))
        .unwrap()
    }

    #[test]
    fn ratings_must_sit_between_one_and_five() {
        assert!(payload(1).validate(&()).is_ok());
        assert!(payload(5).validate(&()).is_ok());
        assert!(payload(0).validate(&()).is_err());
        assert!(payload(6).validate(&()).is_err());
    }
}
