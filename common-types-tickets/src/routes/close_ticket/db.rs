use serde::Deserialize;
use garde::Validate;

#[derive(Deserialize, Debug, Validate)]
pub struct RequestPayload {
    #[garde(length(min=1, max=40))]
    pub issue_id: String,
    #[garde(length(min=1, max=200))]
    pub reason: String,
    #[serde(default)]
    #[garde(length(max=200))]
    pub subreason: String,
    #[serde(default)]
    #[garde(length(max=2000))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::RequestPayload;
    use garde::Validate;

    #[test]
    fn close_without_reason_is_rejected() {
        let payload: RequestPayload = serde_json::from_value(serde_json::json!({
            "issue_id": "Doe-00042",
            "reason": "",
        }))
        .unwrap();
        assert!(payload.validate(&()).is_err());
    }

    #[test]
    fn close_with_full_closure_details_passes() {
        let payload: RequestPayload = serde_json::from_value(serde_json::json!({
            "issue_id": "Doe-00042",
            "reason": "Resolved",
            "subreason": "Issue Fixed",
            "message": "done",
        }))
        .unwrap();
        assert!(payload.validate(&()).is_ok());
        assert_eq!(payload.reason, "Resolved");
        assert_eq!(payload.subreason, "Issue Fixed");
        assert_eq!(payload.message, "done");
    }
}
