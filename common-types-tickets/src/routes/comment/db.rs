use serde::Deserialize;
use garde::Validate;

#[derive(Deserialize, Debug, Validate)]
pub struct ImagePayload {
    #[garde(length(min=1, max=120))]
    pub file_name: String,
    #[garde(length(min=1))]
    pub content_base64: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct RequestPayload {
    #[garde(length(min=1, max=40))]
    pub issue_id: String,
    #[serde(default)]
    #[garde(length(max=2000))]
    pub text: String,
    #[garde(dive)]
    pub image: Option<ImagePayload>,
}

impl RequestPayload {
    /// A comment must say something or show something.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::RequestPayload;
    use garde::Validate;

    fn parse(value: serde_json::Value) -> RequestPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_text_without_image_has_no_content() {
        let payload = parse(serde_json::json!({ "issue_id": "Doe-00042" }));
        assert!(payload.validate(&()).is_ok());
        assert!(!payload.has_content());

        let whitespace = parse(serde_json::json!({ "issue_id": "Doe-00042", "text": "   " }));
        assert!(!whitespace.has_content());
    }

    #[test]
    fn image_alone_is_enough() {
        let payload = parse(serde_json::json!({
            "issue_id": "Doe-00042",
            "image": { "file_name": "pump.jpg", "content_base64": "aGVsbG8=" },
        }));
        assert!(payload.validate(&()).is_ok());
        assert!(payload.has_content());
    }

    #[test]
    fn text_alone_is_enough() {
        let payload = parse(serde_json::json!({
            "issue_id": "Doe-00042",
            "text": "the pump is still down",
        }));
        assert!(payload.has_content());
    }
}
