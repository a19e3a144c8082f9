#[allow(non_snake_case)]
pub mod Mail {
    use ::std::fmt;
    use ::std::str;
    use serde::{Deserialize, Serialize};
    use derive_builder::Builder;

    /// What the transport actually accepts: a fully rendered message.
    #[derive(Debug, Clone, Serialize, Deserialize, Builder)]
    pub struct Message {
        #[builder(setter(into))]
        pub to: String,
        #[builder(setter(into))]
        pub subject: String,
        #[builder(setter(into))]
        pub html: String,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ProviderKind {
        Mailgun,
        Resend,
    }

    impl fmt::Display for ProviderKind {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl str::FromStr for ProviderKind {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "mailgun" | "Mailgun" => Ok(ProviderKind::Mailgun),
                "resend" | "Resend" => Ok(ProviderKind::Resend),
                _ => Err(format!("'{}' is not a valid ProviderKind", s)),
            }
        }
    }

    /// Transport configuration. Both providers take the same message and
    /// differ only in endpoint shape and auth, so they stay interchangeable.
    #[derive(Debug, Clone)]
    pub enum Provider {
        Mailgun {
            api_base: String,
            domain: String,
            api_key: String,
            from: String,
        },
        Resend {
            api_base: String,
            api_key: String,
            from: String,
        },
    }

    impl Provider {
        pub fn kind(&self) -> ProviderKind {
            match self {
                Provider::Mailgun { .. } => ProviderKind::Mailgun,
                Provider::Resend { .. } => ProviderKind::Resend,
            }
        }

        pub fn from_address(&self) -> &str {
            match self {
                Provider::Mailgun { from, .. } => from,
                Provider::Resend { from, .. } => from,
            }
        }
    }
}

#[allow(non_snake_case)]
pub mod Notify {
    use ::std::fmt;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EventKind {
        NewTicket,
        NewComment,
        StatusUpdate,
        Closed,
        SurveySummary,
    }

    impl fmt::Display for EventKind {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    /// One row of the comment table rendered into notification mail.
    #[derive(Deserialize, Serialize, Debug, Clone)]
    pub struct CommentRow {
        pub commenter_name: String,
        pub text: String,
        pub created_at: NaiveDateTime,
    }
}

#[cfg(test)]
mod tests {
    use super::Mail::{MessageBuilder, Provider, ProviderKind};

    #[test]
    fn message_builder_fills_all_fields() {
        let message = MessageBuilder::default()
            .to("jane@example.com")
            .subject("Ticket Received: Doe-00042")
            .html("<p>hi</p>")
            .build()
            .unwrap();
        assert_eq!(message.to, "jane@example.com");
        assert_eq!(message.subject, "Ticket Received: Doe-00042");
    }

    #[test]
    fn message_builder_rejects_missing_fields() {
        assert!(MessageBuilder::default().to("jane@example.com").build().is_err());
    }

    #[test]
    fn provider_kind_parses_env_spelling() {
        assert_eq!("mailgun".parse::<ProviderKind>().unwrap(), ProviderKind::Mailgun);
        assert_eq!("resend".parse::<ProviderKind>().unwrap(), ProviderKind::Resend);
        assert!("sendgrid".parse::<ProviderKind>().is_err());
        let provider = Provider::Resend {
            api_base: "https://api.resend.com".to_string(),
            api_key: "k".to_string(),
            from: "support@fetch.example".to_string(),
        };
        assert_eq!(provider.kind(), ProviderKind::Resend);
        assert_eq!(provider.from_address(), "support@fetch.example");
    }
}
