pub mod sql_types {
    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "ticketstatus"))]
    pub struct TicketStatusMapping;

    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "ticketpriority"))]
    pub struct TicketPriorityMapping;
}

pub mod hooked_sql_types {
    use ::std::fmt;
    use ::std::str;
    use serde::{Deserialize, Serialize};

    // DB values are the human-facing strings; the dashboard search runs
    // ILIKE against status::text and priority::text so the stored value
    // must read the way users type it.
    #[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, diesel_derive_enum::DbEnum)]
    #[ExistingTypePath = "crate::sql_types::TicketStatusMapping"]
    pub enum TicketStatus {
        #[serde(rename = "New Request")]
        #[db_rename = "New Request"]
        NewRequest,
        #[serde(rename = "In Progress")]
        #[db_rename = "In Progress"]
        InProgress,
        #[serde(rename = "OM Escalated")]
        #[db_rename = "OM Escalated"]
        OmEscalated,
        #[serde(rename = "Waiting 3PL")]
        #[db_rename = "Waiting 3PL"]
        Waiting3pl,
        #[serde(rename = "Closed")]
        #[db_rename = "Closed"]
        Closed,
        #[serde(rename = "Canceled by User")]
        #[db_rename = "Canceled by User"]
        CanceledByUser,
        #[serde(rename = "Re-Opened")]
        #[db_rename = "Re-Opened"]
        ReOpened,
        #[serde(rename = "Waiting Buyer/Supplier")]
        #[db_rename = "Waiting Buyer/Supplier"]
        WaitingBuyerSupplier,
        #[serde(rename = "Waiting Customer")]
        #[db_rename = "Waiting Customer"]
        WaitingCustomer,
        #[serde(rename = "Waiting Elevator Repair")]
        #[db_rename = "Waiting Elevator Repair"]
        WaitingElevatorRepair,
        #[serde(rename = "Waiting on IT")]
        #[db_rename = "Waiting on IT"]
        WaitingOnIt,
        #[serde(rename = "Waiting Tool Move")]
        #[db_rename = "Waiting Tool Move"]
        WaitingToolMove,
        #[serde(rename = "Exceptions / Variants")]
        #[db_rename = "Exceptions / Variants"]
        ExceptionsVariants,
        #[serde(rename = "Waiting Chemicals")]
        #[db_rename = "Waiting Chemicals"]
        WaitingChemicals,
        #[serde(rename = "Waiting Count/Verify")]
        #[db_rename = "Waiting Count/Verify"]
        WaitingCountVerify,
        #[serde(rename = "Waiting Delivery Confirmation")]
        #[db_rename = "Waiting Delivery Confirmation"]
        WaitingDeliveryConfirmation,
        #[serde(rename = "Waiting Distribution")]
        #[db_rename = "Waiting Distribution"]
        WaitingDistribution,
        #[serde(rename = "Waiting ePart")]
        #[db_rename = "Waiting ePart"]
        WaitingEPart,
        #[serde(rename = "Waiting Inbound")]
        #[db_rename = "Waiting Inbound"]
        WaitingInbound,
        #[serde(rename = "Waiting IMO")]
        #[db_rename = "Waiting IMO"]
        WaitingImo,
        #[serde(rename = "Waiting Inv Control")]
        #[db_rename = "Waiting Inv Control"]
        WaitingInvControl,
        #[serde(rename = "Waiting Put-away")]
        #[db_rename = "Waiting Put-away"]
        WaitingPutAway,
        #[serde(rename = "Waiting Returns")]
        #[db_rename = "Waiting Returns"]
        WaitingReturns,
        #[serde(rename = "Waiting Shipping")]
        #[db_rename = "Waiting Shipping"]
        WaitingShipping,
        #[serde(rename = "Waiting Si")]
        #[db_rename = "Waiting Si"]
        WaitingSi,
        #[serde(rename = "Waiting Stores")]
        #[db_rename = "Waiting Stores"]
        WaitingStores,
    }

    impl TicketStatus {
        pub fn as_str(&self) -> &'static str {
            match self {
                TicketStatus::NewRequest => "New Request",
                TicketStatus::InProgress => "In Progress",
                TicketStatus::OmEscalated => "OM Escalated",
                TicketStatus::Waiting3pl => "Waiting 3PL",
                TicketStatus::Closed => "Closed",
                TicketStatus::CanceledByUser => "Canceled by User",
                TicketStatus::ReOpened => "Re-Opened",
                TicketStatus::WaitingBuyerSupplier => "Waiting Buyer/Supplier",
                TicketStatus::WaitingCustomer => "Waiting Customer",
                TicketStatus::WaitingElevatorRepair => "Waiting Elevator Repair",
                TicketStatus::WaitingOnIt => "Waiting on IT",
                TicketStatus::WaitingToolMove => "Waiting Tool Move",
                TicketStatus::ExceptionsVariants => "Exceptions / Variants",
                TicketStatus::WaitingChemicals => "Waiting Chemicals",
                TicketStatus::WaitingCountVerify => "Waiting Count/Verify",
                TicketStatus::WaitingDeliveryConfirmation => "Waiting Delivery Confirmation",
                TicketStatus::WaitingDistribution => "Waiting Distribution",
                TicketStatus::WaitingEPart => "Waiting ePart",
                TicketStatus::WaitingInbound => "Waiting Inbound",
                TicketStatus::WaitingImo => "Waiting IMO",
                TicketStatus::WaitingInvControl => "Waiting Inv Control",
                TicketStatus::WaitingPutAway => "Waiting Put-away",
                TicketStatus::WaitingReturns => "Waiting Returns",
                TicketStatus::WaitingShipping => "Waiting Shipping",
                TicketStatus::WaitingSi => "Waiting Si",
                TicketStatus::WaitingStores => "Waiting Stores",
            }
        }
    }

    impl Default for TicketStatus {
        fn default() -> Self {
            TicketStatus::NewRequest
        }
    }

    impl fmt::Display for TicketStatus {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.as_str())
        }
    }

    impl str::FromStr for TicketStatus {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "New Request" => Ok(TicketStatus::NewRequest),
                "In Progress" => Ok(TicketStatus::InProgress),
                "OM Escalated" => Ok(TicketStatus::OmEscalated),
                "Waiting 3PL" => Ok(TicketStatus::Waiting3pl),
                "Closed" => Ok(TicketStatus::Closed),
                "Canceled by User" => Ok(TicketStatus::CanceledByUser),
                "Re-Opened" => Ok(TicketStatus::ReOpened),
                "Waiting Buyer/Supplier" => Ok(TicketStatus::WaitingBuyerSupplier),
                "Waiting Customer" => Ok(TicketStatus::WaitingCustomer),
                "Waiting Elevator Repair" => Ok(TicketStatus::WaitingElevatorRepair),
                "Waiting on IT" => Ok(TicketStatus::WaitingOnIt),
                "Waiting Tool Move" => Ok(TicketStatus::WaitingToolMove),
                "Exceptions / Variants" => Ok(TicketStatus::ExceptionsVariants),
                "Waiting Chemicals" => Ok(TicketStatus::WaitingChemicals),
                "Waiting Count/Verify" => Ok(TicketStatus::WaitingCountVerify),
                "Waiting Delivery Confirmation" => Ok(TicketStatus::WaitingDeliveryConfirmation),
                "Waiting Distribution" => Ok(TicketStatus::WaitingDistribution),
                "Waiting ePart" => Ok(TicketStatus::WaitingEPart),
                "Waiting Inbound" => Ok(TicketStatus::WaitingInbound),
                "Waiting IMO" => Ok(TicketStatus::WaitingImo),
                "Waiting Inv Control" => Ok(TicketStatus::WaitingInvControl),
                "Waiting Put-away" => Ok(TicketStatus::WaitingPutAway),
                "Waiting Returns" => Ok(TicketStatus::WaitingReturns),
                "Waiting Shipping" => Ok(TicketStatus::WaitingShipping),
                "Waiting Si" => Ok(TicketStatus::WaitingSi),
                "Waiting Stores" => Ok(TicketStatus::WaitingStores),
                _ => Err(format!("'{}' is not a valid TicketStatus", s)),
            }
        }
    }

    #[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, diesel_derive_enum::DbEnum)]
    #[ExistingTypePath = "crate::sql_types::TicketPriorityMapping"]
    pub enum TicketPriority {
        #[serde(rename = "Low")]
        #[db_rename = "Low"]
        Low,
        #[serde(rename = "Medium")]
        #[db_rename = "Medium"]
        Medium,
        #[serde(rename = "High")]
        #[db_rename = "High"]
        High,
        #[serde(rename = "Factory Constraint")]
        #[db_rename = "Factory Constraint"]
        FactoryConstraint,
        #[serde(rename = "Not Assigned")]
        #[db_rename = "Not Assigned"]
        NotAssigned,
        #[serde(rename = "Non-Factory Operation")]
        #[db_rename = "Non-Factory Operation"]
        NonFactoryOperation,
    }

    impl TicketPriority {
        pub fn as_str(&self) -> &'static str {
            match self {
                TicketPriority::Low => "Low",
                TicketPriority::Medium => "Medium",
                TicketPriority::High => "High",
                TicketPriority::FactoryConstraint => "Factory Constraint",
                TicketPriority::NotAssigned => "Not Assigned",
                TicketPriority::NonFactoryOperation => "Non-Factory Operation",
            }
        }
    }

    impl Default for TicketPriority {
        fn default() -> Self {
            TicketPriority::NotAssigned
        }
    }

    impl fmt::Display for TicketPriority {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.as_str())
        }
    }

    impl str::FromStr for TicketPriority {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "Low" => Ok(TicketPriority::Low),
                "Medium" => Ok(TicketPriority::Medium),
                "High" => Ok(TicketPriority::High),
                "Factory Constraint" => Ok(TicketPriority::FactoryConstraint),
                "Not Assigned" => Ok(TicketPriority::NotAssigned),
                "Non-Factory Operation" => Ok(TicketPriority::NonFactoryOperation),
                _ => Err(format!("'{}' is not a valid TicketPriority", s)),
            }
        }
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::TicketStatusMapping;
    use super::sql_types::TicketPriorityMapping;

    tickets (id) {
        id -> Int4,
        issue_id -> Text,
        name -> Text,
        #[max_length = 320]
        email -> Varchar,
        problem_statement -> Text,
        priority -> TicketPriorityMapping,
        status -> TicketStatusMapping,
        area -> Text,
        tool_id -> Text,
        wiings_order -> Text,
        part_number -> Text,
        supplier -> Text,
        fab_submitted_as -> Text,
        closed_reason -> Nullable<Text>,
        closed_subreason -> Nullable<Text>,
        closed_message -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    comments (id) {
        id -> Int4,
        ticket_id -> Int4,
        text -> Text,
        commenter_name -> Text,
        image_url -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    surveys (id) {
        id -> Int4,
        ticket_id -> Int4,
        ease_of_use -> Int4,
        response_time -> Int4,
        resolution_quality -> Int4,
        overall_satisfaction -> Int4,
        comments -> Text,
        submitted_at -> Timestamp,
    }
}

diesel::joinable!(comments -> tickets (ticket_id));
diesel::joinable!(surveys -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(
    comments,
    surveys,
    tickets,
);

#[cfg(test)]
mod tests {
    use super::hooked_sql_types::{TicketPriority, TicketStatus};

    #[test]
    fn status_display_and_parse_round_trip() {
        let awkward = [
            TicketStatus::Waiting3pl,
            TicketStatus::WaitingOnIt,
            TicketStatus::WaitingEPart,
            TicketStatus::ExceptionsVariants,
            TicketStatus::CanceledByUser,
            TicketStatus::WaitingPutAway,
        ];
        for status in awkward {
            let parsed = status.as_str().parse::<TicketStatus>().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(TicketStatus::Waiting3pl.to_string(), "Waiting 3PL");
        assert_eq!(TicketStatus::WaitingEPart.to_string(), "Waiting ePart");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("Escalated To Mars".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn defaults_match_submission_form() {
        assert_eq!(TicketStatus::default(), TicketStatus::NewRequest);
        assert_eq!(TicketPriority::default(), TicketPriority::NotAssigned);
    }

    #[test]
    fn priority_parse_round_trip() {
        for priority in [
            TicketPriority::Low,
            TicketPriority::FactoryConstraint,
            TicketPriority::NonFactoryOperation,
        ] {
            assert_eq!(priority.as_str().parse::<TicketPriority>().unwrap(), priority);
        }
    }
}
