pub mod area;
pub mod customer;
pub mod profile;
pub mod receipt;
pub mod settings;
pub mod submission;

pub use area::{Area, AreaRecord};
pub use customer::{BillingRecord, Customer, DailyBill, RawBillingRow, RawCustomer};
pub use profile::ReaderProfile;
pub use receipt::Receipt;
pub use settings::SystemSettings;
pub use submission::{BillPayload, PendingSubmission};

/// Serde adapter for calendar dates as `YYYY-MM-DD`, the format the
/// remote service uses for reading and due dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let out = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&out)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Same as [`iso_date`] but for optional dates.
pub mod iso_date_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => {
                let out = d.format(FORMAT).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&out)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => Date::parse(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
