use serde::{Deserialize, Deserializer, Serialize};

/// One linked login of a source user (`identities[]` in the listing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionIdentity {
    /// Connection label, e.g. `Username-Password-Authentication`, `sms`,
    /// `google-oauth2`.
    pub connection: String,
    /// Provider-side user id. Some providers emit it as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

/// A user read from the source directory. Read-only for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceIdentity {
    #[serde(rename = "user_id")]
    pub source_user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "phone_number")]
    pub phone: Option<String>,
    #[serde(default, rename = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub identities: Vec<ConnectionIdentity>,
}

impl SourceIdentity {
    /// Connection labels in listing order, without repeats.
    #[must_use]
    pub fn connection_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.identities.len());
        for identity in &self.identities {
            if !labels.contains(&identity.connection) {
                labels.push(identity.connection.clone());
            }
        }
        labels
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Int(value) => value.to_string(),
        Raw::Unsigned(value) => value.to_string(),
    })
}
