use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HashParseError;

/// Length of the bcrypt salt in its radix-64 form.
const SALT_LEN: usize = 22;
/// Length of the bcrypt digest in its radix-64 form.
const DIGEST_LEN: usize = 31;

/// One line of a password export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordRecord {
    #[serde(rename = "_id")]
    pub id: ExportObjectId,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(default)]
    pub connection: Option<String>,
}

/// Export-format object id (`{"$oid": "..."}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportObjectId {
    #[serde(rename = "$oid")]
    pub oid: String,
}

impl PasswordRecord {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id.oid
    }
}

/// A parsed bcrypt hash in modular crypt format: `$2b$10$<salt><digest>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BcryptHash {
    pub variant: String,
    pub cost: u32,
    pub salt: String,
    pub digest: String,
}

impl FromStr for BcryptHash {
    type Err = HashParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split('$');
        if parts.next() != Some("") {
            return Err(HashParseError::new("hash must start with '$'"));
        }
        let variant = parts
            .next()
            .ok_or_else(|| HashParseError::new("missing variant"))?;
        if !matches!(variant, "2a" | "2b" | "2x" | "2y") {
            return Err(HashParseError::new(format!(
                "unsupported variant '{variant}'"
            )));
        }
        let cost = parts
            .next()
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|cost| (4..=31).contains(cost))
            .ok_or_else(|| HashParseError::new("cost must be an integer in 4..=31"))?;
        let rest = parts
            .next()
            .ok_or_else(|| HashParseError::new("missing salt and digest"))?;
        if parts.next().is_some() {
            return Err(HashParseError::new("too many '$' separated fields"));
        }
        if !rest.is_ascii() || rest.len() != SALT_LEN + DIGEST_LEN {
            return Err(HashParseError::new(format!(
                "salt and digest must be {} ascii characters, got {}",
                SALT_LEN + DIGEST_LEN,
                rest.len()
            )));
        }

        let (salt, digest) = rest.split_at(SALT_LEN);
        Ok(Self {
            variant: variant.to_string(),
            cost,
            salt: salt.to_string(),
            digest: digest.to_string(),
        })
    }
}

impl fmt::Display for BcryptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${:02}${}{}",
            self.variant, self.cost, self.salt, self.digest
        )
    }
}

/// A user to be created in the target together with an existing hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashedPasswordUser {
    pub login_id: String,
    pub email: String,
    pub email_verified: bool,
    pub hash: BcryptHash,
}

/// What the target reported for one batch of password users.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordBatchResult {
    /// Login ids that were created.
    pub created: Vec<String>,
    /// Login ids that were rejected, with the reason.
    pub failed: Vec<(String, String)>,
}
