//! Login-id derivation.
//!
//! Each linked identity of a source user maps to one target login id,
//! chosen by its connection label:
//!
//! | label contains | login id                               |
//! |----------------|----------------------------------------|
//! | `Username`     | the user's email                       |
//! | `sms`          | the user's phone                       |
//! | `-`            | `{text before the first dash}-{user id}` |
//! | otherwise      | `{label}-{user id}`                    |
//!
//! An `sms` identity on a user without a phone falls back to the last rule.

use idmig_core::entities::{ConnectionIdentity, SourceIdentity};

/// Login id for one linked identity of `source`.
#[must_use]
pub fn derive_login_id(source: &SourceIdentity, identity: &ConnectionIdentity) -> String {
    let label = identity.connection.as_str();
    if label.contains("Username") {
        return source.email.clone();
    }
    if label.contains("sms") {
        if let Some(phone) = source.phone.as_deref().filter(|p| !p.is_empty()) {
            return phone.to_string();
        }
        return format!("{label}-{}", identity.user_id);
    }
    match label.split_once('-') {
        Some((prefix, _)) => format!("{prefix}-{}", identity.user_id),
        None => format!("{label}-{}", identity.user_id),
    }
}

/// Login ids of every linked identity, in listing order and without repeats.
///
/// The first entry is the primary login id. Empty when the source has no
/// linked identities.
#[must_use]
pub fn derive_login_ids(source: &SourceIdentity) -> Vec<String> {
    let mut login_ids: Vec<String> = Vec::with_capacity(source.identities.len());
    for identity in &source.identities {
        let login_id = derive_login_id(source, identity);
        if !login_id.is_empty() && !login_ids.contains(&login_id) {
            login_ids.push(login_id);
        }
    }
    login_ids
}
