use idmig_core::entities::MemberRecord;
use idmig_target::TargetDirectory;

/// Label used for a member in binding reports.
pub fn member_label(member: &MemberRecord) -> &str {
    member
        .email
        .as_deref()
        .filter(|email| !email.is_empty())
        .unwrap_or(&member.user_id)
}

/// Primary login id of the target identity registered under the member's
/// email. The error is the reason the member cannot be bound.
pub async fn resolve_login_id(
    target: &dyn TargetDirectory,
    member: &MemberRecord,
) -> Result<String, String> {
    let email = member
        .email
        .as_deref()
        .filter(|email| !email.is_empty())
        .ok_or_else(|| format!("member {} has no email", member.user_id))?;

    match target.find_by_email(email).await {
        Ok(Some(identity)) => identity
            .primary_login_id()
            .map(ToString::to_string)
            .ok_or_else(|| format!("identity for {email} has no login id")),
        Ok(None) => Err(format!("{email} has not been migrated")),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmig_core::entities::TargetIdentity;
    use idmig_target::InMemoryDirectory;
    use pretty_assertions::assert_eq;

    fn member(email: Option<&str>) -> MemberRecord {
        MemberRecord {
            user_id: "auth0|1".into(),
            email: email.map(ToString::to_string),
            name: None,
        }
    }

    #[tokio::test]
    async fn resolves_through_email() {
        let directory = InMemoryDirectory::new().with_users([TargetIdentity {
            login_ids: vec!["email-1".into()],
            email: "a@x.com".into(),
            ..TargetIdentity::default()
        }]);

        let login_id = resolve_login_id(&directory, &member(Some("a@x.com"))).await;
        assert_eq!(login_id, Ok("email-1".to_string()));
    }

    #[tokio::test]
    async fn member_without_email_cannot_be_bound() {
        let directory = InMemoryDirectory::new();
        let err = resolve_login_id(&directory, &member(None)).await.unwrap_err();
        assert_eq!(err, "member auth0|1 has no email");
        assert!(directory.calls().is_empty());
        assert_eq!(member_label(&member(None)), "auth0|1");
    }

    #[tokio::test]
    async fn unmigrated_member_cannot_be_bound() {
        let directory = InMemoryDirectory::new();
        let err = resolve_login_id(&directory, &member(Some("b@x.com")))
            .await
            .unwrap_err();
        assert_eq!(err, "b@x.com has not been migrated");
    }
}
