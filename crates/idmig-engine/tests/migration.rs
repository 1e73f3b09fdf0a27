//! End-to-end user migrations over in-memory source and target directories.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use idmig_core::RemoteError;
use idmig_core::enums::TargetStatus;
use idmig_engine::{MigrationSummary, Progress, RetryingDirectory};
use idmig_source::{InMemorySource, RetryPolicy};
use idmig_target::{DirectoryCall, InMemoryDirectory};
use pretty_assertions::assert_eq;
use support::{LostCreateResponse, RecordingSleeper, blocked, context, user};

async fn migrate(source: InMemorySource, directory: &Arc<InMemoryDirectory>) -> MigrationSummary {
    context(source, directory.clone(), false)
        .migrate_users(None)
        .await
        .unwrap()
}

#[tokio::test]
async fn passwordless_email_user_is_created_under_its_connection_login_id() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([user("email|1", "a@x.com", &[("email", "1")])]);

    let summary = migrate(source, &directory).await;

    assert_eq!(summary.created, 1);
    let created = directory.user("email-1").unwrap();
    assert_eq!(created.email, "a@x.com");
    assert_eq!(created.connections(), vec!["email"]);
    assert_eq!(created.status, TargetStatus::Enabled);
}

#[tokio::test]
async fn first_run_creates_every_user_and_disables_blocked_ones() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([
        user("auth0|1", "a@x.com", &[("Username-Password-Authentication", "1")]),
        user("google-oauth2|2", "b@x.com", &[("google-oauth2", "2")]),
        blocked(user("github|3", "c@x.com", &[("github", "3")])),
    ]);

    let summary = migrate(source, &directory).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.created, 3);
    assert!(summary.failed.is_empty());
    assert!(directory.user("a@x.com").is_some());
    assert!(directory.user("google-2").is_some());
    assert_eq!(directory.user("github-3").unwrap().status, TargetStatus::Disabled);
}

#[tokio::test]
async fn rerunning_skips_duplicates_and_redisables_blocked_users() {
    let directory = Arc::new(InMemoryDirectory::new());
    let users = [
        user("auth0|1", "a@x.com", &[("Username-Password-Authentication", "1")]),
        blocked(user("github|3", "c@x.com", &[("github", "3")])),
    ];

    migrate(InMemorySource::new().with_users(users.clone()), &directory).await;
    let second = migrate(InMemorySource::new().with_users(users), &directory).await;

    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.merged, 1);
    assert_eq!(second.disabled_mismatches, vec!["github|3"]);
    assert_eq!(directory.users().len(), 2);
    assert_eq!(directory.user("github-3").unwrap().connections(), vec!["github"]);
}

#[tokio::test]
async fn users_sharing_an_email_merge_into_one_identity() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([
        user("google-oauth2|1", "a@x.com", &[("google-oauth2", "1")]),
        user("github|2", "A@x.com", &[("github", "2")]),
    ]);

    let summary = migrate(source, &directory).await;

    assert_eq!(summary.created, 1);
    assert_eq!(summary.merged, 1);
    assert_eq!(summary.merged_ids, vec!["github|2"]);
    assert_eq!(directory.users().len(), 1);

    let merged = directory.user("google-1").unwrap();
    assert_eq!(merged.login_ids, vec!["google-1", "github-2"]);
    assert_eq!(merged.connections(), vec!["google-oauth2", "github"]);
}

#[tokio::test]
async fn merged_connections_are_the_union_of_both_sides() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([
        user("a|1", "a@x.com", &[("alpha", "1"), ("beta", "1")]),
        user("b|2", "a@x.com", &[("beta", "2"), ("gamma", "2")]),
    ]);

    migrate(source, &directory).await;

    let merged = directory.user("alpha-1").unwrap();
    assert_eq!(merged.connections(), vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn reconciling_a_merged_user_again_adds_nothing() {
    let directory = Arc::new(InMemoryDirectory::new());
    let users = [
        user("a|1", "a@x.com", &[("alpha", "1")]),
        user("b|2", "a@x.com", &[("beta", "2")]),
    ];

    migrate(InMemorySource::new().with_users(users.clone()), &directory).await;
    let writes_before = directory.writes().len();
    let again = migrate(InMemorySource::new().with_users(users), &directory).await;

    assert_eq!(again.skipped, 2);
    assert_eq!(directory.writes().len(), writes_before);
    assert_eq!(
        directory.user("alpha-1").unwrap().connections(),
        vec!["alpha", "beta"]
    );
}

#[tokio::test]
async fn merging_into_a_disabled_identity_keeps_it_disabled() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([
        blocked(user("a|1", "a@x.com", &[("alpha", "1")])),
        user("b|2", "a@x.com", &[("beta", "2")]),
    ]);

    let summary = migrate(source, &directory).await;

    assert_eq!(summary.disabled_mismatches, vec!["b|2"]);
    assert_eq!(directory.user("alpha-1").unwrap().status, TargetStatus::Disabled);
    assert!(
        !directory
            .calls()
            .iter()
            .any(|call| matches!(call, DirectoryCall::ActivateUser(_)))
    );
}

#[tokio::test]
async fn summary_does_not_depend_on_record_order() {
    let users = vec![
        user("a|1", "a@x.com", &[("alpha", "1")]),
        user("b|2", "b@x.com", &[("beta", "2")]),
        user("none|3", "c@x.com", &[]),
        blocked(user("d|4", "d@x.com", &[("delta", "4")])),
    ];
    let mut reversed = users.clone();
    reversed.reverse();

    let forward = migrate(
        InMemorySource::new().with_users(users),
        &Arc::new(InMemoryDirectory::new()),
    )
    .await;
    let backward = migrate(
        InMemorySource::new().with_users(reversed),
        &Arc::new(InMemoryDirectory::new()),
    )
    .await;

    assert_eq!(forward, backward);
    assert_eq!(forward.failed.len(), 1);
    assert_eq!(forward.failed[0].0, "none|3");
}

#[tokio::test]
async fn one_failing_user_does_not_stop_the_run() {
    let directory = Arc::new(InMemoryDirectory::new().fail_when(|call| {
        (*call == DirectoryCall::CreateUser("beta-2".into())).then(|| RemoteError::Rejected {
            status: 400,
            code: Some("E011003".into()),
            message: "bad request".into(),
        })
    }));
    let source = InMemorySource::new().with_users([
        user("a|1", "a@x.com", &[("alpha", "1")]),
        user("b|2", "b@x.com", &[("beta", "2")]),
        user("c|3", "c@x.com", &[("gamma", "3")]),
    ]);

    let summary = migrate(source, &directory).await;

    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.starts_with("b|2: "));
}

#[tokio::test]
async fn rate_limited_writes_are_retried_on_the_backoff_schedule() {
    let remaining = AtomicUsize::new(2);
    let directory = Arc::new(InMemoryDirectory::new().fail_when(move |call| {
        let limited = matches!(call, DirectoryCall::CreateUser(_))
            && remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        limited.then_some(RemoteError::RateLimited {
            retry_after_secs: None,
        })
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let retrying = RetryingDirectory::new(directory.clone(), RetryPolicy::default())
        .with_sleeper(sleeper.clone());
    let source = InMemorySource::new().with_users([user("a|1", "a@x.com", &[("alpha", "1")])]);

    let summary = context(source, Arc::new(retrying), false)
        .migrate_users(None)
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(sleeper.seconds(), vec![5, 25]);
    assert!(directory.user("alpha-1").is_some());
}

#[tokio::test]
async fn exhausted_retries_fail_only_that_user() {
    let directory = Arc::new(InMemoryDirectory::new().fail_when(|call| {
        (*call == DirectoryCall::CreateUser("alpha-1".into())).then_some(RemoteError::RateLimited {
            retry_after_secs: None,
        })
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let retrying = RetryingDirectory::new(directory.clone(), RetryPolicy::default())
        .with_sleeper(sleeper.clone());
    let source = InMemorySource::new().with_users([
        user("a|1", "a@x.com", &[("alpha", "1")]),
        user("b|2", "b@x.com", &[("beta", "2")]),
    ]);

    let summary = context(source, Arc::new(retrying), false)
        .migrate_users(None)
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.contains("gave up after 4 attempts"));
    assert_eq!(sleeper.seconds(), vec![5, 25, 125]);
}

#[tokio::test]
async fn dry_run_counts_users_without_touching_the_target() {
    let directory = Arc::new(InMemoryDirectory::new());
    let source = InMemorySource::new().with_users([
        user("a|1", "a@x.com", &[("alpha", "1")]),
        user("b|2", "b@x.com", &[("beta", "2")]),
        user("c|3", "c@x.com", &[("gamma", "3")]),
    ]);

    let summary = context(source, directory.clone(), true)
        .migrate_users(None)
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.migrated(), 0);
    assert!(directory.calls().is_empty());
}

#[tokio::test]
async fn observer_sees_progress_every_n_migrations() {
    let seen: Arc<std::sync::Mutex<Vec<Progress>>> = Arc::default();
    let sink = seen.clone();
    let source = InMemorySource::new().with_users(
        (1..=5).map(|n| {
            let id = n.to_string();
            user(&format!("u|{n}"), &format!("{n}@x.com"), &[("alpha", id.as_str())])
        }),
    );
    let mut ctx = context(source, Arc::new(InMemoryDirectory::new()), false);
    ctx.settings.progress_every = 2;

    ctx.migrate_users(Some(Arc::new(move |progress: Progress| sink.lock().unwrap().push(progress))))
        .await
        .unwrap();

    let migrated: Vec<usize> = seen.lock().unwrap().iter().map(|p| p.migrated).collect();
    assert_eq!(migrated, vec![2, 4]);
}

#[tokio::test]
async fn create_that_landed_before_a_timeout_is_still_created_and_disabled() {
    let directory = Arc::new(InMemoryDirectory::new());
    let retrying = RetryingDirectory::new(
        Arc::new(LostCreateResponse::new(directory.clone())),
        RetryPolicy::default(),
    )
    .with_sleeper(Arc::new(RecordingSleeper::default()));
    let source =
        InMemorySource::new().with_users([blocked(user("a|1", "a@x.com", &[("alpha", "1")]))]);

    let summary = context(source, Arc::new(retrying), false)
        .migrate_users(None)
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert!(summary.failed.is_empty());
    assert_eq!(directory.users().len(), 1);
    assert_eq!(directory.user("alpha-1").unwrap().status, TargetStatus::Disabled);
    assert!(directory.writes().contains(&DirectoryCall::DeactivateUser("alpha-1".into())));
}
