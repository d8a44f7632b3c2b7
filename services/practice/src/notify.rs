//! Grant notifications.
//!
//! # Purpose
//! Tells a grantee that they can now see another member's data. Delivery is
//! fire-and-forget: a failed notification is logged and counted, never
//! retried, and never undoes the grant that triggered it.
use crate::model::{AccessGrant, User};
use crate::observability::GRANT_NOTIFICATIONS_FAILED_TOTAL;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[async_trait]
pub trait GrantNotifier: Send + Sync {
    async fn grant_created(
        &self,
        grant: &AccessGrant,
        grantee: &User,
        target: &User,
    ) -> anyhow::Result<()>;
}

/// Writes notifications to the log; the default when no mail relay is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl GrantNotifier for LogNotifier {
    async fn grant_created(
        &self,
        grant: &AccessGrant,
        grantee: &User,
        target: &User,
    ) -> anyhow::Result<()> {
        tracing::info!(
            grant_id = %grant.id,
            grantee = %grantee.email,
            target = %target.display_name,
            "access grant notification"
        );
        Ok(())
    }
}

/// Send the notification on a detached task.
///
/// The handle is returned for tests; request handlers drop it.
pub fn dispatch_grant_created(
    notifier: Arc<dyn GrantNotifier>,
    grant: AccessGrant,
    grantee: User,
    target: User,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = notifier.grant_created(&grant, &grantee, &target).await {
            metrics::counter!(GRANT_NOTIFICATIONS_FAILED_TOTAL).increment(1);
            tracing::warn!(grant_id = %grant.id, error = %err, "grant notification failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use precedent_authz::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct FailingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GrantNotifier for FailingNotifier {
        async fn grant_created(
            &self,
            _grant: &AccessGrant,
            _grantee: &User,
            _target: &User,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("smtp relay unreachable")
        }
    }

    fn pair() -> (AccessGrant, User, User) {
        let org = Uuid::new_v4();
        let grantee = User::new("a@firm.test", "Assistant", Some(org), Role::Assistant, None);
        let target = User::new("b@firm.test", "Associate", Some(org), Role::Assistant, None);
        let grant = AccessGrant::new(org, Uuid::new_v4(), grantee.id, target.id);
        (grant, grantee, target)
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = Arc::new(FailingNotifier {
            calls: AtomicUsize::new(0),
        });
        let (grant, grantee, target) = pair();
        let handle = dispatch_grant_created(notifier.clone(), grant, grantee, target);
        handle.await.expect("notification task must not panic");
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn log_notifier_succeeds() {
        let (grant, grantee, target) = pair();
        LogNotifier
            .grant_created(&grant, &grantee, &target)
            .await
            .expect("log notifier");
    }
}
