//! First-run platform administrator.
//!
//! A fresh deployment has no account able to create organizations. When both
//! `PRECEDENT_BOOTSTRAP_ADMIN_EMAIL` and `PRECEDENT_BOOTSTRAP_ADMIN_TOKEN` are
//! set, a platform administrator is created and the configured token attached
//! to it. Seeding is skipped once the token resolves to an account.
use crate::auth::token::hash_token;
use crate::config::BootstrapConfig;
use crate::model::User;
use crate::store::PracticeStore;
use anyhow::Context;
use precedent_authz::Role;

pub async fn seed_platform_admin(
    store: &dyn PracticeStore,
    bootstrap: &BootstrapConfig,
) -> anyhow::Result<Option<User>> {
    let (Some(email), Some(token)) = (
        bootstrap.admin_email.as_deref(),
        bootstrap.admin_token.as_deref(),
    ) else {
        return Ok(None);
    };
    let token_hash = hash_token(token);
    if let Some(existing) = store.user_for_token(&token_hash).await? {
        tracing::debug!(user_id = %existing.id, "bootstrap administrator already present");
        return Ok(None);
    }
    let admin = User::new(
        email.trim().to_lowercase(),
        "Platform administrator",
        None,
        Role::PlatformAdmin,
        None,
    );
    let admin = store
        .create_user(admin)
        .await
        .context("create bootstrap administrator")?;
    store
        .insert_api_token(&token_hash, admin.id)
        .await
        .context("store bootstrap token")?;
    tracing::info!(user_id = %admin.id, "bootstrap platform administrator seeded");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            admin_email: Some("Ops@Precedent.test".to_string()),
            admin_token: Some("bootstrap-token".to_string()),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let store = InMemoryStore::new();
        let admin = seed_platform_admin(&store, &config())
            .await
            .expect("seed")
            .expect("created");
        assert_eq!(admin.role, Role::PlatformAdmin);
        assert_eq!(admin.email, "ops@precedent.test");
        assert!(admin.organization_id.is_none());

        let again = seed_platform_admin(&store, &config()).await.expect("reseed");
        assert!(again.is_none());
        let resolved = store
            .user_for_token(&hash_token("bootstrap-token"))
            .await
            .expect("lookup")
            .expect("token resolves");
        assert_eq!(resolved.id, admin.id);
    }

    #[tokio::test]
    async fn disabled_without_both_settings() {
        let store = InMemoryStore::new();
        let partial = BootstrapConfig {
            admin_email: Some("ops@precedent.test".to_string()),
            admin_token: None,
        };
        assert!(seed_platform_admin(&store, &partial).await.expect("noop").is_none());
    }
}
