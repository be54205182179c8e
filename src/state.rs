//! Estado compartido de la aplicación
//!
//! Este módulo define el estado que se pasa a través del router de Axum.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::ParkingStore;
use crate::services::{AuthService, ParkingService, ReportService};
use crate::utils::jwt::JwtConfig;
use crate::utils::Clock;

/// Tokens revocados por logout, indexados por `jti` hasta su expiración
#[derive(Clone, Default)]
pub struct RevokedTokens {
    inner: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoca un token y purga los que ya expiraron.
    ///
    /// `now` tiene que ser la hora del sistema: es la que usa `verify_token`
    /// para rechazar tokens expirados. Un token con `exp == now` todavía es
    /// válido ese segundo, así que se conserva.
    pub async fn revoke(&self, token_id: Uuid, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        let mut tokens = self.inner.write().await;
        let before = tokens.len();
        tokens.retain(|_, exp| *exp >= now);
        if tokens.len() < before {
            debug!("🧹 {} tokens revocados expirados purgados", before - tokens.len());
        }
        tokens.insert(token_id, expires_at);
    }

    pub async fn is_revoked(&self, token_id: &Uuid) -> bool {
        self.inner.read().await.contains_key(token_id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: Arc<EnvironmentConfig>,
    pub clock: Arc<dyn Clock>,
    pub revoked_tokens: RevokedTokens,
}

// derive(Clone) exigiría S: Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            revoked_tokens: self.revoked_tokens.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, config: EnvironmentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock,
            revoked_tokens: RevokedTokens::new(),
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(self.config.as_ref())
    }
}

impl<S: ParkingStore> AppState<S> {
    pub fn parking_service(&self) -> ParkingService<S> {
        ParkingService::new(self.store.clone(), self.clock.clone())
    }

    pub fn report_service(&self) -> ReportService<S> {
        ReportService::new(self.store.clone())
    }

    pub fn auth_service(&self) -> AuthService<S> {
        AuthService::new(self.store.clone(), self.jwt_config(), self.config.bcrypt_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoked_token_is_reported() {
        let revoked = RevokedTokens::new();
        let now = Utc::now();
        let token_id = Uuid::new_v4();

        assert!(!revoked.is_revoked(&token_id).await);
        revoked.revoke(token_id, now + Duration::hours(1), now).await;
        assert!(revoked.is_revoked(&token_id).await);
        assert!(!revoked.is_revoked(&Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_purged_on_revoke() {
        let revoked = RevokedTokens::new();
        let now = Utc::now();
        let old = Uuid::new_v4();
        revoked.revoke(old, now + Duration::minutes(5), now).await;

        let later = now + Duration::minutes(10);
        let fresh = Uuid::new_v4();
        revoked.revoke(fresh, later + Duration::hours(1), later).await;

        assert_eq!(revoked.len().await, 1);
        assert!(!revoked.is_revoked(&old).await);
        assert!(revoked.is_revoked(&fresh).await);
    }

    #[tokio::test]
    async fn test_token_expiring_this_second_stays_revoked() {
        let revoked = RevokedTokens::new();
        let now = Utc::now();
        let expiring = Uuid::new_v4();
        revoked.revoke(expiring, now, now - Duration::seconds(1)).await;

        revoked.revoke(Uuid::new_v4(), now + Duration::hours(1), now).await;

        assert!(revoked.is_revoked(&expiring).await);
    }
}
