use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    auth::AuthService, cache_stats::CacheStatsService, config::Config, list_cache::ListCaches,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    list_caches: ListCaches,
    auth: AuthService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        let list_caches = ListCaches::new(config.list_cache_ttl);
        let auth = AuthService::new(config.auth_secret.clone(), config.session_ttl);

        match (&config.admin_username, &config.admin_password) {
            (Some(username), Some(password)) => {
                auth.ensure_admin(&db.pool, username, password).await?;
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("ADMIN_USERNAME and ADMIN_PASSWORD must be set together; skipping admin seed");
            }
            (None, None) => {}
        }

        if config.require_auth {
            info!("Authentication required for /api routes");
        }

        if config.is_development() {
            CacheStatsService::spawn(list_caches.clone(), config.cache_stats_interval).await;
        }

        Ok(Self {
            config: Arc::new(config),
            db,
            list_caches,
            auth,
        })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn list_caches(&self) -> &ListCaches {
        &self.list_caches
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }
}
