use async_trait::async_trait;
use db::DBService;
use services::services::{
    auth::{AuthError, AuthService},
    config::{Config, ConfigError},
    list_cache::ListCaches,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Everything a request handler needs, shared across the router.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: Config) -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn list_caches(&self) -> &ListCaches;

    fn auth(&self) -> &AuthService;
}
