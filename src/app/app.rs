use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use crate::config::{AppConfig, ConfigError, MongoConfig, StorageBackend};
use crate::repository::repository_error::RepositoryError;
use crate::repository::user_repo::{InMemoryUserRepository, MongoUserRepository, UserRepository};
use crate::router::user_router::user_router;
use crate::service::user_service::UserServiceImpl;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct App {
    config: AppConfig,
    router: Router,
    pub user_service: Arc<UserServiceImpl>,
}

impl App {
    /// Build the application from environment configuration.
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let user_repo: Arc<dyn UserRepository> = match config.storage {
            StorageBackend::Memory => {
                info!("Using in-memory user storage");
                Arc::new(InMemoryUserRepository::new())
            }
            StorageBackend::Mongo => {
                let mongo_config = MongoConfig::from_env()?;
                info!(database = %mongo_config.database, "Using MongoDB user storage");
                Arc::new(MongoUserRepository::new(&mongo_config).await?)
            }
        };
        Ok(Self::with_repository(config, user_repo))
    }

    pub fn with_repository(config: AppConfig, user_repo: Arc<dyn UserRepository>) -> Self {
        let user_service = Arc::new(UserServiceImpl::new(user_repo));
        let router = Self::create_router(user_service.clone());
        App { config, router, user_service }
    }

    pub fn create_router(user_service: Arc<UserServiceImpl>) -> Router {
        Router::new()
            .merge(user_router(user_service))
            .route("/health", get(|| async { "OK" }))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn start(self) -> Result<(), AppError> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🚀 Server running at http://{}", addr);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
