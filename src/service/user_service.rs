use tracing::{debug, error, info, instrument, warn};
use crate::repository::user_repo::UserRepository;
use crate::model::user::User;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait UserService: Send + Sync {
    /// Removes every user. Not exposed over HTTP.
    async fn clear(&self) -> Result<(), ServiceError>;
    async fn get_all(&self) -> Result<Vec<User>, ServiceError>;
    /// Fails with `NotFound` if no user has this id.
    async fn get_by_id(&self, id: i64) -> Result<User, ServiceError>;
    /// Fails with `NotFound` if no user has this login name.
    async fn get_by_login_name(&self, login_name: &str) -> Result<User, ServiceError>;
    /// Creates the user when it has no id, otherwise updates it.
    ///
    /// Fails with `NotFound` when updating a user that does not exist and with
    /// `Duplication` when the login name is already used by another user.
    async fn upsert(&self, user: User) -> Result<User, ServiceError>;
    /// Fails with `NotFound` if no user has this id, including on a repeated delete.
    async fn delete(&self, id: i64) -> Result<(), ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    async fn perform_upsert(&self, user: User) -> Result<User, ServiceError> {
        match self.user_repo.upsert(user).await.map_err(ServiceError::from) {
            Ok(upserted) => {
                info!(id = ?upserted.id, "Successfully upserted user");
                Ok(upserted)
            }
            Err(ServiceError::Duplication(msg)) => {
                error!("Duplication error while upserting user: {}", msg);
                Err(ServiceError::Duplication(msg))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), ServiceError> {
        warn!("Clearing all user data");
        self.user_repo.clear().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<User>, ServiceError> {
        debug!("Retrieving all users");
        Ok(self.user_repo.get_all().await?)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<User, ServiceError> {
        debug!("Retrieving user by ID");
        Ok(self.user_repo.get_by_id(id).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_login_name(&self, login_name: &str) -> Result<User, ServiceError> {
        debug!("Retrieving user by login name");
        Ok(self.user_repo.get_by_login_name(login_name).await?)
    }

    #[instrument(skip(self, user), fields(id = ?user.id, login_name = %user.login_name))]
    async fn upsert(&self, user: User) -> Result<User, ServiceError> {
        match user.id {
            None => info!("Creating new user"),
            Some(id) => {
                info!("Updating user");
                // Existence probe. A concurrent delete between this read and the
                // write is still reported as NotFound by the repository.
                self.user_repo.get_by_id(id).await?;
            }
        }
        self.perform_upsert(user).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        info!("Deleting user");
        self.user_repo.delete(id).await?;
        info!("Deleted user");
        Ok(())
    }
}
