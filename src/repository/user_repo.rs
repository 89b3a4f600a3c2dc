use crate::config::mongo_conf::MongoConfig;
use crate::model::user::User;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, Document};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::IndexModel;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Storage port for users.
///
/// Implementations own the `id`, `created_at` and `updated_at` fields and must
/// enforce login name uniqueness atomically.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by id.
    async fn get_all(&self) -> RepositoryResult<Vec<User>>;
    async fn get_by_id(&self, id: i64) -> RepositoryResult<User>;
    async fn get_by_login_name(&self, login_name: &str) -> RepositoryResult<User>;
    /// Insert when `user.id` is `None`, otherwise update the existing record.
    ///
    /// Fails with `NotFound` when updating an unknown id and with
    /// `AlreadyExists` when the login name belongs to another record.
    async fn upsert(&self, user: User) -> RepositoryResult<User>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    async fn clear(&self) -> RepositoryResult<()>;
}

#[derive(Debug)]
struct InMemoryState {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

impl InMemoryState {
    fn login_name_taken(&self, login_name: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.login_name == login_name && u.id != except)
    }
}

/// Process-local storage. Ids start at 1 and are never reused, even after `clear`.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    state: RwLock<InMemoryState>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InMemoryState {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> RepositoryResult<User> {
        let state = self.state.read().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }

    async fn get_by_login_name(&self, login_name: &str) -> RepositoryResult<User> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.login_name == login_name)
            .cloned()
            .ok_or_else(|| RepositoryError::user_not_found_by_login_name(login_name))
    }

    #[instrument(skip(self, user), fields(id = ?user.id, login_name = %user.login_name))]
    async fn upsert(&self, user: User) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let stored = match user.id {
            None => {
                if state.login_name_taken(&user.login_name, None) {
                    return Err(RepositoryError::duplicate_login_name(&user.login_name));
                }
                let id = state.next_id;
                state.next_id += 1;
                user.to_builder().id(id).created_at(now).updated_at(now).build()
            }
            Some(id) => {
                let created_at = state
                    .users
                    .get(&id)
                    .ok_or_else(|| RepositoryError::user_not_found_by_id(id))?
                    .created_at;
                if state.login_name_taken(&user.login_name, Some(id)) {
                    return Err(RepositoryError::duplicate_login_name(&user.login_name));
                }
                user.to_builder().created_at(created_at).updated_at(now).build()
            }
        };
        if let Some(id) = stored.id {
            state.users.insert(id, stored.clone());
        }
        debug!(id = ?stored.id, "User stored in memory");
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }

    async fn clear(&self) -> RepositoryResult<()> {
        self.state.write().await.users.clear();
        Ok(())
    }
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
    counters: mongodb::Collection<Document>,
    sequence_name: String,
}

impl MongoUserRepository {
    /// Connect, then make sure the unique login name index exists.
    pub async fn new(config: &MongoConfig) -> RepositoryResult<Self> {
        use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client};
        let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("UsersBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));
        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            client_options.credential = Some(Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build());
        }
        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database);
        let collection_name = config.user_collection();
        let repo = MongoUserRepository {
            collection: db.collection::<User>(collection_name),
            counters: db.collection::<Document>("counters"),
            sequence_name: collection_name.to_string(),
        };
        repo.ensure_indexes().await?;
        info!(collection = %collection_name, "MongoDB user repository ready");
        Ok(repo)
    }

    async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "login_name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index, None).await?;
        Ok(())
    }

    async fn next_id(&self) -> RepositoryResult<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": self.sequence_name.as_str() },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| RepositoryError::database("Id sequence document missing after upsert"))?;
        counter
            .get_i64("seq")
            .map_err(|e| RepositoryError::serialization(format!("Invalid id sequence value: {}", e)))
    }

    async fn insert(&self, user: User) -> RepositoryResult<User> {
        let id = self.next_id().await?;
        let now = Utc::now();
        let user = user.to_builder().id(id).created_at(now).updated_at(now).build();
        self.collection.insert_one(&user, None).await.map_err(|e| {
            let err = RepositoryError::from(e);
            if matches!(err, RepositoryError::AlreadyExists(_)) {
                return RepositoryError::duplicate_login_name(&user.login_name);
            }
            err
        })?;
        Ok(user)
    }

    async fn update(&self, id: i64, user: User) -> RepositoryResult<User> {
        let update = doc! {
            "$set": {
                "login_name": user.login_name.as_str(),
                "email_address": user.email_address.as_str(),
                "first_name": user.first_name.as_str(),
                "last_name": user.last_name.as_str(),
                "updated_at": bson::to_bson(&Utc::now())?,
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await
            .map_err(|e| {
                let err = RepositoryError::from(e);
                if matches!(err, RepositoryError::AlreadyExists(_)) {
                    return RepositoryError::duplicate_login_name(&user.login_name);
                }
                err
            })?;
        updated.ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self.collection.find(None, options).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        debug!("Fetched {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> RepositoryResult<User> {
        self.collection
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }

    #[instrument(skip(self))]
    async fn get_by_login_name(&self, login_name: &str) -> RepositoryResult<User> {
        self.collection
            .find_one(doc! { "login_name": login_name }, None)
            .await?
            .ok_or_else(|| RepositoryError::user_not_found_by_login_name(login_name))
    }

    #[instrument(skip(self, user), fields(id = ?user.id, login_name = %user.login_name))]
    async fn upsert(&self, user: User) -> RepositoryResult<User> {
        let result = match user.id {
            None => self.insert(user).await,
            Some(id) => self.update(id, user).await,
        };
        if let Err(e) = &result {
            error!("Failed to upsert user: {}", e);
        }
        result
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::user_not_found_by_id(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> RepositoryResult<()> {
        let result = self.collection.delete_many(doc! {}, None).await?;
        info!("Removed {} users", result.deleted_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> User {
        User::new("ada", "a@x.com", "Ada", "L")
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();
        let first = repo.upsert(ada()).await.unwrap();
        let second = repo.upsert(User::new("bob", "b@x.com", "Bob", "B")).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_insert_ignores_caller_timestamps() {
        let repo = InMemoryUserRepository::new();
        let stale = chrono::DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let stored = repo
            .upsert(ada().to_builder().created_at(stale).updated_at(stale).build())
            .await
            .unwrap();
        assert_ne!(stored.created_at, Some(stale));
    }

    #[tokio::test]
    async fn test_update_keeps_own_login_name() {
        let repo = InMemoryUserRepository::new();
        let stored = repo.upsert(ada()).await.unwrap();
        let updated = repo
            .upsert(stored.to_builder().first_name("Augusta").build())
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let repo = InMemoryUserRepository::new();
        let err = repo.upsert(ada().to_builder().id(99).build()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_taken_login_name_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.upsert(ada()).await.unwrap();
        let bob = repo.upsert(User::new("bob", "b@x.com", "Bob", "B")).await.unwrap();
        let err = repo
            .upsert(bob.to_builder().login_name("ada").build())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists(_)));
        assert_eq!(repo.get_by_id(2).await.unwrap().login_name, "bob");
    }

    #[tokio::test]
    async fn test_clear_does_not_reuse_ids() {
        let repo = InMemoryUserRepository::new();
        repo.upsert(ada()).await.unwrap();
        repo.clear().await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
        let again = repo.upsert(ada()).await.unwrap();
        assert_eq!(again.id, Some(2));
    }

    #[tokio::test]
    async fn test_get_all_is_ordered_by_id() {
        let repo = InMemoryUserRepository::new();
        for name in ["c", "a", "b"] {
            repo.upsert(User::new(name, "x@x.com", "X", "Y")).await.unwrap();
        }
        let ids: Vec<_> = repo.get_all().await.unwrap().into_iter().filter_map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
