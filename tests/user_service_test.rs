use std::sync::Arc;
use std::time::Duration;
use users_backend::model::user::User;
use users_backend::repository::user_repo::InMemoryUserRepository;
use users_backend::service::user_service::{UserService, UserServiceImpl};
use users_backend::util::error::ServiceError;

fn setup_service() -> UserServiceImpl {
    UserServiceImpl::new(Arc::new(InMemoryUserRepository::new()))
}

fn ada() -> User {
    User::new("ada", "a@x.com", "Ada", "L")
}

#[tokio::test]
async fn test_create_assigns_id_and_equal_timestamps() {
    let service = setup_service();
    let created = service.upsert(ada()).await.expect("create ada");

    assert_eq!(created.id, Some(1));
    assert!(created.created_at.is_some());
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.login_name, "ada");
    assert_eq!(created.email_address, "a@x.com");
    assert_eq!(created.first_name, "Ada");
    assert_eq!(created.last_name, "L");
}

#[tokio::test]
async fn test_get_by_id_and_login_name_return_stored_record() {
    let service = setup_service();
    let created = service.upsert(ada()).await.unwrap();

    assert_eq!(service.get_by_id(1).await.unwrap(), created);
    assert_eq!(service.get_by_login_name("ada").await.unwrap(), created);
}

#[tokio::test]
async fn test_unknown_keys_are_not_found() {
    let service = setup_service();
    assert!(matches!(service.get_by_id(1).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(service.get_by_login_name("nobody").await, Err(ServiceError::NotFound(_))));
    assert!(matches!(service.delete(1).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_get_all_empty_is_not_an_error() {
    let service = setup_service();
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_scenario_keeps_id_and_created_at() {
    let service = setup_service();
    let created = service.upsert(ada()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let updated = service
        .upsert(created.to_builder().login_name("ada2").build())
        .await
        .unwrap();

    assert_eq!(updated.id, Some(1));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(updated.login_name, "ada2");
    assert!(matches!(service.get_by_login_name("ada").await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_create_with_taken_login_name_is_duplication() {
    let service = setup_service();
    let created = service.upsert(ada()).await.unwrap();
    service
        .upsert(created.to_builder().login_name("ada2").build())
        .await
        .unwrap();

    let err = service
        .upsert(User::new("ada2", "b@x.com", "Bea", "M"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Duplication(_)));
    let all = service.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].email_address, "a@x.com");
}

#[tokio::test]
async fn test_update_with_taken_login_name_leaves_storage_unchanged() {
    let service = setup_service();
    service.upsert(ada()).await.unwrap();
    let bob = service.upsert(User::new("bob", "b@x.com", "Bob", "B")).await.unwrap();

    let err = service
        .upsert(bob.to_builder().login_name("ada").first_name("Robert").build())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Duplication(_)));
    assert_eq!(service.get_by_id(2).await.unwrap(), bob);
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found_and_writes_nothing() {
    let service = setup_service();
    let err = service
        .upsert(ada().to_builder().id(42).build())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_lookup_and_repeat_delete_fail() {
    let service = setup_service();
    let created = service.upsert(ada()).await.unwrap();
    let id = created.id.unwrap();

    service.delete(id).await.expect("first delete");
    assert!(matches!(service.get_by_id(id).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(service.delete(id).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let service = setup_service();
    service.upsert(ada()).await.unwrap();
    service.upsert(User::new("bob", "b@x.com", "Bob", "B")).await.unwrap();

    service.clear().await.unwrap();
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_creates_with_same_login_name_admit_one() {
    let service = Arc::new(setup_service());
    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .upsert(User::new("race", format!("r{}@x.com", i), "R", "C"))
                .await
        }));
    }
    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, ServiceError::Duplication(_))),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(service.get_all().await.unwrap().len(), 1);
}
