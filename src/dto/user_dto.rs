use crate::model::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Wire representation of a user, shared by requests and responses.
///
/// `createdAt`/`updatedAt` are accepted on input but never trusted; the
/// repository sets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 255))]
    pub login_name: String,
    #[validate(email)]
    pub email_address: String,
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255))]
    pub last_name: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            login_name: user.login_name,
            email_address: user.email_address,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User::builder()
            .id(dto.id)
            .created_at(dto.created_at)
            .updated_at(dto.updated_at)
            .login_name(dto.login_name)
            .email_address(dto.email_address)
            .first_name(dto.first_name)
            .last_name(dto.last_name)
            .build()
    }
}

/// Query string of `GET /api/users/filter`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginNameFilter {
    pub login_name: String,
}
