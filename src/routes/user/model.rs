use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Document, EntityStore, Filter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: String,
}

impl Document for User {
    const COLLECTION: &'static str = "GUser";
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub created: bool,
    pub message: &'static str,
}

impl User {
    fn by_id(user_id: &str) -> Filter {
        Filter::new().eq("userId", user_id)
    }

    /// 登录即注册：找不到用户时新建，返回是否新建
    pub async fn lookup_or_create(store: &impl EntityStore, profile: User) -> ServiceResult<bool> {
        if profile.user_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("userId is required".into()));
        }
        let filter = Self::by_id(&profile.user_id);
        if store.find_one::<User>(&filter).await?.is_some() {
            tracing::debug!("User login: {}", profile.user_id);
            return Ok(false);
        }

        store.insert_one(&profile).await?;
        // 写入后回读确认
        store
            .find_one::<User>(&filter)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", &profile.user_id))?;
        tracing::info!("Created user: {}", profile.user_id);
        Ok(true)
    }

    pub async fn list(store: &impl EntityStore) -> ServiceResult<Vec<User>> {
        Ok(store.find(&Filter::new()).await?)
    }

    pub async fn find_by_ids(
        store: &impl EntityStore,
        user_ids: &[String],
    ) -> ServiceResult<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(store
            .find(&Filter::new().is_in("userId", user_ids.iter().map(String::as_str)))
            .await?)
    }
}

impl From<bool> for LoginResponse {
    fn from(created: bool) -> Self {
        Self {
            created,
            message: if created { "Add New User" } else { "User Login" },
        }
    }
}
