use serde::{Deserialize, Serialize};

/// Профиль текущего пользователя. Бэкенд отдаёт snake_case, старые клиенты camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(alias = "userName")]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default, alias = "isProfileCompleted")]
    pub is_profile_completed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginRedirect {
    pub authorization_url: String,
}
