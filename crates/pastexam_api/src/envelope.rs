use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Общая обёртка ответа бэкенда: `{ status, data, total?, message, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub data: Option<T>,
    /// Только у списочных эндпоинтов (поиск курсов)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One page of a list endpoint after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            total: None,
            message: None,
            timestamp: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            total: None,
            message: Some(message.into()),
            timestamp: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Success with data, or an error. `status: "error"` is never silently accepted.
    pub fn into_data(self) -> Result<T, ApiError> {
        match self.status {
            Status::Error => Err(ApiError::Rejected(self.message)),
            Status::Success => self.data.ok_or(ApiError::MissingData),
        }
    }

    /// For endpoints whose success carries `data: null` (bookmark add/remove, logout).
    pub fn into_ack(self) -> Result<(), ApiError> {
        match self.status {
            Status::Error => Err(ApiError::Rejected(self.message)),
            Status::Success => Ok(()),
        }
    }
}

impl<T> Envelope<Vec<T>> {
    /// Постраничный список: `total` обязателен, без него страницу не с чем сравнивать.
    /// `data: null` на успехе трактуется как пустая страница.
    pub fn into_page(self) -> Result<Paged<T>, ApiError> {
        match self.status {
            Status::Error => Err(ApiError::Rejected(self.message)),
            Status::Success => {
                let total = self.total.ok_or(ApiError::MissingTotal)?;
                Ok(Paged {
                    items: self.data.unwrap_or_default(),
                    total,
                })
            }
        }
    }

    /// Non-paged list endpoints (files, bookmarks, comments) carry no `total`.
    pub fn into_items(self) -> Result<Vec<T>, ApiError> {
        match self.status {
            Status::Error => Err(ApiError::Rejected(self.message)),
            Status::Success => Ok(self.data.unwrap_or_default()),
        }
    }
}

/// Strict decode of a response body; any shape mismatch is an error.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<Envelope<T>, ApiError> {
    Ok(serde_json::from_slice(body)?)
}
