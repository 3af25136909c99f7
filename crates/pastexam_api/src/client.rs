//! HTTP client for the past exams REST API.

use std::collections::BTreeMap;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::comment::{Comment, NewComment};
use crate::config::ApiConfig;
use crate::course::{Course, CourseQuery};
use crate::envelope::{decode, Envelope, Paged};
use crate::error::ApiError;
use crate::file::{BookmarkStatus, FileEntry};
use crate::upload::{avatar_form, AvatarUploaded, UploadRequest};
use crate::user::{LoginRedirect, ProfileUpdate, User};

/// Free-form `/v1/info` payload; not enveloped.
pub type ServiceInfo = BTreeMap<String, serde_json::Value>;

/// Cheap to clone; clones share the connection pool and the session cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        // withCredentials: сессия живёт в cookie, которую ставит бэкенд
        let http = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Body of a 2xx response; anything else becomes [`ApiError::Status`].
    async fn send_raw(&self, req: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Envelope<T>, ApiError> {
        decode(&self.send_raw(req).await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    // --- courses ---

    pub async fn search_courses(&self, query: &CourseQuery) -> Result<Paged<Course>, ApiError> {
        debug!(?query, "course search");
        self.get_with::<Vec<Course>, _>("/v1/course/search", query)
            .await?
            .into_page()
    }

    pub async fn get_course(&self, course_id: &str) -> Result<Course, ApiError> {
        self.get(&format!("/v1/course/{course_id}")).await?.into_data()
    }

    // --- user ---

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.get("/v1/user/profile").await?.into_data()
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let req = self.http.patch(self.url("/v1/user/profile")).json(update);
        self.send::<serde_json::Value>(req).await?.into_ack()
    }

    /// Google OAuth entry point. The caller is expected to send the user to the returned URL.
    pub async fn google_login_url(&self) -> Result<String, ApiError> {
        let body = self.send_raw(self.http.get(self.url("/v1/user/google/login"))).await?;
        let redirect: LoginRedirect = serde_json::from_slice(&body)?;
        Ok(redirect.authorization_url)
    }

    /// Returns the new avatar URL.
    pub async fn upload_avatar(&self, file_name: &str, content: Vec<u8>) -> Result<String, ApiError> {
        let req = self
            .http
            .post(self.url("/v1/user/avatar"))
            .multipart(avatar_form(file_name, content));
        let uploaded: AvatarUploaded = self.send(req).await?.into_data()?;
        Ok(uploaded.avatar_url)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let req = self.http.post(self.url("/v1/user/google/logout"));
        self.send::<serde_json::Value>(req).await?.into_ack()
    }

    // --- bookmarks ---

    pub async fn add_bookmark(&self, file_id: i64) -> Result<(), ApiError> {
        let req = self.http.post(self.url(&format!("/v1/bookmark/{file_id}")));
        self.send::<serde_json::Value>(req).await?.into_ack()
    }

    pub async fn remove_bookmark(&self, file_id: i64) -> Result<(), ApiError> {
        let req = self.http.delete(self.url(&format!("/v1/bookmark/{file_id}")));
        self.send::<serde_json::Value>(req).await?.into_ack()
    }

    pub async fn bookmarks(&self) -> Result<Vec<FileEntry>, ApiError> {
        self.get::<Vec<FileEntry>>("/v1/bookmark").await?.into_items()
    }

    pub async fn is_bookmarked(&self, file_id: i64) -> Result<bool, ApiError> {
        let status: BookmarkStatus = self
            .get(&format!("/v1/bookmark/{file_id}/status"))
            .await?
            .into_data()?;
        Ok(status.is_bookmarked)
    }

    // --- files ---

    pub async fn files(&self) -> Result<Vec<FileEntry>, ApiError> {
        self.get::<Vec<FileEntry>>("/v1/file").await?.into_items()
    }

    pub async fn files_by_course(&self, course_id: &str) -> Result<Vec<FileEntry>, ApiError> {
        self.get::<Vec<FileEntry>>(&format!("/v1/file/course/{course_id}"))
            .await?
            .into_items()
    }

    pub async fn upload_file(&self, upload: &UploadRequest) -> Result<FileEntry, ApiError> {
        debug!(course_id = %upload.course_id, file = %upload.file_name, bytes = upload.content.len(), "uploading exam");
        let req = self.http.post(self.url("/v1/file")).multipart(upload.form());
        self.send(req).await?.into_data()
    }

    pub async fn file(&self, file_id: i64) -> Result<FileEntry, ApiError> {
        self.get(&format!("/v1/file/{file_id}")).await?.into_data()
    }

    pub async fn delete_file(&self, file_id: i64) -> Result<(), ApiError> {
        let req = self.http.delete(self.url(&format!("/v1/file/{file_id}")));
        self.send::<serde_json::Value>(req).await?.into_ack()
    }

    // --- comments ---

    /// The backend answers 404 when there is nothing to list; that is an empty list here.
    pub async fn comments(&self) -> Result<Vec<Comment>, ApiError> {
        empty_on_404(self.get::<Vec<Comment>>("/v1/comment").await)
    }

    pub async fn comments_by(&self, commenter_id: &str) -> Result<Vec<Comment>, ApiError> {
        empty_on_404(self.get::<Vec<Comment>>(&format!("/v1/comment/{commenter_id}")).await)
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let req = self.http.post(self.url("/v1/comment")).json(comment);
        self.send(req).await?.into_data()
    }

    /// Returns the removed comment.
    pub async fn delete_comment(&self, comment_id: i64, current_user: &str) -> Result<Comment, ApiError> {
        let req = self
            .http
            .delete(self.url(&format!("/v1/comment/{comment_id}")))
            .query(&[("current_user", current_user)]);
        self.send(req).await?.into_data()
    }

    // --- service ---

    pub async fn health(&self) -> Result<(), ApiError> {
        self.get::<serde_json::Value>("/v1/health").await?.into_ack()
    }

    pub async fn info(&self) -> Result<ServiceInfo, ApiError> {
        let body = self.send_raw(self.http.get(self.url("/v1/info"))).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn empty_on_404<T>(res: Result<Envelope<Vec<T>>, ApiError>) -> Result<Vec<T>, ApiError> {
    match res {
        Ok(env) => env.into_items(),
        Err(ApiError::Status { status: 404, .. }) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}
