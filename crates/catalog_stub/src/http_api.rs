use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pastexam_api::{Comment, Course, CourseQuery, Envelope, FileEntry, NewComment, User};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::StubConfig;

type Failure = (StatusCode, Json<Envelope<Value>>);
type Reply<T> = Result<Json<Envelope<T>>, Failure>;

/// Файл вместе с курсом, к которому его загрузили (у демо-файлов курса нет)
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub entry: FileEntry,
    pub course_id: Option<String>,
    pub exam_type: Option<String>,
}

impl From<FileEntry> for StoredFile {
    fn from(entry: FileEntry) -> Self {
        Self {
            entry,
            course_id: None,
            exam_type: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub cfg: StubConfig,
    /// `None` == не залогинен, профиль отдаёт 401
    pub profile: Arc<RwLock<Option<User>>>,
    pub files: Arc<RwLock<Vec<StoredFile>>>,
    pub bookmarks: Arc<Mutex<BTreeSet<i64>>>,
    pub comments: Arc<Mutex<Vec<Comment>>>,
}

impl AppState {
    pub fn new(catalog: Catalog, cfg: StubConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            cfg,
            profile: Arc::new(RwLock::new(None)),
            files: Arc::new(RwLock::new(Vec::new())),
            bookmarks: Arc::new(Mutex::new(BTreeSet::new())),
            comments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_profile(self, user: User) -> Self {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
        self
    }

    pub fn with_files(self, files: Vec<FileEntry>) -> Self {
        *self.files.write().unwrap_or_else(PoisonError::into_inner) =
            files.into_iter().map(StoredFile::from).collect();
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/info", get(service_info))
        .route("/api/v1/course/search", get(search_courses))
        .route("/api/v1/course/:course_id", get(get_course))
        .route("/api/v1/user/profile", get(profile))
        .route("/api/v1/user/avatar", post(upload_avatar))
        .route("/api/v1/user/google/login", get(google_login))
        .route("/api/v1/user/google/logout", post(logout))
        .route("/api/v1/bookmark", get(list_bookmarks))
        .route("/api/v1/bookmark/:file_id", post(add_bookmark).delete(remove_bookmark))
        .route("/api/v1/bookmark/:file_id/status", get(bookmark_status))
        .route("/api/v1/file", get(list_files).post(upload_file))
        .route("/api/v1/file/course/:course_id", get(list_course_files))
        .route("/api/v1/file/:file_id", get(get_file).delete(delete_file))
        .route("/api/v1/comment", get(list_comments).post(create_comment))
        .route("/api/v1/comment/:key", get(comments_by).delete(delete_comment))
        .with_state(state)
}

async fn health() -> Json<Envelope<Value>> {
    Json(Envelope::success(json!({ "status": "healthy" })))
}

/// Not enveloped. Only non-secret facts about the stub.
async fn service_info(State(st): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "catalog-stub",
        "version": env!("CARGO_PKG_VERSION"),
        "courses": st.catalog.len(),
    }))
}

async fn search_courses(
    State(st): State<AppState>,
    Query(q): Query<CourseQuery>,
) -> Reply<Vec<Course>> {
    if q.limit == 0 || q.limit > st.cfg.max_limit {
        return Err(fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("limit must be within 1..={}", st.cfg.max_limit),
        ));
    }
    let offset = usize::try_from(q.offset).map_err(|e| fail(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let limit = usize::try_from(q.limit).map_err(|e| fail(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let (items, total) = st.catalog.search(
        q.search_text.as_deref(),
        q.department_id.as_deref(),
        offset,
        limit,
    );
    debug!(text = ?q.search_text, offset, limit, total, returned = items.len(), "course search");
    Ok(Json(Envelope::success(items).with_total(total as u64)))
}

async fn get_course(State(st): State<AppState>, Path(course_id): Path<String>) -> Reply<Course> {
    st.catalog
        .get(&course_id)
        .cloned()
        .map(|c| Json(Envelope::success(c)))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, format!("course {course_id} not found")))
}

async fn profile(State(st): State<AppState>) -> Reply<User> {
    let current = st.profile.read().unwrap_or_else(PoisonError::into_inner).clone();
    current
        .map(|u| Json(Envelope::success(u)))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "not authenticated"))
}

async fn upload_avatar(State(st): State<AppState>, multipart: Multipart) -> Reply<Value> {
    require_login(&st)?;
    let form = read_form(multipart).await?;
    let file_name = form.require("file_name")?;
    if form.upload_len.is_none() {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "upload_file is required"));
    }
    let avatar_url = format!("http://{}/avatars/{file_name}", st.cfg.addr);
    if let Some(user) = st.profile.write().unwrap_or_else(PoisonError::into_inner).as_mut() {
        user.avatar = Some(avatar_url.clone());
    }
    Ok(Json(Envelope::success(json!({ "avatar_url": avatar_url }))))
}

/// Not enveloped: the frontend reads `authorization_url` directly.
async fn google_login(State(st): State<AppState>) -> Json<Value> {
    Json(json!({
        "authorization_url": format!("https://accounts.google.com/o/oauth2/auth?redirect_uri=http://{}/api/v1/user/google/callback", st.cfg.addr)
    }))
}

async fn logout(State(st): State<AppState>) -> Json<Envelope<Value>> {
    let was = st.profile.write().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(u) = was {
        info!(user = %u.username, "logged out");
    }
    Json(ack("Logged out"))
}

async fn list_bookmarks(State(st): State<AppState>) -> Reply<Vec<FileEntry>> {
    require_login(&st)?;
    let marked = st.bookmarks.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(Json(Envelope::success(files_where(&st, |f| marked.contains(&f.entry.file_id)))))
}

async fn add_bookmark(State(st): State<AppState>, Path(file_id): Path<i64>) -> Reply<Value> {
    require_login(&st)?;
    find_file(&st, file_id)?;
    let fresh = st.bookmarks.lock().unwrap_or_else(PoisonError::into_inner).insert(file_id);
    if !fresh {
        return Err(fail(StatusCode::BAD_REQUEST, "already bookmarked"));
    }
    Ok(Json(ack("Bookmark added")))
}

async fn remove_bookmark(State(st): State<AppState>, Path(file_id): Path<i64>) -> Reply<Value> {
    require_login(&st)?;
    let had = st.bookmarks.lock().unwrap_or_else(PoisonError::into_inner).remove(&file_id);
    if !had {
        return Err(fail(StatusCode::NOT_FOUND, "bookmark not found"));
    }
    Ok(Json(ack("Bookmark removed")))
}

async fn bookmark_status(State(st): State<AppState>, Path(file_id): Path<i64>) -> Reply<Value> {
    require_login(&st)?;
    let is_bookmarked = st.bookmarks.lock().unwrap_or_else(PoisonError::into_inner).contains(&file_id);
    Ok(Json(Envelope::success(json!({ "is_bookmarked": is_bookmarked }))))
}

async fn list_files(State(st): State<AppState>) -> Reply<Vec<FileEntry>> {
    Ok(Json(Envelope::success(files_where(&st, |_| true))))
}

async fn list_course_files(State(st): State<AppState>, Path(course_id): Path<String>) -> Reply<Vec<FileEntry>> {
    let items = files_where(&st, |f| f.course_id.as_deref() == Some(course_id.as_str()));
    Ok(Json(Envelope::success(items)))
}

async fn upload_file(State(st): State<AppState>, multipart: Multipart) -> Reply<FileEntry> {
    let uploader = require_login(&st)?;
    let form = read_form(multipart).await?;
    for field in ["year", "course_name", "course_code", "instructor", "anonymous"] {
        form.require(field)?;
    }
    let course_id = form.require("course_id")?;
    let exam_type = form.require("exam_type")?;
    let file_name = form.require("file_name")?;
    let Some(bytes) = form.upload_len else {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "upload_file is required"));
    };

    let mut files = st.files.write().unwrap_or_else(PoisonError::into_inner);
    let file_id = files.iter().map(|f| f.entry.file_id).max().unwrap_or(0) + 1;
    let entry = FileEntry {
        file_id,
        filename: file_name.to_string(),
        file_location: format!("uploads/{course_id}/{file_id}-{file_name}"),
        uploader_id: uploader
            .user_id
            .as_deref()
            .and_then(|id| id.parse().ok())
            .unwrap_or(0),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    };
    files.push(StoredFile {
        entry: entry.clone(),
        course_id: Some(course_id.to_string()),
        exam_type: Some(exam_type.to_string()),
    });
    info!(file_id, course_id, bytes, "exam uploaded");
    Ok(Json(Envelope::success(entry)))
}

async fn get_file(State(st): State<AppState>, Path(file_id): Path<i64>) -> Reply<FileEntry> {
    find_file(&st, file_id).map(|f| Json(Envelope::success(f)))
}

async fn delete_file(State(st): State<AppState>, Path(file_id): Path<i64>) -> Reply<Value> {
    require_login(&st)?;
    let mut files = st.files.write().unwrap_or_else(PoisonError::into_inner);
    let before = files.len();
    files.retain(|f| f.entry.file_id != file_id);
    if files.len() == before {
        return Err(fail(StatusCode::NOT_FOUND, format!("file {file_id} not found")));
    }
    st.bookmarks.lock().unwrap_or_else(PoisonError::into_inner).remove(&file_id);
    Ok(Json(ack("File deleted")))
}

async fn list_comments(State(st): State<AppState>) -> Reply<Vec<Comment>> {
    let all = st.comments.lock().unwrap_or_else(PoisonError::into_inner).clone();
    if all.is_empty() {
        return Err(fail(StatusCode::NOT_FOUND, "No comments found"));
    }
    Ok(Json(Envelope::success(all)))
}

async fn create_comment(
    State(st): State<AppState>,
    Json(new): Json<NewComment>,
) -> Result<(StatusCode, Json<Envelope<Comment>>), Failure> {
    if new.content.trim().is_empty() {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "content is empty"));
    }
    let mut comments = st.comments.lock().unwrap_or_else(PoisonError::into_inner);
    let comment = Comment {
        comment_id: comments.iter().map(|c| c.comment_id).max().unwrap_or(0) + 1,
        commenter_id: new.commenter_id,
        content: new.content,
        comment_time: chrono::Utc::now().to_rfc3339(),
    };
    comments.push(comment.clone());
    Ok((StatusCode::CREATED, Json(Envelope::success(comment))))
}

/// Newest first.
async fn comments_by(State(st): State<AppState>, Path(commenter_id): Path<String>) -> Reply<Vec<Comment>> {
    let mut mine: Vec<Comment> = st
        .comments
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|c| c.commenter_id == commenter_id)
        .cloned()
        .collect();
    if mine.is_empty() {
        return Err(fail(StatusCode::NOT_FOUND, format!("No comments of {commenter_id} found")));
    }
    mine.reverse();
    Ok(Json(Envelope::success(mine)))
}

async fn delete_comment(State(st): State<AppState>, Path(comment_id): Path<i64>) -> Reply<Comment> {
    let mut comments = st.comments.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(pos) = comments.iter().position(|c| c.comment_id == comment_id) else {
        return Err(fail(StatusCode::NOT_FOUND, format!("comment {comment_id} not found")));
    };
    Ok(Json(Envelope::success(comments.remove(pos))))
}

/// Text fields of a multipart body plus the size of `upload_file`.
struct UploadForm {
    text: HashMap<String, String>,
    upload_len: Option<usize>,
}

impl UploadForm {
    fn require(&self, name: &str) -> Result<&str, Failure> {
        self.text
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, format!("{name} is required")))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, Failure> {
    let mut form = UploadForm {
        text: HashMap::new(),
        upload_len: None,
    };
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "upload_file" {
            form.upload_len = Some(field.bytes().await.map_err(bad_form)?.len());
        } else {
            form.text.insert(name, field.text().await.map_err(bad_form)?);
        }
    }
    Ok(form)
}

fn files_where(st: &AppState, keep: impl Fn(&StoredFile) -> bool) -> Vec<FileEntry> {
    st.files
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|f| keep(f))
        .map(|f| f.entry.clone())
        .collect()
}

fn find_file(st: &AppState, file_id: i64) -> Result<FileEntry, Failure> {
    st.files
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|f| f.entry.file_id == file_id)
        .map(|f| f.entry.clone())
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, format!("file {file_id} not found")))
}

fn require_login(st: &AppState) -> Result<User, Failure> {
    st.profile
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "not authenticated"))
}

fn ack(message: &str) -> Envelope<Value> {
    Envelope {
        message: Some(message.to_string()),
        ..Envelope::success(Value::Null)
    }
}

fn bad_form<E: ToString>(e: E) -> Failure {
    fail(StatusCode::BAD_REQUEST, e.to_string())
}

fn fail(status: StatusCode, message: impl Into<String>) -> Failure {
    (status, Json(Envelope::error(message)))
}
