// path: crates/catalog_stub/src/main.rs
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use catalog_stub::catalog::Catalog;
use catalog_stub::config::StubConfig;
use catalog_stub::http_api::{router, AppState};
use pastexam_api::{FileEntry, User};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = StubConfig::from_env();
    let catalog = match cfg.catalog_path.as_deref() {
        Some(path) => Catalog::load_jsonl(path)?,
        None => Catalog::demo(),
    };
    tracing::info!(courses = catalog.len(), "catalog loaded");

    let state = AppState::new(catalog, cfg.clone())
        .with_profile(demo_user())
        .with_files(demo_files());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.addr)
        .await
        .with_context(|| format!("bind {}", cfg.addr))?;
    tracing::info!(address = %cfg.addr, "catalog stub listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn demo_user() -> User {
    User {
        user_id: Some("1".into()),
        username: "demo".into(),
        email: "demo@example.edu".into(),
        avatar: None,
        department: Some("CSIE".into()),
        is_profile_completed: true,
    }
}

fn demo_files() -> Vec<FileEntry> {
    (1..=3)
        .map(|i| FileEntry {
            file_id: i,
            filename: format!("midterm-{i}.pdf"),
            file_location: format!("uploads/midterm-{i}.pdf"),
            uploader_id: 1,
            timestamp: None,
        })
        .collect()
}
