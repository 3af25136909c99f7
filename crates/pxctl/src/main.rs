// Файл: crates/pxctl/src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pastexam::CourseSelection;
use pastexam_api::{ApiClient, ApiConfig, CourseQuery, FileEntry, LoadOutcome, NewComment, Session};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about = "Past exams control: courses, session, bookmarks, files")]
struct Cli {
    /// Backend root, without the /api suffix
    #[arg(long, env = "PASTEXAM_API_URL", default_value = "http://localhost:8000")]
    api_url: String,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Один запрос к поиску курсов
    Search {
        q: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        semester: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Курс по id
    Course { course_id: String },
    /// Текущий пользователь или ссылка на вход
    Whoami,
    /// Закладки текущего пользователя
    Bookmarks,
    Bookmark {
        #[command(subcommand)]
        op: BookmarkOp,
    },
    /// Загруженные файлы, все или одного курса
    Files {
        #[arg(long)]
        course: Option<String>,
    },
    /// Загрузить экзамен к курсу
    Upload {
        #[arg(long)]
        course: String,
        #[arg(long)]
        year: String,
        /// midterm, final, quiz, other
        #[arg(long, default_value = "midterm")]
        exam_type: String,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, default_value_t = false)]
        anonymous: bool,
        file: PathBuf,
    },
    /// Новая аватарка
    Avatar { file: PathBuf },
    /// Комментарии, все или одного автора
    Comments {
        #[arg(long)]
        by: Option<String>,
    },
    Comment {
        #[command(subcommand)]
        op: CommentOp,
    },
    Health,
    /// Сводка окружения сервера
    Info,
}

#[derive(Subcommand)]
enum CommentOp {
    Add {
        #[arg(long)]
        author: String,
        text: String,
    },
    Delete {
        comment_id: i64,
        #[arg(long)]
        author: String,
    },
}

#[derive(Subcommand)]
enum BookmarkOp {
    Add { file_id: i64 },
    Remove { file_id: i64 },
    Status { file_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let client = ApiClient::new(&ApiConfig::from_env().with_url(cli.api_url)).context("build http client")?;

    match cli.cmd {
        Cmd::Search {
            q,
            department,
            semester,
            instructor,
            offset,
            limit,
        } => {
            let mut query = CourseQuery::text(q).page(offset, limit);
            query.department_id = department;
            query.semester = semester;
            query.instructors = instructor;
            let page = client.search_courses(&query).await?;
            for c in &page.items {
                println!("{}\t{}\t{}\t{}", c.course_id, c.code(), c.course_name, c.instructors);
            }
            eprintln!("shown={} total={}", page.items.len(), page.total);
        }
        Cmd::Course { course_id } => {
            let c = client.get_course(&course_id).await?;
            println!("{}", serde_pretty(&c)?);
        }
        Cmd::Whoami => match Session::new(client).load().await? {
            LoadOutcome::Ready(user) => {
                println!("{} <{}>", user.username, user.email);
                if !user.is_profile_completed {
                    eprintln!("profile is incomplete");
                }
            }
            LoadOutcome::LoginRequired { authorization_url } => {
                println!("not logged in; open {authorization_url}");
            }
        },
        Cmd::Bookmarks => print_files(&client.bookmarks().await?),
        Cmd::Bookmark { op } => match op {
            BookmarkOp::Add { file_id } => {
                client.add_bookmark(file_id).await?;
                println!("bookmarked {file_id}");
            }
            BookmarkOp::Remove { file_id } => {
                client.remove_bookmark(file_id).await?;
                println!("removed bookmark {file_id}");
            }
            BookmarkOp::Status { file_id } => {
                println!("{}", client.is_bookmarked(file_id).await?);
            }
        },
        Cmd::Files { course } => {
            let files = match course {
                Some(id) => client.files_by_course(&id).await?,
                None => client.files().await?,
            };
            print_files(&files);
        }
        Cmd::Upload {
            course,
            year,
            exam_type,
            scope,
            anonymous,
            file,
        } => {
            let picked = CourseSelection::from(&client.get_course(&course).await?);
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let mut upload = picked.upload_request(year, exam_type, file_name(&file)?, content)?;
            upload.exam_scope = scope;
            upload.anonymous = anonymous;
            let stored = client.upload_file(&upload).await?;
            println!("uploaded {} as file {}", stored.filename, stored.file_id);
        }
        Cmd::Avatar { file } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            println!("{}", client.upload_avatar(&file_name(&file)?, content).await?);
        }
        Cmd::Comments { by } => {
            let comments = match by {
                Some(who) => client.comments_by(&who).await?,
                None => client.comments().await?,
            };
            for c in comments {
                println!("{}\t{}\t{}\t{}", c.comment_id, c.commenter_id, c.comment_time, c.content);
            }
        }
        Cmd::Comment { op } => match op {
            CommentOp::Add { author, text } => {
                let c = client.create_comment(&NewComment::new(author, text)).await?;
                println!("comment {}", c.comment_id);
            }
            CommentOp::Delete { comment_id, author } => {
                client.delete_comment(comment_id, &author).await?;
                println!("deleted comment {comment_id}");
            }
        },
        Cmd::Health => {
            client.health().await?;
            println!("ok");
        }
        Cmd::Info => {
            for (k, v) in client.info().await? {
                println!("{k}\t{v}");
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_files(files: &[FileEntry]) {
    for f in files {
        println!("{}\t{}\t{}", f.file_id, f.filename, f.timestamp.as_deref().unwrap_or("-"));
    }
}

fn file_name(path: &std::path::Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no file name", path.display()))
}

fn serde_pretty<T: serde::Serialize>(v: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(v)?)
}
