use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pastexam::select::{self, DropdownState, Props, ResultItem, ScrollMetrics, SelectHandle, View};
use pastexam::{course_committer, CourseSearch, CourseSelection, SelectorConfig};
use pastexam_api::{ApiClient, ApiConfig, Course};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about = "Past exams course picker")]
struct Cli {
    /// Backend root, without the /api suffix
    #[arg(long, env = "PASTEXAM_API_URL", default_value = "http://localhost:8000")]
    api_url: String,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive course picker: lines are keystrokes, `:more` scrolls, `:sel N` picks
    Pick {
        /// Restrict the search to one department
        #[arg(long)]
        department: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let api = ApiConfig::from_env().with_url(cli.api_url);
    let client = ApiClient::new(&api).context("build http client")?;
    match cli.cmd {
        Cmd::Pick { department } => {
            let source = match department {
                Some(dept) => CourseSearch::in_department(client, dept),
                None => CourseSearch::new(client),
            };
            run_picker(source, SelectorConfig::from_env(), api.timeout()).await?
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

async fn run_picker(source: CourseSearch, cfg: SelectorConfig, timeout: Duration) -> anyhow::Result<()> {
    let (picked_tx, mut picked_rx) = mpsc::unbounded_channel::<CourseSelection>();
    let committer = course_committer(move |sel| {
        let _ = picked_tx.send(sel);
    });
    // ожидание = дебаунс + сетевой таймаут
    let patience = cfg.debounce() + timeout;
    let mut handle = select::spawn(Arc::new(source), committer, cfg, Props::default());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    loop {
        out.write_all(b"query> ").await?;
        out.flush().await?;
        let Some(line) = lines.next_line().await? else { break };
        let cmd = line.trim_end_matches(['\r', '\n']);

        match cmd {
            ":q" | ":quit" => break,
            ":open" => handle.activate(),
            ":toggle" => handle.toggle(),
            ":close" => handle.outside_click(),
            ":clear" => handle.clear(),
            ":more" => {
                let now = handle.view();
                if !now.can_load_more() {
                    println!("nothing more to load");
                    continue;
                }
                let before = now.cursor;
                handle.scroll(ScrollMetrics::at_bottom());
                settle(&mut handle, patience, |v| v.cursor != before || !v.has_more || v.error).await;
            }
            _ if cmd.starts_with(":sel ") => {
                match cmd[5..].trim().parse::<usize>() {
                    Ok(n) if n >= 1 => {
                        handle.select(n - 1);
                        settle(&mut handle, patience, |v| v.state == DropdownState::Closed).await;
                    }
                    _ => println!("usage: :sel N (1-based)"),
                }
            }
            text => {
                if !handle.view().state.is_open() {
                    handle.activate();
                }
                handle.input(text);
                let want = text.to_string();
                settle(&mut handle, patience, |v| {
                    v.query == want
                        && !matches!(v.state, DropdownState::OpenLoading | DropdownState::OpenLoadingMore)
                })
                .await;
            }
        }

        while let Ok(sel) = picked_rx.try_recv() {
            if sel.is_empty() {
                println!("selection cleared");
                handle.set_props(Props::default());
            } else {
                println!("selected {} {} ({})", sel.course_code, sel.course_name, sel.instructor);
                handle.set_props(Props {
                    value: Some(sel.course_id.clone()),
                    display_label: sel.course_name.clone(),
                    disabled: false,
                });
            }
        }
        render(&handle.view());
    }

    handle.shutdown().await;
    Ok(())
}

async fn settle<F>(handle: &mut SelectHandle<Course>, patience: Duration, pred: F)
where
    F: FnMut(&View<Course>) -> bool,
{
    if tokio::time::timeout(patience, handle.wait_until(pred)).await.is_err() {
        eprintln!("still waiting for the backend…");
    }
}

fn render(v: &View<Course>) {
    match v.state {
        DropdownState::Closed => println!("[{}]", v.label),
        DropdownState::OpenEmpty => println!("type to search courses"),
        DropdownState::OpenLoading => println!("searching…"),
        DropdownState::OpenNoMatches => {
            if v.error {
                println!("no matching courses (search failed)");
            } else {
                println!("no matching courses");
            }
        }
        DropdownState::OpenResults | DropdownState::OpenLoadingMore => {
            for (i, c) in v.items.iter().enumerate() {
                let mark = if v.is_selected(c) { " ✓" } else { "" };
                println!("{:>3}. {}{}\t{}", i + 1, c.title(), mark, c.subtitle().join(" • "));
            }
            if v.state == DropdownState::OpenLoadingMore {
                println!("loading more…");
            } else if !v.has_more {
                println!("all {} results shown", v.items.len());
            } else {
                println!("{} of {}, :more to load", v.cursor, v.total);
            }
        }
    }
}
