/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Task timer, board and backlog commands against the Task Service
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use taskdeck_adapter::{
    EntityId, MonthlyReportQuery, NewTaskRequest, Priority, ProjectId, TaskService,
    TaskdeckClient,
};
use taskdeck_tracker::{
    BoardSession, MoveRequest, Notice, Notifier, Stage, TimerSession, TrackerConfig,
    format_elapsed, format_seconds,
};

/// How often `watch` re-reads the task list
const WATCH_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "taskdeck", version, about = "Task timer and forward-only board for the Task Service")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Project to work in, overrides `project_id` from the config file
    #[arg(long = "project", value_name = "ID")]
    project: Option<EntityId>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List your active tasks and the running timer
    Active,
    /// Start working on a task
    Start { task_id: EntityId },
    /// Stop the running task
    Stop { task_id: EntityId },
    /// Hand a task over for review
    Review { task_id: EntityId },
    /// Follow the running timer until interrupted
    Watch,
    /// Time worked today
    Hours,
    /// Show the four board columns
    Board,
    /// Move a card to another column
    Move {
        task_id: EntityId,
        #[arg(long, value_name = "STAGE")]
        to: Stage,
        /// Position in the destination column, defaults to the end
        #[arg(long)]
        index: Option<usize>,
    },
    /// List the project backlog
    Backlog,
    /// Create a backlog task
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long = "type", default_value = "task")]
        kind: String,
        #[arg(long, value_name = "USER_ID")]
        assignee: Option<EntityId>,
    },
    /// Move backlog tasks onto the board
    Sprint {
        #[arg(required = true)]
        task_ids: Vec<EntityId>,
    },
    /// Your task counters per status
    Dashboard,
    /// Monthly per-employee report
    Report {
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
        #[arg(long = "user", value_name = "USER_ID")]
        user_id: Option<EntityId>,
        /// Only show rows for this employee name
        #[arg(long)]
        employee: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = TrackerConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(base_url = %config.api.base_url, "configuration loaded");

    let client = build_client(&config)?;
    let (notifier, notices) = Notifier::channel();
    let printer = tokio::spawn(print_notices(notices));

    let result = run(args.command, args.project, &config, client, notifier).await;

    // All notifier clones are gone once `run` returns, which ends the printer.
    if let Err(err) = printer.await {
        warn!(error = %err, "notice printer failed");
    }
    result
}

async fn run(
    command: Command,
    project: Option<ProjectId>,
    config: &TrackerConfig,
    client: TaskdeckClient,
    notifier: Notifier,
) -> Result<()> {
    let service: Arc<dyn TaskService> = Arc::new(client.clone());
    let timer_session = |project_id: ProjectId| {
        TimerSession::new(
            service.clone(),
            project_id,
            config.auth.user_id.clone(),
            config.session_settings(),
            notifier.clone(),
        )
    };

    match command {
        Command::Active => {
            let session = timer_session(config.project(project)?);
            session.refresh_tasks().await.context("fetch active tasks")?;
            print_active(&session);
        }
        Command::Start { task_id } => {
            let session = timer_session(config.project(project)?);
            session.refresh_tasks().await.context("fetch active tasks")?;
            session.start(&task_id).await.context("start task")?;
            print_active(&session);
            session.shutdown();
        }
        Command::Stop { task_id } => {
            let session = timer_session(config.project(project)?);
            session.refresh_tasks().await.context("fetch active tasks")?;
            session.stop(&task_id).await.context("stop task")?;
            print_hours(&session).await;
            session.shutdown();
        }
        Command::Review { task_id } => {
            let session = timer_session(config.project(project)?);
            session.send_to_review(&task_id).await.context("send task to review")?;
            println!("Task {task_id} sent to review");
            session.shutdown();
        }
        Command::Watch => {
            let session = timer_session(config.project(project)?);
            let shutdown = session.shutdown_token();
            setup_signal_handlers(shutdown.clone());
            watch(&session, shutdown).await?;
        }
        Command::Hours => {
            let session = timer_session(config.project(project)?);
            session.refresh_tasks().await.context("fetch active tasks")?;
            print_hours(&session).await;
            session.shutdown();
        }
        Command::Board => {
            let mut board = BoardSession::new(service.clone(), config.project(project)?, notifier.clone());
            board.load().await.context("load board")?;
            print_board(&board);
        }
        Command::Move { task_id, to, index } => {
            let mut board = BoardSession::new(service.clone(), config.project(project)?, notifier.clone());
            board.load().await.context("load board")?;
            let from = board
                .board()
                .stage_of(&task_id)
                .with_context(|| format!("task {task_id} is not on the board"))?;
            board
                .move_card(MoveRequest {
                    task_id,
                    from,
                    to,
                    to_index: index.unwrap_or(usize::MAX),
                })
                .await
                .context("move card")?;
            print_board(&board);
        }
        Command::Backlog => {
            let project_id = config.project(project)?;
            let tasks = client.backlog(&project_id).await.context("fetch backlog")?;
            if tasks.is_empty() {
                println!("Backlog is empty");
            }
            for task in tasks {
                println!("{:>8}  {:<6}  {}", task.id, task.priority, task.title);
            }
        }
        Command::Create {
            title,
            description,
            priority,
            kind,
            assignee,
        } => {
            anyhow::ensure!(!title.trim().is_empty(), "title is required");
            let request = NewTaskRequest {
                description,
                priority,
                kind,
                assignee_id: assignee,
                ..NewTaskRequest::backlog(title, Some(config.project(project)?))
            };
            client.create_task(&request).await.context("create task")?;
            println!("Created \"{}\" in the backlog", request.title);
        }
        Command::Sprint { task_ids } => {
            client.start_sprint(&task_ids).await.context("start sprint")?;
            println!("Sprint started with {} task(s)", task_ids.len());
        }
        Command::Dashboard => {
            let project_id = config.project(project)?;
            let counts = client
                .user_task_counts(&project_id)
                .await
                .context("fetch task counters")?
                .counts;
            println!("todo         {}", counts.todo);
            println!("in-progress  {}", counts.in_progress);
            println!("review       {}", counts.review);
            println!("done         {}", counts.done);
        }
        Command::Report {
            from,
            to,
            user_id,
            employee,
        } => {
            let query = MonthlyReportQuery {
                from,
                to,
                user_id,
                project_id: project.or_else(|| config.project_id.clone()),
            };
            let report = client.monthly_report(&query).await.context("fetch monthly report")?;
            let rows = match &employee {
                Some(name) => report.for_employee(name),
                None => report.employees.iter().collect(),
            };
            for row in rows {
                println!(
                    "{:<24} {:>5} tasks {:>8.1} h",
                    row.employee, row.total_tasks, row.hours_worked
                );
            }
            let summary = report.summary;
            println!(
                "todo {} | in-progress {} | review {} | done {}",
                summary.todo, summary.in_progress, summary.review, summary.done
            );
        }
    }

    Ok(())
}

/// Print the running timer once per change until shutdown
async fn watch(session: &TimerSession, shutdown: CancellationToken) -> Result<()> {
    session.refresh_tasks().await.context("fetch active tasks")?;
    if let Err(err) = session.refresh_hours().await {
        warn!(error = %err, "today's hours unavailable");
    }

    let mut timer = session.subscribe();
    let mut refresh = tokio::time::interval(WATCH_REFRESH_INTERVAL);
    refresh.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = timer.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = timer.borrow_and_update().clone();
                match &state.active {
                    Some(task_id) => println!(
                        "{task_id}  {}  today {}",
                        format_seconds(state.elapsed_seconds),
                        format_seconds(session.today_total())
                    ),
                    None => println!(
                        "no running task, last {}  today {}",
                        format_seconds(state.elapsed_seconds),
                        format_seconds(session.today_total())
                    ),
                }
            }
            _ = refresh.tick() => {
                if let Err(err) = session.refresh_tasks().await {
                    debug!(error = %err, "periodic task refresh failed");
                }
            }
        }
    }

    info!("watch stopped");
    session.shutdown();
    Ok(())
}

fn print_active(session: &TimerSession) {
    let timer = session.timer_state();
    let tasks = session.tasks();
    if tasks.is_empty() {
        println!("No active tasks");
    }
    for task in tasks {
        let (marker, elapsed) = if timer.is_active(&task.id) {
            ("*", format_seconds(timer.elapsed_seconds))
        } else {
            (" ", format_elapsed(task.accumulated_seconds))
        };
        println!(
            "{marker} {:>8}  {:<11}  {elapsed}  {}",
            task.id, task.status, task.title
        );
    }
}

async fn print_hours(session: &TimerSession) {
    match session.refresh_hours().await {
        Ok(_) => println!("Worked today: {}", format_seconds(session.today_total())),
        Err(err) => warn!(error = %err, "today's hours unavailable"),
    }
}

fn print_board(board: &BoardSession) {
    for stage in Stage::ALL {
        let cards = board.board().column(stage);
        println!("{stage} ({})", cards.len());
        for card in cards {
            println!("  {:>8}  {:<6}  {}", card.id, card.priority, card.title);
        }
    }
}

async fn print_notices(mut notices: UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        eprintln!("[{}] {}", notice.level, notice.message);
    }
}

fn build_client(config: &TrackerConfig) -> Result<TaskdeckClient> {
    let client =
        TaskdeckClient::with_config_and_base_url(config.client_config(), &config.api.base_url)
            .context("create task service client")?;
    match config.resolve_token() {
        Some(token) => client.set_token(token, config.auth.user_id.clone()),
        None => warn!(
            token_env = %config.auth.token_env,
            "no bearer token configured, requests will not be sent"
        ),
    }
    Ok(client)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
