mod api;
mod app;
mod catalog;
mod cli;
mod config;
mod input;
mod model;
mod preview;
mod submit;
mod ui;

use anyhow::{Context, Result};
use api::{AccessApi, HttpAccessApi};
use app::{App, AppCommand, BackendEvent};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use submit::Submission;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;
    init_tracing(&settings.log_filter, settings.log_file.as_deref())?;
    match &settings.source {
        Some(source) => info!("loaded config from {source}"),
        None => debug!("no config file found, using flags and defaults"),
    }

    let http = HttpAccessApi::new(&settings.api_base_url)?;
    info!(
        "starting against {} (namespace {})",
        http.base_url(),
        settings.namespace
    );
    let mut app = App::new(
        http.base_url().to_string(),
        &settings.namespace,
        settings.output_dir.clone(),
        settings.workflow,
    );

    run(&mut app, Arc::new(http)).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The terminal is owned by the UI, so logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, api: Arc<dyn AccessApi>) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, api).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    api: Arc<dyn AccessApi>,
) -> Result<()> {
    let (backend_tx, mut backend_rx) = mpsc::unbounded_channel::<BackendEvent>();
    app.set_status("Loading namespaces…");
    spawn_namespace_fetch(Arc::clone(&api), backend_tx.clone());

    let mut reader = EventStream::new();
    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(app, command, &api, &backend_tx);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_backend = backend_rx.recv() => {
                if let Some(event) = maybe_backend {
                    app.apply_backend_event(event);
                }
            }
        }
    }

    Ok(())
}

fn execute_app_command(
    app: &mut App,
    command: AppCommand,
    api: &Arc<dyn AccessApi>,
    backend_tx: &UnboundedSender<BackendEvent>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::Generate { ticket, submission } => {
            spawn_generation(Arc::clone(api), backend_tx.clone(), ticket, submission);
        }
        AppCommand::SaveArtifact { workflow, artifact } => {
            match artifact.save_into(app.output_dir()) {
                Ok(path) => app.set_saved(workflow, path),
                Err(error) => {
                    warn!("saving {} failed: {error:#}", artifact.file_name);
                    app.set_status(compact_error(&error));
                }
            }
        }
    }
}

fn spawn_namespace_fetch(
    api: Arc<dyn AccessApi>,
    backend_tx: UnboundedSender<BackendEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = api.list_namespaces().await;
        if backend_tx.send(BackendEvent::Namespaces(result)).is_err() {
            debug!("namespace result dropped, UI already closed");
        }
    })
}

fn spawn_generation(
    api: Arc<dyn AccessApi>,
    backend_tx: UnboundedSender<BackendEvent>,
    ticket: u64,
    submission: Submission,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = submission.send(api.as_ref()).await;
        let event = BackendEvent::Generated {
            workflow: submission.workflow(),
            ticket,
            account: submission.account().to_string(),
            result,
        };
        if backend_tx.send(event).is_err() {
            debug!("generation result for ticket {ticket} dropped, UI already closed");
        }
    })
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join(": ")
}

#[cfg(test)]
mod tests {
    use super::{execute_app_command, spawn_generation, spawn_namespace_fetch};
    use crate::api::{AccessApi, ApiError};
    use crate::app::{App, AppCommand, BackendEvent};
    use crate::input::Action;
    use crate::model::Workflow;
    use crate::submit::tests::RecordingApi;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn ready_app(output_dir: PathBuf) -> App {
        let mut app = App::new(
            "http://localhost:5005".to_string(),
            "default",
            output_dir,
            Some(Workflow::Kubeconfig),
        );
        app.apply_action(Action::EditName);
        for c in "svc1".chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);
        app.apply_action(Action::SelectAllResources);
        app
    }

    #[tokio::test]
    async fn generation_round_trip_through_channel() {
        let recording = Arc::new(RecordingApi::replying(Ok("kind: Config\n".to_string())));
        let api: Arc<dyn AccessApi> = recording.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = ready_app(PathBuf::from("."));

        let command = app.apply_action(Action::Generate);
        execute_app_command(&mut app, command, &api, &tx);
        let event = rx.recv().await.unwrap();
        app.apply_backend_event(event);

        let generated = app
            .form(Workflow::Kubeconfig)
            .submission()
            .generated()
            .unwrap();
        assert_eq!(generated.content, "kind: Config\n");
        assert_eq!(generated.account, "svc1");
        assert_eq!(recording.kubeconfig_requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn spawned_tasks_report_failures() {
        let api: Arc<dyn AccessApi> = Arc::new(RecordingApi::replying(Err(ApiError::Status {
            status: 500,
            message: "Failed to generate role",
        })));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut app = ready_app(PathBuf::from("."));
        app.apply_action(Action::NextWorkflow);
        app.apply_action(Action::EditName);
        app.apply_action(Action::InputChar('r'));
        app.apply_action(Action::SubmitInput);
        app.apply_action(Action::SelectAllResources);
        let AppCommand::Generate { ticket, submission } = app.apply_action(Action::Generate)
        else {
            panic!("expected a generate command");
        };
        spawn_generation(api.clone(), tx.clone(), ticket, submission)
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            BackendEvent::Generated {
                workflow, result, ..
            } => {
                assert_eq!(workflow, Workflow::Role);
                assert_eq!(result.unwrap_err().to_string(), "Failed to generate role");
            }
            other => panic!("unexpected event {other:?}"),
        }

        spawn_namespace_fetch(api, tx).await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            BackendEvent::Namespaces(Ok(vec!["default".to_string()]))
        );
    }

    #[tokio::test]
    async fn save_command_writes_into_output_dir() {
        let dir = std::env::temp_dir().join(format!("kubeaccess-save-{}", std::process::id()));
        let api: Arc<dyn AccessApi> = Arc::new(RecordingApi::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = ready_app(dir.clone());

        let command = app.apply_action(Action::Generate);
        execute_app_command(&mut app, command, &api, &tx);
        app.apply_backend_event(rx.recv().await.unwrap());

        let command = app.apply_action(Action::Save);
        execute_app_command(&mut app, command, &api, &tx);
        let saved = dir.join("kubeconfig-svc1.yaml");
        assert_eq!(
            app.form(Workflow::Kubeconfig).saved_to(),
            Some(&saved)
        );
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "generated");
        std::fs::remove_dir_all(&dir).ok();
    }
}
