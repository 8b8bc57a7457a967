//! Dispatcher loops for the interactive front-ends.
//!
//! Each loop owns its workflow or orchestrator and is the only place their
//! state is mutated. Prompt lines are read only while nothing is in flight,
//! so piped input is processed in order.

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Result;
use clipfetch_core::{
    ChatClient, ChatOrchestrator, ChatSettings, FormatWorkflow, InputError, Launcher,
    RecordingLauncher, Resolver, Session, SystemLauncher, YtDlpResolver, load_default_file_config,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::config_runtime::{self, FormatRunSettings};
use crate::app::input::{self, ChatCommand, FormatCommand, Selection};
use crate::app::terminal::{Presentation, TerminalProbe};
use crate::cli::{Cli, Command};
use crate::view::View;

const BUSY_NOTICE: &str = "Still working on the previous request; try again when it finishes.";
const PERMISSION_HINT: &str = "Restart with --output-dir pointing at a writable folder.";

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let loaded = load_default_file_config()?;
    let file_config = loaded.file_config();

    let presentation = Presentation::for_cli(&cli, TerminalProbe::from_env());
    presentation.init_tracing(config_runtime::resolve_default_log_level(&cli, &file_config));
    debug!(?cli, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "Config file applied");
    }

    match &cli.command {
        Command::Link(args) => {
            run_formats(config_runtime::link_settings(args, &file_config), presentation).await
        }
        Command::Save(args) => {
            run_formats(config_runtime::save_settings(args, &file_config), presentation).await
        }
        Command::Chat => run_chat(config_runtime::chat_settings(&file_config), presentation).await,
    }
}

async fn run_formats(settings: FormatRunSettings, presentation: Presentation) -> Result<()> {
    let launcher: Arc<dyn Launcher> = if settings.open_browser {
        Arc::new(SystemLauncher)
    } else {
        Arc::new(RecordingLauncher::new())
    };
    let filter_name = settings.filter.name();
    let resolver = Arc::new(YtDlpResolver::with_program(settings.ytdlp_program));
    let (completions_tx, mut completions) = mpsc::unbounded_channel();
    let mut workflow = FormatWorkflow::new(
        Session::new(settings.output_dir),
        Arc::clone(&resolver) as Arc<dyn Resolver>,
        settings.filter,
        settings.delivery,
        completions_tx,
    );
    info!(
        filter = filter_name,
        delivery = ?workflow.delivery(),
        ytdlp = %resolver.program().display(),
        "clipfetch starting"
    );
    let mut events = workflow.subscribe();
    let mut view = View::new(presentation).with_launcher(launcher);

    match settings.url {
        Some(url) => {
            workflow.set_url(url);
            start_fetch(&mut workflow, &view);
        }
        None => view.show_notice("Enter a video URL (type `help` for commands)."),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if input_open && !workflow.is_busy() => {
                match line? {
                    Some(line) => {
                        if handle_format_line(&mut workflow, &view, &line).is_break() {
                            break;
                        }
                    }
                    None => input_open = false,
                }
            }
            Some(completion) = completions.recv() => {
                let update = workflow.apply(completion);
                view.drain_events(&mut events);
                view.show_update(&update, workflow.session());
            }
            Ok(event) = events.recv() => view.on_task_event(&event),
        }

        if !input_open && !workflow.is_busy() {
            debug!("Input closed; exiting");
            break;
        }
    }
    Ok(())
}

fn start_fetch(workflow: &mut FormatWorkflow, view: &View) {
    match workflow.fetch_formats() {
        Ok(true) => {}
        Ok(false) => view.show_notice(BUSY_NOTICE),
        Err(err) => view.show_error(err),
    }
}

/// Handles one prompt line.
///
/// A denied destination folder ends the download attempt; the session stays
/// usable for listing and direct links.
fn handle_format_line(
    workflow: &mut FormatWorkflow,
    view: &View,
    line: &str,
) -> ControlFlow<()> {
    let command = match input::parse_format_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return ControlFlow::Continue(()),
        Err(message) => {
            view.show_error(message);
            return ControlFlow::Continue(());
        }
    };

    match command {
        FormatCommand::Fetch(url) => {
            if let Some(url) = url {
                workflow.set_url(url);
            }
            start_fetch(workflow, view);
        }
        FormatCommand::List => view.show_options(workflow.session()),
        FormatCommand::Select(selection) => {
            let result = match selection {
                Selection::Index(index) => workflow.select_index(index),
                Selection::Label(label) => workflow.select(&label),
            };
            match result {
                Ok(()) => {
                    if let Some(option) = workflow.session().selected_option() {
                        view.show_notice(format!("Selected {}", option.display_label()));
                    }
                }
                Err(err) => view.show_error(err),
            }
        }
        FormatCommand::Download => match workflow.download() {
            Ok(true) => {}
            Ok(false) => view.show_notice(BUSY_NOTICE),
            Err(err) if err.is_permission_denied() => {
                view.show_error(err);
                view.show_notice(PERMISSION_HINT);
            }
            Err(err) => view.show_error(err),
        },
        FormatCommand::Status => view.show_status(workflow.status(), workflow.session()),
        FormatCommand::Help => view.show_notice(input::FORMAT_HELP),
        FormatCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

async fn run_chat(settings: ChatSettings, presentation: Presentation) -> Result<()> {
    let client = ChatClient::new(settings)?;
    let settings = client.settings();
    info!(endpoint = %settings.endpoint, model = %settings.model, "clipfetch chat starting");
    if settings.api_key.is_none() {
        warn!(env_var = %settings.api_key_env, "No chat API key found; requests will fail");
    }

    let (completions_tx, mut completions) = mpsc::unbounded_channel();
    let mut chat = ChatOrchestrator::new(Arc::new(client), completions_tx);
    let mut events = chat.subscribe();
    let mut view = View::new(presentation);
    view.show_notice("Type a message (`/help` for commands).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if input_open && !chat.is_busy() => {
                match line? {
                    Some(line) => match input::parse_chat_command(&line) {
                        ChatCommand::Quit => break,
                        ChatCommand::Help => view.show_notice(input::CHAT_HELP),
                        ChatCommand::Send(text) => match chat.send_message(&text) {
                            Ok(true) => {}
                            Ok(false) => view.show_notice(BUSY_NOTICE),
                            Err(InputError::EmptyMessage) => {}
                            Err(err) => view.show_error(err),
                        },
                    },
                    None => input_open = false,
                }
            }
            Some(completion) = completions.recv() => {
                chat.apply(completion);
                view.drain_events(&mut events);
                if let Some(entry) = chat.transcript().last() {
                    view.show_entry(entry);
                }
            }
            Ok(event) = events.recv() => view.on_task_event(&event),
        }

        if !input_open && !chat.is_busy() {
            debug!(turns = chat.transcript().len(), "Input closed; exiting");
            break;
        }
    }
    Ok(())
}
