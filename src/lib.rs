//! Clipfetch Core Library
//!
//! This library holds the orchestration core shared by the clipfetch
//! front-ends: a "fetch formats, pick one, download" flow built on an
//! external media-extraction tool, and a chat client that forwards user text
//! to a remote completions API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`format`] - Format option model, display labels, and filter policies
//! - [`resolver`] - External format resolution and download service
//! - [`task`] - Single-flight task controller with observable status
//! - [`session`] - Per-launch session state and destination folder
//! - [`workflow`] - Downloader front-end logic (discover, select, download)
//! - [`chat`] - Chat transcript, completions client, and orchestrator
//! - [`launcher`] - Hand-off of direct links to the platform browser
//! - [`config`] - File configuration for front-end defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chat;
pub mod config;
pub mod format;
pub mod launcher;
pub mod resolver;
pub mod session;
pub mod task;
pub mod workflow;

mod user_agent;

// Re-export commonly used types
pub use chat::{
    ChatBackend, ChatClient, ChatCompletion, ChatError, ChatOrchestrator, ChatSettings, Role,
    Transcript, TranscriptEntry,
};
pub use config::{
    ConfigError, FileConfig, LoadedConfig, VerbositySetting, default_output_dir,
    load_default_file_config,
};
pub use format::{FormatEntry, FormatFilter, FormatOption, LABEL_SEPARATOR, parse_format_id};
pub use launcher::{LaunchError, Launcher, RecordingLauncher, SystemLauncher};
pub use resolver::{
    DownloadTarget, ResolutionError, Resolver, TargetRequest, YtDlpResolver, materialized_path,
};
pub use session::{InputError, Session, StorageError};
pub use task::{TaskController, TaskEvent, TaskPhase, TaskStatus};
pub use workflow::{
    DeliveryMode, FormatCompletion, FormatWorkflow, WorkflowError, WorkflowUpdate,
};
