//! CLI entry point.
//!
//! # Responsibility
//! - Load one user's task file, print the agenda and save it back.
//! - Without arguments, print the core version as a linkage probe.

use chrono::Local;
use flowctl_core::{
    default_log_level, init_logging, CodecConfig, FileTaskRepository, StorageConfig, TaskCodec,
    TaskService,
};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [data_dir, username] = args.as_slice() else {
        println!("flowctl_core version={}", flowctl_core::core_version());
        println!("usage: flowctl <data_dir> <username>");
        return ExitCode::SUCCESS;
    };

    match run(data_dir, username) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flowctl: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(data_dir: &str, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::path::absolute(Path::new(data_dir))?;
    let log_dir = data_dir.join("logs");
    init_logging(default_log_level(), &log_dir.to_string_lossy())?;

    let codec = TaskCodec::new(CodecConfig::default())?;
    let repo = FileTaskRepository::for_user(&StorageConfig::new(&data_dir), username, codec)?;
    let today = Local::now().date_naive();
    let (service, existed) = TaskService::load(repo, today)?;

    if !existed {
        println!("created empty task list for {username}");
    }
    for task in service.store().all_tasks() {
        let state = if task.is_complete() {
            "done"
        } else if task.is_overdue(today) {
            "overdue"
        } else {
            "open"
        };
        println!("{}  {:<7}  {}", task.due_date, state, task.title);
    }

    service.save()?;
    Ok(())
}
