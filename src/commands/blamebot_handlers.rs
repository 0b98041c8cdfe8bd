use serde_json::json;

use crate::commands::{attribute, checkpoint};
use crate::config;
use crate::git::repository::{Repository, find_repository_in_path};
use crate::observability::{self, log_error};
use std::env;

/// Dispatch a `git-blamebot` invocation and return the process exit code.
///
/// Only usage errors and a missing repository fail the process; hooks call
/// `checkpoint` on every edit and must never be blocked by attribution problems.
pub fn handle_blamebot(args: &[String]) -> i32 {
    if args.is_empty() {
        print_help();
        return 0;
    }

    match args[0].as_str() {
        "help" | "--help" | "-h" => {
            print_help();
            0
        }
        "version" | "--version" | "-v" => {
            if cfg!(debug_assertions) {
                println!("{} (debug)", env!("CARGO_PKG_VERSION"));
            } else {
                println!(env!("CARGO_PKG_VERSION"));
            }
            0
        }
        "git-path" => {
            println!("{}", config::Config::get().git_cmd());
            0
        }
        "checkpoint" => with_repository(|repo| handle_checkpoint(repo, &args[1..])),
        "attribute" => with_repository(|repo| handle_attribute(repo, &args[1..])),
        "clear" => with_repository(handle_clear),
        unknown => {
            eprintln!("Unknown git-blamebot command: {}", unknown);
            print_help();
            1
        }
    }
}

fn with_repository<F>(run: F) -> i32
where
    F: FnOnce(&Repository) -> i32,
{
    let current_dir = match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().to_string(),
        Err(e) => {
            eprintln!("Failed to read current directory: {}", e);
            return 1;
        }
    };

    let repo = match find_repository_in_path(&current_dir) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Not inside a git repository: {}", e);
            return 1;
        }
    };

    // Set repo context to flush buffered events
    observability::set_repo_context(&repo);
    run(&repo)
}

fn handle_checkpoint(repo: &Repository, args: &[String]) -> i32 {
    let parsed = match checkpoint::parse_checkpoint_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    match checkpoint::run_checkpoint(repo, &parsed) {
        Ok(result) => println!("{}", checkpoint::describe_result(&result)),
        Err(e) => {
            eprintln!("Checkpoint failed: {}", e);
            log_error(&e, Some(json!({ "operation": "checkpoint", "file": parsed.file })));
        }
    }
    0
}

fn handle_attribute(repo: &Repository, args: &[String]) -> i32 {
    let parsed = match attribute::parse_attribute_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let attributions = match attribute::compute_attributions(repo, &parsed.files) {
        Ok(attributions) => attributions,
        Err(e) => {
            eprintln!("Attribution failed: {}", e);
            log_error(&e, Some(json!({ "operation": "attribute" })));
            return 0;
        }
    };

    if parsed.json {
        match attribute::format_attributions_json(&attributions) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize attribution: {}", e),
        }
    } else {
        print!("{}", attribute::format_attributions_text(&attributions));
    }
    0
}

fn handle_clear(repo: &Repository) -> i32 {
    match repo.storage.clear() {
        Ok(()) => println!("Cleared checkpoint log"),
        Err(e) => {
            eprintln!("Failed to clear checkpoint log: {}", e);
            log_error(&e, Some(json!({ "operation": "clear" })));
        }
    }
    0
}

fn print_help() {
    eprintln!("git-blamebot - attribute working tree lines to automated edits");
    eprintln!();
    eprintln!("Usage: git-blamebot <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  checkpoint pre-edit <file> --tool-use-id <id>");
    eprintln!("                     Snapshot a file before an automated edit");
    eprintln!("  checkpoint post-edit <file> --tool-use-id <id> --edit-id <id>");
    eprintln!("                     Snapshot a file after an automated edit");
    eprintln!("  attribute [<file>...] [--json]");
    eprintln!("                     Show which lines each edit wrote (all edited files by default)");
    eprintln!("  clear              Remove all checkpoints, snapshots and logs");
    eprintln!("  git-path           Print the git binary in use");
    eprintln!("  version, -v, --version");
    eprintln!("                     Print the version number");
    eprintln!("  help, -h, --help   Show this help message");
}
