mod cancel;
mod changeset;
mod cli;
mod confirm;
mod constants;
mod error;
mod extract;
mod generate;
mod process;
mod provider;
mod select;
mod ui;
mod vcs;

use crate::cancel::CancelToken;
use crate::changeset::ChangeSet;
use crate::cli::Cli;
use crate::confirm::Outcome;
use crate::constants::MIN_FILES_FOR_SELECTION;
use crate::error::Error;
use crate::ui::{ExternalEditor, LineReader};
use crate::vcs::{Backend, BackendKind, DiffSource, GitRepo, JjWorkspace};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::time::Duration;

fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = run(&cli) {
        report(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cancel = CancelToken::install()?;
    cli.model.ensure_installed()?;

    // one reader for every prompt; auto-confirm never asks anything
    let mut input = if cli.yes {
        None
    } else {
        Some(ui::line_reader(&cancel)?)
    };

    let kind = vcs::detect(&cancel);
    cancel.check()?;
    status!("detected {} repository", kind);

    let backend = match kind {
        BackendKind::Jujutsu => Backend::Jujutsu(open_workspace(&mut input, &cancel)?),
        BackendKind::Git => Backend::Git(
            GitRepo::discover(Path::new(".")).context("not inside a git or jujutsu repository")?,
        ),
    };

    let Some(mut changes) = vcs::gather(&backend, &cancel)? else {
        nothing_to_commit(backend.kind(), "");
        return Ok(());
    };

    if let Backend::Git(repo) = &backend {
        vcs::run_pre_commit(repo, &cancel)?;
        // hooks may have rewritten or unstaged files
        match vcs::gather(&backend, &cancel)? {
            Some(updated) => changes = updated,
            None => {
                nothing_to_commit(backend.kind(), " after pre-commit hooks");
                return Ok(());
            }
        }
    }

    let message = generate(cli, &changes, &cancel)?;

    let commit = |message: &str| backend.commit(message, &cancel);
    let outcome = match input.as_deref_mut() {
        None => confirm::auto(&message, &mut io::stdout(), commit)?,
        Some(input) => {
            let editor = ExternalEditor::from_env();
            confirm::run(message, input, &mut io::stdout(), &editor, commit, &cancel)?
        }
    };

    if outcome == Outcome::Committed {
        status!("commit completed");
    }
    Ok(())
}

/// jujutsu working copy, narrowed to the files the user picks
///
/// selection only happens interactively and with at least two changed files
fn open_workspace(
    input: &mut Option<Box<dyn LineReader>>,
    cancel: &CancelToken,
) -> Result<JjWorkspace> {
    let mut workspace = JjWorkspace::current()?;
    let Some(input) = input.as_mut() else {
        return Ok(workspace);
    };

    let entries = workspace
        .summary(cancel)
        .context("failed to list changed files")?;
    if entries.len() < MIN_FILES_FOR_SELECTION {
        return Ok(workspace);
    }

    let selected = select::select_files(&entries, input.as_mut(), &mut io::stdout(), cancel)?;
    workspace.narrow(selected, entries);
    if let Some(count) = workspace.selected_count() {
        let file_word = if count == 1 { "file" } else { "files" };
        status!("generating commit message for {} selected {}...", count, file_word);
    }
    Ok(workspace)
}

fn nothing_to_commit(kind: BackendKind, suffix: &str) {
    match kind {
        BackendKind::Jujutsu => status!("no changes in the working copy{}, nothing to do", suffix),
        BackendKind::Git => status!("no changes staged for commit{}, nothing to do", suffix),
    }
}

/// generate the commit message with a spinner
fn generate(cli: &Cli, changes: &ChangeSet, cancel: &CancelToken) -> Result<String> {
    let file_count = changes.files.lines().filter(|l| !l.trim().is_empty()).count();
    let file_word = if file_count == 1 { "file" } else { "files" };
    status!(
        "generating commit message with {} from {} {}...",
        cli.model,
        file_count,
        file_word
    );

    // debug output and a spinner don't mix
    let spinner = if cli.debug_prompt || cli.debug_response {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("waiting for {}", cli.model));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    };

    let result = generate::generate(
        &cli.model,
        changes,
        cancel,
        cli.debug_prompt,
        cli.debug_response,
    );

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(result?)
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<Error>() {
        Some(Error::Cancelled) => error!("interrupted"),
        Some(Error::AiResponse(response)) => {
            error!("the AI returned an error response: {}", response);
            info!();
            info!("possible causes:");
            info!("  - the diff might be too large");
            info!("  - the AI command line tool might not be configured properly");
            info!("  - try committing fewer files, or another --model");
        }
        Some(Error::Hook(_)) => {
            error!("{}", e);
            info!("fix the issues and try again");
        }
        _ => error!("{:#}", e),
    }
}
