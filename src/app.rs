//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler, runs the
//! decision stage on the main thread and the execution stage on a worker thread,
//! and renders everything the protocol reports.

use anyhow::{Context, Result, anyhow};
use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

use junction_move::cli::Args;
use junction_move::output as out;
use junction_move::relocate::{
    Decision, Outcome, RelocateRequest, State, SystemAdvisory, SystemOps, execute, prepare,
};
use junction_move::report::{ChannelReporter, Event, Reporter};
use junction_move::shutdown::{self, InterruptAction};
use junction_move::terminal::TerminalFrontend;
use junction_move::{
    CONFIG_ENV, ConfigSource, RelocateError, create_template_config, default_config_path, fs_ops,
    load_config,
};

use crate::logging::init_tracing;

/// Renders events the moment they are reported (decision stage, main thread).
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: Event) {
        render(&event);
    }
}

fn render(event: &Event) {
    match event {
        Event::State(state) => {
            let label = match state {
                State::ClearingTarget => "Clearing existing target",
                State::Copying => "Copying",
                State::SourceDeleting => "Deleting source",
                State::Linking => "Creating junction",
                _ => return,
            };
            out::print_user(&format!("\n==> {label}"));
        }
        Event::Note(text) => out::print_user(text),
        Event::Status { title, path, info } => {
            out::print_user("");
            out::print_status(&fs_ops::status_block(title, path, info));
        }
        Event::Finished(outcome) => render_outcome(outcome),
    }
}

fn render_outcome(outcome: &Outcome) {
    out::print_user("");
    match outcome {
        Outcome::Done { verified: true } => {
            out::print_success("Relocation complete. The source path now points at the target.")
        }
        Outcome::Done { verified: false } => out::print_warn(
            "Relocation finished, but the link could not be verified. Check the source path manually.",
        ),
        Outcome::Aborted(reason) => out::print_info(&format!("Aborted: {reason}")),
        Outcome::Failed(f) => {
            out::print_error(&format!("{} phase failed: {}", f.phase, f.cause));
            if f.data_only_at_target() {
                out::print_banner(
                    "The source was deleted but the junction was not created. The target holds the only copy of the data",
                );
                out::print_warn("Create the junction by hand (or move the data back) before starting the application.");
            } else if f.source_intact() {
                out::print_info("The source was left intact.");
            } else {
                out::print_warn("The source may be partially deleted; nothing was linked.");
            }
            out::print_info(&f.remediation);
        }
    }
}

/// Structured log + user message for errors raised before execution started.
fn report_precondition(e: &anyhow::Error) {
    if let Some(re) = e.downcast_ref::<RelocateError>() {
        let code = re.code();
        match re {
            RelocateError::NotADirectory(p) => {
                error!(code, kind = "not_a_directory", path = %p.display(), "Cannot start")
            }
            RelocateError::SamePath(p) => {
                error!(code, kind = "same_path", path = %p.display(), "Cannot start")
            }
            RelocateError::NestedPaths { outer, inner } => {
                error!(code, kind = "nested_paths", outer = %outer.display(), inner = %inner.display(), "Cannot start")
            }
            RelocateError::AlreadyLinked(p) => {
                error!(code, kind = "already_linked", path = %p.display(), "Cannot start")
            }
            RelocateError::TargetMissing(p) => {
                error!(code, kind = "target_missing", path = %p.display(), "Cannot start")
            }
            RelocateError::InsufficientSpace {
                required,
                available,
                dest,
            } => {
                error!(code, kind = "insufficient_space", required = *required, available = *available, dest = %dest.display(), "Cannot start")
            }
            _ => error!(code, kind = "precondition", error = %re, "Cannot start"),
        }
        out::print_error(&format!("{e:#}"));
        out::print_info(re.remediation());
    } else {
        error!(error = ?e, "Cannot start");
        out::print_error(&format!("{e:#}"));
    }
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!(
            "Using {CONFIG_ENV} (explicit):\n  {}",
            std::path::Path::new(&p).display()
        ));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file there yet. Run with --init-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path."),
    }
}

fn show_info(source: &std::path::Path, target: &std::path::Path) -> Result<()> {
    let src_abs = fs_ops::absolutize(source)?;
    if fs_ops::is_link(&src_abs) {
        out::print_info(&format!(
            "{} is already a link or junction (relocated earlier?).",
            src_abs.display()
        ));
    }
    for (title, raw) in [("Source", source), ("Target", target)] {
        let path = fs_ops::resolve_path(raw)?;
        let info = fs_ops::inspect(&path);
        out::print_user("");
        out::print_status(&fs_ops::status_block(title, &path, &info));
    }
    Ok(())
}

/// Drop the file-log guard (flushing it) and leave with the interrupt status.
fn flush_and_exit(slot: &Mutex<Option<WorkerGuard>>) -> ! {
    if let Ok(mut g) = slot.lock() {
        let _ = g.take();
    }
    std::process::exit(i32::from(RelocateError::Interrupted.code()));
}

/// Run the CLI application; returns the process exit status.
pub fn run(args: Args) -> Result<i32> {
    if args.print_config {
        print_config_location();
        return Ok(0);
    }
    if args.init_config {
        let path = default_config_path()
            .ok_or_else(|| anyhow!("could not determine a config location"))?;
        create_template_config(&path)?;
        out::print_success(&format!("Template config written to: {}", path.display()));
        out::print_info(&format!(
            "Edit it, then re-run. To use a different location set {CONFIG_ENV}."
        ));
        return Ok(0);
    }

    // Config file first, CLI flags win.
    let (mut cfg, cfg_source) = load_config().inspect_err(|e| {
        out::print_error(&format!("Failed to load config: {e:#}"));
    })?;
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;
    match &cfg_source {
        ConfigSource::File(p) => info!(path = %p.display(), "loaded config"),
        ConfigSource::Defaults => debug!("using built-in defaults"),
    }

    // Guard is dropped on a terminating interrupt to flush logs.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            match shutdown::on_interrupt() {
                InterruptAction::Abort => {
                    out::print_warn("Interrupted; nothing was changed.");
                    flush_and_exit(&guard_slot);
                }
                InterruptAction::Ignore => out::print_warn(
                    "The relocation cannot be cancelled once started. Press Ctrl-C again to force exit (data may be left half-moved).",
                ),
                InterruptAction::ForceExit => {
                    out::print_warn("Forced exit during relocation.");
                    flush_and_exit(&guard_slot);
                }
            }
        })
        .context("install interrupt handler")?;
    }

    debug!(?args, "starting junction_move");

    let code = (|| -> Result<i32> {
        if args.info {
            show_info(&cfg.source_dir, &cfg.target_dir)?;
            return Ok(0);
        }

        out::print_user("Relocate an application data directory and leave a junction behind:");
        out::print_user("  1. copy the source to the target");
        out::print_user("  2. delete the source");
        out::print_user("  3. create a directory junction at the source pointing to the target\n");

        let stdin = io::stdin();
        let mut term = TerminalFrontend::new(stdin.lock(), io::stdout(), args.yes);
        if args.source.is_none() {
            cfg.source_dir = term.prompt_for_path("Source directory", &cfg.source_dir)?;
        }
        if args.target.is_none() {
            cfg.target_dir = term.prompt_for_path("Target directory", &cfg.target_dir)?;
        }

        let request = RelocateRequest {
            source: cfg.source_dir.clone(),
            target: cfg.target_dir.clone(),
            overwrite: args.effective_overwrite(),
            link_only: args.link_only,
        };
        let advisory = SystemAdvisory::new(cfg.process_patterns.clone());
        let ops = SystemOps::new(cfg.copy_options());

        let plan = match prepare(&request, &mut term, &advisory, &ops, &ConsoleReporter) {
            Ok(Decision::Proceed(plan)) => plan,
            Ok(Decision::Abort(_)) => return Ok(0),
            Err(e) => {
                report_precondition(&e);
                return Ok(1);
            }
        };

        shutdown::enter_execution();
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("relocate".into())
            .spawn(move || execute(&plan, &ops, &ChannelReporter::new(tx)))
            .context("start relocation worker")?;
        for event in rx {
            render(&event);
        }
        let outcome = worker
            .join()
            .map_err(|_| anyhow!("relocation worker panicked"))?;
        info!(?outcome, "run finished");
        Ok(outcome.exit_code())
    })();

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    code
}
