//! `rollcall import <kind>` — provision a roster into a JSON directory.

use std::path::Path;

use rollcall_core::{
    read_source, Config, Engine, EngineSettings, MissingGroupPolicy, Progress, ProvisionError,
    RunReport, SilentProgress, SourceKind, StdoutProgress,
};
use rollcall_directory::{JsonDirectory, LogNotifier, Notifier, OutboxNotifier};

use crate::{report_error, ImportArgs, MissingGroupArg, OutputFormat};

/// Exit code when the run completed but at least one record failed.
const EXIT_RECORD_FAILURES: i32 = 2;

pub(crate) fn cmd_import(
    kind: SourceKind,
    path: &Path,
    opts: &ImportArgs,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let mut profile = config.profile(kind);
    if let Some(policy) = opts.on_missing_group {
        profile.on_missing_prerequisite = match policy {
            MissingGroupArg::Abort => MissingGroupPolicy::Abort,
            MissingGroupArg::SkipRecord => MissingGroupPolicy::SkipRecord,
        };
    }
    let settings = EngineSettings {
        language: config.language.clone(),
        groups: config.groups.clone(),
        send_notifications: config.send_notifications && !opts.no_emails,
        dry_run: opts.dry_run,
    };
    let engine = Engine::new(profile, settings);

    let mut directory = match JsonDirectory::open(&opts.directory) {
        Ok(d) => d,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            return 1;
        }
    };

    let mut notifier: Box<dyn Notifier> = match &opts.outbox {
        Some(outbox) => Box::new(OutboxNotifier::new(outbox)),
        None => Box::new(LogNotifier),
    };

    // Progress lines would corrupt the JSON report on stdout.
    let mut progress: Box<dyn Progress> = if quiet || output == OutputFormat::Json {
        Box::new(SilentProgress)
    } else {
        Box::new(StdoutProgress)
    };

    let result = read_source(kind, path).and_then(|batch| {
        engine.run(batch, &mut directory, notifier.as_mut(), progress.as_mut())
    });

    match result {
        Ok(report) => {
            print_report(&report, output, quiet);
            if report.failed() > 0 {
                EXIT_RECORD_FAILURES
            } else {
                0
            }
        }
        Err(e) => {
            report_abort(&e, output, quiet);
            1
        }
    }
}

fn print_report(report: &RunReport, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            if quiet {
                return;
            }
            println!("{}", report.summary_line());
            if let Some(line) = report.failure_line() {
                println!("{}", line);
            }
        }
    }
}

fn report_abort(err: &ProvisionError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "error": err.to_string(),
                "diagnostics": err.diagnostics(),
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            for line in err.diagnostics() {
                report_error(&line, output, quiet);
            }
            if matches!(err, ProvisionError::Validation(_)) {
                report_error("Validation failed; no accounts were created", output, quiet);
            }
        }
    }
}
