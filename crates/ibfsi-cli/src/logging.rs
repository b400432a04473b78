use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::LookupSpan,
};

/// Maps `-v` occurrences and `-q` to the global level filter.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
}

/// Full-format file output. Closing a span logs its busy and idle time, so
/// each instrumented coupling task leaves one timing line per step.
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(console_layer());

    let result = match log_file {
        Some(path) => subscriber.with(file_layer(File::create(path)?)).try_init(),
        None => subscriber.try_init(),
    };
    result.map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install the logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::merge;
    use crate::config::file::FileConfig;
    use crate::scenario::{build_fluid, build_solid};
    use ibfsi::engine::progress::ProgressReporter;
    use ibfsi::workflows::couple;
    use serial_test::serial;

    /// Runs a two-step coupling of the default scenario with a file layer at `level`
    /// and returns what was written.
    fn log_short_run(level: LevelFilter) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coupling.log");
        let app = merge(FileConfig::default(), &["time.end-time=0.02".to_string()]).unwrap();
        let fluid = build_fluid(&app.scenario.fluid, &app.coupling).unwrap();
        let solid = build_solid(&app.scenario.solid, &app.coupling).unwrap();

        let subscriber = tracing_subscriber::registry()
            .with(level)
            .with(file_layer(File::create(&path).unwrap()));
        tracing::subscriber::with_default(subscriber, || {
            couple::run(fluid, solid, &app.coupling, &ProgressReporter::new()).unwrap();
        });
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(9, false), LevelFilter::TRACE);
        assert_eq!(level_filter(2, true), LevelFilter::ERROR);
    }

    #[test]
    fn debug_log_records_task_events_and_span_timings() {
        let content = log_short_run(level_filter(2, false));
        assert!(content.contains("Number of active cells."));
        assert!(content.contains("fluid_cells=64"));
        assert!(content.contains("Updated fluid indicator."));
        assert!(content.contains("indicator_task"));
        assert!(content.contains("traction_transfer_task"));
        assert!(content.contains("time.busy"));
        assert!(content.contains("Workflow complete."));
    }

    #[test]
    fn quiet_log_drops_workflow_progress() {
        let content = log_short_run(level_filter(3, true));
        assert!(!content.contains("Workflow complete."));
        assert!(!content.contains("Updated fluid indicator."));
    }

    #[test]
    #[serial]
    fn logger_can_only_be_installed_once() {
        // Either this or an earlier install wins; the second call must fail.
        let _ = setup_logging(0, true, None);
        assert!(matches!(
            setup_logging(0, true, None),
            Err(CliError::Other(_))
        ));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, true, Some(dir.path()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
