use crate::config::build_config;
use crate::error::Result;
use crate::scenario;
use crate::utils::progress::CliProgressHandler;
use ibfsi::engine::progress::ProgressReporter;
use ibfsi::engine::state::StepReport;
use ibfsi::workflows;
use std::path::Path;
use tracing::{info, warn};

/// Loads the parameters, builds both solvers and runs the coupled simulation.
pub fn run(parameters: &Path, set_values: &[String], history: Option<&Path>) -> Result<()> {
    info!("Loading parameters from {:?}", parameters);
    let app = build_config(parameters, set_values)?;

    let fluid = scenario::build_fluid(&app.scenario.fluid, &app.coupling)?;
    let solid = scenario::build_solid(&app.scenario.solid, &app.coupling)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting coupled simulation...");
    info!("Invoking the core coupling workflow...");
    let result = workflows::couple::run(fluid, solid, &app.coupling, &reporter)?;

    println!(
        "Simulation complete: {} steps, t = {:.6e}.",
        result.steps_completed, result.final_time
    );
    let unresolved = result.total_unresolved_points();
    if unresolved > 0 {
        println!("Warning: {unresolved} interface points fell back to zero forcing.");
    }
    info!(
        fx = result.solid.net_force().x,
        fy = result.solid.net_force().y,
        "Final fluid force on the solid."
    );

    if let Some(path) = history {
        write_history(path, &result.history)?;
        println!("Step history written to: {}", path.display());
    } else if result.history.is_empty() {
        warn!("Run finished without completing any step.");
    }
    Ok(())
}

pub fn write_history(path: &Path, history: &[StepReport]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for report in history {
        writer.serialize(report)?;
    }
    writer.flush()?;
    info!(rows = history.len(), "Wrote step history to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SHORT_RUN: &str = r#"
        [time]
        end-time = 0.3
        time-step = 0.1

        [fluid]
        subdivisions = [4, 4]

        [fluid.flow]
        pressure = 1.0

        [solid]
        center = [0.375, 0.375]
        radius = 0.15
        rings = 2
    "#;

    #[test]
    fn run_writes_one_history_row_per_step() {
        let dir = tempdir().unwrap();
        let parameters = dir.path().join("parameters.prm");
        let history = dir.path().join("history.csv");
        fs::write(&parameters, SHORT_RUN).unwrap();

        run(&parameters, &[], Some(&history)).unwrap();

        let content = fs::read_to_string(&history).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("step,time,immersed_elements"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("1,"));
        assert!(rows[2].starts_with("3,"));
    }

    #[test]
    fn run_fails_on_missing_parameter_file() {
        let dir = tempdir().unwrap();
        assert!(run(&dir.path().join("absent.prm"), &[], None).is_err());
    }

    #[test]
    fn run_honours_set_overrides() {
        let dir = tempdir().unwrap();
        let parameters = dir.path().join("parameters.prm");
        let history = dir.path().join("history.csv");
        fs::write(&parameters, SHORT_RUN).unwrap();

        run(
            &parameters,
            &["time.end-time=0.2".to_string()],
            Some(&history),
        )
        .unwrap();
        let rows = fs::read_to_string(&history).unwrap().lines().count();
        assert_eq!(rows, 1 + 2);
    }
}
