use crate::engine::config::CouplingConfig;
use crate::engine::driver::CouplingDriver;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::state::StepReport;
use crate::solvers::{FluidSolver, SolidSolver};
use tracing::{info, instrument, warn};

/// A finished coupled run, handing both solvers back to the caller.
pub struct CouplingResult<F, S> {
    pub steps_completed: usize,
    pub final_time: f64,
    pub history: Vec<StepReport>,
    pub fluid: F,
    pub solid: S,
}

impl<F, S> CouplingResult<F, S> {
    /// Interface points that fell back to zero forcing over the whole run.
    pub fn total_unresolved_points(&self) -> usize {
        self.history.iter().map(StepReport::unresolved_points).sum()
    }
}

#[instrument(skip_all, name = "coupling_workflow")]
pub fn run<F, S>(
    fluid: F,
    solid: S,
    config: &CouplingConfig,
    reporter: &ProgressReporter,
) -> Result<CouplingResult<F, S>, EngineError>
where
    F: FluidSolver,
    S: SolidSolver,
{
    let mut driver = reporter.phase("Preparation", || {
        info!("Starting workflow setup: validating configuration and initializing solvers.");
        let mut driver = CouplingDriver::new(fluid, solid, config.clone(), reporter)?;
        driver.initialize()?;
        Ok::<_, EngineError>(driver)
    })?;

    reporter.phase("Time Integration", || driver.run())?;

    let steps_completed = driver.time().timestep();
    let final_time = driver.time().current();
    let (fluid, solid, history) = driver.into_parts();
    let result = CouplingResult {
        steps_completed,
        final_time,
        history,
        fluid,
        solid,
    };

    let unresolved = result.total_unresolved_points();
    if unresolved > 0 {
        warn!(
            unresolved,
            "Some interface points were outside the other mesh and received zero forcing."
        );
    }
    info!(
        "Workflow complete. {} steps reached t = {:.6e}.",
        result.steps_completed, result.final_time
    );
    Ok(result)
}
