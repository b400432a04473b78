use super::config::{ConfigError, CouplingConfig};
use super::error::{EngineError, SolverKind};
use super::progress::{Progress, ProgressReporter};
use super::state::StepReport;
use super::tasks::{force_transfer, indicator, traction_transfer};
use super::time::TimeController;
use super::transfer::{immersed_point_order, traction_point_order};
use crate::solvers::{FluidSolver, SolidSolver, SolverError};
use tracing::{debug, info, instrument, trace};

/// The stages of one coupling cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CouplingStage {
    /// Fluid traction on the solid boundary is computed and handed to the solid.
    Traction,
    SolidStep,
    /// The fluid indicator is recomputed against the displaced solid.
    Indicator,
    /// FSI forcing is computed and handed to the fluid.
    Force,
    FluidStep,
    /// `first_step` is cleared and the clock advances.
    Advance,
}

impl CouplingStage {
    pub const CYCLE: [CouplingStage; 6] = [
        CouplingStage::Traction,
        CouplingStage::SolidStep,
        CouplingStage::Indicator,
        CouplingStage::Force,
        CouplingStage::FluidStep,
        CouplingStage::Advance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CouplingStage::Traction => "traction",
            CouplingStage::SolidStep => "solid step",
            CouplingStage::Indicator => "indicator",
            CouplingStage::Force => "force",
            CouplingStage::FluidStep => "fluid step",
            CouplingStage::Advance => "advance",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CouplingStage::Traction => CouplingStage::SolidStep,
            CouplingStage::SolidStep => CouplingStage::Indicator,
            CouplingStage::Indicator => CouplingStage::Force,
            CouplingStage::Force => CouplingStage::FluidStep,
            CouplingStage::FluidStep => CouplingStage::Advance,
            CouplingStage::Advance => CouplingStage::Traction,
        }
    }
}

#[derive(Debug, Default)]
struct StepRecord {
    immersed_elements: usize,
    traction_points: usize,
    unresolved_traction_points: usize,
    force_points: usize,
    unresolved_force_points: usize,
}

/// Advances a fluid and a solid solver in lockstep.
///
/// Every step runs the stages of [`CouplingStage::CYCLE`] in order; a stage
/// starts only after the previous one has completed. Any failure aborts the
/// run: the driver refuses further steps and nothing is rolled back.
pub struct CouplingDriver<'r, F: FluidSolver, S: SolidSolver> {
    fluid: F,
    solid: S,
    config: CouplingConfig,
    time: TimeController,
    stage: CouplingStage,
    first_step: bool,
    initialized: bool,
    aborted: bool,
    record: StepRecord,
    history: Vec<StepReport>,
    reporter: &'r ProgressReporter<'r>,
}

impl<'r, F: FluidSolver, S: SolidSolver> CouplingDriver<'r, F, S> {
    pub fn new(
        fluid: F,
        mut solid: S,
        config: CouplingConfig,
        reporter: &'r ProgressReporter<'r>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let time = TimeController::new(&config.time)?;

        let volume_points = fluid.volume_quadrature().n_points_1d();
        if volume_points != config.discretization.volume_quadrature_points {
            return Err(ConfigError::Invalid {
                parameter: "volume_quadrature_points",
                reason: format!(
                    "fluid solver integrates with {volume_points} points per direction, configuration says {}",
                    config.discretization.volume_quadrature_points
                ),
            }
            .into());
        }
        let face_points = solid.face_quadrature().size();
        if face_points != config.discretization.face_quadrature_points {
            return Err(ConfigError::Invalid {
                parameter: "face_quadrature_points",
                reason: format!(
                    "solid solver integrates faces with {face_points} points, configuration says {}",
                    config.discretization.face_quadrature_points
                ),
            }
            .into());
        }

        solid.set_dirichlet_boundaries(&config.solid_dirichlet_bcs);

        info!(
            fluid_cells = fluid.mesh().n_elements(),
            solid_cells = solid.mesh().n_elements(),
            "Number of active cells."
        );

        Ok(Self {
            fluid,
            solid,
            config,
            time,
            stage: CouplingStage::Traction,
            first_step: true,
            initialized: false,
            aborted: false,
            record: StepRecord::default(),
            history: Vec::new(),
            reporter,
        })
    }

    /// Initializes both solvers. Must run before the first step; [`run`]
    /// calls it if needed.
    ///
    /// [`run`]: Self::run
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        self.fluid
            .initialize()
            .map_err(|source| self.solver_failure(SolverKind::Fluid, "initialize", source))?;
        self.solid
            .initialize()
            .map_err(|source| self.solver_failure(SolverKind::Solid, "initialize", source))?;
        self.initialized = true;
        debug!("Fluid and solid solvers initialized.");
        Ok(())
    }

    /// Runs coupling cycles until the end time is reached.
    #[instrument(skip_all, name = "coupling_driver")]
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.initialize()?;

        let remaining = self.time.total_steps().saturating_sub(self.time.timestep());
        self.reporter.report(Progress::TaskStart {
            total_steps: remaining as u64,
        });
        info!(
            end_time = self.time.end(),
            time_step = self.time.delta_t(),
            "Starting coupled time integration."
        );

        while !self.time.is_finished() {
            self.step()?;
            self.reporter.report(Progress::TaskIncrement);
        }

        self.reporter.report(Progress::TaskFinish);
        info!(
            steps = self.time.timestep(),
            time = self.time.current(),
            "Coupled time integration finished."
        );
        Ok(())
    }

    /// Executes exactly one full coupling cycle.
    pub fn step(&mut self) -> Result<StepReport, EngineError> {
        self.check_ready()?;
        self.record = StepRecord::default();

        for stage in CouplingStage::CYCLE {
            self.stage = stage;
            trace!(stage = stage.name(), "Entering coupling stage.");
            if let Err(error) = self.execute(stage) {
                self.aborted = true;
                return Err(error);
            }
        }
        self.stage = self.stage.next();

        let report = StepReport {
            step: self.time.timestep(),
            time: self.time.current(),
            immersed_elements: self.record.immersed_elements,
            fluid_elements: self.fluid.mesh().n_elements(),
            traction_points: self.record.traction_points,
            unresolved_traction_points: self.record.unresolved_traction_points,
            force_points: self.record.force_points,
            unresolved_force_points: self.record.unresolved_force_points,
        };
        self.reporter.report(Progress::StepCompleted {
            step: report.step,
            time: report.time,
        });
        self.history.push(report.clone());
        Ok(report)
    }

    fn check_ready(&self) -> Result<(), EngineError> {
        let reason = if self.aborted {
            "a previous step failed; the run cannot continue"
        } else if !self.initialized {
            "solvers have not been initialized"
        } else if self.time.is_finished() {
            "the end time has already been reached"
        } else if self.stage != CouplingStage::Traction {
            "a step is already in progress"
        } else {
            return Ok(());
        };
        Err(EngineError::Assertion {
            phase: "driver",
            reason: reason.to_string(),
        })
    }

    fn execute(&mut self, stage: CouplingStage) -> Result<(), EngineError> {
        let strategy = self.config.point_location;
        match stage {
            CouplingStage::Traction => {
                let transfer = traction_transfer::run(
                    &self.fluid,
                    &self.solid,
                    &self.config.solid_dirichlet_bcs,
                    self.config.viscosity,
                    strategy,
                )?;
                let order = traction_point_order(
                    self.solid.mesh(),
                    &self.config.solid_dirichlet_bcs,
                    self.solid.face_quadrature(),
                );
                let traction = transfer.flatten(&order)?;
                self.record.traction_points = traction.len();
                self.record.unresolved_traction_points = transfer.unresolved;
                self.solid.set_fluid_traction(traction);
            }
            CouplingStage::SolidStep => {
                self.solid.step(self.first_step).map_err(|source| {
                    self.solver_failure(SolverKind::Solid, stage.name(), source)
                })?;
            }
            CouplingStage::Indicator => {
                let summary = indicator::update(&mut self.fluid, &mut self.solid, strategy)?;
                self.record.immersed_elements = summary.immersed;
            }
            CouplingStage::Force => {
                let transfer = force_transfer::run(
                    &self.fluid,
                    &mut self.solid,
                    strategy,
                    self.time.delta_t(),
                )?;
                let order = immersed_point_order(
                    self.fluid.mesh(),
                    self.fluid.cell_properties(),
                    self.fluid.volume_quadrature(),
                );
                let (stress, acceleration) = transfer.flatten(&order)?;
                self.record.force_points = stress.len();
                self.record.unresolved_force_points = transfer.unresolved;
                self.fluid.set_fsi_forcing(stress, acceleration);
            }
            CouplingStage::FluidStep => {
                self.fluid.step(self.first_step).map_err(|source| {
                    self.solver_failure(SolverKind::Fluid, stage.name(), source)
                })?;
            }
            CouplingStage::Advance => {
                self.first_step = false;
                self.time.increment();
                self.report_cadence();
            }
        }
        Ok(())
    }

    fn report_cadence(&self) {
        if self.time.time_to_output() {
            info!(
                step = self.time.timestep(),
                time = self.time.current(),
                immersed = self.record.immersed_elements,
                "Output step."
            );
            self.reporter.report(Progress::StatusUpdate {
                text: format!(
                    "t = {:.6e}, {} immersed cells",
                    self.time.current(),
                    self.record.immersed_elements
                ),
            });
        }
        if self.time.time_to_refine() {
            debug!(
                step = self.time.timestep(),
                "Refinement interval reached; meshes are kept as they are."
            );
        }
    }

    /// Interface data a solver rejects is a coupling invariant violation;
    /// anything else the solver reports is treated as divergence.
    fn solver_failure(
        &self,
        solver: SolverKind,
        phase: &'static str,
        source: SolverError,
    ) -> EngineError {
        match source {
            SolverError::Contract(reason) => EngineError::Assertion {
                phase,
                reason: format!("{solver} solver rejected the coupling data: {reason}"),
            },
            source => EngineError::SolverDivergence {
                solver,
                last_completed_time: self.time.current(),
                source,
            },
        }
    }

    pub fn fluid(&self) -> &F {
        &self.fluid
    }

    pub fn solid(&self) -> &S {
        &self.solid
    }

    /// Mutable access for setup between construction and the first step, such
    /// as registering boundary conditions.
    pub fn fluid_mut(&mut self) -> &mut F {
        &mut self.fluid
    }

    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    pub fn time(&self) -> &TimeController {
        &self.time
    }

    pub fn stage(&self) -> CouplingStage {
        self.stage
    }

    pub fn is_first_step(&self) -> bool {
        self.first_step
    }

    pub fn history(&self) -> &[StepReport] {
        &self.history
    }

    pub fn into_parts(self) -> (F, S, Vec<StepReport>) {
        (self.fluid, self.solid, self.history)
    }
}
