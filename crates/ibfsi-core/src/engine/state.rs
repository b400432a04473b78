use serde::Serialize;

/// Outcome of one completed coupling cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 1-based index of the completed step.
    pub step: usize,
    /// Time reached at the end of the step.
    pub time: f64,
    pub immersed_elements: usize,
    pub fluid_elements: usize,
    pub traction_points: usize,
    pub unresolved_traction_points: usize,
    pub force_points: usize,
    pub unresolved_force_points: usize,
}

impl StepReport {
    pub fn unresolved_points(&self) -> usize {
        self.unresolved_traction_points + self.unresolved_force_points
    }
}
