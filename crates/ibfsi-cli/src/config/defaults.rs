pub struct DefaultsConfig {
    pub end_time: f64,
    pub time_step: f64,
    pub output_interval: usize,
    pub refinement_interval: usize,
    pub global_refinement: u32,
    pub volume_quadrature_points: usize,
    pub face_quadrature_points: usize,
    pub viscosity: f64,
    pub domain_min: [f64; 2],
    pub domain_max: [f64; 2],
    pub subdivisions: [usize; 2],
    pub inflow_boundary_id: u32,
    pub inflow_amplitude: f64,
    pub pulse_center: f64,
    pub pulse_width: f64,
    pub solid_center: [f64; 2],
    pub solid_radius: f64,
    pub solid_sectors: usize,
    pub solid_rings: usize,
    pub motion_frequency: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            end_time: 1.0,
            time_step: 0.01,
            output_interval: 10,
            refinement_interval: 10,
            global_refinement: 0,
            volume_quadrature_points: 2,
            face_quadrature_points: 2,
            viscosity: 1.0,
            domain_min: [0.0, 0.0],
            domain_max: [1.0, 1.0],
            subdivisions: [8, 8],
            inflow_boundary_id: 0,
            inflow_amplitude: 6.0,
            pulse_center: 0.5e-6,
            pulse_width: 0.15e-6,
            solid_center: [0.5, 0.5],
            solid_radius: 0.15,
            solid_sectors: 16,
            solid_rings: 3,
            motion_frequency: 1.0,
        }
    }
}
