pub struct DefaultsConfig {
    pub prefactor: f64,
    pub method: String,
    pub replica_cutoff: i64,
    pub periodic: [bool; 3],
    pub rotation: bool,
    pub integrator: String,
    pub compute_pressure: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            prefactor: 1.0,
            method: "all-with-all-no-replica".to_string(),
            replica_cutoff: 0,
            periodic: [true; 3],
            rotation: true,
            integrator: "velocity-verlet".to_string(),
            compute_pressure: true,
        }
    }
}
