use crate::error::ConfigurationError;
use crate::grid::{Grid, DEFAULT_DX, DEFAULT_NX, DEFAULT_NY};
use crate::parameters::{PhysicalParameters, PotentialCoefficients};
use crate::simulation::{BucklingFieldSimulator, PerturbationSettings};
use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            nx: DEFAULT_NX,
            ny: DEFAULT_NY,
            dx: DEFAULT_DX,
        }
    }
}

impl GridConfig {
    fn to_grid(&self) -> Grid {
        Grid {
            nx: self.nx,
            ny: self.ny,
            dx: self.dx,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>, // Optional: drawn from OS entropy if not provided
    #[serde(default = "default_amplitude")]
    pub initial_amplitude: f64,
    #[serde(default = "default_amplitude")]
    pub proposal_amplitude: f64,
    #[serde(default = "default_report_every")]
    pub report_every: usize,
}

fn default_steps() -> usize {
    100
}

fn default_amplitude() -> f64 {
    0.01
}

fn default_report_every() -> usize {
    10
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            steps: default_steps(),
            seed: None,
            initial_amplitude: default_amplitude(),
            proposal_amplitude: default_amplitude(),
            report_every: default_report_every(),
        }
    }
}

impl SimulationConfig {
    pub fn perturbation(&self) -> PerturbationSettings {
        PerturbationSettings {
            initial_amplitude: self.initial_amplitude,
            proposal_amplitude: self.proposal_amplitude,
        }
    }
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_deflection_size")]
    pub deflection_size: (u32, u32),
    #[serde(default = "default_energy_size")]
    pub energy_size: (u32, u32),
    #[serde(default = "default_contour_levels")]
    pub contour_levels: usize,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_deflection_size() -> (u32, u32) {
    (1200, 500)
}

fn default_energy_size() -> (u32, u32) {
    (800, 400)
}

fn default_contour_levels() -> usize {
    8
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        VisualizationConfig {
            output_dir: default_output_dir(),
            deflection_size: default_deflection_size(),
            energy_size: default_energy_size(),
            contour_levels: default_contour_levels(),
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        for (name, (w, h)) in [
            ("deflection_size", self.deflection_size),
            ("energy_size", self.energy_size),
        ] {
            if w == 0 || h == 0 {
                return Err(anyhow!(
                    "Image dimensions must be positive ({}: width={}, height={})",
                    name,
                    w,
                    h
                ));
            }
        }
        if self.output_dir.trim().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        Ok(())
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub plate: PhysicalParameters,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub potential: PotentialCoefficients,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Constants of the fingerprint-buckling experiment on the default grid.
    pub fn paper_defaults() -> Self {
        Config {
            plate: PhysicalParameters::fingerprint(),
            grid: GridConfig::default(),
            potential: PotentialCoefficients::default(),
            simulation: SimulationConfig::default(),
            visualization: VisualizationConfig::default(),
        }
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;
        config.visualization.validate()?;

        Ok(config)
    }

    /// Validate all physical and numerical parameters
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.plate.validate()?;
        self.grid.to_grid().validate()?;
        self.potential.validate()?;
        self.simulation.perturbation().validate()
    }

    pub fn grid(&self) -> Grid {
        self.grid.to_grid()
    }

    /// Build a simulator carrying this configuration's parameters.
    pub fn build_simulator(&self) -> Result<BucklingFieldSimulator, ConfigurationError> {
        let simulator = BucklingFieldSimulator::new(self.plate, self.grid(), self.potential)?
            .with_perturbation(self.simulation.perturbation())?
            .with_report_every(self.simulation.report_every);
        Ok(simulator)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!("=== Buckling Configuration ===");
        info!(
            "Grid: {}x{} (dx={}, {} x {})",
            self.grid.nx,
            self.grid.ny,
            self.grid.dx,
            self.grid().width(),
            self.grid().height()
        );
        info!(
            "Plate: D={:e}, E={:e}, h={:e}, Rx={}, Ry={}",
            self.plate.flexural_modulus,
            self.plate.youngs_modulus,
            self.plate.thickness,
            self.plate.rx,
            self.plate.ry
        );
        info!(
            "Potential: c={}, a={}, b={}",
            self.potential.c, self.potential.a, self.potential.b
        );
        match self.simulation.seed {
            Some(seed) => info!("Simulation: {} steps, seed={}", self.simulation.steps, seed),
            None => info!("Simulation: {} steps, unseeded", self.simulation.steps),
        }
        info!(
            "Perturbation: initial={}, proposal={}",
            self.simulation.initial_amplitude, self.simulation.proposal_amplitude
        );
        info!(
            "Visualization: output to '{}', {} contour levels",
            self.visualization.output_dir, self.visualization.contour_levels
        );
        info!("==============================");
    }
}
