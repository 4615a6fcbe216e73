//! Buckling of a thin curved layer, found by greedy stochastic minimisation of a
//! von Kármán style elastic energy on a finite-difference grid.

pub mod config;
pub mod contour;
pub mod energy;
pub mod error;
pub mod fields;
pub mod grid;
pub mod parameters;
pub mod simulation;
pub mod visualisation;

pub use config::Config;
pub use error::ConfigurationError;
pub use grid::Grid;
pub use parameters::{PhysicalParameters, PotentialCoefficients};
pub use simulation::{BucklingFieldSimulator, EnergyTrace, PerturbationSettings, StepOutcome};
pub use visualisation::DeflectionVisualiser;
