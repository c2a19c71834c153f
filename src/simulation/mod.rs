//! Multi-year simulation and output assembly.
//!
//! Years are independent: each one loads its snapshot, runs the year pipeline,
//! and writes its sampled rows into its own block of a pre-sized table.
//! Abundance is assigned over the finished table.

mod abundance;
mod runner;
mod table;

pub use abundance::assign_abundance;
pub use runner::{extract_rows, Simulation, SimulationError};
pub use table::{OccurrenceTable, OutputRow, YearReport};
