/// The `quadrat_core` crate implements the computational material of the
/// Quadrat course: regression modelling and inference over observational
/// tables, the visualization-pitfall diagnostics, and local stability
/// analysis of 1-D and 2-D continuous dynamical systems.
///
/// Key components:
/// - **Tables**: named-column datasets loaded from CSV (disk or URL), with
///   missing-value handling and grouping (`table`, `datasets`, `synthetic`).
/// - **Statistics**: descriptive summaries and fingerprints, model formulas,
///   Gaussian/Binomial GLMs with coefficient inference, and the
///   slope-reversal diagnostic (`stats`).
/// - **Dynamics**: `Scalar`/`VectorField`/`Steppable` seams, dual-number
///   differentiation, fixed-point refinement with eigenvalue classification,
///   and nullcline extraction (`traits`, `autodiff`, `solvers`, `systems`,
///   `equilibrium`, `stability`, `nullcline`).
/// - **Figures**: SVG scatterplots, solution curves, and phase portraits
///   (`plot`).
pub mod autodiff;
pub mod datasets;
pub mod equilibrium;
pub mod nullcline;
pub mod plot;
pub mod solvers;
pub mod stability;
pub mod stats;
pub mod synthetic;
pub mod systems;
pub mod table;
pub mod traits;
