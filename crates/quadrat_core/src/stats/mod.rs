//! Statistical modelling: descriptive summaries, model formulas, GLM
//! fitting with coefficient inference, and the aggregation diagnostics the
//! course's visualization material leans on.

pub mod describe;
pub mod design;
pub mod glm;
pub mod paradox;
pub mod special;
