//! Campaign mutations, simulated only.

pub mod simulator;

pub use simulator::{
    CampaignPlan, SimulatedAction, SimulationReport, simulate_budget_update, simulate_creation,
    simulate_enable, simulate_pause,
};
