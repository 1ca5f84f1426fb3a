pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod store;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Building, BuildingUnitType, ChangeTarget, CommissionRate, Lead, LeadRateContext, LeadStatus,
    Money, NewLead, Rate, RateAssignment, ScheduledRateChange,
};
pub use error::AppError;
pub use jobs::{
    execute_scheduled_changes, recalculate_commissions, ExecutionReport, JobScheduler,
    RecalculationReport,
};
pub use store::{CommissionStore, MockStore, StoreError};
