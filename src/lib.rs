// src/lib.rs
pub mod api;
pub mod config;
pub mod contracts;
pub mod error;
pub mod explorer;
pub mod stats;
pub mod utils;

pub use api::{router, AppContext};
pub use contracts::{ChainLoader, ContractBinder, ContractHandle, EpochInfo, SpaContracts};
pub use error::{Error, Result};
pub use explorer::AbiFetcher;
pub use stats::{ContractLoader, Readiness, StakingContracts, StakingStats, StatsProvider};
