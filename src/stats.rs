use crate::contracts::EpochInfo;
use crate::error::{Error, Result};
use crate::utils;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

pub const REBASES_PER_DAY: i32 = 3;
pub const FIVE_DAYS: i32 = 5;
pub const DAYS_PER_YEAR: i32 = 365;

/// Read-only views over the tracked contracts.
pub trait StakingContracts: Send + Sync + 'static {
    /// `OHMCirculatingSupply()` of the circulating supply contract.
    fn circulating_supply(&self) -> impl Future<Output = Result<U256>> + Send;
    fn epoch(&self) -> impl Future<Output = Result<EpochInfo>> + Send;
    /// `circulatingSupply()` of the staked token.
    fn staked_circulating_supply(&self) -> impl Future<Output = Result<U256>> + Send;
}

pub trait ContractLoader: Send + Sync + 'static {
    type Contracts: StakingContracts;

    fn load(&self) -> impl Future<Output = Result<Self::Contracts>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Unloaded,
    Loading,
    Ready,
    LoadFailed(String),
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Unloaded => f.write_str("unloaded"),
            Readiness::Loading => f.write_str("loading"),
            Readiness::Ready => f.write_str("ready"),
            Readiness::LoadFailed(reason) => write!(f, "load failed: {reason}"),
        }
    }
}

enum State<C> {
    Unloaded,
    Loading,
    Ready(Arc<C>),
    LoadFailed(String),
}

impl<C> State<C> {
    fn readiness(&self) -> Readiness {
        match self {
            State::Unloaded => Readiness::Unloaded,
            State::Loading => Readiness::Loading,
            State::Ready(_) => Readiness::Ready,
            State::LoadFailed(reason) => Readiness::LoadFailed(reason.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingStats {
    pub staking_rebase: f64,
    pub five_day_rate: f64,
    #[serde(rename = "stakingAPY")]
    pub staking_apy: f64,
}

impl StakingStats {
    pub fn from_rebase(staking_rebase: f64) -> Self {
        Self {
            staking_rebase,
            five_day_rate: compound(staking_rebase, FIVE_DAYS * REBASES_PER_DAY),
            staking_apy: compound(staking_rebase, DAYS_PER_YEAR * REBASES_PER_DAY),
        }
    }
}

fn compound(rate: f64, periods: i32) -> f64 {
    (1.0 + rate).powf(f64::from(periods)) - 1.0
}

/// Derives the staking stats from the epoch reward and the staked supply.
pub fn compute_staking_stats(distribute: U256, circ: U256) -> Result<StakingStats> {
    let rebase = utils::ratio_to_f64(distribute, circ).ok_or(Error::EmptySupply)?;
    Ok(StakingStats::from_rebase(rebase))
}

pub struct StatsProvider<L: ContractLoader> {
    loader: L,
    state: RwLock<State<L::Contracts>>,
}

impl<L: ContractLoader> StatsProvider<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            state: RwLock::new(State::Unloaded),
        }
    }

    pub async fn readiness(&self) -> Readiness {
        self.state.read().await.readiness()
    }

    /// Binds every tracked contract. Calling it again rebinds them.
    ///
    /// A provider that is already ready keeps serving its current contracts
    /// until the new set is bound, and keeps them if the rebind fails.
    pub async fn load(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, State::Ready(_)) {
                *state = State::Loading;
            }
        }
        info!("loading contract abis");

        match self.loader.load().await {
            Ok(contracts) => {
                *self.state.write().await = State::Ready(Arc::new(contracts));
                info!("loaded contract abis");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load contract abis");
                let mut state = self.state.write().await;
                if !matches!(*state, State::Ready(_)) {
                    *state = State::LoadFailed(e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn contracts(&self) -> Result<Arc<L::Contracts>> {
        match &*self.state.read().await {
            State::Ready(contracts) => Ok(contracts.clone()),
            other => Err(Error::NotReady(other.readiness())),
        }
    }

    pub async fn get_circulating_supply(&self) -> Result<U256> {
        self.contracts().await?.circulating_supply().await
    }

    pub async fn get_epoch(&self) -> Result<EpochInfo> {
        self.contracts().await?.epoch().await
    }

    pub async fn get_circ(&self) -> Result<U256> {
        self.contracts().await?.staked_circulating_supply().await
    }

    pub async fn get_staking_stats(&self) -> Result<StakingStats> {
        let contracts = self.contracts().await?;
        let (epoch, circ) = tokio::try_join!(contracts.epoch(), contracts.staked_circulating_supply())?;
        compute_staking_stats(epoch.distribute, circ)
    }
}
