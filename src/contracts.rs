use crate::config::Config;
use crate::error::{Error, Result};
use crate::explorer::AbiFetcher;
use crate::stats::{ContractLoader, StakingContracts};
use ethers::abi::{Abi, Detokenize, Token};
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::info;

/// Field order of the staking contract's `Epoch` struct.
const EPOCH_LAYOUT: [&str; 4] = ["length", "number", "endBlock", "distribute"];

/// A contract bound to its ABI and a node connection.
pub struct ContractHandle<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> ContractHandle<M> {
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Calls a zero-argument view method and decodes its return value.
    pub async fn call<D: Detokenize>(&self, method: &str) -> Result<D> {
        self.contract
            .method::<_, D>(method, ())
            .map_err(|e| Error::Node(format!("{method}: {e}")))?
            .call()
            .await
            .map_err(|e| Error::Node(format!("{method}: {e}")))
    }

    pub fn output_names(&self, method: &str) -> Result<Vec<String>> {
        let function = self
            .contract
            .abi()
            .function(method)
            .map_err(|e| Error::Node(format!("{method}: {e}")))?;
        Ok(function.outputs.iter().map(|p| p.name.clone()).collect())
    }
}

pub struct ContractBinder<M> {
    fetcher: AbiFetcher,
    client: Arc<M>,
}

impl<M: Middleware + 'static> ContractBinder<M> {
    pub fn new(fetcher: AbiFetcher, client: Arc<M>) -> Self {
        Self { fetcher, client }
    }

    pub fn bind(&self, address: Address, abi: Abi) -> ContractHandle<M> {
        ContractHandle {
            contract: Contract::new(address, abi, self.client.clone()),
        }
    }

    pub async fn get_contract(&self, address: Address) -> Result<ContractHandle<M>> {
        let abi = self.fetcher.fetch_abi(address).await?;
        Ok(self.bind(address, abi))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpochInfo {
    pub length: Option<U256>,
    pub number: Option<U256>,
    pub end_block: Option<U256>,
    pub distribute: U256,
}

impl EpochInfo {
    /// Decodes the `epoch()` return value using the ABI output names.
    ///
    /// Unnamed outputs are read by position when there are exactly four of
    /// them, matching the staking contract's struct layout.
    pub fn from_token(names: &[String], token: Token) -> Result<Self> {
        let values = match token {
            Token::Tuple(values) => values,
            other => vec![other],
        };

        let named = names.len() == values.len() && names.iter().any(|n| n == "distribute");
        let names: Vec<&str> = if named {
            names.iter().map(String::as_str).collect()
        } else if values.len() == EPOCH_LAYOUT.len() {
            EPOCH_LAYOUT.to_vec()
        } else {
            return Err(Error::Node(format!(
                "epoch: cannot locate distribute in {} outputs",
                values.len()
            )));
        };

        let mut epoch = EpochInfo::default();
        let mut distribute = None;
        for (name, value) in names.into_iter().zip(values) {
            let value = value.into_uint();
            match name {
                "length" => epoch.length = value,
                "number" => epoch.number = value,
                "endBlock" | "end" => epoch.end_block = value,
                "distribute" => distribute = value,
                _ => {}
            }
        }
        epoch.distribute =
            distribute.ok_or_else(|| Error::Node("epoch: distribute is not a uint".into()))?;
        Ok(epoch)
    }
}

/// Source of the SPA circulating supply.
pub struct CirculatingSupplyContract<M>(ContractHandle<M>);

impl<M: Middleware + 'static> CirculatingSupplyContract<M> {
    pub async fn ohm_circulating_supply(&self) -> Result<U256> {
        self.0.call("OHMCirculatingSupply").await
    }
}

pub struct StakingContract<M>(ContractHandle<M>);

impl<M: Middleware + 'static> StakingContract<M> {
    pub async fn epoch(&self) -> Result<EpochInfo> {
        let names = self.0.output_names("epoch")?;
        let token: Token = self.0.call("epoch").await?;
        EpochInfo::from_token(&names, token)
    }
}

/// sSPA, whose circulating supply is the staked amount.
pub struct StakedTokenContract<M>(ContractHandle<M>);

impl<M: Middleware + 'static> StakedTokenContract<M> {
    pub async fn circulating_supply(&self) -> Result<U256> {
        self.0.call("circulatingSupply").await
    }
}

pub struct SpaContracts<M> {
    pub circulating_supply: CirculatingSupplyContract<M>,
    pub staking: StakingContract<M>,
    pub staked_token: StakedTokenContract<M>,
}

impl<M: Middleware + 'static> StakingContracts for SpaContracts<M> {
    async fn circulating_supply(&self) -> Result<U256> {
        self.circulating_supply.ohm_circulating_supply().await
    }

    async fn epoch(&self) -> Result<EpochInfo> {
        self.staking.epoch().await
    }

    async fn staked_circulating_supply(&self) -> Result<U256> {
        self.staked_token.circulating_supply().await
    }
}

/// Binds the three configured contracts against a live node.
pub struct ChainLoader<M> {
    binder: ContractBinder<M>,
    circulating_supply: Address,
    staking: Address,
    staked_token: Address,
}

impl<M: Middleware + 'static> ChainLoader<M> {
    pub fn new(binder: ContractBinder<M>, config: &Config) -> Self {
        Self {
            binder,
            circulating_supply: config.contracts.spa_circulating_supply.address,
            staking: config.contracts.spa_staking.address,
            staked_token: config.contracts.s_spa.address,
        }
    }
}

impl<M: Middleware + 'static> ContractLoader for ChainLoader<M> {
    type Contracts = SpaContracts<M>;

    async fn load(&self) -> Result<SpaContracts<M>> {
        let circulating_supply = self.binder.get_contract(self.circulating_supply).await?;
        info!(address = ?circulating_supply.address(), "bound circulating supply contract");

        let staking = self.binder.get_contract(self.staking).await?;
        info!(address = ?staking.address(), "bound staking contract");

        let staked_token = self.binder.get_contract(self.staked_token).await?;
        info!(address = ?staked_token.address(), "bound sSPA contract");

        Ok(SpaContracts {
            circulating_supply: CirculatingSupplyContract(circulating_supply),
            staking: StakingContract(staking),
            staked_token: StakedTokenContract(staked_token),
        })
    }
}
