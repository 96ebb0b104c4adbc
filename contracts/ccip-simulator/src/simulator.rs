use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, token, Address, Env,
};

use crate::router::RouterClient;

/// Addresses and selector describing the simulated chain pair. Source and
/// destination are served by the same router, as with the local CCIP
/// simulator.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Configuration {
    pub chain_selector: u64,
    pub source_router: Address,
    pub destination_router: Address,
    pub wrapped_native: Address,
    pub link_token: Address,
    pub ccip_bnm: Address,
    pub ccip_lnm: Address,
}

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Config,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[contracterror]
#[repr(u32)]
pub enum SimulatorError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidAmount = 3,
}

fn read_config(env: &Env) -> Configuration {
    env.storage()
        .persistent()
        .get(&DataKey::Config)
        .unwrap_or_else(|| panic_with_error!(env, SimulatorError::NotInitialized))
}

#[contract]
pub struct CcipLocalSimulator;

#[contractimpl]
impl CcipLocalSimulator {
    /// Wires the router and test tokens. The simulator must be the admin of
    /// `link_token` for the faucet to work.
    pub fn init(
        env: Env,
        router: Address,
        wrapped_native: Address,
        link_token: Address,
        ccip_bnm: Address,
        ccip_lnm: Address,
    ) {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Config) {
            panic_with_error!(&env, SimulatorError::AlreadyInitialized);
        }
        let chain_selector = RouterClient::new(&env, &router).chain_selector();
        let config = Configuration {
            chain_selector,
            source_router: router.clone(),
            destination_router: router,
            wrapped_native,
            link_token,
            ccip_bnm,
            ccip_lnm,
        };
        storage.set(&DataKey::Config, &config);
    }

    pub fn configuration(env: Env) -> Configuration {
        read_config(&env)
    }

    pub fn request_link_from_faucet(env: Env, to: Address, amount: i128) {
        if amount <= 0 {
            panic_with_error!(&env, SimulatorError::InvalidAmount);
        }
        let config = read_config(&env);
        token::StellarAssetClient::new(&env, &config.link_token).mint(&to, &amount);
    }
}
