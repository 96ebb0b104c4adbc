#![no_std]

#[cfg(test)]
extern crate std;

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error, token,
    Address, Bytes, BytesN, Env, IntoVal, String, Symbol, Vec,
};

// Keep in sync with `ccip_simulator::MAX_GAS_LIMIT` and the lookup's name limit.
pub const MAX_GAS_LIMIT: u64 = 3_000_000;
const MAX_NAME_LENGTH: u32 = 255;

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Router,
    Lookup,
    Chains,
}

/// Destination chain a registration is propagated to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainRoute {
    pub chain_selector: u64,
    pub receiver: Address,
    pub gas_limit: u64,
}

/// Cross-chain payload, XDR-encoded into the message data. The receiver
/// decodes the same layout, so fields must stay in sync with it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameRecord {
    pub name: String,
    pub owner: Address,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RegistrarError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    ChainNotEnabled = 3,
    InvalidGasLimit = 4,
    InvalidName = 5,
}

#[derive(Clone)]
#[contractevent(topics = ["chain_enabled"])]
pub struct EvtChainEnabled {
    #[topic]
    pub chain_selector: u64,
    pub receiver: Address,
    pub gas_limit: u64,
}

#[derive(Clone)]
#[contractevent(topics = ["chain_disabled"])]
pub struct EvtChainDisabled {
    #[topic]
    pub chain_selector: u64,
}

#[derive(Clone)]
#[contractevent(topics = ["message_sent"])]
pub struct EvtMessageSent {
    #[topic]
    pub message_id: BytesN<32>,
    pub chain_selector: u64,
    pub name: String,
    pub owner: Address,
    pub fee: i128,
}

fn read_address(env: &Env, key: &DataKey) -> Address {
    env.storage()
        .persistent()
        .get(key)
        .unwrap_or_else(|| panic_with_error!(env, RegistrarError::NotInitialized))
}

fn read_admin(env: &Env) -> Address {
    read_address(env, &DataKey::Admin)
}

fn read_router(env: &Env) -> Address {
    read_address(env, &DataKey::Router)
}

fn read_lookup(env: &Env) -> Address {
    read_address(env, &DataKey::Lookup)
}

fn read_chains(env: &Env) -> Vec<ChainRoute> {
    env.storage()
        .persistent()
        .get(&DataKey::Chains)
        .unwrap_or_else(|| Vec::new(env))
}

fn write_chains(env: &Env, chains: &Vec<ChainRoute>) {
    env.storage().persistent().set(&DataKey::Chains, chains);
}

fn position(chains: &Vec<ChainRoute>, chain_selector: u64) -> Option<u32> {
    chains
        .iter()
        .position(|route| route.chain_selector == chain_selector)
        .map(|idx| idx as u32)
}

fn validate_name(env: &Env, name: &String) {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        panic_with_error!(env, RegistrarError::InvalidName);
    }
}

mod lookup_api {
    use super::*;

    pub fn register(
        env: &Env,
        lookup: &Address,
        caller: &Address,
        name: &String,
        owner: &Address,
    ) {
        env.invoke_contract::<()>(
            lookup,
            &Symbol::new(env, "register"),
            (caller, name, owner).into_val(env),
        );
    }
}

mod router_api {
    use super::*;

    pub fn get_fee(env: &Env, router: &Address, chain_selector: u64) -> i128 {
        env.invoke_contract::<i128>(
            router,
            &Symbol::new(env, "get_fee"),
            (chain_selector,).into_val(env),
        )
    }

    pub fn fee_token(env: &Env, router: &Address) -> Address {
        env.invoke_contract::<Address>(router, &Symbol::new(env, "fee_token"), Vec::new(env))
    }

    pub fn ccip_send(
        env: &Env,
        router: &Address,
        sender: &Address,
        route: &ChainRoute,
        data: &Bytes,
    ) -> BytesN<32> {
        env.invoke_contract::<BytesN<32>>(
            router,
            &Symbol::new(env, "ccip_send"),
            (sender, route.chain_selector, &route.receiver, data, route.gas_limit).into_val(env),
        )
    }
}

/// Source-chain entry point of the name service. Records names in the local
/// lookup and propagates them to every enabled chain.
#[contract]
pub struct NameRegistrar;

#[contractimpl]
impl NameRegistrar {
    /// One-time initializer.
    pub fn init(env: Env, admin: Address, router: Address, lookup: Address) {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            panic_with_error!(&env, RegistrarError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Router, &router);
        storage.set(&DataKey::Lookup, &lookup);
    }

    /// Add or update the route for `chain_selector` (admin only).
    pub fn enable_chain(env: Env, chain_selector: u64, receiver: Address, gas_limit: u64) {
        read_admin(&env).require_auth();
        if gas_limit == 0 || gas_limit > MAX_GAS_LIMIT {
            panic_with_error!(&env, RegistrarError::InvalidGasLimit);
        }

        let route = ChainRoute {
            chain_selector,
            receiver: receiver.clone(),
            gas_limit,
        };
        let mut chains = read_chains(&env);
        match position(&chains, chain_selector) {
            Some(idx) => chains.set(idx, route),
            None => chains.push_back(route),
        }
        write_chains(&env, &chains);

        EvtChainEnabled {
            chain_selector,
            receiver,
            gas_limit,
        }
        .publish(&env);
    }

    pub fn disable_chain(env: Env, chain_selector: u64) {
        read_admin(&env).require_auth();
        let mut chains = read_chains(&env);
        let idx = position(&chains, chain_selector)
            .unwrap_or_else(|| panic_with_error!(&env, RegistrarError::ChainNotEnabled));
        chains.remove(idx);
        write_chains(&env, &chains);
        EvtChainDisabled { chain_selector }.publish(&env);
    }

    pub fn chains(env: Env) -> Vec<ChainRoute> {
        read_chains(&env)
    }

    /// Total transport fee one `register` call pays, in the router's fee token.
    pub fn quote_fee(env: Env) -> i128 {
        let router = read_router(&env);
        read_chains(&env)
            .iter()
            .map(|route| router_api::get_fee(&env, &router, route.chain_selector))
            .sum()
    }

    /// Register `name` to `caller` here and on every enabled chain. Either the
    /// local write and all sends happen, or none of them.
    pub fn register(env: Env, caller: Address, name: String) {
        let lookup = read_lookup(&env);
        let router = read_router(&env);
        caller.require_auth();
        validate_name(&env, &name);

        let chains = read_chains(&env);
        if chains.is_empty() {
            panic_with_error!(&env, RegistrarError::ChainNotEnabled);
        }

        let registrar = env.current_contract_address();
        lookup_api::register(&env, &lookup, &registrar, &name, &caller);

        let data = NameRecord {
            name: name.clone(),
            owner: caller.clone(),
        }
        .to_xdr(&env);

        for route in chains.iter() {
            // Prepay: the router only counts fee-token balance it has not
            // already collected.
            let fee = router_api::get_fee(&env, &router, route.chain_selector);
            if fee > 0 {
                let fee_token = router_api::fee_token(&env, &router);
                token::TokenClient::new(&env, &fee_token).transfer(&registrar, &router, &fee);
            }
            let message_id = router_api::ccip_send(&env, &router, &registrar, &route, &data);

            EvtMessageSent {
                message_id,
                chain_selector: route.chain_selector,
                name: name.clone(),
                owner: caller.clone(),
                fee,
            }
            .publish(&env);
        }
    }

    /// Sweep the registrar's balance of `token` to `beneficiary` (admin only).
    pub fn withdraw(env: Env, token: Address, beneficiary: Address) -> i128 {
        read_admin(&env).require_auth();
        let client = token::TokenClient::new(&env, &token);
        let registrar = env.current_contract_address();
        let amount = client.balance(&registrar);
        if amount > 0 {
            client.transfer(&registrar, &beneficiary, &amount);
        }
        amount
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    pub fn router(env: Env) -> Address {
        read_router(&env)
    }

    pub fn lookup(env: Env) -> Address {
        read_lookup(&env)
    }
}
