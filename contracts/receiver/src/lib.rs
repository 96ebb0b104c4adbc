#![no_std]

#[cfg(test)]
extern crate std;

mod payload;

pub use payload::NameRecord;

use soroban_sdk::xdr::FromXdr;
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error, Address,
    Bytes, BytesN, Env, IntoVal, String, Symbol,
};

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Router,
    Lookup,
    SourceChainSelector,
    TrustedSender,
    Processed(BytesN<32>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[contracterror]
#[repr(u32)]
pub enum ReceiverError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    UntrustedSender = 3,
    MessageDecodeFailure = 4,
    MessageAlreadyProcessed = 5,
}

#[derive(Clone)]
#[contractevent(topics = ["trusted_sender_set"])]
pub struct EvtTrustedSenderSet {
    pub sender: Address,
}

#[derive(Clone)]
#[contractevent(topics = ["message_applied"])]
pub struct EvtMessageApplied {
    #[topic]
    pub message_id: BytesN<32>,
    pub name: String,
    pub owner: Address,
}

fn read_address(env: &Env, key: &DataKey) -> Address {
    env.storage()
        .persistent()
        .get(key)
        .unwrap_or_else(|| panic_with_error!(env, ReceiverError::NotInitialized))
}

fn read_source_chain_selector(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&DataKey::SourceChainSelector)
        .unwrap_or_else(|| panic_with_error!(env, ReceiverError::NotInitialized))
}

fn read_trusted_sender(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::TrustedSender)
}

fn ensure_trusted(env: &Env, source_chain_selector: u64, sender: &Address) {
    if source_chain_selector != read_source_chain_selector(env) {
        panic_with_error!(env, ReceiverError::UntrustedSender);
    }
    match read_trusted_sender(env) {
        Some(trusted) if trusted == *sender => {}
        _ => panic_with_error!(env, ReceiverError::UntrustedSender),
    }
}

fn lookup_register(env: &Env, lookup: &Address, name: &String, owner: &Address) {
    env.invoke_contract::<()>(
        lookup,
        &Symbol::new(env, "register"),
        (env.current_contract_address(), name, owner).into_val(env),
    );
}

/// Destination-chain side of the name service: applies registrations that
/// arrive through the router to the local lookup.
#[contract]
pub struct NameReceiver;

#[contractimpl]
impl NameReceiver {
    pub fn init(
        env: Env,
        admin: Address,
        router: Address,
        lookup: Address,
        source_chain_selector: u64,
    ) {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            panic_with_error!(&env, ReceiverError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Router, &router);
        storage.set(&DataKey::Lookup, &lookup);
        storage.set(&DataKey::SourceChainSelector, &source_chain_selector);
    }

    /// Registrar whose messages are accepted (admin only).
    pub fn set_trusted_sender(env: Env, sender: Address) {
        read_address(&env, &DataKey::Admin).require_auth();
        env.storage()
            .persistent()
            .set(&DataKey::TrustedSender, &sender);
        EvtTrustedSenderSet { sender }.publish(&env);
    }

    /// Router callback. Rejections are final: the message is not marked
    /// processed and nothing is written.
    pub fn ccip_receive(
        env: Env,
        message_id: BytesN<32>,
        source_chain_selector: u64,
        sender: Address,
        data: Bytes,
    ) {
        read_address(&env, &DataKey::Router).require_auth();
        ensure_trusted(&env, source_chain_selector, &sender);

        let processed_key = DataKey::Processed(message_id.clone());
        let storage = env.storage().persistent();
        if storage.has(&processed_key) {
            panic_with_error!(&env, ReceiverError::MessageAlreadyProcessed);
        }

        if !payload::is_name_record(&data) {
            panic_with_error!(&env, ReceiverError::MessageDecodeFailure);
        }
        let record = NameRecord::from_xdr(&env, &data)
            .unwrap_or_else(|_| panic_with_error!(&env, ReceiverError::MessageDecodeFailure));

        let lookup = read_address(&env, &DataKey::Lookup);
        lookup_register(&env, &lookup, &record.name, &record.owner);
        storage.set(&processed_key, &true);

        EvtMessageApplied {
            message_id,
            name: record.name,
            owner: record.owner,
        }
        .publish(&env);
    }

    pub fn is_processed(env: Env, message_id: BytesN<32>) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Processed(message_id))
    }

    pub fn trusted_sender(env: Env) -> Option<Address> {
        read_trusted_sender(&env)
    }

    pub fn source_chain_selector(env: Env) -> u64 {
        read_source_chain_selector(&env)
    }

    pub fn router(env: Env) -> Address {
        read_address(&env, &DataKey::Router)
    }

    pub fn lookup(env: Env) -> Address {
        read_address(&env, &DataKey::Lookup)
    }
}
