#![no_std]

#[cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error, Address,
    Env, String,
};

/// Longest name in bytes. The registrar enforces the same bound before sending.
pub const MAX_NAME_LENGTH: u32 = 255;

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    AuthorizedCaller,
    Record(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[contracterror]
#[repr(u32)]
pub enum LookupError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    AlreadyBound = 4,
    InvalidName = 5,
}

#[derive(Clone)]
#[contractevent(topics = ["caller_bound"])]
pub struct EvtCallerBound {
    pub caller: Address,
}

#[derive(Clone)]
#[contractevent(topics = ["name_registered"])]
pub struct EvtNameRegistered {
    #[topic]
    pub name: String,
    pub owner: Address,
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, LookupError::NotInitialized))
}

fn read_authorized_caller(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::AuthorizedCaller)
}

fn validate_name(env: &Env, name: &String) {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        panic_with_error!(env, LookupError::InvalidName);
    }
}

/// Name -> owner table for one chain. Writable only by the single caller
/// bound through `set_authorized_caller`.
#[contract]
pub struct NameLookup;

#[contractimpl]
impl NameLookup {
    pub fn init(env: Env, admin: Address) {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            panic_with_error!(&env, LookupError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
    }

    /// Binds the only address allowed to write records. The binding is set
    /// once; repeating it with the same address is a no-op.
    pub fn set_authorized_caller(env: Env, caller: Address) {
        let admin = read_admin(&env);
        admin.require_auth();

        match read_authorized_caller(&env) {
            Some(current) if current == caller => return,
            Some(_) => panic_with_error!(&env, LookupError::AlreadyBound),
            None => {}
        }

        env.storage()
            .persistent()
            .set(&DataKey::AuthorizedCaller, &caller);
        EvtCallerBound { caller }.publish(&env);
    }

    pub fn authorized_caller(env: Env) -> Option<Address> {
        read_authorized_caller(&env)
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    pub fn register(env: Env, caller: Address, name: String, owner: Address) {
        caller.require_auth();
        match read_authorized_caller(&env) {
            Some(bound) if bound == caller => {}
            _ => panic_with_error!(&env, LookupError::Unauthorized),
        }
        validate_name(&env, &name);

        env.storage()
            .persistent()
            .set(&DataKey::Record(name.clone()), &owner);
        EvtNameRegistered { name, owner }.publish(&env);
    }

    /// Current owner of `name`, or `None` if it was never registered here.
    pub fn lookup(env: Env, name: String) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Record(name))
    }
}
