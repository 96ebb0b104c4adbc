use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, panic_with_error,
    token, Address, Bytes, BytesN, Env, Error, IntoVal, Symbol,
};

/// Largest destination gas budget a message may request. The registrar
/// checks routes against the same value.
pub const MAX_GAS_LIMIT: u64 = 3_000_000;

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    ChainSelector,
    FeeToken,
    Fee,
    FeesCollected,
    Nonce,
    Head,
    Tail,
    Pending(u64),
    Status(BytesN<32>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[contracterror]
#[repr(u32)]
pub enum RouterError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    UnsupportedChain = 3,
    InvalidGasLimit = 4,
    InsufficientFee = 5,
    InvalidAmount = 6,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct PendingMessage {
    pub message_id: BytesN<32>,
    pub source_chain_selector: u64,
    pub dest_chain_selector: u64,
    pub sender: Address,
    pub receiver: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub fee: i128,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[contracttype]
pub enum MessageStatus {
    Untouched,
    Success,
    Failure,
}

#[derive(Clone)]
#[contractevent(topics = ["message_queued"])]
pub struct EvtMessageQueued {
    #[topic]
    pub message_id: BytesN<32>,
    pub dest_chain_selector: u64,
    pub sender: Address,
    pub receiver: Address,
    pub fee: i128,
}

#[derive(Clone)]
#[contractevent(topics = ["message_executed"])]
pub struct EvtMessageExecuted {
    #[topic]
    pub message_id: BytesN<32>,
    pub success: bool,
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, RouterError::NotInitialized))
}

fn read_chain_selector(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&DataKey::ChainSelector)
        .unwrap_or_else(|| panic_with_error!(env, RouterError::NotInitialized))
}

fn read_fee_token(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::FeeToken)
        .unwrap_or_else(|| panic_with_error!(env, RouterError::NotInitialized))
}

fn read_counter<V>(env: &Env, key: &DataKey) -> V
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val> + Default,
{
    env.storage().persistent().get(key).unwrap_or_default()
}

fn ensure_supported(env: &Env, chain_selector: u64) {
    if chain_selector != read_chain_selector(env) {
        panic_with_error!(env, RouterError::UnsupportedChain);
    }
}

fn validate_gas_limit(env: &Env, gas_limit: u64) {
    if gas_limit == 0 || gas_limit > MAX_GAS_LIMIT {
        panic_with_error!(env, RouterError::InvalidGasLimit);
    }
}

/// Fees are prepaid: the sender transfers the fee token to the router before
/// `ccip_send`, and only the balance above what was already collected counts.
fn collect_fee(env: &Env, fee: i128) {
    let storage = env.storage().persistent();
    let token = token::TokenClient::new(env, &read_fee_token(env));
    let collected: i128 = read_counter(env, &DataKey::FeesCollected);
    let available = token
        .balance(&env.current_contract_address())
        .saturating_sub(collected);
    if available < fee {
        panic_with_error!(env, RouterError::InsufficientFee);
    }
    storage.set(&DataKey::FeesCollected, &(collected + fee));
}

fn compute_message_id(env: &Env, nonce: u64, message: &PendingMessage) -> BytesN<32> {
    let preimage = (
        nonce,
        message.source_chain_selector,
        message.dest_chain_selector,
        message.sender.clone(),
        message.receiver.clone(),
        message.data.clone(),
    )
        .to_xdr(env);
    env.crypto().sha256(&preimage).to_bytes()
}

fn deliver(env: &Env, message: &PendingMessage) -> bool {
    let args = (
        message.message_id.clone(),
        message.source_chain_selector,
        message.sender.clone(),
        message.data.clone(),
    )
        .into_val(env);
    match env.try_invoke_contract::<(), Error>(
        &message.receiver,
        &Symbol::new(env, "ccip_receive"),
        args,
    ) {
        Ok(Ok(())) => true,
        _ => {
            log!(env, "delivery failed", message.message_id);
            false
        }
    }
}

/// Messaging endpoint of the simulated chain pair. Outbound messages are
/// queued; `route_pending` plays the part of the off-chain relay.
#[contract]
pub struct Router;

#[contractimpl]
impl Router {
    pub fn init(env: Env, admin: Address, chain_selector: u64, fee_token: Address) {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            panic_with_error!(&env, RouterError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::ChainSelector, &chain_selector);
        storage.set(&DataKey::FeeToken, &fee_token);
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    pub fn chain_selector(env: Env) -> u64 {
        read_chain_selector(&env)
    }

    pub fn fee_token(env: Env) -> Address {
        read_fee_token(&env)
    }

    pub fn is_chain_supported(env: Env, chain_selector: u64) -> bool {
        chain_selector == read_chain_selector(&env)
    }

    /// Flat per-message fee, in the fee token, for `dest_chain_selector`.
    pub fn get_fee(env: Env, dest_chain_selector: u64) -> i128 {
        ensure_supported(&env, dest_chain_selector);
        read_counter(&env, &DataKey::Fee)
    }

    pub fn set_fee(env: Env, fee: i128) {
        read_admin(&env).require_auth();
        if fee < 0 {
            panic_with_error!(&env, RouterError::InvalidAmount);
        }
        env.storage().persistent().set(&DataKey::Fee, &fee);
    }

    pub fn ccip_send(
        env: Env,
        sender: Address,
        dest_chain_selector: u64,
        receiver: Address,
        data: Bytes,
        gas_limit: u64,
    ) -> BytesN<32> {
        sender.require_auth();
        ensure_supported(&env, dest_chain_selector);
        validate_gas_limit(&env, gas_limit);

        let fee: i128 = read_counter(&env, &DataKey::Fee);
        if fee > 0 {
            collect_fee(&env, fee);
        }

        let storage = env.storage().persistent();
        let nonce: u64 = read_counter(&env, &DataKey::Nonce);
        let mut message = PendingMessage {
            message_id: BytesN::from_array(&env, &[0u8; 32]),
            source_chain_selector: read_chain_selector(&env),
            dest_chain_selector,
            sender,
            receiver,
            data,
            gas_limit,
            fee,
        };
        message.message_id = compute_message_id(&env, nonce, &message);
        storage.set(&DataKey::Nonce, &(nonce + 1));

        let tail: u64 = read_counter(&env, &DataKey::Tail);
        storage.set(&DataKey::Pending(tail), &message);
        storage.set(&DataKey::Tail, &(tail + 1));

        EvtMessageQueued {
            message_id: message.message_id.clone(),
            dest_chain_selector,
            sender: message.sender,
            receiver: message.receiver,
            fee,
        }
        .publish(&env);

        message.message_id
    }

    /// Delivers up to `max` queued messages in send order and returns how many
    /// were taken off the queue. A message leaves the queue before its receiver
    /// runs, so it is never delivered twice; receiver failures are recorded as
    /// `Failure` and do not revert the relay.
    pub fn route_pending(env: Env, max: u32) -> u32 {
        let storage = env.storage().persistent();
        let mut routed = 0u32;
        while routed < max {
            let head: u64 = read_counter(&env, &DataKey::Head);
            let tail: u64 = read_counter(&env, &DataKey::Tail);
            if head >= tail {
                break;
            }
            let key = DataKey::Pending(head);
            let message: PendingMessage = storage
                .get(&key)
                .unwrap_or_else(|| panic_with_error!(&env, RouterError::NotInitialized));
            storage.remove(&key);
            storage.set(&DataKey::Head, &(head + 1));

            let success = deliver(&env, &message);
            let status = if success {
                MessageStatus::Success
            } else {
                MessageStatus::Failure
            };
            storage.set(&DataKey::Status(message.message_id.clone()), &status);
            EvtMessageExecuted {
                message_id: message.message_id,
                success,
            }
            .publish(&env);
            routed += 1;
        }
        routed
    }

    pub fn pending_count(env: Env) -> u64 {
        let head: u64 = read_counter(&env, &DataKey::Head);
        let tail: u64 = read_counter(&env, &DataKey::Tail);
        tail - head
    }

    /// Oldest queued message, if any.
    pub fn peek_pending(env: Env) -> Option<PendingMessage> {
        let head: u64 = read_counter(&env, &DataKey::Head);
        env.storage().persistent().get(&DataKey::Pending(head))
    }

    pub fn message_status(env: Env, message_id: BytesN<32>) -> MessageStatus {
        env.storage()
            .persistent()
            .get(&DataKey::Status(message_id))
            .unwrap_or(MessageStatus::Untouched)
    }

    pub fn fees_collected(env: Env) -> i128 {
        read_counter(&env, &DataKey::FeesCollected)
    }

    /// Pays out everything collected so far to `to`; prepaid credit that was
    /// not yet consumed by a send stays with the router.
    pub fn withdraw_fees(env: Env, to: Address) -> i128 {
        read_admin(&env).require_auth();
        let collected: i128 = read_counter(&env, &DataKey::FeesCollected);
        if collected > 0 {
            token::TokenClient::new(&env, &read_fee_token(&env)).transfer(
                &env.current_contract_address(),
                &to,
                &collected,
            );
            env.storage().persistent().set(&DataKey::FeesCollected, &0i128);
        }
        collected
    }
}
