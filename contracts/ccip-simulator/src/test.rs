use soroban_sdk::{
    contract, contractimpl, contracttype, testutils::Address as _, token, Address, Bytes, BytesN,
    Env, Vec,
};

use crate::testutils::LocalSimulator;
use crate::{MessageStatus, RouterError, SimulatorError, CHAIN_SELECTOR, MAX_GAS_LIMIT};

#[contract]
pub struct RecordingReceiver;

#[contracttype]
#[derive(Clone)]
enum RecordingKey {
    Seen,
}

#[contractimpl]
impl RecordingReceiver {
    pub fn ccip_receive(
        env: Env,
        _message_id: BytesN<32>,
        source_chain_selector: u64,
        _sender: Address,
        data: Bytes,
    ) {
        assert_eq!(source_chain_selector, CHAIN_SELECTOR);
        let storage = env.storage().persistent();
        let mut seen: Vec<Bytes> = storage.get(&RecordingKey::Seen).unwrap_or(Vec::new(&env));
        seen.push_back(data);
        storage.set(&RecordingKey::Seen, &seen);
    }

    pub fn seen(env: Env) -> Vec<Bytes> {
        env.storage()
            .persistent()
            .get(&RecordingKey::Seen)
            .unwrap_or(Vec::new(&env))
    }
}

#[contract]
pub struct RejectingReceiver;

#[contractimpl]
impl RejectingReceiver {
    pub fn ccip_receive(
        _env: Env,
        _message_id: BytesN<32>,
        _source_chain_selector: u64,
        _sender: Address,
        _data: Bytes,
    ) {
        panic!("rejected");
    }
}

fn setup() -> (Env, LocalSimulator) {
    let env = Env::default();
    env.mock_all_auths();
    let sim = LocalSimulator::deploy(&env);
    (env, sim)
}

fn payload(env: &Env, data: &[u8]) -> Bytes {
    Bytes::from_slice(env, data)
}

#[test]
fn configuration_describes_single_router_pair() {
    let (env, sim) = setup();
    let config = sim.simulator_client(&env).configuration();

    assert_eq!(config, sim.config);
    assert_eq!(config.chain_selector, CHAIN_SELECTOR);
    assert_eq!(config.source_router, sim.router);
    assert_eq!(config.destination_router, sim.router);
    assert_ne!(config.link_token, config.wrapped_native);
    assert_ne!(config.ccip_bnm, config.ccip_lnm);
    assert_eq!(sim.router_client(&env).fee_token(), config.link_token);
}

#[test]
fn simulator_init_only_once() {
    let (env, sim) = setup();
    let config = sim.config.clone();
    let result = sim.simulator_client(&env).try_init(
        &sim.router,
        &config.wrapped_native,
        &config.link_token,
        &config.ccip_bnm,
        &config.ccip_lnm,
    );
    assert_eq!(result, Err(Ok(SimulatorError::AlreadyInitialized.into())));
}

#[test]
fn router_init_only_once() {
    let (env, sim) = setup();
    let result = sim.router_client(&env).try_init(
        &sim.router_admin,
        &CHAIN_SELECTOR,
        &sim.config.link_token,
    );
    assert_eq!(result, Err(Ok(RouterError::AlreadyInitialized.into())));
}

#[test]
fn faucet_mints_link() {
    let (env, sim) = setup();
    let user = Address::generate(&env);
    sim.simulator_client(&env)
        .request_link_from_faucet(&user, &1_000);

    let link = token::TokenClient::new(&env, &sim.config.link_token);
    assert_eq!(link.balance(&user), 1_000);

    assert_eq!(
        sim.simulator_client(&env)
            .try_request_link_from_faucet(&user, &0),
        Err(Ok(SimulatorError::InvalidAmount.into()))
    );
}

#[test]
fn send_to_unsupported_chain_fails() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver = env.register(RecordingReceiver, ());

    assert!(router.is_chain_supported(&CHAIN_SELECTOR));
    assert!(!router.is_chain_supported(&(CHAIN_SELECTOR - 1)));
    assert_eq!(
        router.try_ccip_send(
            &sender,
            &(CHAIN_SELECTOR - 1),
            &receiver,
            &payload(&env, b"x"),
            &200_000
        ),
        Err(Ok(RouterError::UnsupportedChain.into()))
    );
    assert_eq!(
        router.try_get_fee(&(CHAIN_SELECTOR - 1)),
        Err(Ok(RouterError::UnsupportedChain.into()))
    );
}

#[test]
fn send_rejects_out_of_range_gas_limit() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver = env.register(RecordingReceiver, ());

    for gas_limit in [0u64, MAX_GAS_LIMIT + 1] {
        assert_eq!(
            router.try_ccip_send(
                &sender,
                &CHAIN_SELECTOR,
                &receiver,
                &payload(&env, b"x"),
                &gas_limit
            ),
            Err(Ok(RouterError::InvalidGasLimit.into()))
        );
    }
    assert_eq!(router.pending_count(), 0);
}

#[test]
fn send_is_queued_until_routed() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver_id = env.register(RecordingReceiver, ());
    let receiver = RecordingReceiverClient::new(&env, &receiver_id);

    let data = payload(&env, b"hello");
    let message_id = router.ccip_send(&sender, &CHAIN_SELECTOR, &receiver_id, &data, &200_000);

    assert_eq!(router.pending_count(), 1);
    assert_eq!(router.message_status(&message_id), MessageStatus::Untouched);
    assert_eq!(receiver.seen().len(), 0);

    let pending = router.peek_pending().unwrap();
    assert_eq!(pending.message_id, message_id);
    assert_eq!(pending.sender, sender);
    assert_eq!(pending.receiver, receiver_id);
    assert_eq!(pending.gas_limit, 200_000);
    assert_eq!(pending.data, data);

    assert_eq!(router.route_pending(&10), 1);
    assert_eq!(router.pending_count(), 0);
    assert!(router.peek_pending().is_none());
    assert_eq!(router.message_status(&message_id), MessageStatus::Success);
    assert_eq!(receiver.seen().get(0).unwrap(), data);
}

#[test]
fn routing_preserves_send_order() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver_id = env.register(RecordingReceiver, ());
    let receiver = RecordingReceiverClient::new(&env, &receiver_id);

    for data in [b"one", b"two", b"six"] {
        router.ccip_send(
            &sender,
            &CHAIN_SELECTOR,
            &receiver_id,
            &payload(&env, data),
            &200_000,
        );
    }

    assert_eq!(router.route_pending(&2), 2);
    assert_eq!(router.pending_count(), 1);
    assert_eq!(router.route_pending(&2), 1);

    let seen = receiver.seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen.get(0).unwrap(), payload(&env, b"one"));
    assert_eq!(seen.get(1).unwrap(), payload(&env, b"two"));
    assert_eq!(seen.get(2).unwrap(), payload(&env, b"six"));
}

#[test]
fn delivered_messages_are_not_redelivered() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver_id = env.register(RecordingReceiver, ());
    let receiver = RecordingReceiverClient::new(&env, &receiver_id);

    router.ccip_send(
        &sender,
        &CHAIN_SELECTOR,
        &receiver_id,
        &payload(&env, b"once"),
        &200_000,
    );
    assert_eq!(router.route_pending(&5), 1);
    assert_eq!(router.route_pending(&5), 0);
    assert_eq!(receiver.seen().len(), 1);
}

#[test]
fn failed_delivery_is_terminal_and_does_not_block_queue() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let rejecting = env.register(RejectingReceiver, ());
    let recording_id = env.register(RecordingReceiver, ());
    let recording = RecordingReceiverClient::new(&env, &recording_id);

    let failed = router.ccip_send(
        &sender,
        &CHAIN_SELECTOR,
        &rejecting,
        &payload(&env, b"bad"),
        &200_000,
    );
    let delivered = router.ccip_send(
        &sender,
        &CHAIN_SELECTOR,
        &recording_id,
        &payload(&env, b"good"),
        &200_000,
    );

    assert_eq!(router.route_pending(&10), 2);
    assert_eq!(router.message_status(&failed), MessageStatus::Failure);
    assert_eq!(router.message_status(&delivered), MessageStatus::Success);
    assert_eq!(recording.seen().len(), 1);
    assert_eq!(router.route_pending(&10), 0);
}

#[test]
fn identical_sends_get_distinct_ids() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let sender = Address::generate(&env);
    let receiver = env.register(RecordingReceiver, ());
    let data = payload(&env, b"same");

    let first = router.ccip_send(&sender, &CHAIN_SELECTOR, &receiver, &data, &200_000);
    let second = router.ccip_send(&sender, &CHAIN_SELECTOR, &receiver, &data, &200_000);
    assert_ne!(first, second);
}

#[test]
fn fee_must_be_prepaid() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let link = token::TokenClient::new(&env, &sim.config.link_token);
    let sender = Address::generate(&env);
    let receiver = env.register(RecordingReceiver, ());
    let data = payload(&env, b"paid");

    assert_eq!(router.get_fee(&CHAIN_SELECTOR), 0);
    router.set_fee(&25);
    assert_eq!(router.get_fee(&CHAIN_SELECTOR), 25);

    assert_eq!(
        router.try_ccip_send(&sender, &CHAIN_SELECTOR, &receiver, &data, &200_000),
        Err(Ok(RouterError::InsufficientFee.into()))
    );
    assert_eq!(router.pending_count(), 0);

    sim.simulator_client(&env)
        .request_link_from_faucet(&sender, &25);
    link.transfer(&sender, &sim.router, &25);
    let message_id = router.ccip_send(&sender, &CHAIN_SELECTOR, &receiver, &data, &200_000);

    assert_eq!(router.peek_pending().unwrap().fee, 25);
    assert_eq!(router.fees_collected(), 25);
    assert_eq!(
        router.try_ccip_send(&sender, &CHAIN_SELECTOR, &receiver, &data, &200_000),
        Err(Ok(RouterError::InsufficientFee.into()))
    );

    router.route_pending(&1);
    assert_eq!(router.message_status(&message_id), MessageStatus::Success);
}

#[test]
fn collected_fees_can_be_withdrawn() {
    let (env, sim) = setup();
    let router = sim.router_client(&env);
    let link = token::TokenClient::new(&env, &sim.config.link_token);
    let sender = Address::generate(&env);
    let treasury = Address::generate(&env);
    let receiver = env.register(RecordingReceiver, ());

    router.set_fee(&10);
    sim.simulator_client(&env)
        .request_link_from_faucet(&sender, &15);
    link.transfer(&sender, &sim.router, &15);
    router.ccip_send(
        &sender,
        &CHAIN_SELECTOR,
        &receiver,
        &payload(&env, b"fee"),
        &200_000,
    );

    assert_eq!(router.withdraw_fees(&treasury), 10);
    assert_eq!(link.balance(&treasury), 10);
    assert_eq!(link.balance(&sim.router), 5);
    assert_eq!(router.fees_collected(), 0);
    assert_eq!(router.withdraw_fees(&treasury), 0);
}

#[test]
fn negative_fee_rejected() {
    let (env, sim) = setup();
    assert_eq!(
        sim.router_client(&env).try_set_fee(&-1),
        Err(Ok(RouterError::InvalidAmount.into()))
    );
}
