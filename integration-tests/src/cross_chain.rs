use ccip_simulator::MessageStatus;
use lookup::{LookupError, NameLookup, NameLookupClient};
use receiver::ReceiverError;
use registrar::{NameRegistrar, NameRegistrarClient, RegistrarError};
use soroban_sdk::{
    testutils::{Address as _, MockAuth, MockAuthInvoke},
    token, Address, IntoVal,
};

use crate::fixture::{deploy, deploy_wired, GAS_LIMIT};

#[test]
fn registers_and_looks_up_alice_across_chains() {
    let d = deploy();
    let name = d.name("alice.ccns");

    // Bind each lookup to the contract allowed to write it.
    d.lookup_source_client()
        .set_authorized_caller(&d.registrar);
    d.lookup_destination_client()
        .set_authorized_caller(&d.receiver);

    // Route registrations to the receiver on the destination chain.
    d.receiver().set_trusted_sender(&d.registrar);
    d.registrar()
        .enable_chain(&d.sim.config.chain_selector, &d.receiver, &GAS_LIMIT);

    d.registrar().register(&d.alice, &name);
    assert_eq!(d.relay(), 1);

    assert_eq!(d.lookup_source_client().lookup(&name), Some(d.alice.clone()));
    assert_eq!(
        d.lookup_destination_client().lookup(&name),
        Some(d.alice.clone())
    );
}

#[test]
fn destination_updates_only_after_delivery() {
    let d = deploy_wired();
    d.registrar().register(&d.alice, &d.name("alice.ccns"));

    assert_eq!(d.resolve_source("alice.ccns"), Some(d.alice.clone()));
    assert_eq!(d.resolve_destination("alice.ccns"), None);
    assert_eq!(d.router().pending_count(), 1);

    let message_id = d.router().peek_pending().unwrap().message_id;
    assert!(!d.receiver().is_processed(&message_id));

    d.relay();
    assert_eq!(d.resolve_destination("alice.ccns"), Some(d.alice.clone()));
    assert_eq!(d.router().message_status(&message_id), MessageStatus::Success);
    assert!(d.receiver().is_processed(&message_id));
}

#[test]
fn unregistered_names_resolve_to_none_everywhere() {
    let d = deploy_wired();
    d.registrar().register(&d.alice, &d.name("alice.ccns"));
    d.relay();

    for name in ["bob.ccns", "alice", "ALICE.ccns"] {
        assert_eq!(d.resolve_source(name), None);
        assert_eq!(d.resolve_destination(name), None);
    }
}

#[test]
fn register_before_enabling_chain_fails() {
    let d = deploy();
    d.bind_lookups();
    d.receiver().set_trusted_sender(&d.registrar);

    assert_eq!(
        d.registrar().try_register(&d.alice, &d.name("alice.ccns")),
        Err(Ok(RegistrarError::ChainNotEnabled.into()))
    );
    assert_eq!(d.relay(), 0);
    assert_eq!(d.resolve_source("alice.ccns"), None);
    assert_eq!(d.resolve_destination("alice.ccns"), None);
}

#[test]
fn reregistration_overwrites_owner_on_both_chains() {
    let d = deploy_wired();
    let bob = Address::generate(&d.env);
    let name = d.name("shared.ccns");

    d.registrar().register(&d.alice, &name);
    d.relay();
    d.registrar().register(&bob, &name);
    d.relay();

    assert_eq!(d.resolve_source("shared.ccns"), Some(bob.clone()));
    assert_eq!(d.resolve_destination("shared.ccns"), Some(bob));
}

#[test]
fn queued_registrations_apply_in_send_order() {
    let d = deploy_wired();
    let bob = Address::generate(&d.env);
    let carol = Address::generate(&d.env);

    d.registrar().register(&d.alice, &d.name("first.ccns"));
    d.registrar().register(&bob, &d.name("second.ccns"));
    d.registrar().register(&carol, &d.name("first.ccns"));
    assert_eq!(d.router().pending_count(), 3);

    assert_eq!(d.router().route_pending(&2), 2);
    assert_eq!(d.resolve_destination("first.ccns"), Some(d.alice.clone()));
    assert_eq!(d.resolve_destination("second.ccns"), Some(bob));

    assert_eq!(d.relay(), 1);
    assert_eq!(d.resolve_destination("first.ccns"), Some(carol.clone()));
    assert_eq!(d.resolve_source("first.ccns"), Some(carol));
}

#[test]
fn relaying_twice_delivers_once() {
    let d = deploy_wired();
    d.registrar().register(&d.alice, &d.name("alice.ccns"));

    assert_eq!(d.relay(), 1);
    assert_eq!(d.relay(), 0);
    assert_eq!(d.resolve_destination("alice.ccns"), Some(d.alice.clone()));
}

#[test]
fn messages_from_untrusted_registrar_are_rejected() {
    let d = deploy_wired();
    let mallory = Address::generate(&d.env);

    // A second registrar with its own source lookup, pointed at our receiver.
    let rogue_lookup = d.env.register(NameLookup, ());
    NameLookupClient::new(&d.env, &rogue_lookup).init(&mallory);
    let rogue = d.env.register(NameRegistrar, ());
    NameLookupClient::new(&d.env, &rogue_lookup).set_authorized_caller(&rogue);
    let rogue_client = NameRegistrarClient::new(&d.env, &rogue);
    rogue_client.init(&mallory, &d.sim.router, &rogue_lookup);
    rogue_client.enable_chain(&d.sim.config.chain_selector, &d.receiver, &GAS_LIMIT);

    rogue_client.register(&mallory, &d.name("alice.ccns"));
    let message_id = d.router().peek_pending().unwrap().message_id;
    assert_eq!(d.relay(), 1);

    assert_eq!(d.router().message_status(&message_id), MessageStatus::Failure);
    assert!(!d.receiver().is_processed(&message_id));
    assert_eq!(d.resolve_destination("alice.ccns"), None);

    // The legitimate registrar is unaffected.
    d.registrar().register(&d.alice, &d.name("alice.ccns"));
    d.relay();
    assert_eq!(d.resolve_destination("alice.ccns"), Some(d.alice.clone()));
}

#[test]
fn receiver_rejects_direct_untrusted_delivery() {
    let d = deploy_wired();
    let mallory = Address::generate(&d.env);
    let message_id = soroban_sdk::BytesN::from_array(&d.env, &[9u8; 32]);
    let data = soroban_sdk::Bytes::from_slice(&d.env, b"anything");

    assert_eq!(
        d.receiver().try_ccip_receive(
            &message_id,
            &d.sim.config.chain_selector,
            &mallory,
            &data
        ),
        Err(Ok(ReceiverError::UntrustedSender.into()))
    );
}

#[test]
fn lookups_only_accept_their_bound_writer() {
    let d = deploy_wired();
    let name = d.name("alice.ccns");

    assert_eq!(
        d.lookup_destination_client()
            .try_register(&d.registrar, &name, &d.alice),
        Err(Ok(LookupError::Unauthorized.into()))
    );
    assert_eq!(
        d.lookup_source_client()
            .try_register(&d.receiver, &name, &d.alice),
        Err(Ok(LookupError::Unauthorized.into()))
    );
    assert_eq!(
        d.lookup_source_client()
            .try_set_authorized_caller(&d.receiver),
        Err(Ok(LookupError::AlreadyBound.into()))
    );
}

#[test]
fn unfunded_fee_aborts_the_whole_registration() {
    let d = deploy_wired();
    let link = token::TokenClient::new(&d.env, &d.sim.config.link_token);
    d.router().set_fee(&50);

    assert!(d
        .registrar()
        .try_register(&d.alice, &d.name("alice.ccns"))
        .is_err());
    assert_eq!(d.resolve_source("alice.ccns"), None);
    assert_eq!(d.relay(), 0);
    assert_eq!(d.resolve_destination("alice.ccns"), None);

    d.sim
        .simulator_client(&d.env)
        .request_link_from_faucet(&d.registrar, &50);
    assert_eq!(d.registrar().quote_fee(), 50);
    d.registrar().register(&d.alice, &d.name("alice.ccns"));
    d.relay();

    assert_eq!(d.resolve_source("alice.ccns"), Some(d.alice.clone()));
    assert_eq!(d.resolve_destination("alice.ccns"), Some(d.alice.clone()));
    assert_eq!(link.balance(&d.registrar), 0);
    assert_eq!(d.router().fees_collected(), 50);
}

#[test]
fn disabling_the_only_chain_stops_registration() {
    let d = deploy_wired();
    d.registrar().register(&d.alice, &d.name("before.ccns"));
    d.registrar()
        .disable_chain(&d.sim.config.chain_selector);

    assert_eq!(
        d.registrar().try_register(&d.alice, &d.name("after.ccns")),
        Err(Ok(RegistrarError::ChainNotEnabled.into()))
    );
    d.relay();
    assert_eq!(d.resolve_destination("before.ccns"), Some(d.alice.clone()));
    assert_eq!(d.resolve_source("after.ccns"), None);
    assert_eq!(d.resolve_destination("after.ccns"), None);
}

#[test]
fn round_trip_needs_only_the_owner_signature() {
    let d = deploy_wired();
    let name = d.name("alice.ccns");
    d.env.set_auths(&[]);

    // Registrar, router and receiver authorize their nested calls as the
    // direct invoker; only Alice signs.
    d.registrar()
        .mock_auths(&[MockAuth {
            address: &d.alice,
            invoke: &MockAuthInvoke {
                contract: &d.registrar,
                fn_name: "register",
                args: (&d.alice, &name).into_val(&d.env),
                sub_invokes: &[],
            },
        }])
        .register(&d.alice, &name);
    let message_id = d.router().peek_pending().unwrap().message_id;
    assert_eq!(d.relay(), 1);

    assert_eq!(d.router().message_status(&message_id), MessageStatus::Success);
    assert_eq!(d.resolve_source("alice.ccns"), Some(d.alice.clone()));
    assert_eq!(d.resolve_destination("alice.ccns"), Some(d.alice.clone()));
}
