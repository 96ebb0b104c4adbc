use ccip_simulator::testutils::LocalSimulator;
use ccip_simulator::RouterClient;
use lookup::{NameLookup, NameLookupClient};
use receiver::{NameReceiver, NameReceiverClient};
use registrar::{NameRegistrar, NameRegistrarClient};
use soroban_sdk::{testutils::Address as _, Address, Env, String};

pub const GAS_LIMIT: u64 = 200_000;

/// Every component deployed fresh, nothing wired yet.
pub struct Deployment {
    pub env: Env,
    pub sim: LocalSimulator,
    pub admin: Address,
    pub alice: Address,
    pub lookup_source: Address,
    pub lookup_destination: Address,
    pub registrar: Address,
    pub receiver: Address,
}

pub fn deploy() -> Deployment {
    let env = Env::default();
    env.mock_all_auths();

    let sim = LocalSimulator::deploy(&env);
    let config = sim.config.clone();
    let admin = Address::generate(&env);
    let alice = Address::generate(&env);

    let lookup_source = env.register(NameLookup, ());
    let lookup_destination = env.register(NameLookup, ());
    NameLookupClient::new(&env, &lookup_source).init(&admin);
    NameLookupClient::new(&env, &lookup_destination).init(&admin);

    let registrar = env.register(NameRegistrar, ());
    NameRegistrarClient::new(&env, &registrar).init(
        &admin,
        &config.destination_router,
        &lookup_source,
    );

    let receiver = env.register(NameReceiver, ());
    NameReceiverClient::new(&env, &receiver).init(
        &admin,
        &config.destination_router,
        &lookup_destination,
        &config.chain_selector,
    );

    Deployment {
        env,
        sim,
        admin,
        alice,
        lookup_source,
        lookup_destination,
        registrar,
        receiver,
    }
}

/// Deployed and wired: lookups bound, receiver trusts the registrar, and the
/// simulated destination chain enabled.
pub fn deploy_wired() -> Deployment {
    let d = deploy();
    d.bind_lookups();
    d.receiver().set_trusted_sender(&d.registrar);
    d.registrar()
        .enable_chain(&d.sim.config.chain_selector, &d.receiver, &GAS_LIMIT);
    d
}

impl Deployment {
    pub fn bind_lookups(&self) {
        self.lookup_source_client()
            .set_authorized_caller(&self.registrar);
        self.lookup_destination_client()
            .set_authorized_caller(&self.receiver);
    }

    pub fn router(&self) -> RouterClient<'_> {
        self.sim.router_client(&self.env)
    }

    pub fn registrar(&self) -> NameRegistrarClient<'_> {
        NameRegistrarClient::new(&self.env, &self.registrar)
    }

    pub fn receiver(&self) -> NameReceiverClient<'_> {
        NameReceiverClient::new(&self.env, &self.receiver)
    }

    pub fn lookup_source_client(&self) -> NameLookupClient<'_> {
        NameLookupClient::new(&self.env, &self.lookup_source)
    }

    pub fn lookup_destination_client(&self) -> NameLookupClient<'_> {
        NameLookupClient::new(&self.env, &self.lookup_destination)
    }

    pub fn name(&self, text: &str) -> String {
        String::from_str(&self.env, text)
    }

    /// Runs the relay until the router queue is empty.
    pub fn relay(&self) -> u32 {
        self.router().route_pending(&u32::MAX)
    }

    pub fn resolve_source(&self, name: &str) -> Option<Address> {
        self.lookup_source_client().lookup(&self.name(name))
    }

    pub fn resolve_destination(&self, name: &str) -> Option<Address> {
        self.lookup_destination_client().lookup(&self.name(name))
    }
}
