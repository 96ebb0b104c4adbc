use soroban_sdk::{testutils::Address as _, Address, Env};

use crate::{CcipLocalSimulator, CcipLocalSimulatorClient, Configuration, Router, RouterClient};

/// A freshly deployed simulator with its router and test tokens.
pub struct LocalSimulator {
    pub simulator: Address,
    pub router: Address,
    pub router_admin: Address,
    pub config: Configuration,
}

impl LocalSimulator {
    pub fn deploy(env: &Env) -> Self {
        let router_admin = Address::generate(env);
        let simulator = env.register(CcipLocalSimulator, ());
        let router = env.register(Router, ());

        let asset = |admin: &Address| {
            env.register_stellar_asset_contract_v2(admin.clone())
                .address()
        };
        let link_token = asset(&simulator);
        let wrapped_native = asset(&router_admin);
        let ccip_bnm = asset(&router_admin);
        let ccip_lnm = asset(&router_admin);

        RouterClient::new(env, &router).init(&router_admin, &crate::CHAIN_SELECTOR, &link_token);
        let simulator_client = CcipLocalSimulatorClient::new(env, &simulator);
        simulator_client.init(&router, &wrapped_native, &link_token, &ccip_bnm, &ccip_lnm);
        let config = simulator_client.configuration();

        LocalSimulator {
            simulator,
            router,
            router_admin,
            config,
        }
    }

    pub fn router_client<'a>(&self, env: &'a Env) -> RouterClient<'a> {
        RouterClient::new(env, &self.router)
    }

    pub fn simulator_client<'a>(&self, env: &'a Env) -> CcipLocalSimulatorClient<'a> {
        CcipLocalSimulatorClient::new(env, &self.simulator)
    }
}
