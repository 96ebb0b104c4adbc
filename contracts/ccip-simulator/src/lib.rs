#![no_std]

//! Local stand-in for the CCIP messaging layer: a queueing [`Router`] and a
//! [`CcipLocalSimulator`] that hands out the chain [`Configuration`].

#[cfg(test)]
extern crate std;

mod router;
mod simulator;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

#[cfg(test)]
mod test;

pub use router::{
    MessageStatus, PendingMessage, Router, RouterClient, RouterError, MAX_GAS_LIMIT,
};
pub use simulator::{CcipLocalSimulator, CcipLocalSimulatorClient, Configuration, SimulatorError};

/// Selector the local simulator reports for its (single) chain.
pub const CHAIN_SELECTOR: u64 = 16_015_286_601_757_825_753;
