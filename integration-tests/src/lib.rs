#![cfg(test)]

mod cross_chain;
mod fixture;
