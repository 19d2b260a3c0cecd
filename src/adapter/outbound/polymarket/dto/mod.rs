//! Polymarket API wire types.

pub mod market;
pub mod trade;
