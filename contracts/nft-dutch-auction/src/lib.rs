//! Single-lot price auction settling CCD or a CIS-2 token against an NFT.
//!
//! The contract holds one lot and runs it through a fixed lifecycle:
//! not started, open, closed. The controller (the instantiating account,
//! which is also the seller) supplies the configuration once, opens the
//! auction and may close it. While open, any account may bid; the first
//! admissible bid of a descending auction exchanges payment for the lot
//! and closes the auction in the same call.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod ledger;
mod schedule;
mod state;
