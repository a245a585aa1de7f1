//! Types and errors shared by the auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]

pub use crate::{errors::*, types::*};

mod errors;
mod types;
