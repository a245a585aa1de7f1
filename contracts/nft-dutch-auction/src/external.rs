use commons::{PaymentAmount, Tick, Token};
use concordium_std::*;

use crate::schedule::Schedule;
use crate::state::{Config, Payment, Phase};

/// Parameter of the one-time `initialize` entrypoint.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitializeParams {
    /// Payment asset.
    pub payment: Payment,
    /// The token being sold.
    pub item: Token,
    /// Price strategy.
    pub schedule: Schedule,
    /// Number of ticks the auction stays open once started.
    pub duration_ticks: u64,
}

impl From<InitializeParams> for Config {
    fn from(params: InitializeParams) -> Self {
        Config {
            payment: params.payment,
            item: params.item,
            schedule: params.schedule,
            duration_ticks: params.duration_ticks,
        }
    }
}

/// Message of a signed allowance grant. The auction forwards it to the
/// payment token contract untouched; signature verification is entirely
/// the token contract's concern.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct PermitMessage {
    /// Token contract expected to execute the grant.
    pub contract_address: ContractAddress,
    /// Replay protection nonce of the signer on the token contract.
    pub nonce: u64,
    /// Deadline after which the grant is void.
    pub timestamp: Timestamp,
    /// Entrypoint of the token contract the payload is for.
    pub entry_point: OwnedEntrypointName,
    /// Serialized grant payload.
    pub payload: Vec<u8>,
}

/// Signed allowance grant bundled with a bid.
#[derive(Debug, Serialize, SchemaType)]
pub struct PermitParam {
    pub signature: AccountSignatures,
    pub signer: AccountAddress,
    pub message: PermitMessage,
}

/// Parameter of the `bid` entrypoint.
#[derive(Debug, Serialize, SchemaType)]
pub struct BidParams {
    /// Offered amount for CIS-2 payment. Ignored for CCD payment, where
    /// the attached amount is the offer.
    pub offer: PaymentAmount,
    /// Optional signed allowance grant for the payment token. Only
    /// meaningful for CIS-2 payment.
    pub permit: Option<PermitParam>,
}

/// Read-only snapshot returned by `view`.
#[derive(Debug, Serialize, SchemaType)]
pub struct ViewResult {
    pub controller: AccountAddress,
    pub config: Option<Config>,
    pub phase: Phase,
    pub start_tick: Option<Tick>,
    /// Present once the auction has started.
    pub current_price: Option<PaymentAmount>,
    pub winner: Option<AccountAddress>,
    pub winning_amount: Option<PaymentAmount>,
}
