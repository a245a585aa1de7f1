use concordium_cis2::TokenIdVec;
use concordium_std::*;

/// Host clock reading in milliseconds, used to index auction time.
pub type Tick = u64;

/// An amount in the payment asset's smallest unit: micro CCD for native
/// payment, the token's base unit for CIS-2 payment.
pub type PaymentAmount = u64;

/// Reference to a token held by an external CIS-2 contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Token {
    pub contract: ContractAddress,
    pub id: TokenIdVec,
}
