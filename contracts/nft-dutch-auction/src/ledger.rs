//! Adapters for the two external ledgers. Each call is a single
//! cross-contract invoke; any ledger-side rejection surfaces as
//! `SettlementFailed` and rejects the whole auction call.

use commons::{ContractResult, PaymentAmount, Token};
use concordium_cis2::{
    AdditionalData, Receiver, TokenAmountU64, TokenAmountU8, TokenIdUnit, Transfer, TransferParams,
};
use concordium_std::*;

use crate::external::PermitParam;

/// Present a signed allowance grant to the payment token contract. The
/// grant is opaque to the auction; a rejected grant is an ordinary
/// settlement failure.
pub fn present_permit<State>(
    host: &mut impl HasHost<State>,
    token: &ContractAddress,
    permit: &PermitParam,
) -> ContractResult<()> {
    host.invoke_contract(
        token,
        permit,
        EntrypointName::new_unchecked("permit"),
        Amount::zero(),
    )?;
    Ok(())
}

/// Pull `amount` of the payment token from the bidder to the seller.
/// Requires this contract to be an operator of the bidder, granted
/// either beforehand or through a permit presented in the same call.
pub fn pull_payment<State>(
    host: &mut impl HasHost<State>,
    token: &ContractAddress,
    from: AccountAddress,
    to: AccountAddress,
    amount: PaymentAmount,
) -> ContractResult<()> {
    let transfer = Transfer {
        token_id: TokenIdUnit(),
        amount: TokenAmountU64(amount),
        from: Address::Account(from),
        to: Receiver::Account(to),
        data: AdditionalData::empty(),
    };
    host.invoke_contract(
        token,
        &TransferParams::from(vec![transfer]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )?;
    Ok(())
}

/// Move the lot from the seller to the winner. Requires this contract to
/// be an operator of the seller on the item ledger.
pub fn deliver_item<State>(
    host: &mut impl HasHost<State>,
    item: &Token,
    from: AccountAddress,
    to: AccountAddress,
) -> ContractResult<()> {
    let transfer = Transfer {
        token_id: item.id.clone(),
        amount: TokenAmountU8(1),
        from: Address::Account(from),
        to: Receiver::Account(to),
        data: AdditionalData::empty(),
    };
    host.invoke_contract(
        &item.contract,
        &TransferParams::from(vec![transfer]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )?;
    Ok(())
}
