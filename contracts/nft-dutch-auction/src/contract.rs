use commons::{ContractError, ContractResult, PaymentAmount, Tick};
use concordium_std::*;

use crate::events::AuctionEvent;
use crate::external::{BidParams, InitializeParams, ViewResult};
use crate::ledger;
use crate::state::{BidOutcome, Config, EndOutcome, Payment, State};

/// Create an unconfigured auction. The instantiating account becomes the
/// controller and seller; the configuration arrives through the one-time
/// `initialize` call.
#[init(contract = "NftDutchAuction")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    Ok(State::new(state_builder, ctx.init_origin()))
}

fn current_tick(ctx: &impl HasReceiveContext) -> Tick {
    ctx.metadata().slot_time().timestamp_millis()
}

fn only_controller<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    state: &State<S>,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&state.controller),
        ContractError::Unauthorized
    );
    Ok(())
}

fn account_sender(ctx: &impl HasReceiveContext) -> ContractResult<AccountAddress> {
    match ctx.sender() {
        Address::Account(account) => Ok(account),
        Address::Contract(_) => Err(ContractError::OnlyAccountAddress),
    }
}

/// Supply the auction configuration. Controller only, exactly once per
/// instance; a second call fails with `AlreadyInitialized`.
#[receive(
    mutable,
    contract = "NftDutchAuction",
    name = "initialize",
    parameter = "InitializeParams",
    error = "ContractError",
    enable_logger
)]
fn contract_initialize<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params: InitializeParams = ctx.parameter_cursor().get()?;
    only_controller(ctx, host.state())?;
    host.state_mut().initialize(Config::from(params))?;
    logger.log(&AuctionEvent::initialized(host.state().config()?))?;
    Ok(())
}

/// Open the auction, recording the start tick. Controller only.
#[receive(
    mutable,
    contract = "NftDutchAuction",
    name = "start",
    error = "ContractError",
    enable_logger
)]
fn contract_start<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    only_controller(ctx, host.state())?;
    let now = current_tick(ctx);
    host.state_mut().start(now)?;
    logger.log(&AuctionEvent::started(now))?;
    Ok(())
}

/// Place a bid. With CCD payment the attached amount is the offer; with
/// CIS-2 payment the parameter carries the offer and optionally a signed
/// allowance grant for the payment token.
///
/// The first admissible bid of a descending auction exchanges payment
/// for the lot and closes the auction within this call. An admissible
/// ascending bid becomes the standing offer; an escrowed displaced bid
/// is refunded in the same call.
#[receive(
    mutable,
    payable,
    contract = "NftDutchAuction",
    name = "bid",
    parameter = "BidParams",
    error = "ContractError",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params: BidParams = ctx.parameter_cursor().get()?;
    let bidder = account_sender(ctx)?;
    let payment = host.state().config()?.payment;

    let offer: PaymentAmount = match payment {
        Payment::Ccd => {
            ensure!(params.permit.is_none(), ContractError::InvalidBidParameter);
            amount.micro_ccd
        }
        Payment::Cis2 { .. } => {
            ensure!(amount == Amount::zero(), ContractError::UnexpectedDeposit);
            params.offer
        }
    };

    let now = current_tick(ctx);
    let outcome = host.state_mut().place_bid(bidder, offer, now)?;
    logger.log(&AuctionEvent::bid(&bidder, offer))?;

    // The grant must be on the payment ledger before any pull against it.
    if let (Payment::Cis2 { contract }, Some(permit)) = (payment, params.permit.as_ref()) {
        ledger::present_permit(host, &contract, permit)?;
    }

    match outcome {
        BidOutcome::Settle(settlement) => {
            let (item, controller) = {
                let state = host.state();
                (state.config()?.item.clone(), state.controller)
            };
            match payment {
                Payment::Ccd => {
                    host.invoke_transfer(&controller, Amount::from_micro_ccd(settlement.amount))?
                }
                Payment::Cis2 { contract } => ledger::pull_payment(
                    host,
                    &contract,
                    settlement.account,
                    controller,
                    settlement.amount,
                )?,
            }
            ledger::deliver_item(host, &item, controller, settlement.account)?;
            logger.log(&AuctionEvent::settled(&settlement.account, settlement.amount))?;
        }
        BidOutcome::Raised { displaced } => {
            if let Some(previous) = displaced {
                if matches!(payment, Payment::Ccd) {
                    host.invoke_transfer(
                        &previous.bidder,
                        Amount::from_micro_ccd(previous.amount),
                    )?;
                }
                logger.log(&AuctionEvent::outbid(&previous.bidder, previous.amount))?;
            }
        }
    }

    Ok(())
}

/// Close the auction. Controller only, valid only while open. An expired
/// ascending auction settles to its standing bid; in every other case
/// the lot goes unsold and an escrowed standing bid is refunded.
///
/// A standing bid whose payment pull is rejected at this point (balance
/// spent, grant revoked) is discarded and the close proceeds unsold, so
/// the auction can always be brought to rest.
#[receive(
    mutable,
    contract = "NftDutchAuction",
    name = "end",
    error = "ContractError",
    enable_logger
)]
fn contract_end<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    only_controller(ctx, host.state())?;
    let payment = host.state().config()?.payment;
    let now = current_tick(ctx);

    match host.state_mut().end(now)? {
        EndOutcome::Settle(settlement) => {
            let (item, controller) = {
                let state = host.state();
                (state.config()?.item.clone(), state.controller)
            };
            match payment {
                // The winning bid is already escrowed in the contract.
                Payment::Ccd => {
                    host.invoke_transfer(&controller, Amount::from_micro_ccd(settlement.amount))?
                }
                Payment::Cis2 { contract } => {
                    let pulled = ledger::pull_payment(
                        host,
                        &contract,
                        settlement.account,
                        controller,
                        settlement.amount,
                    );
                    if pulled.is_err() {
                        host.state_mut().rescind_settlement();
                        logger.log(&AuctionEvent::unsold())?;
                        return Ok(());
                    }
                }
            }
            ledger::deliver_item(host, &item, controller, settlement.account)?;
            logger.log(&AuctionEvent::settled(&settlement.account, settlement.amount))?;
        }
        EndOutcome::Unsold { displaced } => {
            if let Some(previous) = displaced {
                if matches!(payment, Payment::Ccd) {
                    host.invoke_transfer(
                        &previous.bidder,
                        Amount::from_micro_ccd(previous.amount),
                    )?;
                }
            }
            logger.log(&AuctionEvent::unsold())?;
        }
    }

    Ok(())
}

/// Read-only snapshot of the auction. Unlike every other entrypoint this
/// also answers on an unconfigured instance, reporting `config: None`.
#[receive(
    contract = "NftDutchAuction",
    name = "view",
    return_value = "ViewResult",
    error = "ContractError"
)]
fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ViewResult> {
    let state = host.state();
    Ok(ViewResult {
        controller: state.controller,
        config: state.config.clone(),
        phase: state.phase,
        start_tick: state.start_tick,
        current_price: state.current_price(current_tick(ctx)).ok(),
        winner: state.winner.map(|settlement| settlement.account),
        winning_amount: state.winner.map(|settlement| settlement.amount),
    })
}

/// Computed admissible price at the current tick.
#[receive(
    contract = "NftDutchAuction",
    name = "currentPrice",
    return_value = "PaymentAmount",
    error = "ContractError"
)]
fn contract_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<PaymentAmount> {
    host.state().current_price(current_tick(ctx))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::events;
    use crate::external::{PermitMessage, PermitParam};
    use crate::schedule::Schedule;
    use commons::Token;
    use concordium_cis2::TokenIdVec;
    use concordium_std::collections::BTreeMap;
    use test_infrastructure::*;

    const CONTROLLER: AccountAddress = AccountAddress([0u8; 32]);
    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const PAYMENT_TOKEN: ContractAddress = ContractAddress {
        index: 5,
        subindex: 0,
    };
    const ITEM_CONTRACT: ContractAddress = ContractAddress {
        index: 7,
        subindex: 0,
    };

    const RESERVE: PaymentAmount = 100;
    const STEP: PaymentAmount = 10;
    const DURATION: u64 = 10;

    type Host = TestHost<State<TestStateApi>>;

    fn item() -> Token {
        Token {
            contract: ITEM_CONTRACT,
            id: TokenIdVec(vec![0, 1]),
        }
    }

    fn descending() -> Schedule {
        Schedule::Descending {
            reserve: RESERVE,
            step: STEP,
        }
    }

    fn ascending() -> Schedule {
        Schedule::Ascending {
            reserve: RESERVE,
            step: STEP,
        }
    }

    fn init_params(payment: Payment, schedule: Schedule) -> InitializeParams {
        InitializeParams {
            payment,
            item: item(),
            schedule,
            duration_ticks: DURATION,
        }
    }

    fn receive_ctx<'a>(sender: AccountAddress, tick: Tick) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_metadata_slot_time(Timestamp::from_timestamp_millis(tick));
        ctx
    }

    fn fresh_host() -> Host {
        let mut state_builder = TestStateBuilder::new();
        let state = State::new(&mut state_builder, CONTROLLER);
        TestHost::new(state, state_builder)
    }

    fn call_initialize(
        host: &mut Host,
        sender: AccountAddress,
        params: &InitializeParams,
    ) -> ContractResult<()> {
        let parameter_bytes = to_bytes(params);
        let mut ctx = receive_ctx(sender, 0);
        ctx.set_parameter(&parameter_bytes);
        let mut logger = TestLogger::init();
        contract_initialize(&ctx, host, &mut logger)
    }

    fn call_start(host: &mut Host, sender: AccountAddress, tick: Tick) -> ContractResult<()> {
        let ctx = receive_ctx(sender, tick);
        let mut logger = TestLogger::init();
        contract_start(&ctx, host, &mut logger)
    }

    fn call_bid(
        host: &mut Host,
        bidder: AccountAddress,
        tick: Tick,
        carried: Amount,
        params: &BidParams,
    ) -> ContractResult<()> {
        let parameter_bytes = to_bytes(params);
        let mut ctx = receive_ctx(bidder, tick);
        ctx.set_parameter(&parameter_bytes);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, host, carried, &mut logger)
    }

    fn call_end(host: &mut Host, sender: AccountAddress, tick: Tick) -> ContractResult<()> {
        let ctx = receive_ctx(sender, tick);
        let mut logger = TestLogger::init();
        contract_end(&ctx, host, &mut logger)
    }

    fn ccd_bid(amount: PaymentAmount) -> (Amount, BidParams) {
        (
            Amount::from_micro_ccd(amount),
            BidParams {
                offer: 0,
                permit: None,
            },
        )
    }

    fn open_ccd_auction(host: &mut Host, schedule: Schedule) {
        call_initialize(host, CONTROLLER, &init_params(Payment::Ccd, schedule))
            .expect_report("initialize should succeed");
        call_start(host, CONTROLLER, 0).expect_report("start should succeed");
    }

    fn mock_transfer_ok(host: &mut Host, contract: ContractAddress) {
        host.setup_mock_entrypoint(
            contract,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::returning_ok(()),
        );
    }

    fn permit_param() -> PermitParam {
        PermitParam {
            signature: AccountSignatures {
                sigs: BTreeMap::new(),
            },
            signer: ALICE,
            message: PermitMessage {
                contract_address: PAYMENT_TOKEN,
                nonce: 0,
                timestamp: Timestamp::from_timestamp_millis(u64::MAX),
                entry_point: OwnedEntrypointName::new_unchecked("updateOperator".into()),
                payload: Vec::new(),
            },
        }
    }

    #[concordium_test]
    fn test_init_creates_unconfigured_auction() {
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(CONTROLLER);
        let mut state_builder = TestStateBuilder::new();

        let state = contract_init(&ctx, &mut state_builder)
            .expect_report("init should succeed");

        claim_eq!(state.controller, CONTROLLER);
        claim_eq!(state.phase, crate::state::Phase::NotStarted);
        claim!(state.config.is_none());
    }

    #[concordium_test]
    fn test_initialize_is_guarded_and_one_time() {
        let mut host = fresh_host();
        let params = init_params(Payment::Ccd, descending());

        claim_eq!(
            call_initialize(&mut host, ALICE, &params),
            Err(ContractError::Unauthorized)
        );
        call_initialize(&mut host, CONTROLLER, &params)
            .expect_report("initialize should succeed");
        claim_eq!(
            call_initialize(&mut host, CONTROLLER, &params),
            Err(ContractError::AlreadyInitialized)
        );
    }

    #[concordium_test]
    fn test_operations_require_initialization() {
        let mut host = fresh_host();
        claim_eq!(
            call_start(&mut host, CONTROLLER, 0),
            Err(ContractError::Uninitialized)
        );
        let (carried, params) = ccd_bid(200);
        claim_eq!(
            call_bid(&mut host, ALICE, 0, carried, &params),
            Err(ContractError::Uninitialized)
        );
    }

    #[concordium_test]
    fn test_start_guards() {
        let mut host = fresh_host();
        call_initialize(&mut host, CONTROLLER, &init_params(Payment::Ccd, descending()))
            .expect_report("initialize should succeed");

        claim_eq!(
            call_start(&mut host, ALICE, 0),
            Err(ContractError::Unauthorized)
        );
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");
        // Same outcome no matter how many ticks have elapsed.
        claim_eq!(
            call_start(&mut host, ALICE, 5),
            Err(ContractError::Unauthorized)
        );
        claim_eq!(
            call_start(&mut host, CONTROLLER, 5),
            Err(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_bid_before_start_is_invalid() {
        let mut host = fresh_host();
        call_initialize(&mut host, CONTROLLER, &init_params(Payment::Ccd, descending()))
            .expect_report("initialize should succeed");
        let (carried, params) = ccd_bid(200);
        claim_eq!(
            call_bid(&mut host, ALICE, 0, carried, &params),
            Err(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_low_bid_changes_nothing() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, descending());

        let (carried, params) = ccd_bid(90);
        claim_eq!(
            call_bid(&mut host, ALICE, 1, carried, &params),
            Err(ContractError::BidTooLow)
        );
        claim_eq!(host.state().phase, crate::state::Phase::Open);
        claim!(host.state().winner.is_none());
        claim!(host.get_transfers().is_empty());
    }

    #[concordium_test]
    fn test_descending_settlement_moves_exact_offer() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, descending());
        mock_transfer_ok(&mut host, ITEM_CONTRACT);
        host.set_self_balance(Amount::from_micro_ccd(110));

        let parameter_bytes = to_bytes(&ccd_bid(110).1);
        let mut ctx = receive_ctx(ALICE, 9);
        ctx.set_parameter(&parameter_bytes);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, &mut host, Amount::from_micro_ccd(110), &mut logger)
            .expect_report("bid should settle");

        let state = host.state();
        claim_eq!(state.phase, crate::state::Phase::Closed);
        claim_eq!(
            state.winner,
            Some(crate::state::Settlement {
                account: ALICE,
                amount: 110
            })
        );
        // The seller receives exactly the offered amount, nothing else.
        claim_eq!(
            host.get_transfers(),
            [(CONTROLLER, Amount::from_micro_ccd(110))]
        );
        claim!(logger.logs.iter().any(|log| log[0] == events::SETTLED_TAG));

        // The race has a single winner: later bids fail on the phase
        // guard, and the winner on the repeated-buyer guard.
        let (carried, params) = ccd_bid(200);
        claim_eq!(
            call_bid(&mut host, BOB, 9, carried, &params),
            Err(ContractError::InvalidState)
        );
        claim_eq!(
            call_bid(&mut host, ALICE, 9, carried, &params),
            Err(ContractError::AlreadySettledByCaller)
        );
    }

    #[concordium_test]
    fn test_bid_at_expiry_boundary_is_expired() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, descending());

        let (carried, params) = ccd_bid(200);
        claim_eq!(
            call_bid(&mut host, ALICE, DURATION, carried, &params),
            Err(ContractError::Expired)
        );
        claim_eq!(
            call_bid(&mut host, ALICE, DURATION + 3, carried, &params),
            Err(ContractError::Expired)
        );
        claim_eq!(host.state().phase, crate::state::Phase::Open);
    }

    #[concordium_test]
    fn test_end_guards_and_unsold_close() {
        let mut host = fresh_host();
        call_initialize(&mut host, CONTROLLER, &init_params(Payment::Ccd, descending()))
            .expect_report("initialize should succeed");

        claim_eq!(
            call_end(&mut host, CONTROLLER, 0),
            Err(ContractError::InvalidState)
        );
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");
        claim_eq!(call_end(&mut host, ALICE, 1), Err(ContractError::Unauthorized));

        call_end(&mut host, CONTROLLER, 1).expect_report("end should succeed");
        claim_eq!(host.state().phase, crate::state::Phase::Closed);
        claim!(host.state().winner.is_none());
        claim!(host.get_transfers().is_empty());

        claim_eq!(
            call_end(&mut host, CONTROLLER, 2),
            Err(ContractError::InvalidState)
        );
        let (carried, params) = ccd_bid(200);
        claim_eq!(
            call_bid(&mut host, ALICE, 2, carried, &params),
            Err(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_ccd_bid_rejects_bundled_permit() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, descending());

        let params = BidParams {
            offer: 0,
            permit: Some(permit_param()),
        };
        claim_eq!(
            call_bid(&mut host, ALICE, 1, Amount::from_micro_ccd(200), &params),
            Err(ContractError::InvalidBidParameter)
        );
    }

    #[concordium_test]
    fn test_token_bid_rejects_attached_ccd() {
        let mut host = fresh_host();
        call_initialize(
            &mut host,
            CONTROLLER,
            &init_params(
                Payment::Cis2 {
                    contract: PAYMENT_TOKEN,
                },
                descending(),
            ),
        )
        .expect_report("initialize should succeed");
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");

        let params = BidParams {
            offer: 200,
            permit: None,
        };
        claim_eq!(
            call_bid(&mut host, ALICE, 1, Amount::from_micro_ccd(1), &params),
            Err(ContractError::UnexpectedDeposit)
        );
    }

    #[concordium_test]
    fn test_token_settlement_with_permit() {
        let mut host = fresh_host();
        call_initialize(
            &mut host,
            CONTROLLER,
            &init_params(
                Payment::Cis2 {
                    contract: PAYMENT_TOKEN,
                },
                descending(),
            ),
        )
        .expect_report("initialize should succeed");
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");

        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("permit".into()),
            MockFn::returning_ok(()),
        );
        mock_transfer_ok(&mut host, PAYMENT_TOKEN);
        mock_transfer_ok(&mut host, ITEM_CONTRACT);

        let params = BidParams {
            offer: 110,
            permit: Some(permit_param()),
        };
        call_bid(&mut host, ALICE, 9, Amount::zero(), &params)
            .expect_report("bid should settle");

        claim_eq!(host.state().phase, crate::state::Phase::Closed);
        claim_eq!(
            host.state().winner,
            Some(crate::state::Settlement {
                account: ALICE,
                amount: 110
            })
        );
    }

    #[concordium_test]
    fn test_failed_settlement_leaves_auction_open() {
        let mut host = fresh_host();
        call_initialize(
            &mut host,
            CONTROLLER,
            &init_params(
                Payment::Cis2 {
                    contract: PAYMENT_TOKEN,
                },
                descending(),
            ),
        )
        .expect_report("initialize should succeed");
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");
        // Flush the setup so the rollback below restores the open
        // auction, not the freshly created instance.
        host.commit_state();

        // Payment ledger rejects the pull, for example because the
        // bidder's balance or grant is insufficient.
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::returning_err::<()>(CallContractError::Trap),
        );
        mock_transfer_ok(&mut host, ITEM_CONTRACT);

        let params = BidParams {
            offer: 200,
            permit: None,
        };
        let result = host.with_rollback(|host| call_bid(host, ALICE, 1, Amount::zero(), &params));
        claim_eq!(result, Err(ContractError::SettlementFailed));
        claim_eq!(host.state().phase, crate::state::Phase::Open);
        claim!(host.state().winner.is_none());

        // A correctly authorized bid from someone else still wins.
        mock_transfer_ok(&mut host, PAYMENT_TOKEN);
        let params = BidParams {
            offer: 190,
            permit: None,
        };
        call_bid(&mut host, BOB, 1, Amount::zero(), &params)
            .expect_report("bid should settle");
        claim_eq!(
            host.state().winner,
            Some(crate::state::Settlement {
                account: BOB,
                amount: 190
            })
        );
    }

    #[concordium_test]
    fn test_ascending_refunds_displaced_bid() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, ascending());
        host.set_self_balance(Amount::from_micro_ccd(210));

        let (carried, params) = ccd_bid(100);
        call_bid(&mut host, ALICE, 1, carried, &params).expect_report("first raise");
        claim!(host.get_transfers().is_empty());

        let (carried, params) = ccd_bid(105);
        claim_eq!(
            call_bid(&mut host, BOB, 2, carried, &params),
            Err(ContractError::BidTooLow)
        );

        let (carried, params) = ccd_bid(110);
        call_bid(&mut host, BOB, 2, carried, &params).expect_report("second raise");
        claim!(host.transfer_occurred(&ALICE, Amount::from_micro_ccd(100)));
        claim_eq!(host.state().phase, crate::state::Phase::Open);
    }

    #[concordium_test]
    fn test_ascending_end_after_expiry_settles_standing_bid() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, ascending());
        host.set_self_balance(Amount::from_micro_ccd(110));
        mock_transfer_ok(&mut host, ITEM_CONTRACT);

        let (carried, params) = ccd_bid(110);
        call_bid(&mut host, ALICE, 1, carried, &params).expect_report("raise");

        call_end(&mut host, CONTROLLER, DURATION).expect_report("end should settle");
        claim_eq!(
            host.state().winner,
            Some(crate::state::Settlement {
                account: ALICE,
                amount: 110
            })
        );
        claim!(host.transfer_occurred(&CONTROLLER, Amount::from_micro_ccd(110)));
    }

    #[concordium_test]
    fn test_ascending_end_before_expiry_refunds_standing_bid() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, ascending());
        host.set_self_balance(Amount::from_micro_ccd(100));

        let (carried, params) = ccd_bid(100);
        call_bid(&mut host, ALICE, 1, carried, &params).expect_report("raise");

        call_end(&mut host, CONTROLLER, 5).expect_report("end should close unsold");
        claim!(host.state().winner.is_none());
        claim_eq!(host.state().phase, crate::state::Phase::Closed);
        claim!(host.transfer_occurred(&ALICE, Amount::from_micro_ccd(100)));
    }

    #[concordium_test]
    fn test_ascending_end_discards_unpayable_standing_bid() {
        let mut host = fresh_host();
        call_initialize(
            &mut host,
            CONTROLLER,
            &init_params(
                Payment::Cis2 {
                    contract: PAYMENT_TOKEN,
                },
                ascending(),
            ),
        )
        .expect_report("initialize should succeed");
        call_start(&mut host, CONTROLLER, 0).expect_report("start should succeed");

        let params = BidParams {
            offer: 100,
            permit: None,
        };
        call_bid(&mut host, ALICE, 1, Amount::zero(), &params).expect_report("raise");

        // The bidder spent the balance or revoked the grant after
        // raising; every pull against it is rejected.
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::returning_err::<()>(CallContractError::Trap),
        );

        call_end(&mut host, CONTROLLER, DURATION).expect_report("end should close unsold");
        claim_eq!(host.state().phase, crate::state::Phase::Closed);
        claim!(host.state().winner.is_none());
        claim!(!host.state().settled_buyers.contains(&ALICE));
        claim_eq!(
            call_end(&mut host, CONTROLLER, DURATION + 1),
            Err(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_view_reports_price_and_outcome() {
        let mut host = fresh_host();
        open_ccd_auction(&mut host, descending());

        let ctx = receive_ctx(ALICE, 0);
        let snapshot = contract_view(&ctx, &host).expect_report("view should succeed");
        claim_eq!(snapshot.phase, crate::state::Phase::Open);
        claim_eq!(snapshot.start_tick, Some(0));
        claim_eq!(snapshot.current_price, Some(200));
        claim!(snapshot.winner.is_none());

        let ctx = receive_ctx(ALICE, DURATION);
        claim_eq!(
            contract_current_price(&ctx, &host),
            Ok(RESERVE)
        );
    }

    #[concordium_test]
    fn test_view_answers_on_unconfigured_instance() {
        let host = fresh_host();
        let ctx = receive_ctx(ALICE, 0);

        let snapshot = contract_view(&ctx, &host).expect_report("view should succeed");
        claim_eq!(snapshot.controller, CONTROLLER);
        claim!(snapshot.config.is_none());
        claim!(snapshot.current_price.is_none());
        claim!(snapshot.winner.is_none());

        // The dedicated price query still requires configuration.
        claim_eq!(
            contract_current_price(&ctx, &host),
            Err(ContractError::Uninitialized)
        );
    }
}
