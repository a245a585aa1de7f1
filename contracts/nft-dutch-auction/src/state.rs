use commons::{ContractError, ContractResult, PaymentAmount, Tick, Token};
use concordium_std::*;

use crate::schedule::Schedule;

/// Payment asset accepted by the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Payment {
    /// Native CCD, carried and escrowed by the bid call itself.
    Ccd,
    /// CIS-2 fungible token, pulled from the bidder under an operator
    /// grant or a permit bundled with the bid.
    Cis2 { contract: ContractAddress },
}

/// Auction configuration, supplied exactly once through `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Config {
    /// Payment asset.
    pub payment: Payment,
    /// The token being sold. The controller must keep this contract an
    /// operator of the lot on the item ledger until settlement.
    pub item: Token,
    /// Price strategy.
    pub schedule: Schedule,
    /// Number of ticks the auction stays open once started.
    pub duration_ticks: u64,
}

/// Lifecycle phase. Only ever moves forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Phase {
    NotStarted,
    Open,
    Closed,
}

/// Highest standing offer of an ascending auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct StandingBid {
    pub bidder: AccountAddress,
    pub amount: PaymentAmount,
    pub tick: Tick,
}

/// Recorded winner and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct Settlement {
    pub account: AccountAddress,
    pub amount: PaymentAmount,
}

/// What the `bid` entrypoint must do to complete the call.
#[must_use]
pub enum BidOutcome {
    /// Lot settled at the offered amount; both exchange legs run now.
    Settle(Settlement),
    /// Offer recorded as the new standing bid; an escrowed displaced bid
    /// must be refunded.
    Raised { displaced: Option<StandingBid> },
}

/// What the `end` entrypoint must do to complete the call.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum EndOutcome {
    /// The standing bid won at expiry; both exchange legs run now.
    Settle(Settlement),
    /// Closed without a winner; an escrowed standing bid must be
    /// refunded.
    Unsold { displaced: Option<StandingBid> },
}

/// The contract state: a single auction record.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Account allowed to initialize, start and end the auction. Also
    /// the seller: payment is forwarded to it and the lot leaves it.
    pub controller: AccountAddress,
    /// `None` until the one-time `initialize` call.
    pub config: Option<Config>,
    pub phase: Phase,
    /// Tick at which the auction opened. Set exactly once.
    pub start_tick: Option<Tick>,
    /// Standing offer of an ascending auction, superseded on every raise.
    pub highest_bid: Option<StandingBid>,
    /// Set at most once, by the transition that closes the auction with
    /// a sale.
    pub winner: Option<Settlement>,
    /// Accounts that have already settled a purchase. Consulted on every
    /// bid before any lifecycle check.
    pub settled_buyers: StateSet<AccountAddress, S>,
}

impl<S: HasStateApi> State<S> {
    /// An unconfigured auction owned by `controller`.
    pub fn new(state_builder: &mut StateBuilder<S>, controller: AccountAddress) -> Self {
        State {
            controller,
            config: None,
            phase: Phase::NotStarted,
            start_tick: None,
            highest_bid: None,
            winner: None,
            settled_buyers: state_builder.new_set(),
        }
    }

    /// Accept the configuration. Rejects a second call, keeping the
    /// deferred initializer a one-time operation.
    pub fn initialize(&mut self, config: Config) -> ContractResult<()> {
        ensure!(
            self.config.is_none(),
            ContractError::AlreadyInitialized
        );
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> ContractResult<&Config> {
        self.config.as_ref().ok_or(ContractError::Uninitialized)
    }

    /// Open the auction at `now`.
    pub fn start(&mut self, now: Tick) -> ContractResult<()> {
        self.config()?;
        ensure!(
            matches!(self.phase, Phase::NotStarted),
            ContractError::InvalidState
        );
        self.phase = Phase::Open;
        self.start_tick = Some(now);
        Ok(())
    }

    fn elapsed(&self, now: Tick) -> u64 {
        now.saturating_sub(self.start_tick.unwrap_or(now))
    }

    /// Computed price of the lot at `now`. Defined from the start tick
    /// onwards; once fully decayed it stays clamped at the reserve.
    pub fn current_price(&self, now: Tick) -> ContractResult<PaymentAmount> {
        let config = self.config()?;
        ensure!(self.start_tick.is_some(), ContractError::InvalidState);
        Ok(config.schedule.threshold(
            config.duration_ticks,
            self.elapsed(now),
            self.highest_bid.map(|bid| bid.amount),
        ))
    }

    /// Admit a bid of `offer` placed by `bidder` at `now`.
    ///
    /// Guards run in a fixed order: repeated-buyer check, lifecycle
    /// phase, expiry (exclusive boundary: a bid at exactly
    /// `duration_ticks` elapsed is already expired), then the price
    /// threshold. A descending auction settles immediately; an ascending
    /// one records the offer and reports the displaced bid.
    pub fn place_bid(
        &mut self,
        bidder: AccountAddress,
        offer: PaymentAmount,
        now: Tick,
    ) -> ContractResult<BidOutcome> {
        let (schedule, duration_ticks) = {
            let config = self.config()?;
            (config.schedule, config.duration_ticks)
        };
        ensure!(
            !self.settled_buyers.contains(&bidder),
            ContractError::AlreadySettledByCaller
        );
        ensure!(matches!(self.phase, Phase::Open), ContractError::InvalidState);
        let elapsed = self.elapsed(now);
        ensure!(elapsed < duration_ticks, ContractError::Expired);
        let threshold = schedule.threshold(
            duration_ticks,
            elapsed,
            self.highest_bid.map(|bid| bid.amount),
        );
        ensure!(offer >= threshold, ContractError::BidTooLow);

        if schedule.is_ascending() {
            let displaced = self.highest_bid.replace(StandingBid {
                bidder,
                amount: offer,
                tick: now,
            });
            Ok(BidOutcome::Raised { displaced })
        } else {
            Ok(BidOutcome::Settle(self.settle(bidder, offer)))
        }
    }

    /// Close the auction. Past expiry an ascending auction settles to
    /// its standing bid; in every other case the lot goes unsold.
    pub fn end(&mut self, now: Tick) -> ContractResult<EndOutcome> {
        let (schedule, duration_ticks) = {
            let config = self.config()?;
            (config.schedule, config.duration_ticks)
        };
        ensure!(matches!(self.phase, Phase::Open), ContractError::InvalidState);
        let expired = self.elapsed(now) >= duration_ticks;
        match self.highest_bid {
            Some(standing) if schedule.is_ascending() && expired => {
                Ok(EndOutcome::Settle(self.settle(standing.bidder, standing.amount)))
            }
            displaced => {
                self.phase = Phase::Closed;
                Ok(EndOutcome::Unsold { displaced })
            }
        }
    }

    /// Withdraw a recorded settlement whose payment leg was rejected,
    /// leaving an unsold close. The discarded bidder may buy again.
    pub fn rescind_settlement(&mut self) {
        if let Some(settlement) = self.winner.take() {
            self.settled_buyers.remove(&settlement.account);
        }
        self.highest_bid = None;
    }

    // Record the winner and close. Runs before any ledger invoke so a
    // re-entrant call observes the Closed phase.
    fn settle(&mut self, account: AccountAddress, amount: PaymentAmount) -> Settlement {
        let settlement = Settlement { account, amount };
        self.winner = Some(settlement);
        self.settled_buyers.insert(account);
        self.phase = Phase::Closed;
        settlement
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis2::TokenIdVec;
    use test_infrastructure::*;

    const CONTROLLER: AccountAddress = AccountAddress([0u8; 32]);
    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);

    fn config(schedule: Schedule) -> Config {
        Config {
            payment: Payment::Ccd,
            item: Token {
                contract: ContractAddress {
                    index: 7,
                    subindex: 0,
                },
                id: TokenIdVec(vec![0, 1]),
            },
            schedule,
            duration_ticks: 10,
        }
    }

    fn descending() -> Schedule {
        Schedule::Descending {
            reserve: 100,
            step: 10,
        }
    }

    fn open_state(state_builder: &mut TestStateBuilder, schedule: Schedule) -> State<TestStateApi> {
        let mut state = State::new(state_builder, CONTROLLER);
        state.initialize(config(schedule)).expect_report("initialize");
        state.start(0).expect_report("start");
        state
    }

    #[concordium_test]
    fn test_initialize_only_once() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, CONTROLLER);
        claim_eq!(state.config(), Err(ContractError::Uninitialized));
        state.initialize(config(descending())).expect_report("initialize");
        claim_eq!(
            state.initialize(config(descending())),
            Err(ContractError::AlreadyInitialized)
        );
    }

    #[concordium_test]
    fn test_start_requires_configuration() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, CONTROLLER);
        claim_eq!(state.start(0), Err(ContractError::Uninitialized));
    }

    #[concordium_test]
    fn test_phase_never_regresses() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = open_state(&mut state_builder, descending());
        claim_eq!(state.start(1), Err(ContractError::InvalidState));
        state.end(1).expect_report("end");
        claim_eq!(state.phase, Phase::Closed);
        claim_eq!(state.start(2), Err(ContractError::InvalidState));
        claim_eq!(state.end(2), Err(ContractError::InvalidState));
    }

    #[concordium_test]
    fn test_bid_before_start_is_invalid() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, CONTROLLER);
        state.initialize(config(descending())).expect_report("initialize");
        claim_eq!(
            state.place_bid(ALICE, 200, 0).err(),
            Some(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_expiry_boundary_is_exclusive() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = open_state(&mut state_builder, descending());
        claim_eq!(
            state.place_bid(ALICE, 200, 10).err(),
            Some(ContractError::Expired)
        );
        // One tick earlier the lot is still admissible at its price.
        match state.place_bid(ALICE, 110, 9) {
            Ok(BidOutcome::Settle(settlement)) => {
                claim_eq!(settlement.account, ALICE);
                claim_eq!(settlement.amount, 110);
            }
            _ => fail!("expected settlement"),
        }
    }

    #[concordium_test]
    fn test_repeated_buyer_check_precedes_phase_check() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = open_state(&mut state_builder, descending());
        match state.place_bid(ALICE, 200, 0) {
            Ok(BidOutcome::Settle(_)) => (),
            _ => fail!("expected settlement"),
        }
        // The winner is told they already bought the lot, everyone else
        // that the auction is over.
        claim_eq!(
            state.place_bid(ALICE, 200, 1).err(),
            Some(ContractError::AlreadySettledByCaller)
        );
        claim_eq!(
            state.place_bid(BOB, 200, 1).err(),
            Some(ContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_low_bid_leaves_state_untouched() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = open_state(&mut state_builder, descending());
        claim_eq!(
            state.place_bid(ALICE, 90, 1).err(),
            Some(ContractError::BidTooLow)
        );
        claim_eq!(state.phase, Phase::Open);
        claim!(state.winner.is_none());
    }

    #[concordium_test]
    fn test_ascending_raise_and_settle_at_expiry() {
        let mut state_builder = TestStateBuilder::new();
        let ascending = Schedule::Ascending {
            reserve: 100,
            step: 10,
        };
        let mut state = open_state(&mut state_builder, ascending);

        match state.place_bid(ALICE, 100, 1) {
            Ok(BidOutcome::Raised { displaced: None }) => (),
            _ => fail!("expected first raise"),
        }
        claim_eq!(
            state.place_bid(BOB, 105, 2).err(),
            Some(ContractError::BidTooLow)
        );
        match state.place_bid(BOB, 110, 2) {
            Ok(BidOutcome::Raised {
                displaced: Some(previous),
            }) => {
                claim_eq!(previous.bidder, ALICE);
                claim_eq!(previous.amount, 100);
            }
            _ => fail!("expected displaced bid"),
        }

        match state.end(10) {
            Ok(EndOutcome::Settle(settlement)) => {
                claim_eq!(settlement.account, BOB);
                claim_eq!(settlement.amount, 110);
            }
            _ => fail!("expected settlement at expiry"),
        }
        claim_eq!(state.phase, Phase::Closed);
    }

    #[concordium_test]
    fn test_rescinded_settlement_discards_winner() {
        let mut state_builder = TestStateBuilder::new();
        let ascending = Schedule::Ascending {
            reserve: 100,
            step: 10,
        };
        let mut state = open_state(&mut state_builder, ascending);
        match state.place_bid(ALICE, 100, 1) {
            Ok(BidOutcome::Raised { .. }) => (),
            _ => fail!("expected raise"),
        }
        match state.end(10) {
            Ok(EndOutcome::Settle(_)) => (),
            _ => fail!("expected settlement at expiry"),
        }

        state.rescind_settlement();
        claim_eq!(state.phase, Phase::Closed);
        claim!(state.winner.is_none());
        claim!(state.highest_bid.is_none());
        claim!(!state.settled_buyers.contains(&ALICE));
    }

    #[concordium_test]
    fn test_ascending_end_before_expiry_is_unsold() {
        let mut state_builder = TestStateBuilder::new();
        let ascending = Schedule::Ascending {
            reserve: 100,
            step: 10,
        };
        let mut state = open_state(&mut state_builder, ascending);
        match state.place_bid(ALICE, 100, 1) {
            Ok(BidOutcome::Raised { .. }) => (),
            _ => fail!("expected raise"),
        }

        match state.end(5) {
            Ok(EndOutcome::Unsold {
                displaced: Some(previous),
            }) => claim_eq!(previous.bidder, ALICE),
            _ => fail!("expected unsold close with refund"),
        }
        claim!(state.winner.is_none());
    }
}
