use commons::{PaymentAmount, Tick};
use concordium_std::*;

use crate::state::Config;

pub const INITIALIZED_TAG: u8 = 0;
pub const STARTED_TAG: u8 = 1;
pub const BID_TAG: u8 = 2;
pub const OUTBID_TAG: u8 = 3;
pub const SETTLED_TAG: u8 = 4;
pub const UNSOLD_TAG: u8 = 5;

/// Configuration acceptance event data.
#[derive(Debug, Serial)]
pub struct InitializedEvent<'a> {
    /// Accepted configuration.
    pub config: &'a Config,
}

/// Auction opening event data.
#[derive(Debug, Serial)]
pub struct StartedEvent {
    /// Tick at which the auction opened.
    pub start_tick: Tick,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent<'a> {
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Offered amount.
    pub amount: PaymentAmount,
}

/// Displaced bid event data.
#[derive(Debug, Serial)]
pub struct OutbidEvent<'a> {
    /// Displaced bidder account address.
    pub bidder: &'a AccountAddress,
    /// Displaced offer.
    pub amount: PaymentAmount,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct SettledEvent<'a> {
    /// Auction winner.
    pub winner: &'a AccountAddress,
    /// Price paid.
    pub amount: PaymentAmount,
}

/// Tagged event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvent<'a> {
    Initialized(InitializedEvent<'a>),
    Started(StartedEvent),
    Bid(BidEvent<'a>),
    Outbid(OutbidEvent<'a>),
    Settled(SettledEvent<'a>),
    Unsold,
}

impl<'a> AuctionEvent<'a> {
    pub fn initialized(config: &'a Config) -> Self {
        Self::Initialized(InitializedEvent { config })
    }

    pub fn started(start_tick: Tick) -> Self {
        Self::Started(StartedEvent { start_tick })
    }

    pub fn bid(bidder: &'a AccountAddress, amount: PaymentAmount) -> Self {
        Self::Bid(BidEvent { bidder, amount })
    }

    pub fn outbid(bidder: &'a AccountAddress, amount: PaymentAmount) -> Self {
        Self::Outbid(OutbidEvent { bidder, amount })
    }

    pub fn settled(winner: &'a AccountAddress, amount: PaymentAmount) -> Self {
        Self::Settled(SettledEvent { winner, amount })
    }

    pub fn unsold() -> Self {
        Self::Unsold
    }
}

impl<'a> Serial for AuctionEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvent::Initialized(event) => {
                out.write_u8(INITIALIZED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Started(event) => {
                out.write_u8(STARTED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Bid(event) => {
                out.write_u8(BID_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Outbid(event) => {
                out.write_u8(OUTBID_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Settled(event) => {
                out.write_u8(SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Unsold => out.write_u8(UNSOLD_TAG),
        }
    }
}
