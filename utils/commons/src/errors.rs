use concordium_std::*;

/// Every reason an auction call may be rejected. A rejected call has no
/// effect; the host reverts all state changes and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Reject, SchemaType)]
pub enum ContractError {
    /// Failed to parse the parameter.
    #[from(ParseError)]
    ParseParams,
    /// Log is full.
    LogFull,
    /// Log is malformed.
    LogMalformed,
    /// Caller is not allowed to perform this operation.
    Unauthorized,
    /// The instance has not received its configuration yet.
    Uninitialized,
    /// The one-time initializer was invoked a second time.
    AlreadyInitialized,
    /// Operation is not valid in the current lifecycle phase.
    InvalidState,
    /// The auction time window has elapsed.
    Expired,
    /// Offered amount is below the admissible price.
    BidTooLow,
    /// The asset exchange could not complete.
    SettlementFailed,
    /// This account has already settled a purchase.
    AlreadySettledByCaller,
    /// Only accounts may call this operation.
    OnlyAccountAddress,
    /// CCD was attached to a call that must not carry any.
    UnexpectedDeposit,
    /// Bid parameters do not match the configured payment mode.
    InvalidBidParameter,
}

pub type ContractResult<T> = Result<T, ContractError>;

impl From<LogError> for ContractError {
    fn from(error: LogError) -> Self {
        match error {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

impl From<TransferError> for ContractError {
    fn from(_: TransferError) -> Self {
        Self::SettlementFailed
    }
}

impl<T> From<CallContractError<T>> for ContractError {
    fn from(_: CallContractError<T>) -> Self {
        Self::SettlementFailed
    }
}
