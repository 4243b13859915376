use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,

    NotInitialized = 2,

    // Caller is not the price authority, or not a registered validator
    Unauthorized = 3,

    InvalidAmount = 4,

    InvalidPrice = 5,

    // The change would leave the position under MIN_RATIO
    InsufficientCollateralRatio = 6,

    PositionInactive = 7,

    PositionSafe = 8,

    DivisionByZero = 9,

    ArithmeticOverflow = 10,

    InsufficientCollateral = 11,

    // Vault custody holds less of the borrow token than the payout
    InsufficientLiquidity = 12,

    NothingToRepay = 13,
}
