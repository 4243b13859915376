use soroban_sdk::contracttype;

/// One account's locked collateral and outstanding debt.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Position {
    // Collateral asset, 18 decimals
    pub collateral_amount: i128,
    // Borrowed asset, 6 decimals
    pub borrowed_amount: i128,
    pub last_update_time: u64,
    // Set on the first deposit, never cleared
    pub is_active: bool,
}

/// Result of a validator-triggered deleveraging.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Liquidation {
    pub burned_collateral: i128,
    pub debt_written_off: i128,
    pub ratio_before: i128,
}
