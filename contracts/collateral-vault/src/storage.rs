use soroban_sdk::{contracttype, Address, Env};

use crate::error::Error;
use crate::types::Position;

// ---------- TTL constants ----------
// Testnet: ~5s per ledger
// 30 days  ≈  518_400 ledgers
// 180 days ≈ 3_110_400 ledgers
const INSTANCE_LIFETIME_THRESHOLD: u32 = 100_800; // ~7 days
const INSTANCE_BUMP_AMOUNT: u32 = 518_400; // bump to ~30 days
const ACCOUNT_LIFETIME_THRESHOLD: u32 = 518_400; // ~30 days
const ACCOUNT_BUMP_AMOUNT: u32 = 3_110_400; // bump to ~180 days

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Admin,
    CollateralToken,
    BorrowToken,
    Price,
    TotalCollateral,
    TotalBorrowed,
    ValidatorCount,
    Initialized,
    Position(Address),
    Validator(Address),
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn extend_account_entry(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, ACCOUNT_LIFETIME_THRESHOLD, ACCOUNT_BUMP_AMOUNT);
}

//  INITIALIZED STATE

pub fn is_initialized(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Initialized)
        .unwrap_or(false)
}

pub fn set_initialized(env: &Env) {
    env.storage().instance().set(&DataKey::Initialized, &true);
}

// PRICE AUTHORITY

pub fn read_admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn write_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
}

// TOKENS

pub fn read_collateral_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::CollateralToken)
        .ok_or(Error::NotInitialized)
}

pub fn read_borrow_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::BorrowToken)
        .ok_or(Error::NotInitialized)
}

pub fn write_tokens(env: &Env, collateral_token: &Address, borrow_token: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::CollateralToken, collateral_token);
    env.storage().instance().set(&DataKey::BorrowToken, borrow_token);
}

// PRICE

pub fn read_price(env: &Env) -> Result<i128, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Price)
        .ok_or(Error::NotInitialized)
}

pub fn write_price(env: &Env, price: i128) {
    env.storage().instance().set(&DataKey::Price, &price);
}

// TOTALS

pub fn read_total(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

pub fn write_total(env: &Env, key: &DataKey, val: i128) {
    env.storage().instance().set(key, &val);
}

// POSITIONS

pub fn read_position(env: &Env, account: &Address) -> Position {
    let key = DataKey::Position(account.clone());
    match env.storage().persistent().get::<_, Position>(&key) {
        Some(position) => {
            extend_account_entry(env, &key);
            position
        }
        None => Position::default(),
    }
}

pub fn write_position(env: &Env, account: &Address, position: &Position) {
    let key = DataKey::Position(account.clone());
    env.storage().persistent().set(&key, position);
    extend_account_entry(env, &key);
}

// VALIDATORS

pub fn is_validator(env: &Env, account: &Address) -> bool {
    let key = DataKey::Validator(account.clone());
    let registered = env.storage().persistent().has(&key);
    if registered {
        extend_account_entry(env, &key);
    }
    registered
}

/// Returns false when the account was already registered.
pub fn add_validator(env: &Env, account: &Address) -> bool {
    if is_validator(env, account) {
        return false;
    }
    let key = DataKey::Validator(account.clone());
    env.storage().persistent().set(&key, &true);
    extend_account_entry(env, &key);

    let count = read_validator_count(env);
    env.storage()
        .instance()
        .set(&DataKey::ValidatorCount, &(count + 1));
    true
}

pub fn read_validator_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::ValidatorCount)
        .unwrap_or(0)
}
