#![no_std]

use soroban_sdk::{contract, contractimpl, log, token, Address, BytesN, Env};

mod error;
mod events;
mod fixed_point;
mod storage;
mod types;

pub use error::Error;
pub use types::{Liquidation, Position};

use fixed_point::{deleverage, max_debt_for, ratio_percent};
use storage::{
    add_validator, extend_instance, is_initialized, read_admin, read_borrow_token,
    read_collateral_token, read_position, read_price, read_total, read_validator_count,
    set_initialized, write_admin, write_position, write_price, write_tokens, write_total,
    DataKey,
};

/// Minimum collateralization ratio, in percent.
pub const MIN_RATIO: i128 = 200;

/// Ratio reported for a position that owes nothing.
pub const NO_DEBT_RATIO: i128 = i128::MAX;

#[contract]
pub struct CollateralVault;

#[contractimpl]
impl CollateralVault {
    /// Stores the price authority, both token contracts and the opening price.
    pub fn initialize(
        env: Env,
        admin: Address,
        collateral_token: Address,
        borrow_token: Address,
        initial_price: i128,
    ) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        if initial_price <= 0 {
            return Err(Error::InvalidPrice);
        }

        write_admin(&env, &admin);
        write_tokens(&env, &collateral_token, &borrow_token);
        write_price(&env, initial_price);
        write_total(&env, &DataKey::TotalCollateral, 0);
        write_total(&env, &DataKey::TotalBorrowed, 0);
        set_initialized(&env);
        extend_instance(&env);

        events::initialized(&env, admin, initial_price);
        log!(&env, "CollateralVault: Initialized", initial_price);
        Ok(())
    }

    /// Upgrade the contract WASM. Only callable by the price authority.
    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), Error> {
        let admin = read_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Bump instance TTL, callable by anyone.
    pub fn bump_instance(env: Env) {
        extend_instance(&env);
    }

    // ==========================================================
    // Roles
    // ==========================================================

    /// Self-registration into the validator set. Registering twice is a no-op.
    pub fn register_validator(env: Env, caller: Address) -> Result<(), Error> {
        Self::ensure_initialized(&env)?;
        caller.require_auth();
        extend_instance(&env);

        if add_validator(&env, &caller) {
            events::validator_registered(&env, caller.clone());
            log!(&env, "Validator registered", caller);
        }
        Ok(())
    }

    /// Replaces the global price. Existing positions are not re-checked here;
    /// a breach surfaces on the next read or liquidation of each account.
    pub fn update_price(env: Env, caller: Address, new_price: i128) -> Result<(), Error> {
        caller.require_auth();
        Self::require_price_authority(&env, &caller)?;

        if new_price <= 0 {
            return Err(Error::InvalidPrice);
        }
        extend_instance(&env);

        let old_price = read_price(&env)?;
        write_price(&env, new_price);

        events::price_updated(&env, old_price, new_price);
        log!(&env, "Price updated", old_price, new_price);
        Ok(())
    }

    /// Hands the price authority role to `new_authority`.
    pub fn set_price_authority(
        env: Env,
        caller: Address,
        new_authority: Address,
    ) -> Result<(), Error> {
        caller.require_auth();
        Self::require_price_authority(&env, &caller)?;
        extend_instance(&env);

        write_admin(&env, &new_authority);

        events::authority_changed(&env, caller, new_authority);
        Ok(())
    }

    // ==========================================================
    // Positions
    // ==========================================================

    /// Locks `collateral_amount` and borrows `borrow_amount` against it in one
    /// step. A zero borrow is a plain top-up and is always accepted.
    pub fn deposit_collateral_and_borrow(
        env: Env,
        caller: Address,
        collateral_amount: i128,
        borrow_amount: i128,
    ) -> Result<Position, Error> {
        caller.require_auth();

        if collateral_amount <= 0 || borrow_amount < 0 {
            return Err(Error::InvalidAmount);
        }

        Self::grow_position(&env, &caller, collateral_amount, borrow_amount)
    }

    pub fn deposit_collateral(env: Env, caller: Address, amount: i128) -> Result<Position, Error> {
        caller.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        Self::grow_position(&env, &caller, amount, 0)
    }

    /// Borrows more against collateral that is already locked.
    pub fn borrow(env: Env, caller: Address, amount: i128) -> Result<Position, Error> {
        caller.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if !read_position(&env, &caller).is_active {
            return Err(Error::PositionInactive);
        }

        Self::grow_position(&env, &caller, 0, amount)
    }

    /// Pays back debt. Amounts above the outstanding debt are clamped.
    pub fn repay(env: Env, caller: Address, amount: i128) -> Result<Position, Error> {
        caller.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        Self::ensure_initialized(&env)?;
        extend_instance(&env);

        let mut position = read_position(&env, &caller);
        if position.borrowed_amount == 0 {
            return Err(Error::NothingToRepay);
        }

        let repay_amount = amount.min(position.borrowed_amount);
        position.borrowed_amount -= repay_amount;
        position.last_update_time = env.ledger().timestamp();
        write_position(&env, &caller, &position);

        let total = read_total(&env, &DataKey::TotalBorrowed);
        write_total(&env, &DataKey::TotalBorrowed, total - repay_amount);

        let borrow_token = read_borrow_token(&env)?;
        token::Client::new(&env, &borrow_token).transfer(
            &caller,
            &env.current_contract_address(),
            &repay_amount,
        );

        events::repaid(&env, caller, repay_amount);
        log!(&env, "Repaid", repay_amount);
        Ok(position)
    }

    /// Releases collateral as long as the remaining debt stays at MIN_RATIO.
    pub fn withdraw_collateral(
        env: Env,
        caller: Address,
        amount: i128,
    ) -> Result<Position, Error> {
        caller.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        extend_instance(&env);

        let price = read_price(&env)?;
        let mut position = read_position(&env, &caller);
        if amount > position.collateral_amount {
            return Err(Error::InsufficientCollateral);
        }

        let new_collateral = position.collateral_amount - amount;
        Self::ensure_safe(new_collateral, price, position.borrowed_amount)?;

        position.collateral_amount = new_collateral;
        position.last_update_time = env.ledger().timestamp();
        write_position(&env, &caller, &position);

        let total = read_total(&env, &DataKey::TotalCollateral);
        write_total(&env, &DataKey::TotalCollateral, total - amount);

        let collateral_token = read_collateral_token(&env)?;
        token::Client::new(&env, &collateral_token).transfer(
            &env.current_contract_address(),
            &caller,
            &amount,
        );

        events::withdrawn(&env, caller, amount);
        log!(&env, "Withdrew collateral", amount);
        Ok(position)
    }

    // ==========================================================
    // Liquidation
    // ==========================================================

    /// Deleverages a position below MIN_RATIO back to exactly MIN_RATIO.
    ///
    /// Collateral is burned against the debt: the burned amount's value is
    /// written off the borrowed amount, so the remainder sits on the boundary.
    /// Nothing is paid to the validator. A position worth less than its debt
    /// loses all of its collateral and keeps the uncovered debt.
    pub fn check_and_liquidate_position(
        env: Env,
        caller: Address,
        account: Address,
    ) -> Result<Liquidation, Error> {
        caller.require_auth();
        Self::ensure_initialized(&env)?;
        extend_instance(&env);

        if !storage::is_validator(&env, &caller) {
            return Err(Error::Unauthorized);
        }

        let mut position = read_position(&env, &account);
        if !position.is_active {
            return Err(Error::PositionInactive);
        }
        if position.borrowed_amount == 0 {
            return Err(Error::PositionSafe);
        }

        let price = read_price(&env)?;
        let ratio_before = ratio_percent(position.collateral_amount, price, position.borrowed_amount)?;
        if ratio_before >= MIN_RATIO {
            return Err(Error::PositionSafe);
        }

        let (burned_collateral, debt_written_off) = deleverage(
            position.collateral_amount,
            price,
            position.borrowed_amount,
            MIN_RATIO,
        )?;

        position.collateral_amount -= burned_collateral;
        position.borrowed_amount -= debt_written_off;
        position.last_update_time = env.ledger().timestamp();
        write_position(&env, &account, &position);

        let total_collateral = read_total(&env, &DataKey::TotalCollateral);
        write_total(&env, &DataKey::TotalCollateral, total_collateral - burned_collateral);
        let total_borrowed = read_total(&env, &DataKey::TotalBorrowed);
        write_total(&env, &DataKey::TotalBorrowed, total_borrowed - debt_written_off);

        if burned_collateral > 0 {
            let collateral_token = read_collateral_token(&env)?;
            token::Client::new(&env, &collateral_token)
                .burn(&env.current_contract_address(), &burned_collateral);
        }

        events::liquidated(&env, caller, account, burned_collateral, debt_written_off);
        log!(&env, "Liquidated: burned collateral, wrote off debt", burned_collateral, debt_written_off);

        Ok(Liquidation {
            burned_collateral,
            debt_written_off,
            ratio_before,
        })
    }

    pub fn burn_excess_collateral(
        env: Env,
        caller: Address,
        account: Address,
    ) -> Result<Liquidation, Error> {
        Self::check_and_liquidate_position(env, caller, account)
    }

    // --- Views ---

    /// Zero-valued position for accounts that never deposited.
    pub fn get_position(env: Env, account: Address) -> Position {
        read_position(&env, &account)
    }

    /// Current ratio in percent; `NO_DEBT_RATIO` when nothing is owed.
    pub fn check_collateral_ratio(env: Env, account: Address) -> Result<i128, Error> {
        let position = read_position(&env, &account);
        if position.borrowed_amount == 0 {
            return Ok(NO_DEBT_RATIO);
        }
        let price = read_price(&env)?;
        ratio_percent(position.collateral_amount, price, position.borrowed_amount)
    }

    /// Additional debt the account could take on at the current price.
    pub fn max_borrowable(env: Env, account: Address) -> Result<i128, Error> {
        let position = read_position(&env, &account);
        let price = read_price(&env)?;
        let max_debt = max_debt_for(position.collateral_amount, price, MIN_RATIO)?;
        Ok((max_debt - position.borrowed_amount).max(0))
    }

    pub fn get_price(env: Env) -> Result<i128, Error> {
        read_price(&env)
    }

    pub fn get_price_authority(env: Env) -> Result<Address, Error> {
        read_admin(&env)
    }

    /// Returns (collateral token, borrow token).
    pub fn get_tokens(env: Env) -> Result<(Address, Address), Error> {
        Ok((read_collateral_token(&env)?, read_borrow_token(&env)?))
    }

    pub fn is_validator(env: Env, account: Address) -> bool {
        storage::is_validator(&env, &account)
    }

    pub fn validator_count(env: Env) -> u32 {
        read_validator_count(&env)
    }

    pub fn total_collateral(env: Env) -> i128 {
        read_total(&env, &DataKey::TotalCollateral)
    }

    pub fn total_borrowed(env: Env) -> i128 {
        read_total(&env, &DataKey::TotalBorrowed)
    }
}

impl CollateralVault {
    fn ensure_initialized(env: &Env) -> Result<(), Error> {
        if !is_initialized(env) {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn require_price_authority(env: &Env, caller: &Address) -> Result<(), Error> {
        if read_admin(env)? != *caller {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn ensure_safe(collateral_amount: i128, price: i128, borrowed_amount: i128) -> Result<(), Error> {
        if borrowed_amount == 0 {
            return Ok(());
        }
        if ratio_percent(collateral_amount, price, borrowed_amount)? < MIN_RATIO {
            return Err(Error::InsufficientCollateralRatio);
        }
        Ok(())
    }

    // Checks run before any write or transfer so a rejection leaves no trace.
    fn grow_position(
        env: &Env,
        account: &Address,
        collateral_amount: i128,
        borrow_amount: i128,
    ) -> Result<Position, Error> {
        extend_instance(env);

        let price = read_price(env)?;
        let mut position = read_position(env, account);

        let new_collateral = position
            .collateral_amount
            .checked_add(collateral_amount)
            .ok_or(Error::ArithmeticOverflow)?;
        let new_borrowed = position
            .borrowed_amount
            .checked_add(borrow_amount)
            .ok_or(Error::ArithmeticOverflow)?;

        Self::ensure_safe(new_collateral, price, new_borrowed)?;

        let collateral_client = token::Client::new(env, &read_collateral_token(env)?);
        let borrow_client = token::Client::new(env, &read_borrow_token(env)?);

        if borrow_amount > 0 && borrow_client.balance(&env.current_contract_address()) < borrow_amount {
            return Err(Error::InsufficientLiquidity);
        }

        position.collateral_amount = new_collateral;
        position.borrowed_amount = new_borrowed;
        position.is_active = true;
        position.last_update_time = env.ledger().timestamp();
        write_position(env, account, &position);

        let total_collateral = read_total(env, &DataKey::TotalCollateral);
        write_total(env, &DataKey::TotalCollateral, total_collateral + collateral_amount);
        let total_borrowed = read_total(env, &DataKey::TotalBorrowed);
        write_total(env, &DataKey::TotalBorrowed, total_borrowed + borrow_amount);

        if collateral_amount > 0 {
            collateral_client.transfer(account, &env.current_contract_address(), &collateral_amount);
            events::deposited(env, account.clone(), collateral_amount);
            log!(env, "Deposited collateral", collateral_amount);
        }
        if borrow_amount > 0 {
            borrow_client.transfer(&env.current_contract_address(), account, &borrow_amount);
            events::borrowed(env, account.clone(), borrow_amount);
            log!(env, "Borrowed", borrow_amount);
        }

        Ok(position)
    }
}
