use soroban_sdk::{symbol_short, Address, Env};

pub fn initialized(env: &Env, admin: Address, price: i128) {
    let topics = (symbol_short!("init"), admin);
    env.events().publish(topics, price);
}

pub fn validator_registered(env: &Env, validator: Address) {
    let topics = (symbol_short!("validator"), validator);
    env.events().publish(topics, ());
}

// Emitted on every accepted oracle update
pub fn price_updated(env: &Env, old_price: i128, new_price: i128) {
    let topics = (symbol_short!("price"),);
    env.events().publish(topics, (old_price, new_price));
}

pub fn authority_changed(env: &Env, old_authority: Address, new_authority: Address) {
    let topics = (symbol_short!("authority"),);
    env.events().publish(topics, (old_authority, new_authority));
}

pub fn deposited(env: &Env, account: Address, collateral_amount: i128) {
    let topics = (symbol_short!("deposit"), account);
    env.events().publish(topics, collateral_amount);
}

pub fn borrowed(env: &Env, account: Address, borrow_amount: i128) {
    let topics = (symbol_short!("borrow"), account);
    env.events().publish(topics, borrow_amount);
}

pub fn repaid(env: &Env, account: Address, amount: i128) {
    let topics = (symbol_short!("repay"), account);
    env.events().publish(topics, amount);
}

pub fn withdrawn(env: &Env, account: Address, amount: i128) {
    let topics = (symbol_short!("withdraw"), account);
    env.events().publish(topics, amount);
}

// Emitted when a validator deleverages a position
pub fn liquidated(
    env: &Env,
    validator: Address,
    account: Address,
    burned_collateral: i128,
    debt_written_off: i128,
) {
    let topics = (symbol_short!("liquidate"), account);
    env.events()
        .publish(topics, (validator, burned_collateral, debt_written_off));
}
