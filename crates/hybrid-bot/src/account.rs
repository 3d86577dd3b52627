//! Account facts.
//!
//! An [`AccountProvider`] reports balances and open orders; the host turns
//! them into the [`AccountFacts`] the risk gate reads.

use std::collections::HashMap;

use hybrid_core::{OrderSide, Price, Size};
use hybrid_risk::AccountFacts;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// An order resting at the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub pair: String,
    pub side: OrderSide,
    pub price: Price,
    pub size: Size,
}

impl OpenOrder {
    pub fn notional(&self) -> Decimal {
        self.size.notional(self.price)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait AccountProvider {
    /// Balance per asset.
    fn balances(&self) -> AppResult<HashMap<String, Decimal>>;
    fn open_orders(&self) -> AppResult<Vec<OpenOrder>>;
}

/// Collect facts for `pair`, valuing the balance in `quote_asset`.
///
/// Exposure is the notional of the pair's open orders and each open order
/// counts as one active trade. A missing quote balance or a negative
/// amount is an error; the caller falls back to the last known facts.
pub fn collect_facts(
    provider: &dyn AccountProvider,
    pair: &str,
    quote_asset: &str,
) -> AppResult<AccountFacts> {
    let balances = provider.balances()?;
    let balance = balances
        .get(quote_asset)
        .copied()
        .ok_or_else(|| AppError::Account(format!("no {quote_asset} balance reported")))?;
    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(AppError::Account(format!(
            "negative {quote_asset} balance: {balance}"
        )));
    }

    let orders: Vec<OpenOrder> = provider
        .open_orders()?
        .into_iter()
        .filter(|o| o.pair == pair)
        .collect();

    Ok(AccountFacts {
        balance,
        exposure: orders.iter().map(OpenOrder::notional).sum(),
        active_trade_count: orders.len() as u32,
    })
}

/// In-memory account for paper runs.
///
/// Starts from a fixed balance, is credited with realized PnL and holds
/// whatever open orders it is given.
#[derive(Debug, Clone)]
pub struct PaperAccount {
    quote_asset: String,
    balance: Decimal,
    open_orders: Vec<OpenOrder>,
}

impl PaperAccount {
    pub fn new(quote_asset: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            quote_asset: quote_asset.into(),
            balance: initial_balance,
            open_orders: Vec::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Apply realized PnL.
    pub fn credit(&mut self, pnl: Decimal) {
        self.balance += pnl;
    }

    pub fn set_open_orders(&mut self, orders: Vec<OpenOrder>) {
        self.open_orders = orders;
    }
}

impl AccountProvider for PaperAccount {
    fn balances(&self) -> AppResult<HashMap<String, Decimal>> {
        Ok(HashMap::from([(self.quote_asset.clone(), self.balance)]))
    }

    fn open_orders(&self) -> AppResult<Vec<OpenOrder>> {
        Ok(self.open_orders.clone())
    }
}
