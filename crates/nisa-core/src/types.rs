use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{NisaError, NisaResult};

/// NISA quota bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaType {
    /// Growth investment quota (listed stocks, ETFs, funds)
    Growth,
    /// Accumulation (tsumitate) quota for regular fund purchases
    Accumulation,
}

impl QuotaType {
    pub const ALL: [QuotaType; 2] = [QuotaType::Growth, QuotaType::Accumulation];

    /// Maximum purchase amount per tax year, in yen
    pub fn annual_limit(&self) -> f64 {
        match self {
            QuotaType::Growth => 2_400_000.0,
            QuotaType::Accumulation => 400_000.0,
        }
    }

    /// Lifetime tax-free holding limit, in yen
    pub fn tax_free_limit(&self) -> f64 {
        match self {
            QuotaType::Growth => 12_000_000.0,
            QuotaType::Accumulation => 2_000_000.0,
        }
    }

    /// Stable identifier used in alert ids and wire formats
    pub fn code(&self) -> &'static str {
        match self {
            QuotaType::Growth => "GROWTH",
            QuotaType::Accumulation => "ACCUMULATION",
        }
    }
}

impl std::fmt::Display for QuotaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaType::Growth => write!(f, "growth quota"),
            QuotaType::Accumulation => write!(f, "accumulation quota"),
        }
    }
}

impl FromStr for QuotaType {
    type Err = NisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GROWTH" => Ok(QuotaType::Growth),
            "ACCUMULATION" => Ok(QuotaType::Accumulation),
            _ => Err(NisaError::UnknownQuotaType(s.to_string())),
        }
    }
}

/// A pair of amounts, one per quota type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaAmounts {
    pub growth: f64,
    pub accumulation: f64,
}

impl QuotaAmounts {
    pub fn get(&self, quota_type: QuotaType) -> f64 {
        match quota_type {
            QuotaType::Growth => self.growth,
            QuotaType::Accumulation => self.accumulation,
        }
    }

    pub fn add(&mut self, quota_type: QuotaType, amount: f64) {
        match quota_type {
            QuotaType::Growth => self.growth += amount,
            QuotaType::Accumulation => self.accumulation += amount,
        }
    }

    pub fn total(&self) -> f64 {
        self.growth + self.accumulation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = NisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TransactionKind::Buy),
            "SELL" => Ok(TransactionKind::Sell),
            _ => Err(NisaError::UnknownTransactionKind(s.to_string())),
        }
    }
}

/// Fields shared by every transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    pub id: String,
    pub symbol: String,
    pub symbol_name: String,
    pub quantity: u64,
    pub price: f64,
    /// quantity × price, as reported by the broker
    pub amount: f64,
    pub quota_type: QuotaType,
    pub transaction_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyTransaction {
    #[serde(flatten)]
    pub trade: TradeDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellTransaction {
    #[serde(flatten)]
    pub trade: TradeDetails,
    /// Realized gain or loss of the sale
    pub profit_loss: f64,
    /// Cost basis released from the quota, normally equal to `amount`
    pub tax_free_amount: f64,
}

/// An immutable ledger entry. Only sells carry realized results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transaction {
    Buy(BuyTransaction),
    Sell(SellTransaction),
}

impl Transaction {
    /// Build a buy with `amount = quantity × price`
    pub fn buy(
        id: impl Into<String>,
        symbol: impl Into<String>,
        symbol_name: impl Into<String>,
        quantity: u64,
        price: f64,
        quota_type: QuotaType,
        transaction_date: NaiveDate,
    ) -> Self {
        Transaction::Buy(BuyTransaction {
            trade: TradeDetails {
                id: id.into(),
                symbol: symbol.into(),
                symbol_name: symbol_name.into(),
                quantity,
                price,
                amount: quantity as f64 * price,
                quota_type,
                transaction_date,
            },
        })
    }

    /// Build a sell that releases its full amount from the quota
    #[allow(clippy::too_many_arguments)]
    pub fn sell(
        id: impl Into<String>,
        symbol: impl Into<String>,
        symbol_name: impl Into<String>,
        quantity: u64,
        price: f64,
        quota_type: QuotaType,
        transaction_date: NaiveDate,
        profit_loss: f64,
    ) -> Self {
        let amount = quantity as f64 * price;
        Transaction::Sell(SellTransaction {
            trade: TradeDetails {
                id: id.into(),
                symbol: symbol.into(),
                symbol_name: symbol_name.into(),
                quantity,
                price,
                amount,
                quota_type,
                transaction_date,
            },
            profit_loss,
            tax_free_amount: amount,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Buy(_) => TransactionKind::Buy,
            Transaction::Sell(_) => TransactionKind::Sell,
        }
    }

    pub fn trade(&self) -> &TradeDetails {
        match self {
            Transaction::Buy(buy) => &buy.trade,
            Transaction::Sell(sell) => &sell.trade,
        }
    }

    pub fn as_sell(&self) -> Option<&SellTransaction> {
        match self {
            Transaction::Sell(sell) => Some(sell),
            Transaction::Buy(_) => None,
        }
    }

    pub fn id(&self) -> &str {
        &self.trade().id
    }

    pub fn symbol(&self) -> &str {
        &self.trade().symbol
    }

    pub fn quantity(&self) -> u64 {
        self.trade().quantity
    }

    pub fn amount(&self) -> f64 {
        self.trade().amount
    }

    pub fn quota_type(&self) -> QuotaType {
        self.trade().quota_type
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.trade().transaction_date
    }

    /// NISA tax years follow the calendar year
    pub fn tax_year(&self) -> i32 {
        self.trade().transaction_date.year()
    }
}

/// Loosely typed transaction as submitted by a form or an import file.
///
/// Validation runs on drafts so that malformed enum values and signed
/// quantities can be reported instead of rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub id: String,
    /// "BUY" or "SELL"
    pub kind: String,
    pub symbol: String,
    #[serde(default)]
    pub symbol_name: String,
    pub quantity: i64,
    pub price: f64,
    /// Defaults to quantity × price when absent
    #[serde(default)]
    pub amount: Option<f64>,
    /// "GROWTH" or "ACCUMULATION"
    pub quota_type: String,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub profit_loss: Option<f64>,
    #[serde(default)]
    pub tax_free_amount: Option<f64>,
}

impl TransactionDraft {
    /// Amount as submitted, falling back to quantity × price
    pub fn effective_amount(&self) -> f64 {
        self.amount
            .unwrap_or_else(|| self.quantity as f64 * self.price)
    }

    /// Convert into a typed transaction.
    ///
    /// This is the contract check, not business validation: it fails on the
    /// first malformed field and performs no quota checks.
    pub fn into_transaction(self) -> NisaResult<Transaction> {
        let kind: TransactionKind = self.kind.parse()?;
        let quota_type: QuotaType = self.quota_type.parse()?;

        // stored under the same key validation looks up
        let symbol = self.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(NisaError::InvalidTransaction(format!(
                "transaction {} has an empty symbol",
                self.id
            )));
        }
        if self.quantity <= 0 {
            return Err(NisaError::InvalidTransaction(format!(
                "transaction {} has non-positive quantity {}",
                self.id, self.quantity
            )));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(NisaError::InvalidPrice {
                symbol,
                price: self.price,
            });
        }

        let amount = self.effective_amount();
        let trade = TradeDetails {
            id: self.id,
            symbol,
            symbol_name: self.symbol_name,
            quantity: self.quantity as u64,
            price: self.price,
            amount,
            quota_type,
            transaction_date: self.transaction_date,
        };

        Ok(match kind {
            TransactionKind::Buy => Transaction::Buy(BuyTransaction { trade }),
            TransactionKind::Sell => Transaction::Sell(SellTransaction {
                trade,
                profit_loss: self.profit_loss.unwrap_or(0.0),
                tax_free_amount: self.tax_free_amount.unwrap_or(amount),
            }),
        })
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(tx: &Transaction) -> Self {
        let trade = tx.trade();
        let (profit_loss, tax_free_amount) = match tx.as_sell() {
            Some(sell) => (Some(sell.profit_loss), Some(sell.tax_free_amount)),
            None => (None, None),
        };

        Self {
            id: trade.id.clone(),
            kind: tx.kind().to_string(),
            symbol: trade.symbol.clone(),
            symbol_name: trade.symbol_name.clone(),
            quantity: trade.quantity as i64,
            price: trade.price,
            amount: Some(trade.amount),
            quota_type: trade.quota_type.code().to_string(),
            transaction_date: trade.transaction_date,
            profit_loss,
            tax_free_amount,
        }
    }
}

/// Outcome of an explicit tax-year rollover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloverSummary {
    /// Window that was closed (None when the ledger had no window yet)
    pub closed_tax_year: Option<i32>,
    pub opened_tax_year: i32,
    /// Quota released by sales of the closed window, now added to the new
    /// year's available amount
    pub carried_over: QuotaAmounts,
}
