//! Personal expense ledger: expenses, a wallet, a budget with a spending
//! threshold alert, savings goals and an in-app notification log, kept
//! consistent with each other and mirrored to a key-value store.

pub mod aggregate;
pub mod alerts;
pub mod errors;
pub mod export;
pub mod ledger;
pub mod models;
pub mod remote;
pub mod seed;
pub mod storage;

pub use errors::{LedgerError, Result, StorageError, StorageResult};
pub use ledger::Ledger;
pub use models::{
    Budget, BudgetPeriod, Category, Expense, ExpenseFilter, FinancialGoal, LedgerData, NewExpense,
    NewGoal, NewNotification, Notification, NotificationFilter, NotificationKind, SpendingTrend,
    ThresholdAlert, Wallet,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
