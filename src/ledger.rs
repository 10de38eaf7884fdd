use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregate::{self, BudgetStatus, DashboardSummary};
use crate::alerts;
use crate::errors::{LedgerError, Result, StorageResult};
use crate::models::{
    Budget, Category, Expense, ExpenseFilter, FinancialGoal, LedgerData, NewExpense, NewGoal,
    NewNotification, Notification, NotificationFilter, SpendingTrend, ThresholdAlert, Wallet,
};
use crate::remote::BlobStore;
use crate::seed;
use crate::storage::{self, KeyValueStore, RecordKey};

pub const BACKUP_KEY: &str = "pursesh-backup";
pub const RESTORE_MESSAGE: &str = "Data restored from backup";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Authoritative in-memory state plus the store it is mirrored to.
///
/// Every mutator validates first, then changes state, writes the touched
/// records back (best effort), and recomputes derived data before
/// returning. Rejected calls leave everything untouched.
pub struct Ledger<S: KeyValueStore> {
    store: S,
    data: LedgerData,
    categories: Vec<Category>,
    trends: Vec<SpendingTrend>,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Loads every record from `store`, using seeded defaults for anything
    /// missing or unreadable.
    pub fn load(store: S) -> Self {
        let data = storage::load_ledger_data(&store);
        info!(
            "Loaded ledger: {} expenses, {} goals, {} notifications",
            data.expenses.len(),
            data.goals.len(),
            data.notifications.len()
        );
        Self::from_data(store, data)
    }

    /// Wraps existing state without touching the store.
    pub fn from_data(store: S, data: LedgerData) -> Self {
        let mut ledger = Self {
            store,
            data,
            categories: seed::categories(),
            trends: Vec::new(),
        };
        ledger.refresh();
        ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn data(&self) -> &LedgerData {
        &self.data
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.data.expenses
    }

    pub fn expense(&self, id: &str) -> Option<&Expense> {
        self.data.expenses.iter().find(|e| e.id == id)
    }

    /// Matching expenses, newest first.
    pub fn find_expenses(&self, filter: &ExpenseFilter) -> Vec<&Expense> {
        let mut found: Vec<&Expense> = self
            .data
            .expenses
            .iter()
            .filter(|e| filter.matches(e))
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn wallet(&self) -> &Wallet {
        &self.data.wallet
    }

    pub fn budget(&self) -> &Budget {
        &self.data.budget
    }

    pub fn threshold_alert(&self) -> &ThresholdAlert {
        &self.data.threshold_alert
    }

    pub fn goals(&self) -> &[FinancialGoal] {
        &self.data.goals
    }

    pub fn goal(&self, id: &str) -> Option<&FinancialGoal> {
        self.data.goals.iter().find(|g| g.id == id)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.data.notifications
    }

    pub fn filtered_notifications(&self, filter: NotificationFilter) -> Vec<&Notification> {
        self.data
            .notifications
            .iter()
            .filter(|n| filter.matches(n))
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.data.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn spending_trends(&self) -> &[SpendingTrend] {
        &self.trends
    }

    pub fn budget_status(&self) -> BudgetStatus {
        self.budget_status_on(today())
    }

    pub fn budget_status_on(&self, reference: NaiveDate) -> BudgetStatus {
        aggregate::budget_status(&self.data.expenses, &self.data.budget, reference)
    }

    pub fn dashboard(&self) -> DashboardSummary {
        aggregate::dashboard_summary(&self.data.expenses, &self.categories, Local::now())
    }

    /// Current budget window against the previous one, per category.
    pub fn period_comparison(&self) -> Vec<SpendingTrend> {
        aggregate::compare_periods(&self.data.expenses, self.data.budget.period, today())
    }

    /// Records a new expense and debits the wallet. Amounts that would push
    /// the expense total or the balance out of range are rejected as invalid.
    pub fn add_expense(&mut self, input: NewExpense) -> Result<String> {
        input.validate()?;
        let balance = aggregate::checked_total(&self.data.expenses)
            .and_then(|total| total.checked_add(input.amount))
            .and_then(|_| self.data.wallet.balance.checked_sub(input.amount))
            .ok_or(LedgerError::InvalidAmount(input.amount))?;
        let expense = input.into_expense(new_id());
        let id = expense.id.clone();
        info!(
            "Adding expense {}: {} {} ({})",
            id, expense.amount, self.data.wallet.currency, expense.category
        );

        self.data.wallet.balance = balance;
        self.data.expenses.insert(0, expense);
        self.persist(&[RecordKey::Expenses, RecordKey::Wallet]);
        self.after_expense_change();
        Ok(id)
    }

    /// Removes the expense and refunds its amount. `None` if the id is unknown.
    pub fn delete_expense(&mut self, id: &str) -> Option<Expense> {
        let Some(index) = self.data.expenses.iter().position(|e| e.id == id) else {
            debug!("Delete of unknown expense {}", id);
            return None;
        };
        let removed = self.data.expenses.remove(index);
        info!("Deleted expense {}, refunding {}", id, removed.amount);

        self.data.wallet.balance = self.data.wallet.balance.saturating_add(removed.amount);
        self.persist(&[RecordKey::Expenses, RecordKey::Wallet]);
        self.after_expense_change();
        Some(removed)
    }

    pub fn upload_receipt(&mut self, expense_id: &str, reference: impl Into<String>) -> bool {
        let Some(expense) = self.data.expenses.iter_mut().find(|e| e.id == expense_id) else {
            debug!("Receipt for unknown expense {}", expense_id);
            return false;
        };
        expense.receipt = Some(reference.into());
        self.persist(&[RecordKey::Expenses]);
        true
    }

    /// Replaces balance and currency as given. Amounts already recorded are
    /// not converted.
    pub fn update_wallet(&mut self, wallet: Wallet) {
        info!("Wallet set to {} {}", wallet.balance, wallet.currency);
        self.data.wallet = wallet;
        self.persist(&[RecordKey::Wallet]);
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.data.wallet.balance = self
            .data
            .wallet
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        self.persist(&[RecordKey::Wallet]);
        Ok(self.data.wallet.balance)
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let available = self.data.wallet.balance;
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        self.data.wallet.balance -= amount;
        self.persist(&[RecordKey::Wallet]);
        Ok(self.data.wallet.balance)
    }

    pub fn set_currency(&mut self, currency: &str) -> Result<()> {
        let code = currency.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(LedgerError::MissingField("currency"));
        }
        self.data.wallet.currency = code;
        self.persist(&[RecordKey::Wallet]);
        Ok(())
    }

    pub fn set_budget(&mut self, budget: Budget) -> Result<()> {
        if budget.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(budget.amount));
        }
        let message = format!(
            "Budget updated to {} {} ({})",
            budget.amount.normalize(),
            self.data.wallet.currency,
            budget.period
        );
        info!("{}", message);

        self.data.budget = budget;
        self.push_notification(NewNotification::info(message));
        self.persist(&[RecordKey::Budget, RecordKey::Notifications]);
        self.apply_threshold_policy();
        Ok(())
    }

    pub fn set_threshold_alert(&mut self, config: ThresholdAlert) -> Result<()> {
        if config.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(config.amount));
        }
        info!(
            "Threshold alert {} at {}",
            if config.enabled { "enabled" } else { "disabled" },
            config.amount
        );
        self.data.threshold_alert = config;
        self.persist(&[RecordKey::ThresholdAlert]);
        self.apply_threshold_policy();
        Ok(())
    }

    pub fn add_goal(&mut self, input: NewGoal) -> Result<String> {
        input.validate()?;
        let goal = input.into_goal(new_id());
        let id = goal.id.clone();
        info!("Adding goal {} ({}) target {}", goal.name, id, goal.target_amount);

        self.data.goals.push(goal);
        self.persist(&[RecordKey::Goals]);
        Ok(id)
    }

    /// Stores `goal`, treating any increase of `current_amount` over the
    /// stored value as a contribution paid from the wallet.
    ///
    /// A goal id that is not stored yet is appended without touching the
    /// wallet.
    pub fn update_goal(&mut self, goal: FinancialGoal) -> Result<()> {
        goal.validate()?;

        let index = self.data.goals.iter().position(|g| g.id == goal.id);
        let contribution = index
            .map(|i| goal.current_amount - self.data.goals[i].current_amount)
            .filter(|delta| *delta > Decimal::ZERO);

        if let Some(amount) = contribution {
            let available = self.data.wallet.balance;
            if amount > available {
                return Err(LedgerError::InsufficientFunds {
                    requested: amount,
                    available,
                });
            }
        }

        let mut keys = vec![RecordKey::Goals];
        if let Some(amount) = contribution {
            self.data.wallet.balance -= amount;
            let message = format!(
                "You've contributed {} {} to your \"{}\" goal.",
                amount.normalize(),
                self.data.wallet.currency,
                goal.name
            );
            info!("{}", message);
            self.push_notification(NewNotification::info(message));
            keys.extend([RecordKey::Wallet, RecordKey::Notifications]);
        }

        match index {
            Some(i) => self.data.goals[i] = goal,
            None => {
                warn!("Goal {} was not stored yet, inserting it", goal.id);
                self.data.goals.push(goal);
            }
        }
        self.persist(&keys);
        Ok(())
    }

    /// Moves `amount` from the wallet into the goal.
    pub fn contribute_to_goal(&mut self, goal_id: &str, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut goal = self
            .goal(goal_id)
            .cloned()
            .ok_or_else(|| LedgerError::GoalNotFound(goal_id.to_string()))?;
        goal.current_amount = goal
            .current_amount
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        self.update_goal(goal)
    }

    /// Removes the goal. Money already contributed stays spent.
    pub fn delete_goal(&mut self, id: &str) -> Option<FinancialGoal> {
        let index = self.data.goals.iter().position(|g| g.id == id)?;
        let removed = self.data.goals.remove(index);
        info!("Deleted goal {} ({})", removed.name, id);
        self.persist(&[RecordKey::Goals]);
        Some(removed)
    }

    pub fn add_notification(&mut self, notification: NewNotification) -> String {
        let id = self.push_notification(notification);
        self.persist(&[RecordKey::Notifications]);
        id
    }

    pub fn mark_notification_as_read(&mut self, id: &str) -> bool {
        let Some(notification) = self.data.notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        notification.read = true;
        self.persist(&[RecordKey::Notifications]);
        true
    }

    pub fn delete_notification(&mut self, id: &str) -> bool {
        let before = self.data.notifications.len();
        self.data.notifications.retain(|n| n.id != id);
        if self.data.notifications.len() == before {
            return false;
        }
        self.persist(&[RecordKey::Notifications]);
        true
    }

    pub fn clear_all_notifications(&mut self) {
        self.data.notifications.clear();
        self.persist(&[RecordKey::Notifications]);
    }

    /// Drops all stored records and starts over from the seeded defaults,
    /// leaving a single confirmation notification.
    pub fn reset_all(&mut self) {
        warn!("Resetting all ledger data");
        for key in RecordKey::ALL {
            if let Err(e) = self.store.remove(key.as_str()) {
                error!("Removing {} failed: {}", key.as_str(), e);
            }
        }

        self.data = seed::ledger_data();
        self.categories = seed::categories();
        self.data.notifications =
            vec![NewNotification::success(seed::RESET_MESSAGE).into_notification(new_id(), Local::now())];
        self.refresh();
        self.persist(&RecordKey::ALL);
    }

    /// Uploads a snapshot of every record and returns its location.
    pub fn backup_to<B: BlobStore + ?Sized>(&self, remote: &mut B, key: &str) -> StorageResult<String> {
        let value = serde_json::to_value(&self.data)?;
        let location = remote.put(key, &value)?;
        info!("Backed up ledger to {}", location);
        Ok(location)
    }

    /// Replaces all state with the snapshot stored under `key`. Returns
    /// `false` when there is no snapshot; a malformed one is an error and
    /// leaves the ledger as it was.
    pub fn restore_from<B: BlobStore + ?Sized>(&mut self, remote: &B, key: &str) -> StorageResult<bool> {
        let Some(value) = remote.get(key)? else {
            return Ok(false);
        };
        let data: LedgerData = serde_json::from_value(value)?;
        info!("Restoring ledger from {}", key);

        self.data = data;
        self.push_notification(NewNotification::success(RESTORE_MESSAGE));
        self.refresh();
        self.persist(&RecordKey::ALL);
        Ok(true)
    }

    fn push_notification(&mut self, notification: NewNotification) -> String {
        let notification = notification.into_notification(new_id(), Local::now());
        let id = notification.id.clone();
        self.data.notifications.insert(0, notification);
        id
    }

    fn refresh(&mut self) {
        self.trends = aggregate::compute_trends(&self.data.expenses);
    }

    fn after_expense_change(&mut self) {
        self.refresh();
        self.apply_threshold_policy();
    }

    fn apply_threshold_policy(&mut self) {
        let Some(alert) = alerts::evaluate_threshold(&self.data, today()) else {
            return;
        };
        info!(
            "Spending threshold of {} reached",
            self.data.threshold_alert.amount
        );
        self.push_notification(alert);
        self.persist(&[RecordKey::Notifications]);
    }

    fn persist(&mut self, keys: &[RecordKey]) {
        if let Err(e) = storage::save_ledger_data(&mut self.store, &self.data, keys) {
            error!("Persisting {:?} failed: {}", keys, e);
        }
    }
}
