use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    /// Always positive; the wallet is debited by exactly this amount.
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// Input for [`crate::ledger::Ledger::add_expense`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: DateTime<Local>,
    pub receipt: Option<String>,
}

impl NewExpense {
    pub fn new(
        amount: Decimal,
        category: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Local>,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            description: description.into(),
            date,
            receipt: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(self.amount));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::MissingField("category"));
        }
        if self.description.trim().is_empty() {
            return Err(LedgerError::MissingField("description"));
        }
        Ok(())
    }

    pub(crate) fn into_expense(self, id: String) -> Expense {
        Expense {
            id,
            amount: self.amount,
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            date: self.date,
            receipt: self.receipt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// May go negative: expenses are never blocked by the balance.
    pub balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Any unrecognised persisted value. Consumes nothing.
    #[serde(other)]
    Unknown,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 4] = [
        BudgetPeriod::Daily,
        BudgetPeriod::Weekly,
        BudgetPeriod::Monthly,
        BudgetPeriod::Yearly,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Some(BudgetPeriod::Daily),
            "weekly" | "w" => Some(BudgetPeriod::Weekly),
            "monthly" | "m" => Some(BudgetPeriod::Monthly),
            "yearly" | "y" => Some(BudgetPeriod::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Daily => "daily",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
            BudgetPeriod::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: Decimal,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAlert {
    pub amount: Decimal,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FinancialGoal {
    /// Checks `target > 0` and `0 <= current <= target`.
    pub fn validate(&self) -> Result<()> {
        validate_goal_amounts(&self.name, self.target_amount, self.current_amount)
    }

    /// Percent complete, 0 when the target is not positive.
    pub fn progress(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.current_amount / self.target_amount * Decimal::ONE_HUNDRED
    }

    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    pub fn is_complete(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// Input for [`crate::ledger::Ledger::add_goal`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<DateTime<Local>>,
    pub description: Option<String>,
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        validate_goal_amounts(&self.name, self.target_amount, self.current_amount)
    }

    pub(crate) fn into_goal(self, id: String) -> FinancialGoal {
        FinancialGoal {
            id,
            name: self.name.trim().to_string(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            deadline: self.deadline,
            description: self.description,
        }
    }
}

fn validate_goal_amounts(name: &str, target: Decimal, current: Decimal) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::MissingField("name"));
    }
    if target <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(target));
    }
    if current < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(current));
    }
    if current > target {
        return Err(LedgerError::ExceedsTarget {
            target,
            attempted: current,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Alert,
    Info,
    Success,
}

/// Structured marker used to recognise notifications emitted by a policy,
/// independent of their wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationTag {
    ThresholdBreach,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub read: bool,
    pub date: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<NotificationTag>,
}

/// The caller-supplied part of a notification; id, date and read flag are
/// assigned by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub message: String,
    pub kind: NotificationKind,
    pub tag: Option<NotificationTag>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            tag: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Alert, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn tagged(mut self, tag: NotificationTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub(crate) fn into_notification(self, id: String, date: DateTime<Local>) -> Notification {
        Notification {
            id,
            message: self.message,
            read: false,
            date,
            kind: self.kind,
            tag: self.tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !notification.read,
            NotificationFilter::Read => notification.read,
        }
    }

    pub fn next(self) -> Self {
        match self {
            NotificationFilter::All => NotificationFilter::Unread,
            NotificationFilter::Unread => NotificationFilter::Read,
            NotificationFilter::Read => NotificationFilter::All,
        }
    }
}

impl fmt::Display for NotificationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationFilter::All => "all",
            NotificationFilter::Unread => "unread",
            NotificationFilter::Read => "read",
        };
        f.write_str(label)
    }
}

/// Search over the expense list. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub search: String,
    pub category: Option<String>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || expense.description.to_lowercase().contains(&needle)
            || expense.category.to_lowercase().contains(&needle);
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| expense.category == category);
        matches_search && matches_category
    }
}

/// Per-category share of spend. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTrend {
    pub category: String,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub previous_amount: Decimal,
    pub change: Decimal,
}

/// Every persisted entity collection of one ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerData {
    pub expenses: Vec<Expense>,
    pub wallet: Wallet,
    pub budget: Budget,
    pub threshold_alert: ThresholdAlert,
    pub goals: Vec<FinancialGoal>,
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expense(description: &str, category: &str) -> Expense {
        Expense {
            id: "e1".into(),
            amount: dec!(10),
            category: category.into(),
            description: description.into(),
            date: Local::now(),
            receipt: None,
        }
    }

    #[test]
    fn new_expense_rejects_non_positive_amounts() {
        let input = NewExpense::new(dec!(0), "Food", "Lunch", Local::now());
        assert_eq!(input.validate(), Err(LedgerError::InvalidAmount(dec!(0))));

        let input = NewExpense::new(dec!(-3.5), "Food", "Lunch", Local::now());
        assert_eq!(
            input.validate(),
            Err(LedgerError::InvalidAmount(dec!(-3.5)))
        );
    }

    #[test]
    fn new_expense_requires_category_and_description() {
        let input = NewExpense::new(dec!(5), "  ", "Lunch", Local::now());
        assert_eq!(input.validate(), Err(LedgerError::MissingField("category")));

        let input = NewExpense::new(dec!(5), "Food", "", Local::now());
        assert_eq!(
            input.validate(),
            Err(LedgerError::MissingField("description"))
        );
    }

    #[test]
    fn goal_validation_enforces_bounds() {
        let mut goal = FinancialGoal {
            id: "g".into(),
            name: "Bike".into(),
            target_amount: dec!(100),
            current_amount: dec!(100),
            deadline: None,
            description: None,
        };
        assert!(goal.validate().is_ok());
        assert!(goal.is_complete());

        goal.current_amount = dec!(100.01);
        assert_eq!(
            goal.validate(),
            Err(LedgerError::ExceedsTarget {
                target: dec!(100),
                attempted: dec!(100.01)
            })
        );

        goal.current_amount = dec!(-1);
        assert_eq!(goal.validate(), Err(LedgerError::InvalidAmount(dec!(-1))));

        goal.current_amount = dec!(0);
        goal.target_amount = dec!(0);
        assert_eq!(goal.validate(), Err(LedgerError::InvalidAmount(dec!(0))));
    }

    #[test]
    fn goal_progress_and_remaining() {
        let goal = FinancialGoal {
            id: "g".into(),
            name: "Vacation".into(),
            target_amount: dec!(1500),
            current_amount: dec!(750),
            deadline: None,
            description: None,
        };
        assert_eq!(goal.progress(), dec!(50));
        assert_eq!(goal.remaining(), dec!(750));
    }

    #[test]
    fn budget_period_serializes_lowercase_and_tolerates_unknown() {
        let json = serde_json::to_string(&BudgetPeriod::Monthly).unwrap();
        assert_eq!(json, "\"monthly\"");

        let parsed: BudgetPeriod = serde_json::from_str("\"fortnightly\"").unwrap();
        assert_eq!(parsed, BudgetPeriod::Unknown);
        assert_eq!(BudgetPeriod::parse("W"), Some(BudgetPeriod::Weekly));
        assert_eq!(BudgetPeriod::parse("hourly"), None);
    }

    #[test]
    fn notification_uses_type_field_on_the_wire() {
        let notification = NewNotification::alert("Over threshold")
            .tagged(NotificationTag::ThresholdBreach)
            .into_notification("n1".into(), Local::now());
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "alert");
        assert_eq!(value["tag"], "thresholdBreach");
        assert_eq!(value["read"], false);
    }

    #[test]
    fn expense_filter_matches_description_or_category() {
        let lunch = expense("Team lunch", "Food");
        let filter = ExpenseFilter {
            search: "LUNCH".into(),
            category: None,
        };
        assert!(filter.matches(&lunch));

        let filter = ExpenseFilter {
            search: "foo".into(),
            category: None,
        };
        assert!(filter.matches(&lunch));

        let filter = ExpenseFilter {
            search: String::new(),
            category: Some("Transport".into()),
        };
        assert!(!filter.matches(&lunch));
    }

    #[test]
    fn notification_filter_cycles() {
        assert_eq!(NotificationFilter::All.next(), NotificationFilter::Unread);
        assert_eq!(NotificationFilter::Read.next(), NotificationFilter::All);
    }
}
