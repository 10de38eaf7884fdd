//! Derived views over the expense list. Everything here is a pure function
//! of its inputs and is recomputed in full whenever the ledger changes.

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Budget, BudgetPeriod, Category, Expense, SpendingTrend};

/// Stand-in for last period's spend in [`compute_trends`], relative to the
/// current amount.
pub const PREVIOUS_PERIOD_FACTOR: Decimal = dec!(0.9);
/// Stand-in for the period-over-period change reported by [`compute_trends`].
pub const SIMULATED_CHANGE: Decimal = dec!(10);

const RECENT_DAYS: i64 = 7;

/// Sums amounts, pinning at `Decimal::MAX` instead of overflowing.
fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

pub fn total_spent(expenses: &[Expense]) -> Decimal {
    sum_amounts(expenses.iter().map(|e| e.amount))
}

/// Exact total of every expense, or `None` if it does not fit in a `Decimal`.
pub fn checked_total(expenses: &[Expense]) -> Option<Decimal> {
    expenses
        .iter()
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
}

/// Category totals in first-seen order.
fn group_by_category<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<(String, Decimal)> {
    let mut totals: Vec<(String, Decimal)> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|(c, _)| *c == expense.category) {
            Some((_, amount)) => *amount = amount.saturating_add(expense.amount),
            None => totals.push((expense.category.clone(), expense.amount)),
        }
    }
    totals
}

fn share(amount: Decimal, total: Decimal) -> Decimal {
    if total > Decimal::ZERO {
        ratio_percent(amount, total)
    } else {
        Decimal::ZERO
    }
}

fn growth(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        ratio_percent(current.saturating_sub(previous), previous)
    } else {
        Decimal::ZERO
    }
}

/// `numerator / denominator * 100`, saturating when the result is out of range.
fn ratio_percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    let saturated = if numerator.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    };
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(saturated)
}

/// Per-category share of all expenses, largest first. Equal amounts keep the
/// order in which their categories first appear.
///
/// `previous_amount` and `change` are placeholders; use [`compare_periods`]
/// for figures backed by real history.
pub fn compute_trends(expenses: &[Expense]) -> Vec<SpendingTrend> {
    let totals = group_by_category(expenses);
    let total = sum_amounts(totals.iter().map(|(_, amount)| *amount));

    let mut trends: Vec<SpendingTrend> = totals
        .into_iter()
        .map(|(category, amount)| SpendingTrend {
            category,
            amount,
            percentage: share(amount, total),
            previous_amount: amount * PREVIOUS_PERIOD_FACTOR,
            change: SIMULATED_CHANGE,
        })
        .collect();
    trends.sort_by(|a, b| b.amount.cmp(&a.amount));
    trends
}

/// Whether `date` falls inside the budget window ending at `reference`.
///
/// A week starts on the Sunday on or before `reference`.
pub fn in_budget_window(period: BudgetPeriod, reference: NaiveDate, date: NaiveDate) -> bool {
    match period {
        BudgetPeriod::Daily => date == reference,
        BudgetPeriod::Weekly => {
            let offset = u64::from(reference.weekday().num_days_from_sunday());
            match reference.checked_sub_days(Days::new(offset)) {
                Some(start) => start <= date && date <= reference,
                None => false,
            }
        }
        BudgetPeriod::Monthly => date.year() == reference.year() && date.month() == reference.month(),
        BudgetPeriod::Yearly => date.year() == reference.year(),
        BudgetPeriod::Unknown => false,
    }
}

pub fn compute_budget_used(expenses: &[Expense], period: BudgetPeriod, reference: NaiveDate) -> Decimal {
    sum_amounts(
        expenses
            .iter()
            .filter(|e| in_budget_window(period, reference, e.date.date_naive()))
            .map(|e| e.amount),
    )
}

/// Spend in the calendar month of `reference`.
pub fn monthly_total(expenses: &[Expense], reference: NaiveDate) -> Decimal {
    compute_budget_used(expenses, BudgetPeriod::Monthly, reference)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub period: BudgetPeriod,
    pub amount: Decimal,
    pub used: Decimal,
    /// `used / amount * 100`; can exceed 100.
    pub progress: Decimal,
    pub is_over_budget: bool,
}

impl BudgetStatus {
    pub fn remaining(&self) -> Decimal {
        self.amount.saturating_sub(self.used)
    }
}

pub fn budget_status(expenses: &[Expense], budget: &Budget, reference: NaiveDate) -> BudgetStatus {
    let used = compute_budget_used(expenses, budget.period, reference);
    BudgetStatus {
        period: budget.period,
        amount: budget.amount,
        used,
        progress: share(used, budget.amount),
        is_over_budget: used > budget.amount,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_spent: Decimal,
    /// Spend over the last seven days up to `now`.
    pub recent_spending: Decimal,
    /// Known categories with spend, largest first.
    pub by_category: Vec<CategoryTotal>,
}

pub fn dashboard_summary(
    expenses: &[Expense],
    categories: &[Category],
    now: DateTime<Local>,
) -> DashboardSummary {
    let since = now - Duration::days(RECENT_DAYS);
    let recent_spending = sum_amounts(
        expenses
            .iter()
            .filter(|e| e.date >= since)
            .map(|e| e.amount),
    );

    let mut by_category: Vec<CategoryTotal> = categories
        .iter()
        .map(|category| CategoryTotal {
            name: category.name.clone(),
            color: category.color.clone(),
            total: sum_amounts(
                expenses
                    .iter()
                    .filter(|e| e.category == category.name)
                    .map(|e| e.amount),
            ),
        })
        .filter(|c| c.total > Decimal::ZERO)
        .collect();
    by_category.sort_by(|a, b| b.total.cmp(&a.total));

    DashboardSummary {
        total_spent: total_spent(expenses),
        recent_spending,
        by_category,
    }
}

/// A date inside the window that precedes the one ending at `reference`,
/// positioned so [`in_budget_window`] selects the same span one period back.
fn previous_reference(period: BudgetPeriod, reference: NaiveDate) -> Option<NaiveDate> {
    match period {
        BudgetPeriod::Daily => reference.pred_opt(),
        BudgetPeriod::Weekly => reference.checked_sub_days(Days::new(7)),
        BudgetPeriod::Monthly => reference.with_day(1)?.pred_opt(),
        BudgetPeriod::Yearly => NaiveDate::from_ymd_opt(reference.year() - 1, 1, 1),
        BudgetPeriod::Unknown => None,
    }
}

/// Category spend in the current budget window against the same span one
/// period earlier. Categories only present in the earlier window are listed
/// with a zero amount.
pub fn compare_periods(expenses: &[Expense], period: BudgetPeriod, reference: NaiveDate) -> Vec<SpendingTrend> {
    let current = group_by_category(
        expenses
            .iter()
            .filter(|e| in_budget_window(period, reference, e.date.date_naive())),
    );
    let previous = match previous_reference(period, reference) {
        Some(prev) => group_by_category(
            expenses
                .iter()
                .filter(|e| in_budget_window(period, prev, e.date.date_naive())),
        ),
        None => Vec::new(),
    };

    let total = sum_amounts(current.iter().map(|(_, amount)| *amount));
    let previous_of = |category: &str| {
        previous
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, amount)| *amount)
            .unwrap_or(Decimal::ZERO)
    };

    let mut trends: Vec<SpendingTrend> = current
        .iter()
        .map(|(category, amount)| {
            let previous_amount = previous_of(category);
            SpendingTrend {
                category: category.clone(),
                amount: *amount,
                percentage: share(*amount, total),
                previous_amount,
                change: growth(*amount, previous_amount),
            }
        })
        .collect();

    for (category, previous_amount) in &previous {
        if current.iter().any(|(c, _)| c == category) {
            continue;
        }
        trends.push(SpendingTrend {
            category: category.clone(),
            amount: Decimal::ZERO,
            percentage: Decimal::ZERO,
            previous_amount: *previous_amount,
            change: growth(Decimal::ZERO, *previous_amount),
        });
    }

    trends.sort_by(|a, b| b.amount.cmp(&a.amount));
    trends
}
