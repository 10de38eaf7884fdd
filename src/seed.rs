//! Seeded defaults used on first start, on unreadable records, and after a
//! full reset.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use rust_decimal_macros::dec;

use crate::models::{
    Budget, BudgetPeriod, Category, Expense, FinancialGoal, LedgerData, Notification,
    NotificationKind, ThresholdAlert, Wallet,
};

pub const RESET_MESSAGE: &str = "All data has been cleared successfully";

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Local> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or_else(Local::now)
}

pub fn categories() -> Vec<Category> {
    [
        ("1", "Food", "#4CAF50", "pie-chart"),
        ("2", "Transport", "#2196F3", "credit-card"),
        ("3", "Shopping", "#FFC107", "shopping-bag"),
        ("4", "Entertainment", "#9C27B0", "music"),
        ("5", "Health", "#F44336", "heart"),
        ("6", "Utilities", "#607D8B", "zap"),
        ("7", "Other", "#9E9E9E", "more-horizontal"),
    ]
    .into_iter()
    .map(|(id, name, color, icon)| Category {
        id: id.into(),
        name: name.into(),
        color: color.into(),
        icon: icon.into(),
    })
    .collect()
}

pub fn wallet() -> Wallet {
    Wallet {
        balance: dec!(2450.75),
        currency: "INR".into(),
    }
}

pub fn budget() -> Budget {
    Budget {
        amount: dec!(1000),
        period: BudgetPeriod::Monthly,
    }
}

pub fn threshold_alert() -> ThresholdAlert {
    ThresholdAlert {
        amount: dec!(500),
        enabled: true,
    }
}

pub fn goals() -> Vec<FinancialGoal> {
    vec![
        FinancialGoal {
            id: "1".into(),
            name: "Vacation".into(),
            target_amount: dec!(1500),
            current_amount: dec!(750),
            deadline: Some(seed_date(2025, 9, 1)),
            description: Some("Summer vacation in Italy".into()),
        },
        FinancialGoal {
            id: "2".into(),
            name: "New Laptop".into(),
            target_amount: dec!(1200),
            current_amount: dec!(300),
            deadline: Some(seed_date(2025, 7, 15)),
            description: Some("MacBook Air".into()),
        },
    ]
}

pub fn notifications() -> Vec<Notification> {
    vec![
        Notification {
            id: "1".into(),
            message: "You've reached 90% of your monthly budget".into(),
            read: false,
            date: seed_date(2025, 4, 22),
            kind: NotificationKind::Alert,
            tag: None,
        },
        Notification {
            id: "2".into(),
            message: "Your electricity bill was higher than usual".into(),
            read: true,
            date: seed_date(2025, 4, 18),
            kind: NotificationKind::Info,
            tag: None,
        },
    ]
}

pub fn expenses() -> Vec<Expense> {
    let sample = [
        ("1", dec!(45.99), "Food", "Grocery shopping", (2025, 4, 20), None),
        ("2", dec!(25.00), "Transport", "Uber ride", (2025, 4, 19), None),
        (
            "3",
            dec!(129.99),
            "Shopping",
            "New headphones",
            (2025, 4, 17),
            Some("receipt1.jpg"),
        ),
        ("4", dec!(15.50), "Entertainment", "Movie ticket", (2025, 4, 15), None),
        ("5", dec!(35.75), "Health", "Pharmacy", (2025, 4, 14), None),
        ("6", dec!(78.23), "Utilities", "Electricity bill", (2025, 4, 10), None),
    ];

    sample
        .into_iter()
        .map(|(id, amount, category, description, (y, m, d), receipt)| Expense {
            id: id.into(),
            amount,
            category: category.into(),
            description: description.into(),
            date: seed_date(y, m, d),
            receipt: receipt.map(String::from),
        })
        .collect()
}

pub fn ledger_data() -> LedgerData {
    LedgerData {
        expenses: expenses(),
        wallet: wallet(),
        budget: budget(),
        threshold_alert: threshold_alert(),
        goals: goals(),
        notifications: notifications(),
    }
}
