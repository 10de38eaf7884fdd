use chrono::Local;
use pursesh::aggregate::compute_trends;
use pursesh::alerts::has_threshold_alert;
use pursesh::seed;
use pursesh::storage::RecordKey;
use pursesh::{
    Budget, BudgetPeriod, FileStore, KeyValueStore, Ledger, LedgerError, MemoryStore, NewExpense,
    NotificationKind, ThresholdAlert,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn expense(amount: Decimal, category: &str) -> NewExpense {
    NewExpense::new(amount, category, "Scenario purchase", Local::now())
}

fn threshold_alerts(ledger: &Ledger<MemoryStore>) -> usize {
    ledger
        .notifications()
        .iter()
        .filter(|n| n.kind == NotificationKind::Alert && n.message.contains("threshold"))
        .count()
}

#[test]
fn wallet_tracks_present_expenses() {
    let mut ledger = Ledger::load(MemoryStore::new());
    let initial = ledger.wallet().balance;

    let amounts = [dec!(12.30), dec!(7.05), dec!(99.99), dec!(0.01), dec!(40)];
    let ids: Vec<String> = amounts
        .iter()
        .map(|amount| ledger.add_expense(expense(*amount, "Other")).unwrap())
        .collect();

    ledger.delete_expense(&ids[1]);
    ledger.delete_expense(&ids[3]);
    ledger.delete_expense("not-an-id");

    let present: Decimal = ids
        .iter()
        .filter_map(|id| ledger.expense(id))
        .map(|e| e.amount)
        .sum();
    assert_eq!(present, dec!(152.29));
    assert_eq!(ledger.wallet().balance, initial - present);
}

#[test]
fn delete_then_readd_restores_balance() {
    let mut ledger = Ledger::load(MemoryStore::new());
    let before_delete = ledger.wallet().balance;

    let removed = ledger.delete_expense("2").unwrap();
    ledger
        .add_expense(NewExpense {
            amount: removed.amount,
            category: removed.category.clone(),
            description: removed.description.clone(),
            date: removed.date,
            receipt: removed.receipt.clone(),
        })
        .unwrap();

    assert_eq!(ledger.wallet().balance, before_delete);
}

#[test]
fn food_expense_scenario() {
    let mut ledger = Ledger::load(MemoryStore::new());
    assert_eq!(ledger.wallet().balance, dec!(2450.75));
    assert_eq!(ledger.wallet().currency, "INR");

    let id = ledger.add_expense(expense(dec!(45.99), "Food")).unwrap();
    assert_eq!(ledger.wallet().balance, dec!(2404.76));

    ledger.delete_expense(&id).unwrap();
    assert_eq!(ledger.wallet().balance, dec!(2450.75));
}

#[test]
fn goal_contribution_scenario() {
    let mut ledger = Ledger::load(MemoryStore::new());
    let goal = ledger.goal("1").unwrap().clone();
    assert_eq!(goal.target_amount, dec!(1500));
    assert_eq!(goal.current_amount, dec!(750));
    let notifications = ledger.notifications().len();

    let mut updated = goal.clone();
    updated.current_amount += dec!(200);
    ledger.update_goal(updated).unwrap();

    assert_eq!(ledger.goal("1").unwrap().current_amount, dec!(950));
    assert_eq!(ledger.wallet().balance, dec!(2250.75));
    assert_eq!(ledger.notifications().len(), notifications + 1);
    assert_eq!(ledger.notifications()[0].kind, NotificationKind::Info);
}

#[test]
fn over_target_contribution_is_rejected() {
    let mut ledger = Ledger::load(MemoryStore::new());
    let before = ledger.data().clone();

    let err = ledger.contribute_to_goal("1", dec!(750.01)).unwrap_err();
    assert_eq!(
        err,
        LedgerError::ExceedsTarget {
            target: dec!(1500),
            attempted: dec!(1500.01)
        }
    );
    assert_eq!(ledger.data(), &before);

    // Filling the goal exactly is allowed.
    ledger.contribute_to_goal("1", dec!(750)).unwrap();
    let goal = ledger.goal("1").unwrap();
    assert_eq!(goal.current_amount, goal.target_amount);
}

#[test]
fn goals_stay_within_bounds() {
    let mut ledger = Ledger::load(MemoryStore::new());
    for amount in [dec!(100), dec!(400), dec!(500), dec!(1)] {
        let _ = ledger.contribute_to_goal("2", amount);
        for goal in ledger.goals() {
            assert!(goal.current_amount >= Decimal::ZERO);
            assert!(goal.current_amount <= goal.target_amount);
        }
    }
    assert_eq!(ledger.goal("2").unwrap().current_amount, dec!(801));
}

#[test]
fn threshold_alert_fires_once_per_episode() {
    let mut ledger = Ledger::load(MemoryStore::new());
    ledger
        .set_threshold_alert(ThresholdAlert {
            amount: dec!(500),
            enabled: true,
        })
        .unwrap();
    assert_eq!(ledger.budget().period, BudgetPeriod::Monthly);

    ledger.add_expense(expense(dec!(300), "Shopping")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 0);

    ledger.add_expense(expense(dec!(200), "Food")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);

    ledger.add_expense(expense(dec!(50), "Food")).unwrap();
    ledger.add_expense(expense(dec!(75), "Health")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);

    // Reading the alert does not re-arm it.
    assert!(has_threshold_alert(ledger.notifications()));
    let alert = ledger
        .notifications()
        .iter()
        .find(|n| n.message.contains("threshold"))
        .unwrap()
        .id
        .clone();
    ledger.mark_notification_as_read(&alert);
    ledger.add_expense(expense(dec!(5), "Food")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);

    // Deleting it does: the next expense change raises a fresh one.
    ledger.delete_notification(&alert);
    assert_eq!(threshold_alerts(&ledger), 0);
    ledger.add_expense(expense(dec!(5), "Food")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);

    ledger.clear_all_notifications();
    let id = ledger.add_expense(expense(dec!(1), "Food")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);
    ledger.delete_expense(&id);
    assert_eq!(threshold_alerts(&ledger), 1);
}

#[test]
fn threshold_alert_needs_monthly_budget() {
    let mut ledger = Ledger::load(MemoryStore::new());
    ledger
        .set_budget(Budget {
            amount: dec!(100),
            period: BudgetPeriod::Weekly,
        })
        .unwrap();
    ledger.add_expense(expense(dec!(600), "Shopping")).unwrap();
    assert_eq!(threshold_alerts(&ledger), 0);

    // Switching back to monthly evaluates the policy right away.
    ledger
        .set_budget(Budget {
            amount: dec!(1000),
            period: BudgetPeriod::Monthly,
        })
        .unwrap();
    assert_eq!(threshold_alerts(&ledger), 1);
}

#[test]
fn trend_percentages_sum_to_one_hundred() {
    let mut ledger = Ledger::load(MemoryStore::new());
    ledger.add_expense(expense(dec!(33.33), "Food")).unwrap();
    ledger.add_expense(expense(dec!(0.07), "Transport")).unwrap();

    let sum: Decimal = ledger.spending_trends().iter().map(|t| t.percentage).sum();
    assert!((sum - dec!(100)).abs() < dec!(0.0000001), "sum was {sum}");
    assert_eq!(ledger.spending_trends(), compute_trends(ledger.expenses()).as_slice());

    ledger.reset_all();
    for expense in seed::expenses() {
        ledger.delete_expense(&expense.id);
    }
    assert!(ledger.spending_trends().is_empty());
}

#[test]
fn reset_all_restores_seeded_state() {
    let mut ledger = Ledger::load(MemoryStore::new());
    ledger.add_expense(expense(dec!(700), "Shopping")).unwrap();
    ledger.delete_goal("1");
    ledger
        .set_budget(Budget {
            amount: dec!(5),
            period: BudgetPeriod::Daily,
        })
        .unwrap();

    ledger.reset_all();

    let defaults = seed::ledger_data();
    assert_eq!(ledger.expenses(), defaults.expenses.as_slice());
    assert_eq!(ledger.wallet(), &defaults.wallet);
    assert_eq!(ledger.budget(), &defaults.budget);
    assert_eq!(ledger.threshold_alert(), &defaults.threshold_alert);
    assert_eq!(ledger.goals(), defaults.goals.as_slice());

    let notifications = ledger.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Success);
    assert!(notifications[0].message.contains("cleared"));
}

#[test]
fn state_survives_restart_on_disk() {
    let dir = tempdir().unwrap();
    {
        let mut ledger = Ledger::load(FileStore::new(dir.path()).unwrap());
        ledger.add_expense(expense(dec!(20.5), "Transport")).unwrap();
        ledger.contribute_to_goal("2", dec!(100)).unwrap();
    }

    let ledger = Ledger::load(FileStore::new(dir.path()).unwrap());
    assert_eq!(ledger.expenses().len(), 7);
    assert_eq!(ledger.expenses()[0].amount, dec!(20.5));
    assert_eq!(ledger.wallet().balance, dec!(2330.25));
    assert_eq!(ledger.goal("2").unwrap().current_amount, dec!(400));
}

#[test]
fn corrupt_records_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::new(dir.path()).unwrap();
    store.set(RecordKey::Goals.as_str(), "[{\"id\": 1").unwrap();
    store
        .set(
            RecordKey::Wallet.as_str(),
            r#"{"balance": 10, "currency": "USD"}"#,
        )
        .unwrap();

    let ledger = Ledger::load(store);
    assert_eq!(ledger.goals(), seed::goals().as_slice());
    assert_eq!(ledger.wallet().balance, dec!(10));
    assert_eq!(ledger.wallet().currency, "USD");
}
