use chrono::NaiveDate;
use log::debug;

use crate::aggregate::monthly_total;
use crate::models::{
    BudgetPeriod, LedgerData, NewNotification, Notification, NotificationKind, NotificationTag,
};

pub fn threshold_message(data: &LedgerData) -> String {
    format!(
        "You've exceeded your {} {} spending threshold",
        data.threshold_alert.amount.normalize(),
        data.wallet.currency
    )
}

/// True while a threshold-breach alert is still in the log, read or not.
pub fn has_threshold_alert(notifications: &[Notification]) -> bool {
    notifications.iter().any(is_threshold_alert)
}

/// Tagged breach alerts, plus untagged alerts mentioning the threshold as
/// written by records that predate the tag.
fn is_threshold_alert(notification: &Notification) -> bool {
    match notification.tag {
        Some(tag) => tag == NotificationTag::ThresholdBreach,
        None => {
            notification.kind == NotificationKind::Alert
                && notification.message.to_lowercase().contains("threshold")
        }
    }
}

/// Decides whether a new threshold alert is due.
///
/// Only applies to monthly budgets with the alert enabled. Fires when spend
/// in the month of `today` reaches the threshold and no earlier breach alert
/// is still present; deleting that alert re-arms the check.
pub fn evaluate_threshold(data: &LedgerData, today: NaiveDate) -> Option<NewNotification> {
    let threshold = &data.threshold_alert;
    if !threshold.enabled || data.budget.period != BudgetPeriod::Monthly {
        return None;
    }

    let spent = monthly_total(&data.expenses, today);
    if spent < threshold.amount {
        return None;
    }
    if has_threshold_alert(&data.notifications) {
        debug!("Threshold {} reached but already notified", threshold.amount);
        return None;
    }

    Some(NewNotification::alert(threshold_message(data)).tagged(NotificationTag::ThresholdBreach))
}
