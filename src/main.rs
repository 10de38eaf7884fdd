mod config;
mod ui;

use crate::config::Config;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use env_logger::{Env, Target};
use log::{error, info};
use pursesh::export::export_expenses_csv;
use pursesh::ledger::BACKUP_KEY;
use pursesh::remote::DirectoryBlobStore;
use pursesh::{
    Budget, BudgetPeriod, Expense, ExpenseFilter, FileStore, Ledger, NewExpense, NewGoal,
    Notification, NotificationFilter, ThresholdAlert,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use rust_decimal::Decimal;
use std::fs::OpenOptions;
use std::io::{Stdout, stdout};
use std::str::FromStr;
use std::time::Duration;

fn main() -> Result<()> {
    let config = Config::load()?;
    config.ensure_dirs()?;
    init_logging(&config)?;
    info!("Starting pursesh with data in {}", config.data_dir.display());

    let mut app = App::new(config)?;
    let res = run(&mut app);
    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("Application error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to a file so they never draw over the terminal UI.
fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {:?}", config.log_file))?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    terminal
        .backend_mut()
        .execute(LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;

    result
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Expenses,
    Goals,
    Notifications,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Overview, Tab::Expenses, Tab::Goals, Tab::Notifications];

    fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Expenses => "Expenses",
            Tab::Goals => "Goals",
            Tab::Notifications => "Notifications",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1).min(Tab::ALL.len() - 1)]
    }

    fn prev(self) -> Self {
        Tab::ALL[self.index().saturating_sub(1)]
    }
}

struct App {
    ledger: Ledger<FileStore>,
    config: Config,
    active_tab: Tab,
    selected: usize,
    form: Option<Form>,
    expense_filter: ExpenseFilter,
    notification_filter: NotificationFilter,
    confirm_reset: bool,
    last_message: String,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store = FileStore::new(&config.data_dir).context("opening data directory")?;
        let ledger = Ledger::load(store);
        Ok(Self {
            ledger,
            config,
            active_tab: Tab::Overview,
            selected: 0,
            form: None,
            expense_filter: ExpenseFilter::default(),
            notification_filter: NotificationFilter::default(),
            confirm_reset: false,
            last_message: "Loaded data".to_string(),
        })
    }

    fn visible_expenses(&self) -> Vec<&Expense> {
        self.ledger.find_expenses(&self.expense_filter)
    }

    fn visible_notifications(&self) -> Vec<&Notification> {
        self.ledger.filtered_notifications(self.notification_filter)
    }

    fn visible_len(&self) -> usize {
        match self.active_tab {
            Tab::Overview => 0,
            Tab::Expenses => self.visible_expenses().len(),
            Tab::Goals => self.ledger.goals().len(),
            Tab::Notifications => self.visible_notifications().len(),
        }
    }

    fn selected_id(&self) -> Option<String> {
        match self.active_tab {
            Tab::Overview => None,
            Tab::Expenses => self.visible_expenses().get(self.selected).map(|e| e.id.clone()),
            Tab::Goals => self.ledger.goals().get(self.selected).map(|g| g.id.clone()),
            Tab::Notifications => self
                .visible_notifications()
                .get(self.selected)
                .map(|n| n.id.clone()),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.selected = 0;
    }

    fn open_form(&mut self, kind: FormKind) {
        let target = match kind {
            FormKind::Contribution | FormKind::Receipt => match self.selected_id() {
                Some(id) => Some(id),
                None => {
                    self.last_message = "Select an item first".into();
                    return;
                }
            },
            _ => None,
        };
        self.form = Some(Form::new(kind, target, self));
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            self.last_message = "Nothing selected".into();
            return;
        };
        self.last_message = match self.active_tab {
            Tab::Expenses => match self.ledger.delete_expense(&id) {
                Some(expense) => format!("Deleted \"{}\"", expense.description),
                None => "Expense not found".into(),
            },
            Tab::Goals => match self.ledger.delete_goal(&id) {
                Some(goal) => format!("Deleted goal \"{}\"", goal.name),
                None => "Goal not found".into(),
            },
            Tab::Notifications => {
                self.ledger.delete_notification(&id);
                "Notification deleted".into()
            }
            Tab::Overview => return,
        };
        self.clamp_selection();
    }

    fn mark_selected_read(&mut self) {
        if self.active_tab != Tab::Notifications {
            return;
        }
        if let Some(id) = self.selected_id()
            && self.ledger.mark_notification_as_read(&id)
        {
            self.last_message = "Marked as read".into();
            self.clamp_selection();
        }
    }

    fn export(&mut self) {
        self.last_message = match export_expenses_csv(self.ledger.expenses(), &self.config.export_file) {
            Ok(()) => format!("Exported to {}", self.config.export_file.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn backup(&mut self) {
        let saved = DirectoryBlobStore::new(&self.config.backup_dir)
            .and_then(|mut remote| self.ledger.backup_to(&mut remote, BACKUP_KEY));
        self.last_message = match saved {
            Ok(location) => format!("Backed up to {location}"),
            Err(err) => {
                error!("Backup failed: {err}");
                format!("Backup failed: {err}")
            }
        };
    }

    fn restore(&mut self) {
        let restored = DirectoryBlobStore::new(&self.config.backup_dir)
            .and_then(|remote| self.ledger.restore_from(&remote, BACKUP_KEY));
        self.last_message = match restored {
            Ok(true) => "Restored from backup".into(),
            Ok(false) => "No backup found".into(),
            Err(err) => {
                error!("Restore failed: {err}");
                format!("Restore failed: {err}")
            }
        };
        self.clamp_selection();
    }

    fn reload(&mut self) {
        match FileStore::new(&self.config.data_dir) {
            Ok(store) => {
                self.ledger = Ledger::load(store);
                self.clamp_selection();
                self.last_message = "Reloaded data".into();
            }
            Err(err) => {
                error!("Reload failed: {err}");
                self.last_message = format!("Reload failed: {err}");
            }
        }
    }

    fn request_reset(&mut self) {
        if self.confirm_reset {
            self.ledger.reset_all();
            self.confirm_reset = false;
            self.selected = 0;
            self.last_message = "All data reset".into();
        } else {
            self.confirm_reset = true;
            self.last_message = "Press R again to erase all data".into();
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FormKind {
    Expense,
    Search,
    Budget,
    Threshold,
    Funds,
    Goal,
    Contribution,
    Receipt,
}

#[derive(Clone)]
struct Field {
    label: &'static str,
    value: String,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

struct Form {
    kind: FormKind,
    fields: Vec<Field>,
    index: usize,
    /// Id of the expense or goal the form acts on.
    target: Option<String>,
}

impl Form {
    fn new(kind: FormKind, target: Option<String>, app: &App) -> Self {
        let ledger = &app.ledger;
        let today = Local::now().date_naive();
        let fields = match kind {
            FormKind::Expense => vec![
                Field::new("Description", ""),
                Field::new("Amount", ""),
                Field::new("Category", "Food"),
                Field::new("Date (YYYY-MM-DD)", today.to_string()),
            ],
            FormKind::Search => vec![
                Field::new("Search", app.expense_filter.search.clone()),
                Field::new(
                    "Category (blank for all)",
                    app.expense_filter.category.clone().unwrap_or_default(),
                ),
            ],
            FormKind::Budget => vec![
                Field::new("Amount", ledger.budget().amount.to_string()),
                Field::new("Period (daily/weekly/monthly/yearly)", ledger.budget().period.to_string()),
            ],
            FormKind::Threshold => vec![
                Field::new("Amount", ledger.threshold_alert().amount.to_string()),
                Field::new(
                    "Enabled (y/n)",
                    if ledger.threshold_alert().enabled { "y" } else { "n" },
                ),
            ],
            FormKind::Funds => vec![
                Field::new("Amount (+deposit / -withdraw)", ""),
                Field::new("Currency", ledger.wallet().currency.clone()),
            ],
            FormKind::Goal => vec![
                Field::new("Name", ""),
                Field::new("Target", ""),
                Field::new("Saved so far", "0"),
                Field::new("Deadline (YYYY-MM-DD, optional)", ""),
                Field::new("Description (optional)", ""),
            ],
            FormKind::Contribution => vec![Field::new("Amount", "")],
            FormKind::Receipt => vec![Field::new("Receipt reference", "")],
        };
        Self {
            kind,
            fields,
            index: 0,
            target,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Expense => "Add expense",
            FormKind::Search => "Filter expenses",
            FormKind::Budget => "Set budget",
            FormKind::Threshold => "Spending threshold",
            FormKind::Funds => "Wallet",
            FormKind::Goal => "New goal",
            FormKind::Contribution => "Contribute to goal",
            FormKind::Receipt => "Attach receipt",
        }
    }

    fn value(&self, i: usize) -> &str {
        self.fields[i].value.trim()
    }

    fn current_mut(&mut self) -> &mut Field {
        &mut self.fields[self.index]
    }

    fn next(&mut self) {
        if self.index + 1 < self.fields.len() {
            self.index += 1;
        }
    }

    fn prev(&mut self) {
        if self.index > 0 {
            self.index -= 1;
        }
    }

    fn push_char(&mut self, c: char) {
        self.current_mut().value.push(c);
    }

    fn backspace(&mut self) {
        self.current_mut().value.pop();
    }

    fn target(&self) -> Result<&str> {
        self.target.as_deref().ok_or_else(|| anyhow!("Nothing selected"))
    }

    /// Applies the form to the app and returns the status line to show.
    fn submit(&self, app: &mut App) -> Result<String> {
        match self.kind {
            FormKind::Expense => {
                if self.value(0).is_empty() {
                    bail!("Description is required");
                }
                let category = match self.value(2) {
                    "" => "Other",
                    category => category,
                };
                let expense = NewExpense::new(
                    parse_amount("Amount", self.value(1))?,
                    category,
                    self.value(0),
                    parse_date(self.value(3))?.unwrap_or_else(Local::now),
                );
                app.ledger.add_expense(expense)?;
                Ok("Expense added".into())
            }
            FormKind::Search => {
                app.expense_filter = ExpenseFilter {
                    search: self.value(0).to_string(),
                    category: Some(self.value(1).to_string()).filter(|c| !c.is_empty()),
                };
                app.selected = 0;
                Ok("Filter applied".into())
            }
            FormKind::Budget => {
                let period = BudgetPeriod::parse(self.value(1))
                    .ok_or_else(|| anyhow!("Period must be daily, weekly, monthly or yearly"))?;
                app.ledger.set_budget(Budget {
                    amount: parse_amount("Amount", self.value(0))?,
                    period,
                })?;
                Ok("Budget saved".into())
            }
            FormKind::Threshold => {
                app.ledger.set_threshold_alert(ThresholdAlert {
                    amount: parse_amount("Amount", self.value(0))?,
                    enabled: parse_flag(self.value(1))?,
                })?;
                Ok("Threshold saved".into())
            }
            FormKind::Funds => {
                let currency = self.value(1);
                if currency.is_empty() {
                    bail!("Currency is required");
                }
                let amount = match self.value(0) {
                    "" => None,
                    raw => Some(parse_amount("Amount", raw)?),
                };

                match amount {
                    Some(amount) if amount.is_sign_negative() => {
                        app.ledger.withdraw(amount.abs())?;
                    }
                    Some(amount) => {
                        app.ledger.deposit(amount)?;
                    }
                    None => {}
                }
                if !currency.eq_ignore_ascii_case(&app.ledger.wallet().currency) {
                    app.ledger.set_currency(currency)?;
                }

                let wallet = app.ledger.wallet();
                Ok(match amount {
                    Some(_) => format!(
                        "Balance now {}",
                        ui::format_currency(wallet.balance, &wallet.currency)
                    ),
                    None => format!("Currency set to {}", wallet.currency),
                })
            }
            FormKind::Goal => {
                let current = match self.value(2) {
                    "" => Decimal::ZERO,
                    raw => parse_amount("Saved so far", raw)?,
                };
                let description = Some(self.value(4).to_string()).filter(|d| !d.is_empty());
                app.ledger.add_goal(NewGoal {
                    name: self.value(0).to_string(),
                    target_amount: parse_amount("Target", self.value(1))?,
                    current_amount: current,
                    deadline: parse_date(self.value(3))?,
                    description,
                })?;
                Ok("Goal created".into())
            }
            FormKind::Contribution => {
                let amount = parse_amount("Amount", self.value(0))?;
                app.ledger.contribute_to_goal(self.target()?, amount)?;
                Ok("Contribution saved".into())
            }
            FormKind::Receipt => {
                let reference = self.value(0);
                if reference.is_empty() {
                    bail!("Receipt reference is required");
                }
                if !app.ledger.upload_receipt(self.target()?, reference) {
                    bail!("Expense not found");
                }
                Ok("Receipt attached".into())
            }
        }
    }
}

fn parse_amount(label: &str, raw: &str) -> Result<Decimal> {
    if raw.is_empty() {
        bail!("{label} is required");
    }
    Decimal::from_str(raw).with_context(|| format!("{label} must be a number"))
}

/// Blank input means "no date". Dates are stored at local noon.
fn parse_date(raw: &str) -> Result<Option<DateTime<Local>>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").context("Date must be YYYY-MM-DD")?;
    if date == Local::now().date_naive() {
        return Ok(Some(Local::now()));
    }
    let noon = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| anyhow!("invalid date {raw}"))?;
    let local = Local
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| anyhow!("{raw} does not exist in the local time zone"))?;
    Ok(Some(local))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "on" => Ok(true),
        "n" | "no" | "false" | "off" => Ok(false),
        _ => bail!("Enabled must be y or n"),
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;
        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
            && handle_key(app, key)?
        {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    if let Some(mut form) = app.form.take() {
        match key.code {
            KeyCode::Esc => {
                app.last_message = format!("Cancelled {}", form.title().to_lowercase());
                return Ok(false);
            }
            KeyCode::Tab | KeyCode::Down => form.next(),
            KeyCode::BackTab | KeyCode::Up => form.prev(),
            KeyCode::Enter => {
                if form.index + 1 < form.fields.len() {
                    form.next();
                } else {
                    match form.submit(app) {
                        Ok(message) => {
                            app.last_message = message;
                            app.clamp_selection();
                            return Ok(false);
                        }
                        Err(err) => app.last_message = err.to_string(),
                    }
                }
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.push_char(c),
            _ => {}
        }
        app.form = Some(form);
        return Ok(false);
    }

    if key.code != KeyCode::Char('R') {
        app.confirm_reset = false;
    }

    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
        KeyCode::Char('h') | KeyCode::Left => app.switch_tab(app.active_tab.prev()),
        KeyCode::Char('l') | KeyCode::Right => app.switch_tab(app.active_tab.next()),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.selected + 1 < app.visible_len() {
                app.selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => app.selected = app.selected.saturating_sub(1),
        KeyCode::Char('a') => app.open_form(FormKind::Expense),
        KeyCode::Char('/') => app.open_form(FormKind::Search),
        KeyCode::Char('b') => app.open_form(FormKind::Budget),
        KeyCode::Char('t') => app.open_form(FormKind::Threshold),
        KeyCode::Char('w') => app.open_form(FormKind::Funds),
        KeyCode::Char('n') => app.open_form(FormKind::Goal),
        KeyCode::Char('c') if app.active_tab == Tab::Goals => app.open_form(FormKind::Contribution),
        KeyCode::Char('u') if app.active_tab == Tab::Expenses => app.open_form(FormKind::Receipt),
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Char('m') => app.mark_selected_read(),
        KeyCode::Char('x') if app.active_tab == Tab::Notifications => {
            app.ledger.clear_all_notifications();
            app.selected = 0;
            app.last_message = "Notifications cleared".into();
        }
        KeyCode::Char('v') => {
            app.notification_filter = app.notification_filter.next();
            app.selected = 0;
            app.last_message = format!("Showing {} notifications", app.notification_filter);
        }
        KeyCode::Char('e') => app.export(),
        KeyCode::Char('B') => app.backup(),
        KeyCode::Char('L') => app.restore(),
        KeyCode::Char('R') => app.request_reset(),
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }

    Ok(false)
}
