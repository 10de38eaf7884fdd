use crate::{App, Field, Tab};
use pursesh::{FileStore, Ledger, NotificationKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub(crate) fn draw(f: &mut ratatui::Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(8),
        ])
        .split(f.size());

    let top = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(layout[0]);

    render_header(f, top[0], app);

    let unread = app.ledger.unread_count();
    let tab_titles = Tab::ALL
        .iter()
        .map(|t| match t {
            Tab::Notifications if unread > 0 => Line::from(format!("{} ({unread})", t.title())),
            _ => Line::from(t.title()),
        })
        .collect::<Vec<_>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(app.active_tab.index());
    f.render_widget(tabs, top[1]);

    match app.active_tab {
        Tab::Overview => render_overview(f, layout[1], &app.ledger),
        Tab::Expenses => render_expenses(f, layout[1], app),
        Tab::Goals => render_goals(f, layout[1], app),
        Tab::Notifications => render_notifications(f, layout[1], app),
    }

    render_footer(f, layout[2], app);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let wallet = app.ledger.wallet();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "pursesh",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  | balance "),
        styled_balance(wallet.balance, &wallet.currency),
        Span::raw("  | data "),
        Span::styled(
            app.ledger.store().path().to_string_lossy(),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .wrap(Wrap { trim: true });
    f.render_widget(header, area);
}

fn render_overview(f: &mut ratatui::Frame, area: Rect, ledger: &Ledger<FileStore>) {
    let currency = ledger.wallet().currency.as_str();
    let status = ledger.budget_status();
    let summary = ledger.dashboard();
    let threshold = ledger.threshold_alert();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Wallet: "),
            styled_balance(ledger.wallet().balance, currency),
        ]),
        Line::from(" "),
        Line::from(format!(
            "Budget ({}): {} / {} ({:.0}%)",
            status.period,
            format_currency(status.used, currency),
            format_currency(status.amount, currency),
            status.progress
        )),
    ];
    if status.is_over_budget {
        lines.push(Line::from(Span::styled(
            format!(
                "Over budget by {}",
                format_currency(status.used - status.amount, currency)
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(format!(
            "Remaining: {}",
            format_currency(status.remaining(), currency)
        )));
    }
    lines.push(Line::from(format!(
        "Threshold alert: {} ({})",
        format_currency(threshold.amount, currency),
        if threshold.enabled { "on" } else { "off" }
    )));
    lines.push(Line::from(" "));
    lines.push(Line::from(format!(
        "Last 7 days: {}",
        format_currency(summary.recent_spending, currency)
    )));
    lines.push(Line::from(format!(
        "All time: {}",
        format_currency(summary.total_spent, currency)
    )));
    lines.push(Line::from(" "));
    lines.push(Line::from("By category:"));
    if summary.by_category.is_empty() {
        lines.push(Line::from("No expenses yet. Press a to add one."));
    }
    for category in &summary.by_category {
        lines.push(Line::from(format!(
            "- {}: {}",
            category.name,
            format_currency(category.total, currency)
        )));
    }
    let stats = Paragraph::new(lines)
        .block(Block::default().title("Summary").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(stats, chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(chunks[1]);

    render_trend_chart(f, right_chunks[0], ledger);
    render_comparison(f, right_chunks[1], ledger);
}

fn render_trend_chart(f: &mut ratatui::Frame, area: Rect, ledger: &Ledger<FileStore>) {
    let data: Vec<(&str, u64)> = ledger
        .spending_trends()
        .iter()
        .map(|t| (t.category.as_str(), t.amount.round().to_u64().unwrap_or(0)))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title("Spending by category")
                .borders(Borders::ALL),
        )
        .bar_width(8)
        .data(&data)
        .value_style(Style::default().fg(Color::Yellow))
        .label_style(Style::default().fg(Color::White));
    f.render_widget(chart, area);
}

fn render_comparison(f: &mut ratatui::Frame, area: Rect, ledger: &Ledger<FileStore>) {
    let currency = ledger.wallet().currency.as_str();
    let rows: Vec<Row> = ledger
        .period_comparison()
        .into_iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.category),
                Cell::from(format_currency(t.amount, currency)),
                Cell::from(format_currency(t.previous_amount, currency)),
                Cell::from(styled_change(t.change)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
        Constraint::Percentage(20),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Category", "This period", "Previous", "Change"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(format!("{} comparison", ledger.budget().period))
                .borders(Borders::ALL),
        );
    f.render_widget(table, area);
}

fn render_expenses(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let currency = app.ledger.wallet().currency.as_str();
    let header = Row::new(vec!["Date", "Description", "Category", "Amount", "Receipt"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .visible_expenses()
        .into_iter()
        .enumerate()
        .map(|(i, expense)| {
            Row::new(vec![
                Cell::from(expense.date.format("%Y-%m-%d").to_string()),
                Cell::from(expense.description.clone()),
                Cell::from(expense.category.clone()),
                Cell::from(Span::styled(
                    format_currency(expense.amount, currency),
                    Style::default().fg(Color::Red),
                )),
                Cell::from(expense.receipt.clone().unwrap_or_default()),
            ])
            .style(row_style(i == app.selected))
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Percentage(35),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Percentage(20),
    ];
    let filter = &app.expense_filter;
    let title = if filter.search.is_empty() && filter.category.is_none() {
        "Expenses".to_string()
    } else {
        format!(
            "Expenses matching \"{}\" in {}",
            filter.search,
            filter.category.as_deref().unwrap_or("all categories")
        )
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn render_goals(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let currency = app.ledger.wallet().currency.as_str();
    let rows: Vec<Row> = app
        .ledger
        .goals()
        .iter()
        .enumerate()
        .map(|(i, goal)| {
            let progress = if goal.is_complete() {
                Span::styled("done", Style::default().fg(Color::Green))
            } else {
                Span::raw(format!("{:.0}%", goal.progress()))
            };
            Row::new(vec![
                Cell::from(goal.name.clone()),
                Cell::from(format!(
                    "{} / {}",
                    format_currency(goal.current_amount, currency),
                    format_currency(goal.target_amount, currency)
                )),
                Cell::from(progress),
                Cell::from(
                    goal.deadline
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ),
                Cell::from(goal.description.clone().unwrap_or_default()),
            ])
            .style(row_style(i == app.selected))
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(30),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Percentage(30),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Goal", "Saved", "Progress", "Deadline", "Notes"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title("Savings goals").borders(Borders::ALL));
    f.render_widget(table, area);
}

fn render_notifications(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let rows: Vec<Row> = app
        .visible_notifications()
        .into_iter()
        .enumerate()
        .map(|(i, notification)| {
            let color = match notification.kind {
                NotificationKind::Alert => Color::Red,
                NotificationKind::Info => Color::Cyan,
                NotificationKind::Success => Color::Green,
            };
            let kind = match notification.kind {
                NotificationKind::Alert => "alert",
                NotificationKind::Info => "info",
                NotificationKind::Success => "success",
            };
            Row::new(vec![
                Cell::from(if notification.read { " " } else { "*" }),
                Cell::from(notification.date.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(Span::styled(kind, Style::default().fg(color))),
                Cell::from(notification.message.clone()),
            ])
            .style(row_style(i == app.selected))
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(17),
        Constraint::Length(8),
        Constraint::Percentage(70),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["", "Date", "Type", "Message"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(format!("Notifications ({})", app.notification_filter))
                .borders(Borders::ALL),
        );
    f.render_widget(table, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, app: &App) {
    if let Some(form) = &app.form {
        render_form(f, area, form.title(), &form.fields, form.index);
        return;
    }

    let keys = match app.active_tab {
        Tab::Overview => "b budget  t threshold  w wallet  e export csv",
        Tab::Expenses => "a add  d delete  u receipt  / filter  e export csv",
        Tab::Goals => "n new goal  c contribute  d delete",
        Tab::Notifications => "m mark read  d delete  x clear all  v filter",
    };
    let footer = Paragraph::new(vec![
        Line::from(format!("q quit  h/l tabs  j/k select  {keys}")),
        Line::from("B backup  L restore  r reload  R reset"),
        Line::from(Span::styled(
            app.last_message.as_str(),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}

fn render_form(f: &mut ratatui::Frame, area: Rect, title: &str, fields: &[Field], index: usize) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let label = if i == index {
            Span::styled(
                field.label,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(field.label)
        };
        lines.push(Line::from(vec![
            label,
            Span::raw(": "),
            Span::raw(field.value.clone()),
        ]));
    }
    lines.push(Line::from("Enter: next/submit   Tab: next   Esc: cancel"));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
    } else {
        Style::default()
    }
}

pub(crate) fn format_currency(value: Decimal, currency: &str) -> String {
    if value.is_sign_negative() {
        format!("-{currency} {:.2}", value.abs())
    } else {
        format!("{currency} {:.2}", value)
    }
}

fn styled_balance(balance: Decimal, currency: &str) -> Span<'static> {
    let color = if balance >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    };
    Span::styled(format_currency(balance, currency), Style::default().fg(color))
}

fn styled_change(change: Decimal) -> Span<'static> {
    let (color, sign) = if change > Decimal::ZERO {
        (Color::Red, "+")
    } else {
        (Color::Green, "")
    };
    Span::styled(format!("{sign}{change:.1}%"), Style::default().fg(color))
}
