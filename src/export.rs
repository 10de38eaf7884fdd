use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::{StorageError, StorageResult};
use crate::models::Expense;

#[derive(Serialize)]
struct ExpenseRow<'a> {
    id: &'a str,
    date: String,
    description: &'a str,
    category: &'a str,
    amount: String,
    receipt: &'a str,
}

/// Writes one header line plus one row per expense, in list order.
pub fn write_expenses_csv<W: Write>(expenses: &[Expense], writer: W) -> StorageResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for expense in expenses {
        csv.serialize(ExpenseRow {
            id: &expense.id,
            date: expense.date.format("%Y-%m-%d").to_string(),
            description: &expense.description,
            category: &expense.category,
            amount: expense.amount.to_string(),
            receipt: expense.receipt.as_deref().unwrap_or(""),
        })?;
    }
    csv.flush()
        .map_err(|e| StorageError::io("csv writer", e))?;
    Ok(())
}

pub fn export_expenses_csv(expenses: &[Expense], path: &Path) -> StorageResult<()> {
    let file = File::create(path).map_err(|e| StorageError::io(path.display().to_string(), e))?;
    write_expenses_csv(expenses, file)?;
    info!("Exported {} expenses to {}", expenses.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn writes_header_and_rows() {
        let mut buffer = Vec::new();
        write_expenses_csv(&seed::expenses()[..3], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "id,date,description,category,amount,receipt");
        assert_eq!(lines[1], "1,2025-04-20,Grocery shopping,Food,45.99,");
        assert_eq!(lines[3], "3,2025-04-17,New headphones,Shopping,129.99,receipt1.jpg");
    }

    #[test]
    fn empty_list_writes_nothing() {
        let mut buffer = Vec::new();
        write_expenses_csv(&[], &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        export_expenses_csv(&seed::expenses(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 7);
    }
}
