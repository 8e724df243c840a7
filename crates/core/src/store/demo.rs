//! Generated dataset for demo mode.

use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::model::{Category, Ledger, Transaction, TransactionKind};

/// Number of transactions in the demo dataset.
pub const DEMO_TRANSACTION_COUNT: usize = 1500;

/// Demo transactions spread over the past two years.
pub const DEMO_WINDOW_DAYS: i64 = 730;

const EXPENSE_NOTES: [&str; 5] = [
    "Weekly groceries",
    "Lunch with colleagues",
    "Online order",
    "Commute top-up",
    "Utility bill",
];

const INCOME_NOTES: [&str; 3] = ["Monthly salary", "Quarterly bonus", "Side project payout"];

/// Demo ledgers for a user.
#[must_use]
pub fn mock_ledgers(user_id: Uuid) -> Vec<Ledger> {
    let ledger = |name: &str, icon: &str, color: &str, is_default: bool| Ledger {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        is_default,
        is_archived: false,
        created_at: Utc::now(),
    };

    vec![
        ledger("Personal", "📔", "blue", true),
        ledger("Family", "🏠", "green", false),
    ]
}

/// Demo category tree for a user: expense roots with children, plus an
/// income root.
#[must_use]
pub fn mock_categories(user_id: Uuid) -> Vec<Category> {
    let mut categories = Vec::new();
    let mut add_root = |name: &str, icon: &str| {
        let id = Uuid::new_v4();
        categories.push(Category {
            id,
            user_id,
            name: name.to_string(),
            parent_id: None,
            icon: icon.to_string(),
        });
        id
    };

    let dining = add_root("Dining", "🍜");
    let transport = add_root("Transport", "🚇");
    let shopping = add_root("Shopping", "🛍️");
    let income = add_root("Income", "💰");

    let children = [
        ("Breakfast", "🥐", dining),
        ("Lunch", "🍱", dining),
        ("Dinner", "🍲", dining),
        ("Taxi", "🚕", transport),
        ("Subway", "🚈", transport),
        ("Digital", "📱", shopping),
        ("Clothing", "👕", shopping),
        ("Salary", "💵", income),
        ("Bonus", "🧧", income),
    ];
    for (name, icon, parent) in children {
        categories.push(Category {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            parent_id: Some(parent),
            icon: icon.to_string(),
        });
    }
    categories
}

/// Generate the demo transaction set: 70% expenses between 10 and 510,
/// 30% income between 5000 and 15000, all CNY, spread over the window,
/// newest first.
pub fn generate_mock_transactions<R: Rng>(
    user_id: Uuid,
    ledgers: &[Ledger],
    categories: &[Category],
    rng: &mut R,
) -> Vec<Transaction> {
    let income_root = categories
        .iter()
        .find(|c| c.is_root() && c.name == "Income")
        .map(|c| c.id);

    let income_categories: Vec<&Category> = categories
        .iter()
        .filter(|c| c.parent_id.is_some() && c.parent_id == income_root)
        .collect();
    let expense_categories: Vec<&Category> = categories
        .iter()
        .filter(|c| c.parent_id.is_some() && c.parent_id != income_root)
        .collect();

    let now = Utc::now();
    let mut transactions: Vec<Transaction> = (0..DEMO_TRANSACTION_COUNT)
        .map(|_| {
            let is_expense = rng.random_bool(0.7);
            let (kind, category, description, amount) = if is_expense {
                (
                    TransactionKind::Expense,
                    expense_categories[rng.random_range(0..expense_categories.len())],
                    EXPENSE_NOTES[rng.random_range(0..EXPENSE_NOTES.len())],
                    Decimal::from(rng.random_range(10u32..=510)),
                )
            } else {
                (
                    TransactionKind::Income,
                    income_categories[rng.random_range(0..income_categories.len())],
                    INCOME_NOTES[rng.random_range(0..INCOME_NOTES.len())],
                    Decimal::from(rng.random_range(5000u32..=15000)),
                )
            };

            let created_at = now - Duration::days(rng.random_range(0..DEMO_WINDOW_DAYS));
            Transaction {
                id: Uuid::new_v4(),
                user_id,
                ledger_id: Some(ledgers[rng.random_range(0..ledgers.len())].id),
                category_id: category.id,
                amount,
                currency: "CNY".to_string(),
                kind,
                description: description.to_string(),
                attachments: Vec::new(),
                transaction_date: created_at.date_naive(),
                created_at,
            }
        })
        .collect();

    transactions.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then(b.created_at.cmp(&a.created_at))
    });
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset() -> (Vec<Ledger>, Vec<Category>, Vec<Transaction>) {
        let user_id = Uuid::new_v4();
        let ledgers = mock_ledgers(user_id);
        let categories = mock_categories(user_id);
        let mut rng = StdRng::seed_from_u64(7);
        let transactions = generate_mock_transactions(user_id, &ledgers, &categories, &mut rng);
        (ledgers, categories, transactions)
    }

    #[test]
    fn generates_the_full_count() {
        let (_, _, transactions) = dataset();
        assert_eq!(transactions.len(), DEMO_TRANSACTION_COUNT);
    }

    #[test]
    fn amounts_match_kind_bands() {
        let (_, _, transactions) = dataset();
        for t in &transactions {
            assert_eq!(t.currency, "CNY");
            match t.kind {
                TransactionKind::Expense => {
                    assert!(t.amount >= Decimal::from(10) && t.amount <= Decimal::from(510));
                }
                TransactionKind::Income => {
                    assert!(t.amount >= Decimal::from(5000) && t.amount <= Decimal::from(15000));
                }
            }
        }
    }

    #[test]
    fn expenses_dominate() {
        let (_, _, transactions) = dataset();
        let expenses = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .count();
        // 70% split with generous slack for sampling noise.
        assert!(expenses > DEMO_TRANSACTION_COUNT * 6 / 10);
        assert!(expenses < DEMO_TRANSACTION_COUNT * 8 / 10);
    }

    #[test]
    fn sorted_newest_first_within_window() {
        let (_, _, transactions) = dataset();
        let today = Utc::now().date_naive();
        for pair in transactions.windows(2) {
            assert!(pair[0].transaction_date >= pair[1].transaction_date);
        }
        for t in &transactions {
            let age = today - t.transaction_date;
            assert!(age.num_days() >= 0 && age.num_days() < DEMO_WINDOW_DAYS);
        }
    }

    #[test]
    fn kinds_respect_the_category_tree() {
        let (ledgers, categories, transactions) = dataset();
        let income_root = categories
            .iter()
            .find(|c| c.is_root() && c.name == "Income")
            .unwrap()
            .id;
        let ledger_ids: Vec<Uuid> = ledgers.iter().map(|l| l.id).collect();

        for t in &transactions {
            let category = categories.iter().find(|c| c.id == t.category_id).unwrap();
            let under_income = category.parent_id == Some(income_root);
            assert_eq!(under_income, t.kind == TransactionKind::Income);
            assert!(ledger_ids.contains(&t.ledger_id.unwrap()));
            assert!(t.attachments.is_empty());
        }
    }
}
