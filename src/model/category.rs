//! The closed set of transaction categories and the resolver that maps free text onto it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A transaction category. The serialized form (`food_dining`, `salary`, ...) is what gets
/// written into the `Kategori` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    // Income
    Salary,
    Freelance,
    Investment,
    Business,
    Bonus,
    OtherIncome,

    // Expense
    FoodDining,
    Transportation,
    Healthcare,
    Utilities,
    Entertainment,
    ShoppingClothing,
    Electronics,
    Education,
    Insurance,
    RentMortgage,
    Groceries,
    Travel,
    Subscriptions,
    OtherExpense,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

const ALL: [Category; 20] = [
    Category::Salary,
    Category::Freelance,
    Category::Investment,
    Category::Business,
    Category::Bonus,
    Category::OtherIncome,
    Category::FoodDining,
    Category::Transportation,
    Category::Healthcare,
    Category::Utilities,
    Category::Entertainment,
    Category::ShoppingClothing,
    Category::Electronics,
    Category::Education,
    Category::Insurance,
    Category::RentMortgage,
    Category::Groceries,
    Category::Travel,
    Category::Subscriptions,
    Category::OtherExpense,
];

/// Indonesian keywords, checked in order. The first keyword found among the words of the input
/// wins.
const KEYWORDS: &[(&str, Category)] = &[
    ("makan", Category::FoodDining),
    ("makanan", Category::FoodDining),
    ("restoran", Category::FoodDining),
    ("cafe", Category::FoodDining),
    ("snack", Category::FoodDining),
    ("minuman", Category::FoodDining),
    ("bensin", Category::Transportation),
    ("transportasi", Category::Transportation),
    ("ojek", Category::Transportation),
    ("taksi", Category::Transportation),
    ("bus", Category::Transportation),
    ("kereta", Category::Transportation),
    ("parkir", Category::Transportation),
    ("laptop", Category::Electronics),
    ("hp", Category::Electronics),
    ("handphone", Category::Electronics),
    ("komputer", Category::Electronics),
    ("tv", Category::Electronics),
    ("elektronik", Category::Electronics),
    ("baju", Category::ShoppingClothing),
    ("celana", Category::ShoppingClothing),
    ("sepatu", Category::ShoppingClothing),
    ("tas", Category::ShoppingClothing),
    ("pakaian", Category::ShoppingClothing),
    ("gaji", Category::Salary),
    ("freelance", Category::Freelance),
    ("bonus", Category::Bonus),
    ("investasi", Category::Investment),
];

impl Category {
    /// The category used when nothing else matches.
    pub const FALLBACK: Category = Category::OtherExpense;

    /// All categories, income first.
    pub fn all() -> &'static [Category] {
        &ALL
    }

    pub fn is_income(self) -> bool {
        matches!(
            self,
            Category::Salary
                | Category::Freelance
                | Category::Investment
                | Category::Business
                | Category::Bonus
                | Category::OtherIncome
        )
    }

    pub fn income() -> impl Iterator<Item = Category> {
        ALL.into_iter().filter(|c| c.is_income())
    }

    pub fn expense() -> impl Iterator<Item = Category> {
        ALL.into_iter().filter(|c| !c.is_income())
    }

    /// Maps free text onto a category. This never fails: an exact tag (`food_dining`,
    /// `Food Dining`) is used as-is, otherwise the Indonesian keyword table is consulted, and
    /// anything left over becomes `Category::FALLBACK`.
    pub fn resolve(text: &str) -> Category {
        let lower = text.trim().to_lowercase();
        if let Ok(category) = Category::from_str(&lower.replace([' ', '-'], "_")) {
            return category;
        }
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| words.contains(keyword))
            .map(|(_, category)| *category)
            .unwrap_or(Category::FALLBACK)
    }
}
