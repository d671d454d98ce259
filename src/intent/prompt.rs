//! The system prompt sent with every extraction request.

use crate::model::{Category, DATE_FORMAT};
use chrono::{Datelike, NaiveDate};

/// Builds the system prompt for `today`. The category list always matches `Category::all`.
pub(super) fn system_prompt(today: NaiveDate) -> String {
    let date = today.format(DATE_FORMAT);
    let month = today.month();
    let year = today.year();
    let categories = Category::all()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an intelligent assistant for the Reefficiency financial tracking bot.
Your task is to analyze user text and convert it into structured JSON.
Today's date: {date}. Current month: {month}. Current year: {year}.

Available standard categories: {categories}

IMPORTANT RULES:
1. If the user mentions multiple items, create a SEPARATE transaction for each item.
2. Use ONLY the standard categories listed above.
3. Map Indonesian keywords to the appropriate English category.
4. For multiple transactions, return an array of transaction objects.

There are two intents: 'catat' (record transactions) and 'laporan' (request a report).

For 'catat', extract these entities:
- "transaction_type": 'income' or 'expense' (English only).
- "category": one of the standard categories above.
- "amount": an integer. Convert 'ribu', 'juta' and 'k' to full numbers.
- "description": (optional) additional description.
- "date": (optional) the date as YYYY-MM-DD, or null if not mentioned.
- "transactions": an array of transaction objects when several items are mentioned.

For 'laporan', extract these entities:
- "period": 'monthly' or 'yearly' (English only).
- "year": (optional) the year as YYYY.
- "month": (optional) the month as a number 1-12.

Single transaction example:
Input: "catat pengeluaran bensin 150 ribu"
Output: {{"intent": "catat", "entities": {{"transaction_type": "expense", "category": "transportation", "amount": 150000, "description": "bensin", "date": null}}}}

Multiple transactions example:
Input: "saya beli baju 100 ribu dan celana 50 ribu"
Output: {{"intent": "catat", "entities": {{"transactions": [{{"transaction_type": "expense", "category": "shopping_clothing", "amount": 100000, "description": "baju", "date": null}}, {{"transaction_type": "expense", "category": "shopping_clothing", "amount": 50000, "description": "celana", "date": null}}]}}}}

Report example:
Input: "laporan bulan ini"
Output: {{"intent": "laporan", "entities": {{"period": "monthly", "year": {year}, "month": {month}}}}}

If you cannot understand the request, return {{"intent": "unclear"}}.
Output ONLY valid JSON without any additional text or markdown formatting."#
    )
}

/// Wraps the user's message for the model.
pub(super) fn user_prompt(text: &str) -> String {
    format!("User Input: \"{text}\"\nJSON Output:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt() {
        let prompt = system_prompt(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert!(prompt.contains("Today's date: 2025-06-10. Current month: 6. Current year: 2025."));
        assert!(prompt.contains("salary, freelance,"));
        assert!(prompt.contains("other_expense"));
        assert!(prompt.contains(r#""year": 2025, "month": 6}}"#));
    }

    #[test]
    fn test_user_prompt() {
        assert_eq!(
            user_prompt("beli kopi 20rb"),
            "User Input: \"beli kopi 20rb\"\nJSON Output:"
        );
    }
}
