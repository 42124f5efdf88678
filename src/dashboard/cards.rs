//! Summary cards for the income, expenses and balance of all transactions.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    html::{CARD_STYLE, CurrencyFormat, format_currency},
    transaction::Totals,
};

/// The server-sent event that replaces the summary cards.
pub const SUMMARY_EVENT: &str = "summary";

fn summary_card(
    id: &str,
    title: &str,
    amount: Decimal,
    amount_style: &str,
    currency_format: &CurrencyFormat,
) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            h3 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }

            p class={"mt-2 text-3xl font-bold " (amount_style)} data-amount
            {
                (format_currency(amount, currency_format))
            }
        }
    }
}

/// Renders the income, expense and balance cards.
///
/// The balance is red when it is negative.
pub(super) fn summary_cards_view(totals: &Totals, currency_format: &CurrencyFormat) -> Markup {
    let balance = totals.balance();
    let balance_style = if balance.is_sign_negative() && !balance.is_zero() {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-white"
    };

    html! {
        div class="grid grid-cols-1 md:grid-cols-3 gap-4"
        {
            (summary_card(
                "income-card",
                "Income",
                totals.income,
                "text-green-600 dark:text-green-400",
                currency_format,
            ))
            (summary_card(
                "expense-card",
                "Expenses",
                totals.expense,
                "text-red-600 dark:text-red-400",
                currency_format,
            ))
            (summary_card("balance-card", "Balance", balance, balance_style, currency_format))
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use scraper::{Html, Selector};

    use crate::{html::CurrencyFormat, transaction::Totals};

    use super::summary_cards_view;

    #[track_caller]
    fn card_amount(html: &Html, id: &str) -> String {
        let selector = Selector::parse(&format!("#{id} [data-amount]")).unwrap();
        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("card {id} missing"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[test]
    fn shows_totals_and_balance() {
        let totals = Totals {
            income: Decimal::new(300000, 2),
            expense: Decimal::new(112050, 2),
        };

        let markup = summary_cards_view(&totals, &CurrencyFormat::default()).into_string();
        let html = Html::parse_fragment(&markup);

        assert_eq!(card_amount(&html, "income-card"), "$3,000.00");
        assert_eq!(card_amount(&html, "expense-card"), "$1,120.50");
        assert_eq!(card_amount(&html, "balance-card"), "$1,879.50");
    }

    #[test]
    fn negative_balance_is_red() {
        let totals = Totals {
            income: Decimal::ZERO,
            expense: Decimal::new(50, 0),
        };

        let markup = summary_cards_view(&totals, &CurrencyFormat::default()).into_string();
        let html = Html::parse_fragment(&markup);

        assert_eq!(card_amount(&html, "balance-card"), "-$50.00");
        let balance = html
            .select(&Selector::parse("#balance-card [data-amount]").unwrap())
            .next()
            .unwrap();
        assert!(
            balance
                .value()
                .attr("class")
                .is_some_and(|class| class.contains("text-red-600"))
        );
    }

    #[test]
    fn zero_totals() {
        let markup =
            summary_cards_view(&Totals::default(), &CurrencyFormat::default()).into_string();
        let html = Html::parse_fragment(&markup);

        assert_eq!(card_amount(&html, "balance-card"), "$0.00");
    }
}
