//! The monthly income and expense chart.
//!
//! The chart is built with charming, serialized as ECharts options and
//! initialized by an inline script when the fragment is swapped in.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip, Trigger,
    },
    series::bar,
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    endpoints,
    html::{CurrencyFormat, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::MonthlyBucket,
};

/// The HTML element the chart is drawn in.
const CHART_ID: &str = "monthly-chart";

/// Income and expenses share one bar per month.
const MONTH_STACK: &str = "month";

fn to_chart_value(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

fn month_label(bucket: &MonthlyBucket) -> String {
    bucket.month.to_string().chars().take(3).collect()
}

/// A bar chart with an income and an expense bar for every month of `year`.
pub(super) fn monthly_chart(
    buckets: &[MonthlyBucket; 12],
    year: i32,
    currency_format: &CurrencyFormat,
) -> Chart {
    let labels = buckets.iter().map(month_label).collect::<Vec<_>>();
    let income = buckets
        .iter()
        .map(|bucket| to_chart_value(bucket.income))
        .collect::<Vec<_>>();
    let expenses = buckets
        .iter()
        .map(|bucket| to_chart_value(bucket.expense))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Income and expenses").subtext(year.to_string()))
        .tooltip(currency_tooltip(currency_format))
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency_format))),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .stack(MONTH_STACK)
                .item_style(ItemStyle::new().color("#16a34a"))
                .data(income),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .stack(MONTH_STACK)
                .item_style(ItemStyle::new().color("#dc2626"))
                .data(expenses),
        )
}

fn currency_formatter(currency_format: &CurrencyFormat) -> JsFunction {
    // A JSON string is also a valid JavaScript string literal.
    let symbol = serde_json::to_string(&currency_format.symbol)
        .unwrap_or_else(|_| "\"$\"".to_owned());
    let locale = if currency_format.decimal_comma {
        "de-DE"
    } else {
        "en-US"
    };

    JsFunction::new_with_args(
        "number",
        &format!(
            "const numberFormatter = new Intl.NumberFormat('{locale}', {{
                minimumFractionDigits: 2,
                maximumFractionDigits: 2
            }});
            if (!number) {{ return \"-\"; }}
            const sign = number < 0 ? \"-\" : \"\";
            return sign + {symbol} + numberFormatter.format(Math.abs(number));"
        ),
    )
}

fn currency_tooltip(currency_format: &CurrencyFormat) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency_format))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

fn chart_script(chart: &Chart) -> Markup {
    let script = format!(
        r#"(function() {{
            const chartDom = document.getElementById("{CHART_ID}");
            const existing = echarts.getInstanceByDom(chartDom);
            if (existing) {{ existing.dispose(); }}
            const chart = echarts.init(chartDom);
            chart.setOption({options});

            new ResizeObserver(() => chart.resize()).observe(chartDom);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
            }};
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        options = chart
    );

    html! { script { (PreEscaped(script)) } }
}

fn year_select(year: i32, years: &[i32]) -> Markup {
    let mut options = years.to_vec();
    if !options.contains(&year) {
        options.push(year);
        options.sort_unstable();
    }

    html! {
        div class="flex items-center gap-2 mb-2"
        {
            label for="chart-year" class=(FORM_LABEL_STYLE) { "Year" }

            select
                id="chart-year"
                name="year"
                hx-get=(endpoints::DASHBOARD_CHART)
                hx-trigger="change"
                hx-target="#chart-container"
                hx-target-error="#alert-container"
                class={"max-w-32 " (FORM_TEXT_INPUT_STYLE)}
            {
                @for option in options {
                    option value=(option) selected[option == year] { (option) }
                }
            }
        }
    }
}

/// The chart for `year` with a selector for the years that have transactions.
pub(super) fn chart_view(
    buckets: &[MonthlyBucket; 12],
    year: i32,
    years: &[i32],
    currency_format: &CurrencyFormat,
) -> Markup {
    let chart = monthly_chart(buckets, year, currency_format);

    html! {
        (year_select(year, years))

        div id=(CHART_ID) class="min-h-[380px] rounded dark:bg-gray-100" {}

        (chart_script(&chart))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use scraper::{Html, Selector};
    use time::Month;

    use crate::{html::CurrencyFormat, transaction::MonthlyBucket};

    use super::{chart_view, monthly_chart};

    fn buckets() -> [MonthlyBucket; 12] {
        let mut month = Month::January;
        std::array::from_fn(|_| {
            let bucket = MonthlyBucket {
                month,
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
            };
            month = month.next();
            bucket
        })
    }

    #[test]
    fn chart_has_month_labels_and_both_series() {
        let mut buckets = buckets();
        buckets[2].income = Decimal::new(300000, 2);
        buckets[2].expense = Decimal::new(4550, 2);

        let options = monthly_chart(&buckets, 2025, &CurrencyFormat::default()).to_string();

        assert!(options.contains("\"Jan\""), "got {options}");
        assert!(options.contains("\"Dec\""));
        assert!(options.contains("\"Income\""));
        assert!(options.contains("\"Expenses\""));
        assert!(options.contains("3000"));
        assert!(options.contains("45.5"));
    }

    #[test]
    fn income_and_expenses_stack_in_one_bar() {
        let options = monthly_chart(&buckets(), 2025, &CurrencyFormat::default()).to_string();

        assert_eq!(options.matches("\"stack\"").count(), 2, "got {options}");
        assert_eq!(options.matches("\"month\"").count(), 2, "got {options}");
    }

    #[test]
    fn year_select_marks_current_year() {
        let markup =
            chart_view(&buckets(), 2024, &[2023, 2024], &CurrencyFormat::default()).into_string();
        let html = Html::parse_fragment(&markup);

        let selected = html
            .select(&Selector::parse("select[name=year] option[selected]").unwrap())
            .next()
            .expect("no year selected");
        assert_eq!(selected.value().attr("value"), Some("2024"));
        assert_eq!(
            html.select(&Selector::parse("select[name=year] option").unwrap())
                .count(),
            2
        );
    }

    #[test]
    fn year_without_data_is_still_selectable() {
        let markup = chart_view(&buckets(), 2026, &[], &CurrencyFormat::default()).into_string();
        let html = Html::parse_fragment(&markup);

        let options = html
            .select(&Selector::parse("select[name=year] option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .collect::<Vec<_>>();
        assert_eq!(options, vec!["2026"]);
        assert!(
            html.select(&Selector::parse("#monthly-chart").unwrap())
                .next()
                .is_some()
        );
    }
}
