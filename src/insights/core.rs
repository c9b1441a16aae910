//! Derives monthly insights: month-over-month comparison, top spending
//! categories, budget alerts and rule-based recommendations.

use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    aggregation::{CategorySpend, count_for_period, top_categories, total_for_period},
    auth::OwnerId,
    budget::{BudgetCategory, budgets_with_spending},
    expense::Category,
    money::{round1, round2},
    period::{month_bounds, previous_month},
};

/// How many top categories the insights report.
const TOP_CATEGORY_LIMIT: u32 = 3;

/// Whether spending moved up or down compared to last month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Spending increased.
    Up,
    /// Spending decreased or stayed level.
    Down,
}

/// This month's spending next to last month's.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    /// Total spent this month so far.
    pub current: f64,
    /// Total spent over the whole of last month.
    pub last: f64,
    /// The month-over-month change in percent, rounded to one decimal
    /// place. Zero when there was no spending last month.
    pub change: f64,
    /// Which way spending moved.
    pub trend: Trend,
}

/// One of the categories the owner spent the most on this month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    /// The spending category.
    pub category: Category,
    /// The amount spent in the category this month.
    pub amount: f64,
    /// How many expenses fell in the category this month.
    pub count: u32,
}

/// A budget whose utilisation has reached its alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    /// What the budget covers.
    pub category: BudgetCategory,
    /// The budget's spending cap.
    pub budget: f64,
    /// The amount spent against the cap.
    pub spent: f64,
    /// Utilisation of the cap in percent, rounded to one decimal place.
    pub percentage: f64,
}

/// How urgent a recommendation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Spending is notably higher than last month.
    Warning,
    /// Spending is notably lower than last month.
    Success,
    /// Budget limits are being approached or exceeded.
    Alert,
    /// A neutral observation.
    Info,
}

/// A short piece of rule-based advice shown alongside the numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// How urgent the recommendation is.
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    /// A short heading.
    pub title: String,
    /// The advice itself.
    pub message: String,
    /// An emoji shown next to the recommendation.
    pub icon: String,
}

/// The full monthly insights report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// This month's spending next to last month's.
    pub monthly_comparison: MonthlyComparison,
    /// The categories the owner spent the most on this month.
    pub top_categories: Vec<TopCategory>,
    /// Budgets that have reached their alert threshold.
    pub budget_alerts: Vec<BudgetAlert>,
    /// Average spending per elapsed day of the month, rounded to two
    /// decimal places.
    pub average_per_day: f64,
    /// How many expenses were recorded this month.
    pub total_transactions: u32,
    /// Rule-based advice derived from the figures above.
    pub recommendations: Vec<Recommendation>,
}

/// Generate the monthly insights report for an owner as of `now`.
///
/// Comparisons use exact calendar month bounds in UTC; the current month
/// runs from its first day to `now`'s month end, last month covers the
/// whole previous calendar month.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error. A failed aggregate fails the whole report; insights are
/// never silently zeroed.
pub fn generate_insights(
    owner: &OwnerId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Insights, Error> {
    let current_bounds = month_bounds(now.year(), now.month());
    let (last_year, last_month) = previous_month(now.year(), now.month());
    let last_bounds = month_bounds(last_year, last_month);

    let current_total = total_for_period(owner, &current_bounds, connection)?;
    let last_total = total_for_period(owner, &last_bounds, connection)?;
    let top = top_categories(owner, &current_bounds, TOP_CATEGORY_LIMIT, connection)?;
    let budgets =
        budgets_with_spending(owner, u8::from(now.month()), now.year(), connection)?;
    let total_transactions = count_for_period(owner, &current_bounds, connection)?;

    let budget_alerts: Vec<BudgetAlert> = budgets
        .into_iter()
        .filter(|tracked| tracked.percentage >= tracked.budget.alert_threshold)
        .map(|tracked| BudgetAlert {
            category: tracked.budget.category,
            budget: tracked.budget.amount,
            spent: tracked.spent,
            percentage: tracked.percentage,
        })
        .collect();

    let change = if last_total > 0.0 {
        round1((current_total - last_total) / last_total * 100.0)
    } else {
        0.0
    };
    let trend = if current_total > last_total { Trend::Up } else { Trend::Down };

    let recommendations = build_recommendations(current_total, last_total, &top, &budget_alerts);

    Ok(Insights {
        monthly_comparison: MonthlyComparison {
            current: current_total,
            last: last_total,
            change,
            trend,
        },
        top_categories: top
            .into_iter()
            .map(|entry| TopCategory {
                category: entry.category,
                amount: entry.total,
                count: entry.count,
            })
            .collect(),
        budget_alerts,
        average_per_day: round2(current_total / f64::from(now.day())),
        total_transactions,
        recommendations,
    })
}

/// Apply the recommendation rules, in a fixed order.
///
/// At most one of the month-over-month rules fires: a warning when this
/// month runs more than 20% over last month, a congratulation when it
/// runs more than 20% under. A budget rule fires when any budget has
/// reached its alert threshold, and an informational rule names the top
/// category whenever there is any spending.
pub fn build_recommendations(
    current_total: f64,
    last_total: f64,
    top: &[CategorySpend],
    budget_alerts: &[BudgetAlert],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if current_total > last_total * 1.2 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "High Spending Alert".to_owned(),
            message: "Your spending is 20% higher than last month. Consider reviewing your \
                      expenses."
                .to_owned(),
            icon: "\u{26A0}\u{FE0F}".to_owned(),
        });
    } else if current_total < last_total * 0.8 {
        let reduction = (last_total - current_total) / last_total * 100.0;
        recommendations.push(Recommendation {
            kind: RecommendationKind::Success,
            title: "Great Job!".to_owned(),
            message: format!(
                "You've reduced your spending by {reduction:.0}% compared to last month."
            ),
            icon: "\u{1F389}".to_owned(),
        });
    }

    if !budget_alerts.is_empty() {
        let noun = if budget_alerts.len() == 1 { "category" } else { "categories" };
        recommendations.push(Recommendation {
            kind: RecommendationKind::Alert,
            title: "Budget Limit Approaching".to_owned(),
            message: format!(
                "You're approaching or exceeding budget limits in {} {noun}.",
                budget_alerts.len()
            ),
            icon: "\u{1F514}".to_owned(),
        });
    }

    if let Some(top_category) = top.first() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Info,
            title: "Top Spending Category".to_owned(),
            message: format!(
                "{} is your highest expense category this month with {:.2}.",
                top_category.category, top_category.total
            ),
            icon: "\u{1F4CA}".to_owned(),
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use super::{RecommendationKind, Trend, build_recommendations, generate_insights};
    use crate::{
        aggregation::CategorySpend,
        auth::OwnerId,
        budget::{BudgetCategory, core::{NewBudget, create_budget}},
        db::initialize,
        expense::{Category, Expense, core::create_expense},
        insights::core::BudgetAlert,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    fn spend(conn: &Connection, amount: f64, category: Category, date: time::OffsetDateTime) {
        create_expense(&owner(), Expense::build("spend", amount, category, date), conn).unwrap();
    }

    #[test]
    fn comparison_reports_change_and_trend() {
        let conn = get_test_connection();
        spend(&conn, 1000.0, Category::Food, datetime!(2024-02-10 12:00:00 UTC));
        spend(&conn, 1100.0, Category::Food, datetime!(2024-03-10 12:00:00 UTC));

        let insights =
            generate_insights(&owner(), datetime!(2024-03-20 12:00:00 UTC), &conn).unwrap();

        assert_eq!(insights.monthly_comparison.current, 1100.0);
        assert_eq!(insights.monthly_comparison.last, 1000.0);
        assert_eq!(insights.monthly_comparison.change, 10.0);
        assert_eq!(insights.monthly_comparison.trend, Trend::Up);
        assert_eq!(insights.average_per_day, 55.0);
        assert_eq!(insights.total_transactions, 1);
    }

    #[test]
    fn no_spending_last_month_reports_zero_change() {
        let conn = get_test_connection();
        spend(&conn, 500.0, Category::Food, datetime!(2024-03-10 12:00:00 UTC));

        let insights =
            generate_insights(&owner(), datetime!(2024-03-20 12:00:00 UTC), &conn).unwrap();

        assert_eq!(insights.monthly_comparison.change, 0.0);
        assert_eq!(insights.monthly_comparison.trend, Trend::Up);
    }

    #[test]
    fn equal_spending_trends_down() {
        let conn = get_test_connection();
        spend(&conn, 500.0, Category::Food, datetime!(2024-02-10 12:00:00 UTC));
        spend(&conn, 500.0, Category::Food, datetime!(2024-03-10 12:00:00 UTC));

        let insights =
            generate_insights(&owner(), datetime!(2024-03-20 12:00:00 UTC), &conn).unwrap();

        assert_eq!(insights.monthly_comparison.trend, Trend::Down);
    }

    #[test]
    fn breached_budget_shows_up_as_alert() {
        let conn = get_test_connection();
        create_budget(
            &owner(),
            NewBudget {
                category: BudgetCategory::Category(Category::Food),
                amount: 500.0,
                month: Some(3),
                year: Some(2024),
                alert_threshold: None,
            },
            &conn,
        )
        .unwrap();
        spend(&conn, 420.0, Category::Food, datetime!(2024-03-10 12:00:00 UTC));

        let insights =
            generate_insights(&owner(), datetime!(2024-03-20 12:00:00 UTC), &conn).unwrap();

        // 84% utilisation crosses the default 80% threshold.
        assert_eq!(
            insights.budget_alerts,
            vec![BudgetAlert {
                category: BudgetCategory::Category(Category::Food),
                budget: 500.0,
                spent: 420.0,
                percentage: 84.0,
            }]
        );
    }

    #[test]
    fn warning_needs_more_than_twenty_percent_increase() {
        // 1200 against 1000 is exactly 20% and must not warn.
        let quiet = build_recommendations(1200.0, 1000.0, &[], &[]);
        assert!(quiet.iter().all(|rec| rec.kind != RecommendationKind::Warning));

        let loud = build_recommendations(1201.0, 1000.0, &[], &[]);
        assert_eq!(loud[0].kind, RecommendationKind::Warning);
        assert_eq!(loud[0].title, "High Spending Alert");
    }

    #[test]
    fn reduced_spending_earns_a_congratulation() {
        let recommendations = build_recommendations(600.0, 1000.0, &[], &[]);

        assert_eq!(recommendations[0].kind, RecommendationKind::Success);
        assert_eq!(
            recommendations[0].message,
            "You've reduced your spending by 40% compared to last month."
        );
    }

    #[test]
    fn budget_rule_pluralises_categories() {
        let alert = BudgetAlert {
            category: BudgetCategory::Total,
            budget: 100.0,
            spent: 90.0,
            percentage: 90.0,
        };

        let one = build_recommendations(0.0, 0.0, &[], &[alert.clone()]);
        assert!(one[0].message.ends_with("in 1 category."));

        let two = build_recommendations(0.0, 0.0, &[], &[alert.clone(), alert]);
        assert!(two[0].message.ends_with("in 2 categories."));
    }

    #[test]
    fn top_category_rule_names_the_category() {
        let top = [CategorySpend {
            category: Category::Food,
            total: 150.0,
            count: 2,
        }];

        let recommendations = build_recommendations(150.0, 150.0, &top, &[]);

        assert_eq!(recommendations[0].kind, RecommendationKind::Info);
        assert_eq!(
            recommendations[0].message,
            "Food is your highest expense category this month with 150.00."
        );
    }

    #[test]
    fn rules_fire_in_a_fixed_order() {
        let top = [CategorySpend {
            category: Category::Food,
            total: 2000.0,
            count: 4,
        }];
        let alerts = [BudgetAlert {
            category: BudgetCategory::Total,
            budget: 1500.0,
            spent: 2000.0,
            percentage: 133.3,
        }];

        let recommendations = build_recommendations(2000.0, 1000.0, &top, &alerts);

        let kinds: Vec<RecommendationKind> =
            recommendations.iter().map(|rec| rec.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::Warning,
                RecommendationKind::Alert,
                RecommendationKind::Info,
            ]
        );
    }
}
