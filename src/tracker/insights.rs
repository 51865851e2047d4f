use super::{aggregate::CategoryHours, category::Category};

const MIN_LEARNING_HOURS: u32 = 10;
// Six hours per night across a week
const MIN_REST_HOURS: u32 = 42;
const MIN_HEALTH_HOURS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Warning,
    Info,
}

/// One line of advice derived from a week's category totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub severity: Severity,
    pub title: &'static str,
    pub message: String,
}

/// Derives the weekly insight list. Totals already carry canonical category
/// ids, so hours logged under the old labels are included.
pub fn weekly_insights(totals: &CategoryHours) -> Vec<Insight> {
    let hours = |category: Category| totals.get(&category).copied().unwrap_or(0);

    let mut insights = Vec::new();

    let learning = hours(Category::Learning);
    insights.push(if learning < MIN_LEARNING_HOURS {
        Insight {
            severity: Severity::Warning,
            title: "Learning deficit",
            message: format!(
                "Only {learning}h of learning logged this week. Try block-scheduling focus sessions."
            ),
        }
    } else {
        Insight {
            severity: Severity::Good,
            title: "Great focus",
            message: format!("{learning}h of learning logged this week. Keep it up."),
        }
    });

    let rest = hours(Category::Rest);
    insights.push(if rest < MIN_REST_HOURS {
        Insight {
            severity: Severity::Warning,
            title: "Sleep debt",
            message: format!(
                "You're averaging under 6 hours of rest per night ({rest}h total). Prioritize recovery."
            ),
        }
    } else {
        Insight {
            severity: Severity::Good,
            title: "Well rested",
            message: format!("{rest}h of rest logged. You're maintaining a healthy recovery cycle."),
        }
    });

    let health = hours(Category::Health);
    insights.push(if health >= MIN_HEALTH_HOURS {
        Insight {
            severity: Severity::Good,
            title: "Active lifestyle",
            message: format!("{health}h of health activity this week. Great consistency."),
        }
    } else {
        Insight {
            severity: Severity::Info,
            title: "Movement recommendation",
            message: format!(
                "Only {health}h of health activity logged. Try to slot in a few more active hours."
            ),
        }
    });

    insights
}

#[cfg(test)]
mod tests {
    use super::{weekly_insights, Severity};
    use crate::tracker::{aggregate::CategoryHours, category::Category};

    fn totals(entries: &[(Category, u32)]) -> CategoryHours {
        entries.iter().copied().collect()
    }

    #[test]
    fn empty_week_warns_about_learning_and_rest() {
        let insights = weekly_insights(&CategoryHours::new());
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].severity, Severity::Warning);
        assert_eq!(insights[1].severity, Severity::Warning);
        assert_eq!(insights[2].severity, Severity::Info);
    }

    #[test]
    fn thresholds_flip_each_insight() {
        let insights = weekly_insights(&totals(&[
            (Category::Learning, 10),
            (Category::Rest, 42),
            (Category::Health, 5),
        ]));
        assert!(insights.iter().all(|i| i.severity == Severity::Good));

        let insights = weekly_insights(&totals(&[
            (Category::Learning, 9),
            (Category::Rest, 41),
            (Category::Health, 4),
        ]));
        assert!(insights.iter().all(|i| i.severity != Severity::Good));
    }
}
