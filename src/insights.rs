use crate::aggregate::{aggregate_by, AggOp, AggregateRow, AggregationResult};
use crate::error::{Result, SchemaError};
use crate::types::{CampaignTable, Column, Dimension, Metric};
use crate::util::{format_fraction_percent, format_roi};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightKind {
    BestChannel,
    BestGoal,
    BestMonth,
    BestSegment,
    WorstChannel,
}

/// One recommendation derived from a grouped statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub dimension: Dimension,
    pub winner: String,
    pub metric_value: f64,
    pub title: String,
    pub rationale: String,
}

/// Columns the five insights read.
pub const INSIGHT_COLUMNS: [Column; 6] = [
    Column::Channel,
    Column::CampaignGoal,
    Column::Roi,
    Column::Month,
    Column::CustomerSegment,
    Column::ConversionRate,
];

struct Winner {
    name: String,
    value: f64,
}

fn pick(
    table: &CampaignTable,
    dimension: Dimension,
    metric: Metric,
    choose: fn(&AggregationResult) -> Option<&AggregateRow>,
) -> Result<Winner> {
    let result = aggregate_by(table, dimension, metric, AggOp::Mean)?;
    // every group mean is null
    let row = choose(&result).ok_or_else(|| SchemaError::NoValues {
        field: metric.column().header().to_string(),
    })?;
    Ok(Winner {
        name: row.label(),
        value: row.value.unwrap_or_default(),
    })
}

/// The five fixed recommendations, in a fixed order: best channel, best goal,
/// best month, best segment, then the worst channel.
pub fn select_insights(table: &CampaignTable) -> Result<Vec<Insight>> {
    let missing: Vec<String> = table
        .missing(&INSIGHT_COLUMNS)
        .into_iter()
        // the month is derived from the date, so that is what the user must supply
        .map(|c| if c == Column::Month.header() { Column::Date.header().to_string() } else { c })
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing).into());
    }

    let best = |d: Dimension, m: Metric| pick(table, d, m, AggregationResult::idxmax);
    let worst = |d: Dimension, m: Metric| pick(table, d, m, AggregationResult::idxmin);

    let channel = best(Dimension::Channel, Metric::Roi)?;
    let goal = best(Dimension::CampaignGoal, Metric::Roi)?;
    let month = best(Dimension::Month, Metric::Roi)?;
    let segment = best(Dimension::CustomerSegment, Metric::ConversionRate)?;
    let laggard = worst(Dimension::Channel, Metric::Roi)?;

    Ok(vec![
        Insight {
            kind: InsightKind::BestChannel,
            dimension: Dimension::Channel,
            title: format!("Best Platform: {}", channel.name),
            rationale: format!(
                "{} achieves the highest average ROI of {}; focus budget here",
                channel.name,
                format_roi(channel.value)
            ),
            winner: channel.name.clone(),
            metric_value: channel.value,
        },
        Insight {
            kind: InsightKind::BestGoal,
            dimension: Dimension::CampaignGoal,
            title: format!("Top Campaign Goal: {}", goal.name),
            rationale: format!(
                "{} campaigns deliver the highest average ROI at {}",
                goal.name,
                format_roi(goal.value)
            ),
            winner: goal.name,
            metric_value: goal.value,
        },
        Insight {
            kind: InsightKind::BestMonth,
            dimension: Dimension::Month,
            title: format!("Best Month to Launch: Month {}", month.name),
            rationale: format!(
                "Campaigns launched in month {} peak at an average ROI of {}",
                month.name,
                format_roi(month.value)
            ),
            winner: month.name,
            metric_value: month.value,
        },
        Insight {
            kind: InsightKind::BestSegment,
            dimension: Dimension::CustomerSegment,
            title: format!("Top Customer Segment: {}", segment.name),
            rationale: format!(
                "{} converts best at {}; prioritize this audience in targeting",
                segment.name,
                format_fraction_percent(segment.value)
            ),
            winner: segment.name,
            metric_value: segment.value,
        },
        Insight {
            kind: InsightKind::WorstChannel,
            dimension: Dimension::Channel,
            title: format!("Underperforming: {}", laggard.name),
            rationale: format!(
                "{} has the lowest average ROI of {}; consider reallocating budget to {}",
                laggard.name,
                format_roi(laggard.value),
                channel.name
            ),
            winner: laggard.name,
            metric_value: laggard.value,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CampaignError;
    use crate::loader::read_csv;
    use crate::schema::validate;

    const HEADER: &str =
        "Company,Channel_Used,Campaign_Goal,Customer_Segment,Clicks,Impressions,ROI,Conversion_Rate,Date";

    fn table(body: &str) -> CampaignTable {
        validate(&read_csv(format!("{HEADER}\n{body}").as_bytes()).unwrap().0).unwrap()
    }

    #[test]
    fn picks_each_category() {
        let t = table(
            "Acme,Search,Sales,Youth,10,100,3.0,0.05,2021-01-10\n\
             Acme,Email,Brand,Seniors,10,100,1.0,0.20,2021-02-10\n\
             Acme,Search,Brand,Seniors,10,100,2.0,0.10,2021-02-11\n",
        );
        let insights = select_insights(&t).unwrap();
        let winners: Vec<(InsightKind, &str)> =
            insights.iter().map(|i| (i.kind, i.winner.as_str())).collect();
        assert_eq!(
            winners,
            vec![
                (InsightKind::BestChannel, "Search"),
                (InsightKind::BestGoal, "Sales"),
                (InsightKind::BestMonth, "1"),
                (InsightKind::BestSegment, "Seniors"),
                (InsightKind::WorstChannel, "Email"),
            ]
        );
        assert_eq!(
            insights[3].rationale,
            "Seniors converts best at 15.00%; prioritize this audience in targeting"
        );
        assert!(insights[4].rationale.ends_with("reallocating budget to Search"));
    }

    #[test]
    fn is_deterministic() {
        let t = table(
            "Acme,Search,Sales,Youth,10,100,2.0,0.05,2021-01-10\n\
             Acme,Email,Sales,Youth,10,100,2.0,0.05,2021-01-10\n",
        );
        assert_eq!(select_insights(&t).unwrap(), select_insights(&t).unwrap());
    }

    #[test]
    fn requires_segment_and_conversion_columns() {
        let csv = "Company,Channel_Used,Campaign_Goal,Clicks,Impressions,ROI,Month\nA,S,G,1,1,1.0,1\n";
        let t = validate(&read_csv(csv.as_bytes()).unwrap().0).unwrap();
        let err = select_insights(&t).unwrap_err();
        match err {
            CampaignError::Schema(SchemaError::MissingColumns(cols)) => assert_eq!(
                cols,
                vec!["Customer_Segment".to_string(), "Conversion_Rate".to_string()]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn asks_for_a_date_when_no_month_is_available() {
        let csv = "Company,Channel_Used,Campaign_Goal,Customer_Segment,Clicks,Impressions,ROI,Conversion_Rate\n\
                   A,S,G,Y,1,1,1.0,0.1\n";
        let t = validate(&read_csv(csv.as_bytes()).unwrap().0).unwrap();
        let err = select_insights(&t).unwrap_err();
        assert!(matches!(
            err,
            CampaignError::Schema(SchemaError::MissingColumns(ref cols)) if cols == &vec!["Date".to_string()]
        ));
    }

    #[test]
    fn blank_conversion_rates_name_the_column() {
        let t = table(
            "Acme,Search,Sales,Youth,10,100,3.0,,2021-01-10
             Acme,Email,Brand,Seniors,10,100,1.0, ,2021-02-10
",
        );
        match select_insights(&t).unwrap_err() {
            CampaignError::Schema(err) => {
                assert_eq!(err, SchemaError::NoValues { field: "Conversion_Rate".into() });
                assert_eq!(err.columns(), vec!["Conversion_Rate"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
