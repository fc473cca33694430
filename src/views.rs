//! Screen-level summaries. Each view bundles everything one dashboard page
//! shows, so the terminal shell and the JSON export read the same numbers.

use crate::aggregate::{
    aggregate_by, distinct_count, filter_company, group_summary, monthly_means, AggOp,
    AggregateRow, AggregationResult, GroupSummary, Kpis,
};
use crate::config::AppConfig;
use crate::error::Result;
use crate::insights::{select_insights, Insight};
use crate::labels::{label, Label, Locale};
use crate::model::{load_model, FeatureWeight, ModelArtifact};
use crate::projection::{project, Projection};
use crate::schema::REQUIRED_COLUMNS;
use crate::types::{CampaignTable, Column, Dimension, GroupKey, Metric};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

const TOP_CLIENTS: usize = 10;
const TOP_FEATURES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: u32,
    pub mean_roi: Option<f64>,
    pub total_clicks: u64,
    pub mean_conversion: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub kpis: Kpis,
    pub clients: usize,
    pub platforms: Vec<GroupSummary>,
    pub goal_roi: Vec<AggregateRow>,
    pub monthly: Vec<MonthlyPoint>,
    /// Ascending, so the best client is last.
    pub top_clients: Vec<AggregateRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestCard {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientView {
    pub client: String,
    pub campaigns: usize,
    pub platform_count: usize,
    pub goal_count: usize,
    pub kpis: Kpis,
    pub platforms: Vec<GroupSummary>,
    pub goal_roi: Vec<AggregateRow>,
    pub monthly: Vec<MonthlyPoint>,
    pub best: Vec<BestCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsView {
    pub insights: Vec<Insight>,
    pub monthly_roi: Vec<(u32, f64)>,
    pub projection: Projection,
    pub feature_importance: Option<Vec<FeatureWeight>>,
    pub platforms: Vec<GroupSummary>,
    pub goals: Vec<GroupSummary>,
    pub clients: usize,
    pub summary: Kpis,
}

fn monthly_trend(table: &CampaignTable) -> Result<Vec<MonthlyPoint>> {
    if !table.has(Column::Month) {
        return Ok(Vec::new());
    }
    let mut points: Vec<MonthlyPoint> = group_summary(table, Dimension::Month)?
        .into_iter()
        .filter_map(|g| {
            Some(MonthlyPoint {
                month: g.key.as_month()?,
                mean_roi: g.mean_roi,
                total_clicks: g.total_clicks,
                mean_conversion: g.mean_conversion,
            })
        })
        .collect();
    points.sort_by_key(|p| p.month);
    Ok(points)
}

fn mean_roi_by(table: &CampaignTable, dimension: Dimension) -> Result<AggregationResult> {
    aggregate_by(table, dimension, Metric::Roi, AggOp::Mean)
}

pub fn overview(table: &CampaignTable) -> Result<Overview> {
    table.require(&REQUIRED_COLUMNS)?;
    Ok(Overview {
        kpis: Kpis::compute(table)?,
        clients: distinct_count(table, Dimension::Company),
        platforms: group_summary(table, Dimension::Channel)?,
        goal_roi: mean_roi_by(table, Dimension::CampaignGoal)?.rows,
        monthly: monthly_trend(table)?,
        top_clients: mean_roi_by(table, Dimension::Company)?.top_n(TOP_CLIENTS),
    })
}

fn best_card(
    table: &CampaignTable,
    locale: Locale,
    title: Label,
    dimension: Dimension,
    metric: Metric,
) -> Result<Option<BestCard>> {
    if !table.has(dimension.column()) || !table.has(metric.column()) {
        return Ok(None);
    }
    let result = aggregate_by(table, dimension, metric, AggOp::Mean)?;
    Ok(result.idxmax().map(|row| {
        let value = match row.key.first() {
            Some(GroupKey::Month(m)) => format!("Month {m}"),
            _ => row.label(),
        };
        BestCard {
            title: label(locale, title).to_string(),
            value,
        }
    }))
}

/// Everything the per-client page shows for `company`.
pub fn client_view(table: &CampaignTable, company: &str, locale: Locale) -> Result<ClientView> {
    table.require(&REQUIRED_COLUMNS)?;
    let sub = filter_company(table, company)?;
    let cards = [
        (Label::BestPlatform, Dimension::Channel, Metric::Roi),
        (Label::BestCampaign, Dimension::CampaignGoal, Metric::Roi),
        (Label::BestMonth, Dimension::Month, Metric::Roi),
        (Label::BestSegment, Dimension::CustomerSegment, Metric::ConversionRate),
    ];
    let mut best = Vec::with_capacity(cards.len());
    for (title, dimension, metric) in cards {
        if let Some(card) = best_card(&sub, locale, title, dimension, metric)? {
            best.push(card);
        }
    }

    Ok(ClientView {
        client: company.trim().to_string(),
        campaigns: sub.len(),
        platform_count: distinct_count(&sub, Dimension::Channel),
        goal_count: distinct_count(&sub, Dimension::CampaignGoal),
        kpis: Kpis::compute(&sub)?,
        platforms: group_summary(&sub, Dimension::Channel)?,
        goal_roi: mean_roi_by(&sub, Dimension::CampaignGoal)?.rows,
        monthly: monthly_trend(&sub)?,
        best,
    })
}

/// Load the feature-importance artifact, logging and returning `None` when it
/// cannot be read.
pub fn load_model_or_warn(dir: &Path) -> Option<ModelArtifact> {
    match load_model(dir) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!(error = %e, "feature importance unavailable");
            None
        }
    }
}

pub fn insights_view(
    table: &CampaignTable,
    config: &AppConfig,
    model: Option<&ModelArtifact>,
) -> Result<InsightsView> {
    let insights = select_insights(table)?;
    let monthly_roi = monthly_means(table, Metric::Roi)?;
    let projection = project(&monthly_roi, config.growth_rate, config.forecast_horizon)?;

    Ok(InsightsView {
        insights,
        monthly_roi,
        projection,
        feature_importance: model.map(|m| m.top_features(TOP_FEATURES)),
        platforms: group_summary(table, Dimension::Channel)?,
        goals: group_summary(table, Dimension::CampaignGoal)?,
        clients: distinct_count(table, Dimension::Company),
        summary: Kpis::compute(table)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CampaignError;
    use crate::loader::read_csv;
    use crate::schema::validate;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const CSV: &str = "\
Company,Channel_Used,Campaign_Goal,Customer_Segment,Clicks,Impressions,ROI,Acquisition_Cost,Conversion_Rate,Date
Acme,Search,Sales,Youth,100,1000,3.0,100,0.10,2021-01-05
Acme,Email,Brand,Seniors,50,1000,1.0,200,0.20,2021-02-05
Beta,Search,Sales,Youth,10,100,2.0,50,0.05,2021-02-07
Beta,Email,Sales,Youth,20,100,1.0,50,0.05,2021-03-07
";

    fn table() -> CampaignTable {
        validate(&read_csv(CSV.as_bytes()).unwrap().0).unwrap()
    }

    #[test]
    fn overview_groups_the_whole_table() {
        let view = overview(&table()).unwrap();
        assert_eq!(view.clients, 2);
        assert_eq!(view.kpis.total_clicks, 180);

        let search = &view.platforms[0];
        assert_eq!(search.key, GroupKey::Text("Search".into()));
        assert_eq!(search.total_clicks, 110);
        assert_relative_eq!(search.mean_roi.unwrap(), 2.5);

        let months: Vec<u32> = view.monthly.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![1, 2, 3]);
        assert_eq!(view.monthly[1].total_clicks, 60);

        let best = view.top_clients.last().unwrap();
        assert_eq!(best.label(), "Acme");
    }

    #[test]
    fn client_view_filters_to_one_company() {
        let view = client_view(&table(), "Acme", Locale::En).unwrap();
        assert_eq!(view.campaigns, 2);
        assert_eq!(view.platform_count, 2);
        assert_eq!(view.goal_count, 2);
        assert_eq!(
            view.best,
            vec![
                BestCard { title: "Best Platform".into(), value: "Search".into() },
                BestCard { title: "Best Campaign Goal".into(), value: "Sales".into() },
                BestCard { title: "Best Month".into(), value: "Month 1".into() },
                BestCard { title: "Best Customer Segment".into(), value: "Seniors".into() },
            ]
        );
    }

    #[test]
    fn arabic_client_view_translates_every_card_title() {
        let view = client_view(&table(), "Acme", Locale::Ar).unwrap();
        let titles: Vec<&str> = view.best.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["أفضل منصة", "أفضل هدف حملة", "أفضل شهر", "أفضل شريحة عملاء"]);
        assert_eq!(view.best[2].value, "Month 1");
    }

    #[test]
    fn client_view_rejects_unknown_company() {
        let err = client_view(&table(), "Gamma", Locale::En).unwrap_err();
        assert!(matches!(err, CampaignError::UnknownClient(ref name) if name == "Gamma"));
    }

    #[test]
    fn insights_view_projects_and_ranks_features() {
        let model = ModelArtifact {
            weights: vec![
                FeatureWeight { feature: "Clicks".into(), importance: 0.7 },
                FeatureWeight { feature: "Channel_Used".into(), importance: 0.3 },
            ],
            encoders: BTreeMap::new(),
        };
        let view = insights_view(&table(), &AppConfig::default(), Some(&model)).unwrap();
        assert_eq!(view.insights.len(), 5);
        assert_eq!(view.projection.last_month, 3);
        let months: Vec<u32> = view.projection.points.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![4, 5, 6]);
        assert_relative_eq!(view.projection.points[0].value, 1.05);
        let names: Vec<&str> = view
            .feature_importance
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|w| w.feature.as_str())
            .collect();
        assert_eq!(names, vec!["Channel_Used", "Clicks"]);
        assert_eq!(view.clients, 2);
    }

    #[test]
    fn insights_view_without_model_omits_importance() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model_or_warn(dir.path());
        assert!(model.is_none());
        let view = insights_view(&table(), &AppConfig::default(), model.as_ref()).unwrap();
        assert!(view.feature_importance.is_none());
    }
}
