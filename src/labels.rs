//! Display labels for the two supported locales.
//!
//! Labels only cover headings and captions. Numbers are formatted the same way
//! in every locale.
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            other => Err(format!("unsupported locale {other:?} (expected en or ar)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    DashboardTitle,
    Overview,
    ClientView,
    AiInsights,
    TotalClicks,
    TotalImpressions,
    AvgRoi,
    AvgCtr,
    AvgConversion,
    AvgCost,
    BestPlatform,
    BestCampaign,
    BestSegment,
    BestMonth,
    CampaignPerformance,
    PlatformComparison,
    MonthlyTrend,
    TopClients,
    Recommendations,
    Prediction,
    FeatureImportance,
    SummaryStats,
    ReportHeading,
    KpiHeading,
    Generated,
    Metric,
    Value,
    TotalRecords,
    ActiveClients,
}

impl Label {
    pub const ALL: [Label; 29] = [
        Label::DashboardTitle,
        Label::Overview,
        Label::ClientView,
        Label::AiInsights,
        Label::TotalClicks,
        Label::TotalImpressions,
        Label::AvgRoi,
        Label::AvgCtr,
        Label::AvgConversion,
        Label::AvgCost,
        Label::BestPlatform,
        Label::BestCampaign,
        Label::BestSegment,
        Label::BestMonth,
        Label::CampaignPerformance,
        Label::PlatformComparison,
        Label::MonthlyTrend,
        Label::TopClients,
        Label::Recommendations,
        Label::Prediction,
        Label::FeatureImportance,
        Label::SummaryStats,
        Label::ReportHeading,
        Label::KpiHeading,
        Label::Generated,
        Label::Metric,
        Label::Value,
        Label::TotalRecords,
        Label::ActiveClients,
    ];
}

type LabelTable = HashMap<Locale, HashMap<Label, &'static str>>;

static LABELS: Lazy<LabelTable> = Lazy::new(|| {
    use Label::*;
    let en = HashMap::from([
        (DashboardTitle, "Campaign Intelligence"),
        (Overview, "Overview"),
        (ClientView, "Client View"),
        (AiInsights, "AI Insights"),
        (TotalClicks, "Total Clicks"),
        (TotalImpressions, "Total Impressions"),
        (AvgRoi, "Average ROI"),
        (AvgCtr, "Average CTR"),
        (AvgConversion, "Avg Conversion Rate"),
        (AvgCost, "Avg Acquisition Cost"),
        (BestPlatform, "Best Platform"),
        (BestCampaign, "Best Campaign Goal"),
        (BestSegment, "Best Customer Segment"),
        (BestMonth, "Best Month"),
        (CampaignPerformance, "Campaign Performance"),
        (PlatformComparison, "Platform Comparison"),
        (MonthlyTrend, "Monthly ROI Trend"),
        (TopClients, "Top 10 Clients by ROI"),
        (Recommendations, "AI Recommendations"),
        (Prediction, "Next Month Prediction"),
        (FeatureImportance, "Key Success Factors"),
        (SummaryStats, "Overall Performance Summary"),
        (ReportHeading, "Campaign Performance Report"),
        (KpiHeading, "Key Performance Indicators"),
        (Generated, "Generated"),
        (Metric, "Metric"),
        (Value, "Value"),
        (TotalRecords, "Total Records"),
        (ActiveClients, "Active Clients"),
    ]);
    let ar = HashMap::from([
        (DashboardTitle, "منصة ذكاء الحملات"),
        (Overview, "نظرة عامة"),
        (ClientView, "عرض العميل"),
        (AiInsights, "توصيات الذكاء الاصطناعي"),
        (TotalClicks, "إجمالي النقرات"),
        (TotalImpressions, "إجمالي المشاهدات"),
        (AvgRoi, "متوسط العائد"),
        (AvgCtr, "متوسط النقر"),
        (AvgConversion, "معدل التحويل"),
        (AvgCost, "متوسط تكلفة الاكتساب"),
        (BestPlatform, "أفضل منصة"),
        (BestCampaign, "أفضل هدف حملة"),
        (BestSegment, "أفضل شريحة عملاء"),
        (BestMonth, "أفضل شهر"),
        (CampaignPerformance, "أداء الحملات"),
        (PlatformComparison, "مقارنة المنصات"),
        (MonthlyTrend, "الاتجاه الشهري للعائد"),
        (TopClients, "أفضل 10 عملاء حسب العائد"),
        (Recommendations, "توصيات الذكاء الاصطناعي"),
        (Prediction, "توقعات الشهر القادم"),
        (FeatureImportance, "عوامل النجاح الرئيسية"),
        (SummaryStats, "ملخص الأداء العام"),
        (ReportHeading, "تقرير أداء الحملات"),
        (KpiHeading, "مؤشرات الأداء الرئيسية"),
        (Generated, "تاريخ الإنشاء"),
        (Metric, "المؤشر"),
        (Value, "القيمة"),
        (TotalRecords, "إجمالي السجلات"),
        (ActiveClients, "العملاء النشطين"),
    ]);
    HashMap::from([(Locale::En, en), (Locale::Ar, ar)])
});

/// Look up a label, falling back to English when a locale lacks it.
pub fn label(locale: Locale, key: Label) -> &'static str {
    LABELS
        .get(&locale)
        .and_then(|m| m.get(&key))
        .or_else(|| LABELS.get(&Locale::En).and_then(|m| m.get(&key)))
        .copied()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_codes() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" ar ".parse::<Locale>(), Ok(Locale::Ar));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn english_covers_every_label() {
        for key in Label::ALL {
            assert!(!label(Locale::En, key).is_empty(), "{key:?} has no English label");
        }
    }

    #[test]
    fn arabic_covers_every_label() {
        let ar = &LABELS[&Locale::Ar];
        for key in Label::ALL {
            assert!(ar.contains_key(&key), "{key:?} has no Arabic label");
            assert_ne!(label(Locale::Ar, key), label(Locale::En, key), "{key:?}");
        }
        assert_eq!(label(Locale::Ar, Label::Generated), "تاريخ الإنشاء");
        assert_eq!(label(Locale::Ar, Label::BestMonth), "أفضل شهر");
    }
}
