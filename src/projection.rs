//! Naive forward projection of a monthly metric.
//!
//! This is a fixed-rate compound-growth extrapolation seeded by the most recent
//! monthly mean. It ignores every earlier point and does not look at the
//! series' own trend.

use crate::error::{CampaignError, Result};
use crate::util::round2;
use serde::Serialize;

pub const DEFAULT_GROWTH_RATE: f64 = 0.05;
pub const DEFAULT_HORIZON: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub month: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub last_month: u32,
    pub last_value: f64,
    pub growth_rate: f64,
    pub points: Vec<ProjectedPoint>,
}

impl Projection {
    pub fn pairs(&self) -> Vec<(u32, f64)> {
        self.points.iter().map(|p| (p.month, p.value)).collect()
    }
}

/// Extrapolate `monthly_means` (ascending by month) `horizon` months ahead.
///
/// Each step grows the previous rounded value by `growth_rate` and rounds the
/// result to two decimals. Future months keep counting past 12.
pub fn project(monthly_means: &[(u32, f64)], growth_rate: f64, horizon: i32) -> Result<Projection> {
    if horizon <= 0 {
        return Err(CampaignError::InvalidHorizon { horizon });
    }
    let (last_month, last_value) = monthly_means
        .iter()
        .copied()
        .fold(None, |best: Option<(u32, f64)>, (m, v)| match best {
            Some((bm, _)) if bm >= m => best,
            _ => Some((m, v)),
        })
        .ok_or(CampaignError::EmptyTable)?;

    let mut points = Vec::with_capacity(horizon as usize);
    let mut value = last_value;
    for i in 1..=horizon as u32 {
        value = round2(value * (1.0 + growth_rate));
        points.push(ProjectedPoint {
            month: last_month + i,
            value,
        });
    }
    Ok(Projection {
        last_month,
        last_value,
        growth_rate,
        points,
    })
}

/// Single-period estimate used for the "next month" figure in reports.
pub fn next_period_estimate(current: f64, growth_rate: f64) -> f64 {
    current * (1.0 + growth_rate)
}
