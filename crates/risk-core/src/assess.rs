//! Combined supplier assessment.

use rand::Rng;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::OracleError;
use crate::model::{MapInsight, RiskAnalysis, RiskLevel, Supplier};
use crate::oracle::RiskOracle;

/// Number of points in a synthesized trend series.
pub const TREND_LEN: usize = 8;

/// Maximum distance a trend point may stray from the level's baseline.
const TREND_NOISE: f64 = 20.0;

/// Run the strategic and geographic assessments concurrently and merge them.
///
/// A strategic failure fails the whole assessment: without a status there is
/// no new information. A geographic failure only degrades the map block to
/// [`MapInsight::pending`].
pub async fn assess_supplier_risk<O>(
    oracle: &O,
    supplier: &Supplier,
    hq_location: Option<&str>,
    clock: &dyn Clock,
) -> Result<RiskAnalysis, OracleError>
where
    O: RiskOracle + ?Sized,
{
    debug!(
        supplier_id = %supplier.id,
        oracle = oracle.name(),
        "Assessing supplier risk"
    );

    let (strategic, geography) = tokio::join!(
        oracle.assess_strategic(supplier, hq_location),
        oracle.assess_geography(supplier)
    );

    let strategic = strategic?;
    let map_insights = geography.unwrap_or_else(|e| {
        warn!(supplier_id = %supplier.id, error = %e, "Geographic assessment failed");
        MapInsight::pending()
    });

    Ok(RiskAnalysis {
        supplier_id: supplier.id.clone(),
        status: strategic.status,
        summary: strategic.summary,
        weather_details: strategic.weather_details,
        news_details: strategic.news_details,
        map_insights: Some(map_insights),
        last_updated: clock.now(),
        sources: strategic.sources,
        trend: synthesize_trend(strategic.status),
    })
}

/// Build a sparkline series around the level's baseline using thread-local randomness.
pub fn synthesize_trend(level: RiskLevel) -> Vec<u8> {
    synthesize_trend_with(level, &mut rand::thread_rng())
}

/// Build a sparkline series around the level's baseline.
///
/// Each point is the baseline plus uniform noise in `[-20, 20]`, clamped to `[0, 100]`.
pub fn synthesize_trend_with<R: Rng + ?Sized>(level: RiskLevel, rng: &mut R) -> Vec<u8> {
    let baseline = level.baseline();
    (0..TREND_LEN)
        .map(|_| {
            let value = baseline + rng.gen_range(-TREND_NOISE..=TREND_NOISE);
            value.clamp(0.0, 100.0).round() as u8
        })
        .collect()
}
