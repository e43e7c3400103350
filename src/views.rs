// Views: the dashboard overview and the five business case studies.
//
// A view is a list of sections, each carrying the prepared table (for
// preview and export) and the chart spec built from it. When the selected
// period has no rows the view comes back with no sections and a notice,
// mirroring how the aggregation would read on screen.
use crate::aggregate::{filter_eq, group_by, ratio_column, scale_column, top_n};
use crate::aggregate::{Agg, SortOrder, ZeroGuard};
use crate::charts::{self, ChartSpec, ColorScale};
use crate::error::InsightResult;
use crate::frame::{Frame, Value};
use crate::geo::GeoReference;
use crate::loader::Loader;
use crate::schema::{col, derived, Dataset};
use serde::Serialize;

#[derive(Debug)]
pub struct Section {
    /// File-name fragment for exports.
    pub slug: &'static str,
    pub heading: String,
    pub table: Frame,
    pub chart: Option<ChartSpec>,
}

#[derive(Debug)]
pub struct View {
    pub title: String,
    /// Set when the selection had no rows; sections are empty then.
    pub notice: Option<String>,
    pub sections: Vec<Section>,
}

/// Headline totals across whole datasets; missing data reads as zero.
#[derive(Debug, Serialize)]
pub struct QuickStats {
    pub total_transaction_count: f64,
    pub total_transaction_amount: f64,
    pub total_registered_users: f64,
    pub total_insurance_amount: f64,
}

/// The five case studies, each drawing year/quarter selections from its
/// primary dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStudy {
    TransactionDynamics,
    DeviceUsage,
    InsuranceMarket,
    MarketExpansion,
    UserGrowth,
}

impl CaseStudy {
    pub const ALL: [CaseStudy; 5] = [
        CaseStudy::TransactionDynamics,
        CaseStudy::DeviceUsage,
        CaseStudy::InsuranceMarket,
        CaseStudy::MarketExpansion,
        CaseStudy::UserGrowth,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CaseStudy::TransactionDynamics => "Transaction Dynamics Analysis",
            CaseStudy::DeviceUsage => "Device Usage & User Engagement",
            CaseStudy::InsuranceMarket => "Insurance Market Analysis",
            CaseStudy::MarketExpansion => "Market Expansion Strategy",
            CaseStudy::UserGrowth => "User Growth Analysis",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            CaseStudy::TransactionDynamics => "transaction_dynamics",
            CaseStudy::DeviceUsage => "device_usage",
            CaseStudy::InsuranceMarket => "insurance_market",
            CaseStudy::MarketExpansion => "market_expansion",
            CaseStudy::UserGrowth => "user_growth",
        }
    }

    /// Dataset the year/quarter selectors read from.
    pub fn dataset(self) -> Dataset {
        match self {
            CaseStudy::TransactionDynamics => Dataset::AggTransaction,
            CaseStudy::DeviceUsage => Dataset::AggUser,
            CaseStudy::InsuranceMarket => Dataset::AggInsurance,
            CaseStudy::MarketExpansion => Dataset::MapTransaction,
            CaseStudy::UserGrowth => Dataset::MapUser,
        }
    }
}

// ── Period selectors ────────────────────────────────────────────────────────

pub fn years(loader: &Loader, dataset: Dataset) -> Vec<i64> {
    loader
        .frame(dataset)
        .distinct_ints(col::YEARS)
        .unwrap_or_default()
}

pub fn quarters(loader: &Loader, dataset: Dataset, year: i64) -> Vec<i64> {
    let frame = loader.frame(dataset);
    filter_eq(&frame, col::YEARS, &Value::Int(year))
        .and_then(|f| f.distinct_ints(col::QUARTER))
        .unwrap_or_default()
}

/// Latest year, then the latest quarter within it.
pub fn latest_period(loader: &Loader, dataset: Dataset) -> Option<(i64, i64)> {
    let year = *years(loader, dataset).last()?;
    let quarter = *quarters(loader, dataset, year).last()?;
    Some((year, quarter))
}

// ── Dashboard ───────────────────────────────────────────────────────────────

pub fn quick_stats(loader: &Loader) -> QuickStats {
    let agg_transaction = loader.frame(Dataset::AggTransaction);
    QuickStats {
        total_transaction_count: column_sum(&agg_transaction, col::TRANSACTION_COUNT),
        total_transaction_amount: column_sum(&agg_transaction, col::TRANSACTION_AMOUNT),
        total_registered_users: column_sum(
            &loader.frame(Dataset::TopUser),
            col::REGISTERED_USERS_TOP,
        ),
        total_insurance_amount: column_sum(
            &loader.frame(Dataset::AggInsurance),
            col::INSURANCE_AMOUNT,
        ),
    }
}

pub fn dashboard(loader: &Loader, geo: &GeoReference) -> InsightResult<View> {
    let agg = loader.frame(Dataset::AggTransaction);
    let Some((year, quarter)) = latest_period(loader, Dataset::AggTransaction) else {
        return Ok(View {
            title: "Transaction Analysis Dashboard".to_string(),
            notice: Some("No transaction data loaded.".to_string()),
            sections: Vec::new(),
        });
    };

    let period = filter_period(&agg, year, quarter)?;
    let by_state = group_by(
        &period,
        &[col::STATE],
        &[
            (col::TRANSACTION_AMOUNT, Agg::Sum),
            (col::TRANSACTION_COUNT, Agg::Sum),
        ],
    )?;
    let by_state = scale_column(&by_state, col::TRANSACTION_AMOUNT, 1e6, derived::AMOUNT_M)?;
    let heatmap = charts::choropleth(
        &by_state,
        derived::AMOUNT_M,
        &format!("Transaction Amount - {} Q{}", year, quarter),
        ColorScale::Viridis,
        "₹M",
        geo,
    )?;

    let trend = group_by(
        &agg,
        &[col::YEARS, col::QUARTER],
        &[(col::TRANSACTION_AMOUNT, Agg::Sum)],
    )?;
    let trend = with_period_labels(trend)?;
    let mut trend_chart = charts::line(
        &trend,
        derived::PERIOD,
        col::TRANSACTION_AMOUNT,
        "Transaction Amount Over Time",
    )?;
    if let Some(ChartSpec::Line(line)) = trend_chart.as_mut() {
        line.x_title = "Time Period".to_string();
        line.y_title = "Transaction Amount (₹)".to_string();
        line.y_tick_format = Some(".2e".to_string());
        line.height = Some(600);
    }

    Ok(View {
        title: "Transaction Analysis Dashboard".to_string(),
        notice: None,
        sections: vec![
            section("transaction_heatmap", "Transaction Heatmap", by_state, heatmap),
            section("transaction_trend", "Transaction Trend", trend, trend_chart),
        ],
    })
}

// ── Case studies ────────────────────────────────────────────────────────────

pub fn case_study(
    study: CaseStudy,
    loader: &Loader,
    geo: &GeoReference,
    year: i64,
    quarter: i64,
) -> InsightResult<View> {
    match study {
        CaseStudy::TransactionDynamics => transaction_dynamics(loader, geo, year, quarter),
        CaseStudy::DeviceUsage => device_usage(loader, year, quarter),
        CaseStudy::InsuranceMarket => insurance_market(loader, geo, year, quarter),
        CaseStudy::MarketExpansion => market_expansion(loader, geo, year, quarter),
        CaseStudy::UserGrowth => user_growth(loader, geo, year, quarter),
    }
}

fn transaction_dynamics(
    loader: &Loader,
    geo: &GeoReference,
    year: i64,
    quarter: i64,
) -> InsightResult<View> {
    let study = CaseStudy::TransactionDynamics;
    let agg = loader.frame(Dataset::AggTransaction);
    let filtered = filter_period(&agg, year, quarter)?;
    if filtered.is_empty() {
        return Ok(empty_view(study, "No transaction data for selected period."));
    }

    let by_state = group_by(&filtered, &[col::STATE], &[(col::TRANSACTION_AMOUNT, Agg::Sum)])?;
    let by_state = scale_column(&by_state, col::TRANSACTION_AMOUNT, 1e6, derived::AMOUNT_M)?;
    let heatmap = charts::choropleth(
        &by_state,
        derived::AMOUNT_M,
        &format!("Transaction Heatmap - {} Q{}", year, quarter),
        ColorScale::Blues,
        "₹M",
        geo,
    )?;

    let top_states = top_n(&by_state, col::TRANSACTION_AMOUNT, 10, SortOrder::Descending)?;
    let top_chart = charts::bar(&top_states, col::STATE, derived::AMOUNT_M, "Top 10 States (₹M)")?;

    let pay_type = group_by(
        &filtered,
        &[col::TRANSACTION_TYPE],
        &[(col::TRANSACTION_COUNT, Agg::Sum)],
    )?;
    let pay_chart = charts::pie(
        &pay_type,
        col::TRANSACTION_COUNT,
        col::TRANSACTION_TYPE,
        "Transaction Count by Type",
    )?;

    let growth = group_by(&agg, &[col::YEARS], &[(col::TRANSACTION_AMOUNT, Agg::Sum)])?;
    let growth_chart = charts::line(
        &growth,
        col::YEARS,
        col::TRANSACTION_AMOUNT,
        "Yearly Transaction Growth",
    )?;

    let sums = group_by(
        &filtered,
        &[col::STATE],
        &[
            (col::TRANSACTION_AMOUNT, Agg::Sum),
            (col::TRANSACTION_COUNT, Agg::Sum),
        ],
    )?;
    let avg_value = ratio_column(
        &sums,
        col::TRANSACTION_AMOUNT,
        col::TRANSACTION_COUNT,
        derived::AVG_VALUE,
        ZeroGuard::ZeroIfZero,
    )?;
    let avg_value = top_n(&avg_value, derived::AVG_VALUE, 10, SortOrder::Descending)?;
    let avg_chart = charts::bar(
        &avg_value,
        col::STATE,
        derived::AVG_VALUE,
        "Top 10 Avg Transaction Value (₹)",
    )?;

    Ok(View {
        title: study.title().to_string(),
        notice: None,
        sections: vec![
            section("state_heatmap", "State-wise Transaction Heatmap", by_state, heatmap),
            section(
                "top_states",
                "Top 10 States by Transaction Amount",
                top_states,
                top_chart,
            ),
            section("payment_types", "Payment Type Distribution", pay_type, pay_chart),
            section("yearly_growth", "Yearly Growth Trend", growth, growth_chart),
            section(
                "avg_transaction_value",
                "Average Transaction Value per Transaction",
                avg_value,
                avg_chart,
            ),
        ],
    })
}

fn device_usage(loader: &Loader, year: i64, quarter: i64) -> InsightResult<View> {
    let study = CaseStudy::DeviceUsage;
    let agg_user = loader.frame(Dataset::AggUser);
    let map_user = loader.frame(Dataset::MapUser);
    let user_df = filter_period(&agg_user, year, quarter)?;
    let map_df = filter_period(&map_user, year, quarter)?;
    // Both sources have to cover the period; otherwise the whole view
    // degrades to the notice.
    if user_df.is_empty() || map_df.is_empty() {
        return Ok(empty_view(
            study,
            "No user data available for the selected period.",
        ));
    }

    let brands = group_by(&user_df, &[col::BRANDS], &[(col::TRANSACTION_COUNT, Agg::Sum)])?;
    let brands = top_n(&brands, col::TRANSACTION_COUNT, 10, SortOrder::Descending)?;
    let brand_chart = charts::bar(
        &brands,
        col::BRANDS,
        col::TRANSACTION_COUNT,
        &format!("Top 10 Device Brands - {} Q{}", year, quarter),
    )?;

    let app_opens = group_by(&map_df, &[col::STATE], &[(col::APP_OPENS, Agg::Sum)])?;
    let app_opens = top_n(&app_opens, col::APP_OPENS, 10, SortOrder::Descending)?;
    let opens_chart = charts::bar(
        &app_opens,
        col::STATE,
        col::APP_OPENS,
        &format!("Top 10 States by App Opens - {} Q{}", year, quarter),
    )?;

    let share = group_by(&user_df, &[col::STATE], &[(col::TRANSACTION_COUNT, Agg::Sum)])?;
    let share = top_n(&share, col::TRANSACTION_COUNT, 10, SortOrder::Descending)?;
    let mut share_chart = charts::pie(
        &share,
        col::TRANSACTION_COUNT,
        col::STATE,
        &format!(
            "Top 10 States by Share of Total Device Usage - {} Q{}",
            year, quarter
        ),
    )?;
    if let Some(ChartSpec::Pie(pie)) = share_chart.as_mut() {
        pie.hole = 0.3;
        pie.text_info = Some("percent+label".to_string());
        pie.pull = Some(0.05);
        pie.color_sequence = Some("Set3".to_string());
    }

    Ok(View {
        title: study.title().to_string(),
        notice: None,
        sections: vec![
            section("device_brands", "Top 10 Device Brands by Transaction Count", brands, brand_chart),
            section("state_app_opens", "Top 10 States by App Opens", app_opens, opens_chart),
            section("state_device_share", "Share of Device Usage by State", share, share_chart),
        ],
    })
}

fn insurance_market(
    loader: &Loader,
    geo: &GeoReference,
    year: i64,
    quarter: i64,
) -> InsightResult<View> {
    let study = CaseStudy::InsuranceMarket;
    let agg = loader.frame(Dataset::AggInsurance);
    let filtered = filter_period(&agg, year, quarter)?;
    if filtered.is_empty() {
        return Ok(empty_view(study, "No insurance data available."));
    }

    let by_state = group_by(&filtered, &[col::STATE], &[(col::INSURANCE_AMOUNT, Agg::Sum)])?;
    let by_state = scale_column(&by_state, col::INSURANCE_AMOUNT, 1e6, derived::AMOUNT_M)?;
    let heatmap = charts::choropleth(
        &by_state,
        derived::AMOUNT_M,
        &format!("Insurance - {} Q{}", year, quarter),
        ColorScale::Oranges,
        "₹M",
        geo,
    )?;

    let top_states = top_n(&by_state, col::INSURANCE_AMOUNT, 10, SortOrder::Descending)?;
    let top_chart = charts::bar(
        &top_states,
        col::STATE,
        derived::AMOUNT_M,
        "Top States by Insurance (₹M)",
    )?;

    let within_year = filter_eq(&agg, col::YEARS, &Value::Int(year))?;
    let quarterly = group_by(&within_year, &[col::QUARTER], &[(col::INSURANCE_AMOUNT, Agg::Sum)])?;
    let quarterly_chart = charts::line(
        &quarterly,
        col::QUARTER,
        col::INSURANCE_AMOUNT,
        "Quarterly Insurance Growth",
    )?;

    // Policy value is a row-level ratio averaged per state.
    let with_policy = ratio_column(
        &filtered,
        col::INSURANCE_AMOUNT,
        col::INSURANCE_COUNT,
        derived::AVG_POLICY_VALUE,
        ZeroGuard::AddOne,
    )?;
    let avg_policy = group_by(
        &with_policy,
        &[col::STATE],
        &[(derived::AVG_POLICY_VALUE, Agg::Mean)],
    )?;
    let avg_policy = top_n(&avg_policy, derived::AVG_POLICY_VALUE, 10, SortOrder::Descending)?;
    let policy_chart = charts::bar(
        &avg_policy,
        col::STATE,
        derived::AVG_POLICY_VALUE,
        "Average Policy Value by State",
    )?;

    let yearly = group_by(&agg, &[col::YEARS], &[(col::INSURANCE_AMOUNT, Agg::Sum)])?;
    let yearly_chart = charts::line(
        &yearly,
        col::YEARS,
        col::INSURANCE_AMOUNT,
        "Year-on-Year Insurance Growth",
    )?;

    Ok(View {
        title: study.title().to_string(),
        notice: None,
        sections: vec![
            section("insurance_heatmap", "State-wise Insurance Heatmap", by_state, heatmap),
            section("top_states", "Top States by Insurance Amount", top_states, top_chart),
            section("quarterly_growth", "Quarterly Insurance Growth", quarterly, quarterly_chart),
            section("avg_policy_value", "Average Policy Value by State", avg_policy, policy_chart),
            section("yearly_growth", "Year-on-Year Insurance Growth", yearly, yearly_chart),
        ],
    })
}

fn market_expansion(
    loader: &Loader,
    geo: &GeoReference,
    year: i64,
    quarter: i64,
) -> InsightResult<View> {
    let study = CaseStudy::MarketExpansion;
    let map = loader.frame(Dataset::MapTransaction);
    let filtered = filter_period(&map, year, quarter)?;
    if filtered.is_empty() {
        return Ok(empty_view(study, "No transaction mapping data available."));
    }

    let summary = group_by(
        &filtered,
        &[col::STATE],
        &[
            (col::TRANSACTION_AMOUNT, Agg::Sum),
            (col::TRANSACTION_COUNT, Agg::Sum),
        ],
    )?;
    let summary = scale_column(&summary, col::TRANSACTION_AMOUNT, 1e6, derived::AMOUNT_M)?;
    let heatmap = charts::choropleth(
        &summary,
        derived::AMOUNT_M,
        &format!("Market Penetration - {} Q{}", year, quarter),
        ColorScale::Reds,
        "₹M",
        geo,
    )?;

    let scored = ratio_column(
        &summary,
        col::TRANSACTION_AMOUNT,
        col::TRANSACTION_COUNT,
        derived::GROWTH_SCORE,
        ZeroGuard::ZeroIfZero,
    )?;
    let growth_potential = top_n(&scored, derived::GROWTH_SCORE, 10, SortOrder::Descending)?;
    let growth_chart = charts::bar(
        &growth_potential,
        col::STATE,
        derived::GROWTH_SCORE,
        "Top 10 Growth Potential States",
    )?;

    let density = top_n(&summary, col::TRANSACTION_COUNT, 10, SortOrder::Descending)?;
    let density_chart = charts::bar(
        &density,
        col::STATE,
        col::TRANSACTION_COUNT,
        "Top States by Transaction Density",
    )?;

    let trend = group_by(&map, &[col::YEARS], &[(col::TRANSACTION_AMOUNT, Agg::Sum)])?;
    let trend_chart = charts::line(
        &trend,
        col::YEARS,
        col::TRANSACTION_AMOUNT,
        "Yearly Market Volume Trend",
    )?;

    let corr_chart = charts::scatter(
        &summary,
        col::TRANSACTION_COUNT,
        col::TRANSACTION_AMOUNT,
        col::STATE,
        "Correlation: Count vs Amount",
    )?;
    let correlation = summary.clone();

    Ok(View {
        title: study.title().to_string(),
        notice: None,
        sections: vec![
            section("penetration_heatmap", "Market Penetration Heatmap", summary, heatmap),
            section(
                "growth_potential",
                "Top 10 Growth Potential States",
                growth_potential,
                growth_chart,
            ),
            section("transaction_density", "Top States by Transaction Density", density, density_chart),
            section("yearly_volume", "Yearly Market Volume Trend", trend, trend_chart),
            section("count_vs_amount", "Correlation: Count vs Amount", correlation, corr_chart),
        ],
    })
}

fn user_growth(
    loader: &Loader,
    geo: &GeoReference,
    year: i64,
    quarter: i64,
) -> InsightResult<View> {
    let study = CaseStudy::UserGrowth;
    let map = loader.frame(Dataset::MapUser);
    let filtered = filter_period(&map, year, quarter)?;
    if filtered.is_empty() {
        return Ok(empty_view(study, "No user data available."));
    }

    let summary = group_by(
        &filtered,
        &[col::STATE],
        &[(col::REGISTERED_USERS, Agg::Sum), (col::APP_OPENS, Agg::Sum)],
    )?;
    let summary = scale_column(&summary, col::REGISTERED_USERS, 1e3, derived::USERS_K)?;
    let heatmap = charts::choropleth(
        &summary,
        derived::USERS_K,
        &format!("Registered Users - {} Q{}", year, quarter),
        ColorScale::Purples,
        "K Users",
        geo,
    )?;

    let engaged = ratio_column(
        &summary,
        col::APP_OPENS,
        col::REGISTERED_USERS,
        derived::ENGAGEMENT_RATE,
        ZeroGuard::AddOne,
    )?;
    let engaged = top_n(&engaged, derived::ENGAGEMENT_RATE, 10, SortOrder::Descending)?;
    let engagement_chart = charts::bar(
        &engaged,
        col::STATE,
        derived::ENGAGEMENT_RATE,
        "Top 10 States by Engagement Rate",
    )?;

    let within_year = filter_eq(&map, col::YEARS, &Value::Int(year))?;
    let quarterly = group_by(&within_year, &[col::QUARTER], &[(col::REGISTERED_USERS, Agg::Sum)])?;
    let quarterly_chart = charts::line(
        &quarterly,
        col::QUARTER,
        col::REGISTERED_USERS,
        "Quarterly User Growth",
    )?;

    let districts = group_by(&filtered, &[col::DISTRICT], &[(col::REGISTERED_USERS, Agg::Sum)])?;
    let districts = top_n(&districts, col::REGISTERED_USERS, 10, SortOrder::Descending)?;
    let district_chart = charts::bar(
        &districts,
        col::DISTRICT,
        col::REGISTERED_USERS,
        "Top Districts by Registered Users",
    )?;

    let corr_chart = charts::scatter(
        &summary,
        col::REGISTERED_USERS,
        col::APP_OPENS,
        col::STATE,
        "Correlation: App Opens vs Registered Users",
    )?;
    let correlation = summary.clone();

    Ok(View {
        title: study.title().to_string(),
        notice: None,
        sections: vec![
            section("users_heatmap", "Registered Users Heatmap", summary, heatmap),
            section("engagement_rate", "Top 10 States by Engagement Rate", engaged, engagement_chart),
            section("quarterly_growth", "Quarterly User Growth", quarterly, quarterly_chart),
            section("top_districts", "Top Districts by Registered Users", districts, district_chart),
            section(
                "users_vs_app_opens",
                "Correlation: App Opens vs Registered Users",
                correlation,
                corr_chart,
            ),
        ],
    })
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn section(slug: &'static str, heading: &str, table: Frame, chart: Option<ChartSpec>) -> Section {
    Section {
        slug,
        heading: heading.to_string(),
        table,
        chart,
    }
}

fn empty_view(study: CaseStudy, notice: &str) -> View {
    View {
        title: study.title().to_string(),
        notice: Some(notice.to_string()),
        sections: Vec::new(),
    }
}

fn filter_period(frame: &Frame, year: i64, quarter: i64) -> InsightResult<Frame> {
    let by_year = filter_eq(frame, col::YEARS, &Value::Int(year))?;
    filter_eq(&by_year, col::QUARTER, &Value::Int(quarter))
}

fn column_sum(frame: &Frame, column: &str) -> f64 {
    frame
        .column_f64(column)
        .map(|values| values.iter().sum())
        .unwrap_or(0.0)
}

/// Append "`<year>` Q`<quarter>`" period labels to a (Years, Quarter) frame.
fn with_period_labels(mut frame: Frame) -> InsightResult<Frame> {
    let labels: Vec<Value> = frame
        .column_values(col::YEARS)?
        .iter()
        .zip(frame.column_values(col::QUARTER)?.iter())
        .map(|(year, quarter)| Value::Str(format!("{} Q{}", year, quarter)))
        .collect();
    frame.add_column(derived::PERIOD, labels)?;
    Ok(frame)
}
