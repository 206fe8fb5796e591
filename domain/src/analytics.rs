//! Dashboard and report aggregations over quotes.
//!
//! All functions are pure folds over slices so the service can hand them
//! whatever subset the caller is allowed to see.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Month, OffsetDateTime};
use uuid::Uuid;

use crate::model::{Client, Product, Quote, User};
use crate::money::{Money, round_money, safe_ratio};
use crate::permissions::Role;
use crate::pipeline::{PipelineStage, QuoteStatus};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: PipelineStage,
    pub count: usize,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: QuoteStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_quotes: usize,
    pub open_quotes: usize,
    pub won_quotes: usize,
    pub won_revenue: Money,
    pub pipeline_value: Money,
    pub average_quote_value: Money,
    /// Percent of decided quotes (won or closed) that were won.
    pub conversion_rate: Decimal,
    pub stages: Vec<StageCount>,
    pub statuses: Vec<StatusCount>,
    pub product_count: usize,
    pub client_count: usize,
}

fn percent(numerator: usize, denominator: usize) -> Decimal {
    round_money(safe_ratio(Decimal::from(numerator), Decimal::from(denominator)) * HUNDRED)
}

#[must_use]
pub fn sales_funnel(quotes: &[Quote]) -> Vec<StageCount> {
    PipelineStage::ALL
        .into_iter()
        .map(|stage| {
            let in_stage = quotes.iter().filter(|q| q.pipeline_stage == stage);
            StageCount {
                stage,
                count: in_stage.clone().count(),
                value: in_stage.map(|q| q.totals.total).sum(),
            }
        })
        .collect()
}

#[must_use]
pub fn dashboard_stats(quotes: &[Quote], product_count: usize, client_count: usize) -> DashboardStats {
    let stages = sales_funnel(quotes);
    let statuses = QuoteStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: quotes.iter().filter(|q| q.status == status).count() })
        .collect();

    let won: Vec<&Quote> = quotes.iter().filter(|q| q.pipeline_stage == PipelineStage::Won).collect();
    let closed = quotes.iter().filter(|q| q.pipeline_stage == PipelineStage::Closed).count();
    let open: Vec<&Quote> = quotes.iter().filter(|q| q.pipeline_stage.is_open()).collect();
    let all_value: Money = quotes.iter().map(|q| q.totals.total).sum();

    DashboardStats {
        total_quotes: quotes.len(),
        open_quotes: open.len(),
        won_quotes: won.len(),
        won_revenue: won.iter().map(|q| q.totals.total).sum(),
        pipeline_value: open.iter().map(|q| q.totals.total).sum(),
        average_quote_value: round_money(safe_ratio(all_value, Decimal::from(quotes.len()))),
        conversion_rate: percent(won.len(), won.len() + closed),
        stages,
        statuses,
        product_count,
        client_count,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRevenue {
    pub client_id: Uuid,
    pub name: String,
    pub quote_count: usize,
    pub quoted_value: Money,
    pub won_value: Money,
}

/// Clients ranked by total quoted value, highest first.
#[must_use]
pub fn top_clients(quotes: &[Quote], clients: &[Client], limit: usize) -> Vec<ClientRevenue> {
    let names: HashMap<Uuid, &str> = clients.iter().map(|c| (c.id, c.name.as_str())).collect();
    let mut by_client: HashMap<Uuid, ClientRevenue> = HashMap::new();
    for quote in quotes {
        let entry = by_client.entry(quote.client_id).or_insert_with(|| ClientRevenue {
            client_id: quote.client_id,
            name: names.get(&quote.client_id).copied().unwrap_or("Unknown client").to_owned(),
            quote_count: 0,
            quoted_value: Decimal::ZERO,
            won_value: Decimal::ZERO,
        });
        entry.quote_count += 1;
        entry.quoted_value += quote.totals.total;
        if quote.pipeline_stage == PipelineStage::Won {
            entry.won_value += quote.totals.total;
        }
    }
    let mut ranked: Vec<ClientRevenue> = by_client.into_values().collect();
    ranked.sort_by(|a, b| b.quoted_value.cmp(&a.quoted_value).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRevenue {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub line_count: usize,
    pub quantity: Decimal,
    pub revenue: Money,
}

/// Products ranked by quoted line revenue (pre-tax), highest first.
#[must_use]
pub fn top_products(quotes: &[Quote], products: &[Product], limit: usize) -> Vec<ProductRevenue> {
    let catalog: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut by_product: HashMap<Uuid, ProductRevenue> = HashMap::new();
    for item in quotes.iter().flat_map(|q| q.line_items.iter()) {
        let entry = by_product.entry(item.product_id).or_insert_with(|| {
            let product = catalog.get(&item.product_id);
            ProductRevenue {
                product_id: item.product_id,
                name: product.map_or_else(|| "Unknown product".to_owned(), |p| p.name.clone()),
                category: product.map_or_else(String::new, |p| p.category.clone()),
                line_count: 0,
                quantity: Decimal::ZERO,
                revenue: Decimal::ZERO,
            }
        });
        entry.line_count += 1;
        entry.quantity += item.quantity;
        entry.revenue += item.total_price;
    }
    let mut ranked: Vec<ProductRevenue> = by_product.into_values().collect();
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepPerformance {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub quote_count: usize,
    pub won_count: usize,
    pub won_revenue: Money,
    pub pipeline_value: Money,
    pub average_quote_value: Money,
    pub conversion_rate: Decimal,
}

/// Per-rep numbers for every active sales user, best won revenue first.
#[must_use]
pub fn rep_performance(quotes: &[Quote], users: &[User]) -> Vec<RepPerformance> {
    let mut rows: Vec<RepPerformance> = users
        .iter()
        .filter(|u| u.is_active && u.role.is_sales())
        .map(|user| {
            let mine: Vec<&Quote> = quotes.iter().filter(|q| q.credited_rep() == user.id).collect();
            let won: Vec<&&Quote> = mine.iter().filter(|q| q.pipeline_stage == PipelineStage::Won).collect();
            let closed = mine.iter().filter(|q| q.pipeline_stage == PipelineStage::Closed).count();
            let total: Money = mine.iter().map(|q| q.totals.total).sum();
            RepPerformance {
                user_id: user.id,
                name: user.display_name(),
                role: user.role,
                quote_count: mine.len(),
                won_count: won.len(),
                won_revenue: won.iter().map(|q| q.totals.total).sum(),
                pipeline_value: mine.iter().filter(|q| q.pipeline_stage.is_open()).map(|q| q.totals.total).sum(),
                average_quote_value: round_money(safe_ratio(total, Decimal::from(mine.len()))),
                conversion_rate: percent(won.len(), won.len() + closed),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.won_revenue.cmp(&a.won_revenue).then_with(|| a.name.cmp(&b.name)));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    pub month: String,
    pub quotes_created: usize,
    pub quoted_value: Money,
    pub won_value: Money,
}

fn month_key(year: i32, month: Month) -> String {
    format!("{year}-{:02}", u8::from(month))
}

/// Last `months` calendar months ending at `now`, oldest first, including
/// empty months.
#[must_use]
pub fn revenue_trend(quotes: &[Quote], months: u32, now: OffsetDateTime) -> Vec<MonthlyRevenue> {
    let mut buckets: BTreeMap<(i32, u8), MonthlyRevenue> = BTreeMap::new();
    let (mut year, mut month) = (now.year(), now.month());
    for _ in 0..months {
        buckets.insert(
            (year, u8::from(month)),
            MonthlyRevenue {
                month: month_key(year, month),
                quotes_created: 0,
                quoted_value: Decimal::ZERO,
                won_value: Decimal::ZERO,
            },
        );
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    for quote in quotes {
        let key = (quote.created_at.year(), u8::from(quote.created_at.month()));
        if let Some(bucket) = buckets.get_mut(&key) {
            bucket.quotes_created += 1;
            bucket.quoted_value += quote.totals.total;
            if quote.pipeline_stage == PipelineStage::Won {
                bucket.won_value += quote.totals.total;
            }
        }
    }
    buckets.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMargin {
    pub category: String,
    pub revenue: Money,
    pub cost: Money,
    pub margin: Money,
    pub margin_percent: Decimal,
}

/// Gross margin per category over won quotes, costing each line at the
/// product's wholesale price. Lines for products without a wholesale price
/// count as zero cost.
#[must_use]
pub fn margin_by_category(quotes: &[Quote], products: &[Product]) -> Vec<CategoryMargin> {
    let catalog: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut buckets: BTreeMap<String, (Money, Money)> = BTreeMap::new();

    let won_lines = quotes
        .iter()
        .filter(|q| q.pipeline_stage == PipelineStage::Won)
        .flat_map(|q| q.line_items.iter());
    for item in won_lines {
        let Some(product) = catalog.get(&item.product_id) else {
            continue;
        };
        let cost = round_money(product.wholesale_price.unwrap_or_default() * item.quantity);
        let entry = buckets.entry(product.category.clone()).or_default();
        entry.0 += item.total_price;
        entry.1 += cost;
    }

    buckets
        .into_iter()
        .map(|(category, (revenue, cost))| {
            let margin = revenue - cost;
            CategoryMargin {
                category,
                revenue,
                cost,
                margin,
                margin_percent: round_money(safe_ratio(margin, revenue) * HUNDRED),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
