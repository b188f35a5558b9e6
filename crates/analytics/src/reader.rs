//! Read-only query implementations.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use stockledger_core::window::end_of_day;
use stockledger_core::{DateWindow, DomainError, ItemId, SupplierId};
use stockledger_infra::{EventFilter, EventQueryResult, LedgerStore, Pagination, StoreError};
use stockledger_inventory::{Item, StockEvent};

use crate::types::{
    DailyStockValue, DashboardSummary, EventSearch, ItemActivity, LowStockItem, MonthlyMovement,
    PriceMovement, PricePoint, SupplierStock,
};

/// Error of a read query: invalid query input, or the store being away.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-only trend queries over a [`LedgerStore`].
///
/// Never writes. Each query takes one consistent snapshot per store read,
/// so results are either fully pre-commit or fully post-commit relative to
/// concurrent writers, never a half-applied mixture.
pub struct AnalyticsReader<S> {
    store: S,
}

impl<S> AnalyticsReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: LedgerStore> AnalyticsReader<S> {
    /// Monthly inbound/outbound totals across the inventory, newest month
    /// first. The optional supplier filter matches the denormalized
    /// supplier snapshot on each event.
    pub fn monthly_movement(
        &self,
        window: DateWindow,
        supplier_id: Option<SupplierId>,
    ) -> Result<Vec<MonthlyMovement>, AnalyticsError> {
        let filter = EventFilter {
            supplier_id,
            occurred_after: Some(window.start_instant()),
            occurred_before: Some(window.end_instant()),
            ..EventFilter::default()
        };
        Ok(bucket_by_month(&self.all_events(&filter)?))
    }

    /// Monthly inbound/outbound totals for one item, newest month first.
    pub fn monthly_movement_for_item(
        &self,
        item_id: ItemId,
        window: DateWindow,
    ) -> Result<Vec<MonthlyMovement>, AnalyticsError> {
        let filter = EventFilter {
            item_id: Some(item_id),
            occurred_after: Some(window.start_instant()),
            occurred_before: Some(window.end_instant()),
            ..EventFilter::default()
        };
        Ok(bucket_by_month(&self.all_events(&filter)?))
    }

    /// Whole-inventory valuation for each day of the window, ascending.
    ///
    /// A day's figure is, per item, the latest known resulting quantity at
    /// or before that day times the unit price in effect that day (the
    /// event's captured price, falling back to the item's current price).
    /// Days before an item's first event contribute nothing for it.
    pub fn stock_value_over_time(
        &self,
        window: DateWindow,
        supplier_id: Option<SupplierId>,
    ) -> Result<Vec<DailyStockValue>, AnalyticsError> {
        let items = self.items_for_supplier(supplier_id)?;
        let streams = self.streams_up_to(&items, window.end_instant())?;
        Ok(walk_daily_values(&items, &streams, window.days()))
    }

    /// Whole-inventory valuation snapshot on one date.
    pub fn valuation_on(
        &self,
        date: NaiveDate,
        supplier_id: Option<SupplierId>,
    ) -> Result<Decimal, AnalyticsError> {
        let items = self.items_for_supplier(supplier_id)?;
        let streams = self.streams_up_to(&items, end_of_day(date))?;
        let days = walk_daily_values(&items, &streams, std::iter::once(date));
        Ok(days.into_iter().next().map(|d| d.value).unwrap_or(Decimal::ZERO))
    }

    /// Price observations of one item within the window, each paired with
    /// the immediately preceding price from the same ordered stream (one
    /// forward pass with a one-element lookback, not a self-join). The
    /// lookback may reach before the window; only emission is windowed.
    pub fn price_trend(
        &self,
        item_id: ItemId,
        window: DateWindow,
    ) -> Result<Vec<PricePoint>, AnalyticsError> {
        let stream = self.store.events_for_item(item_id)?;

        let mut previous: Option<Decimal> = None;
        let mut points = Vec::new();
        for event in &stream {
            let Some(price) = event.price_at_change else {
                continue;
            };
            if window.contains(event.occurred_at) {
                let (movement, magnitude) = classify(price, previous);
                points.push(PricePoint {
                    occurred_at: event.occurred_at,
                    price,
                    previous,
                    movement,
                    magnitude,
                });
            }
            previous = Some(price);
        }
        Ok(points)
    }

    /// Items strictly below their reorder threshold, most urgent first
    /// (ascending by quantity, name as tie-breaker). Disabled items never
    /// appear. The supplier filter matches the item's current supplier.
    pub fn low_stock(
        &self,
        supplier_id: Option<SupplierId>,
    ) -> Result<Vec<LowStockItem>, AnalyticsError> {
        let mut flagged: Vec<LowStockItem> = self
            .items_for_supplier(supplier_id)?
            .into_iter()
            .filter(Item::is_low_stock)
            .map(|item| LowStockItem {
                item_id: item.id,
                name: item.name,
                quantity: item.quantity,
                minimum_quantity: item.minimum_quantity,
                supplier_id: item.supplier_id,
            })
            .collect();
        flagged.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
        Ok(flagged)
    }

    /// Global low-stock KPI.
    pub fn low_stock_count(&self) -> Result<u64, AnalyticsError> {
        Ok(self
            .store
            .list_items()?
            .iter()
            .filter(|i| i.is_low_stock())
            .count() as u64)
    }

    /// Current quantity and value per supplier, computed from item
    /// projections (current-state aggregation, not event replay). Largest
    /// position first.
    pub fn stock_per_supplier(&self) -> Result<Vec<SupplierStock>, AnalyticsError> {
        let mut totals: HashMap<SupplierId, (i64, Decimal)> = HashMap::new();
        for item in self.store.list_items()? {
            if item.disabled {
                continue;
            }
            let entry = totals.entry(item.supplier_id).or_insert((0, Decimal::ZERO));
            entry.0 += item.quantity;
            entry.1 += item.stock_value();
        }

        let mut rollup: Vec<SupplierStock> = totals
            .into_iter()
            .map(|(supplier_id, (total_quantity, total_value))| SupplierStock {
                supplier_id,
                total_quantity,
                total_value,
            })
            .collect();
        rollup.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        });
        Ok(rollup)
    }

    /// Event count per item, most active first. Higher count means a more
    /// frequently touched product.
    pub fn item_update_frequency(
        &self,
        supplier_id: Option<SupplierId>,
    ) -> Result<Vec<ItemActivity>, AnalyticsError> {
        let items = self.items_for_supplier(supplier_id)?;
        let mut counts: HashMap<ItemId, u64> = HashMap::new();
        for event in self.all_events(&EventFilter::default())? {
            *counts.entry(event.item_id).or_default() += 1;
        }

        let mut activity: Vec<ItemActivity> = items
            .into_iter()
            .map(|item| ItemActivity {
                update_count: counts.get(&item.id).copied().unwrap_or(0),
                item_id: item.id,
                name: item.name,
            })
            .collect();
        activity.sort_by(|a, b| {
            b.update_count
                .cmp(&a.update_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(activity)
    }

    /// Multi-criteria event search, newest first, paginated. Missing date
    /// bounds default to the last 30 days; inverted bounds are rejected
    /// before any read happens.
    pub fn filtered_events(&self, search: &EventSearch) -> Result<EventQueryResult, AnalyticsError> {
        let window = DateWindow::resolve(search.start_date, search.end_date)?;
        if let (Some(min), Some(max)) = (search.min_delta, search.max_delta) {
            if min > max {
                return Err(DomainError::validation("min_delta must be <= max_delta").into());
            }
        }

        let filter = EventFilter {
            supplier_id: search.supplier_id,
            recorded_by: search.recorded_by.clone(),
            occurred_after: Some(window.start_instant()),
            occurred_before: Some(window.end_instant()),
            min_delta: search.min_delta,
            max_delta: search.max_delta,
            ..EventFilter::default()
        };

        let name_matches: Option<HashSet<ItemId>> = match &search.item_name {
            None => None,
            Some(fragment) => {
                let needle = fragment.to_lowercase();
                Some(
                    self.store
                        .list_items()?
                        .into_iter()
                        .filter(|i| i.name.to_lowercase().contains(&needle))
                        .map(|i| i.id)
                        .collect(),
                )
            }
        };

        let mut matches = self.all_events(&filter)?;
        if let Some(ids) = &name_matches {
            matches.retain(|e| ids.contains(&e.item_id));
        }

        let pagination = Pagination::new(search.limit, search.offset);
        let total = matches.len() as u64;
        let events: Vec<StockEvent> = matches
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        let has_more = (pagination.offset as usize + events.len()) < total as usize;

        debug!(total, returned = events.len(), "filtered event search");
        Ok(EventQueryResult {
            events,
            total,
            pagination,
            has_more,
        })
    }

    /// One bundle of the dashboard KPIs: supplier rollups, low-stock list,
    /// monthly movement for the window, and the five most-touched items.
    pub fn dashboard_summary(
        &self,
        window: DateWindow,
        supplier_id: Option<SupplierId>,
    ) -> Result<DashboardSummary, AnalyticsError> {
        let mut top_updated_items = self.item_update_frequency(supplier_id)?;
        top_updated_items.truncate(5);

        Ok(DashboardSummary {
            stock_per_supplier: self.stock_per_supplier()?,
            low_stock_items: self.low_stock(supplier_id)?,
            monthly_movement: self.monthly_movement(window, supplier_id)?,
            top_updated_items,
        })
    }

    /// All matches of a filter, newest first (no page cap).
    fn all_events(&self, filter: &EventFilter) -> Result<Vec<StockEvent>, AnalyticsError> {
        let page = self.store.query_events(
            filter,
            Pagination {
                limit: u32::MAX,
                offset: 0,
            },
        )?;
        Ok(page.events)
    }

    /// Non-disabled items, optionally restricted to one current supplier.
    fn items_for_supplier(
        &self,
        supplier_id: Option<SupplierId>,
    ) -> Result<Vec<Item>, AnalyticsError> {
        Ok(self
            .store
            .list_items()?
            .into_iter()
            .filter(|i| !i.disabled)
            .filter(|i| supplier_id.is_none_or(|s| i.supplier_id == s))
            .collect())
    }

    /// Ascending per-item streams of everything at or before `cutoff`.
    fn streams_up_to(
        &self,
        items: &[Item],
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<HashMap<ItemId, Vec<StockEvent>>, AnalyticsError> {
        let mut streams = HashMap::new();
        for item in items {
            let mut stream = self.store.events_for_item(item.id)?;
            stream.retain(|e| e.occurred_at <= cutoff);
            streams.insert(item.id, stream);
        }
        Ok(streams)
    }
}

fn classify(price: Decimal, previous: Option<Decimal>) -> (PriceMovement, Decimal) {
    match previous {
        None => (PriceMovement::Flat, Decimal::ZERO),
        Some(prev) if price > prev => (PriceMovement::Up, price - prev),
        Some(prev) if price < prev => (PriceMovement::Down, prev - price),
        Some(_) => (PriceMovement::Flat, Decimal::ZERO),
    }
}

/// Bucket events into calendar months; newest month first.
fn bucket_by_month(events: &[StockEvent]) -> Vec<MonthlyMovement> {
    let mut buckets: BTreeMap<(i32, u32), (i64, i64)> = BTreeMap::new();
    for event in events {
        let key = (event.occurred_at.year(), event.occurred_at.month());
        let bucket = buckets.entry(key).or_default();
        if event.quantity_delta > 0 {
            bucket.0 += event.quantity_delta;
        } else {
            bucket.1 += -event.quantity_delta;
        }
    }

    buckets
        .into_iter()
        .rev()
        .map(|((year, month), (inbound, outbound))| MonthlyMovement {
            month: format!("{year:04}-{month:02}"),
            inbound,
            outbound,
        })
        .collect()
}

/// Walk days in order, advancing each item's stream pointer, summing
/// `latest resulting quantity × price in effect` across items.
fn walk_daily_values(
    items: &[Item],
    streams: &HashMap<ItemId, Vec<StockEvent>>,
    days: impl Iterator<Item = NaiveDate>,
) -> Vec<DailyStockValue> {
    struct Pointer<'a> {
        stream: &'a [StockEvent],
        next: usize,
        quantity: Option<i64>,
        price: Option<Decimal>,
        fallback_price: Decimal,
    }

    let mut pointers: Vec<Pointer<'_>> = items
        .iter()
        .map(|item| Pointer {
            stream: streams.get(&item.id).map(Vec::as_slice).unwrap_or(&[]),
            next: 0,
            quantity: None,
            price: None,
            fallback_price: item.unit_price,
        })
        .collect();

    days.map(|day| {
        let cutoff = end_of_day(day);
        let mut value = Decimal::ZERO;
        for p in pointers.iter_mut() {
            while p.next < p.stream.len() && p.stream[p.next].occurred_at <= cutoff {
                let event = &p.stream[p.next];
                p.quantity = Some(event.resulting_quantity);
                if let Some(price) = event.price_at_change {
                    p.price = Some(price);
                }
                p.next += 1;
            }
            if let Some(quantity) = p.quantity {
                value += Decimal::from(quantity) * p.price.unwrap_or(p.fallback_price);
            }
        }
        DailyStockValue { date: day, value }
    })
    .collect()
}
