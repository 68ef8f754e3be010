//! Derived views over a todo snapshot: filtering, activity over the last
//! week, per-category completion and the monthly summary.
//!
//! Everything here is a pure function of its inputs. `QueryCache` memoizes
//! a query against the identity of the snapshot it ran on.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::model::category::CategorySet;
use crate::model::config::ActivityWindow;
use crate::model::filter::{CategoryFilter, StatusFilter};
use crate::model::todo::{TodoItem, TodoList};

/// Days covered by the activity window
pub const ACTIVITY_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Items matching both predicates, in collection order.
pub fn filter_todos(list: &TodoList, status: StatusFilter, category: &CategoryFilter) -> TodoList {
    list.iter()
        .filter(|t| status.matches(t) && category.matches(t))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Per-day counts aligned to `labels` (day of month).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub labels: Vec<u32>,
    pub created: Vec<usize>,
    pub completed: Vec<usize>,
}

impl DailyActivity {
    fn for_dates(list: &TodoList, dates: &[NaiveDate], date_of: impl Fn(&TodoItem) -> NaiveDate) -> Self {
        let mut activity = DailyActivity {
            labels: dates.iter().map(|d| d.day()).collect(),
            created: vec![0; dates.len()],
            completed: vec![0; dates.len()],
        };
        for item in list {
            let day = date_of(item);
            if let Some(idx) = dates.iter().position(|d| *d == day) {
                activity.created[idx] += 1;
                if item.completed {
                    activity.completed[idx] += 1;
                }
            }
        }
        activity
    }
}

/// Created/completed counts for the days `max(1, d - 6) ..= d` of the
/// reference month, where `d` is the reference day. Near the start of a
/// month the window is shorter than seven days.
pub fn daily_activity<Tz: TimeZone>(list: &TodoList, reference: &DateTime<Tz>) -> DailyActivity {
    let today = reference.date_naive();
    let first = today.day().saturating_sub(ACTIVITY_DAYS - 1).max(1);
    let dates: Vec<NaiveDate> = (first..=today.day())
        .filter_map(|day| today.with_day(day))
        .collect();
    DailyActivity::for_dates(list, &dates, |item| local_date(item, reference))
}

/// Created/completed counts for the seven calendar days ending at the
/// reference date, reaching into the previous month when needed.
pub fn rolling_activity<Tz: TimeZone>(list: &TodoList, reference: &DateTime<Tz>) -> DailyActivity {
    let today = reference.date_naive();
    let dates: Vec<NaiveDate> = (0..ACTIVITY_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .collect();
    DailyActivity::for_dates(list, &dates, |item| local_date(item, reference))
}

/// Dispatch on the configured window policy.
pub fn activity<Tz: TimeZone>(
    list: &TodoList,
    reference: &DateTime<Tz>,
    window: ActivityWindow,
) -> DailyActivity {
    match window {
        ActivityWindow::Month => daily_activity(list, reference),
        ActivityWindow::Rolling => rolling_activity(list, reference),
    }
}

/// Calendar date of an item's creation in the reference's time zone
fn local_date<Tz: TimeZone>(item: &TodoItem, reference: &DateTime<Tz>) -> NaiveDate {
    item.created()
        .with_timezone(&reference.timezone())
        .date_naive()
}

// ---------------------------------------------------------------------------
// Completion rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    /// Whole percent, 0..=100
    pub rate: u32,
}

/// `round(100 * completed / total)` with halves rounding up; 0 when `total` is 0.
pub fn percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * completed + total) / (2 * total)) as u32
}

/// Completion rate per known category, in category-set order.
pub fn category_completion_rates(list: &TodoList, categories: &CategorySet) -> Vec<CategoryRate> {
    categories
        .iter()
        .map(|category| {
            let (total, completed) = list
                .iter()
                .filter(|t| t.category == category)
                .fold((0, 0), |(total, done), t| {
                    (total + 1, done + usize::from(t.completed))
                });
            CategoryRate {
                category: category.to_string(),
                rate: percent(completed, total),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub total: usize,
    pub completed: usize,
    pub percent: u32,
}

/// Totals over items created in the reference's calendar month.
pub fn monthly_summary<Tz: TimeZone>(list: &TodoList, reference: &DateTime<Tz>) -> MonthlySummary {
    let today = reference.date_naive();
    let (total, completed) = list
        .iter()
        .filter(|t| {
            let day = local_date(t, reference);
            day.year() == today.year() && day.month() == today.month()
        })
        .fold((0, 0), |(total, done), t| {
            (total + 1, done + usize::from(t.completed))
        });
    MonthlySummary {
        total,
        completed,
        percent: percent(completed, total),
    }
}

// ---------------------------------------------------------------------------
// Progress report
// ---------------------------------------------------------------------------

/// Everything the progress view shows, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub date: NaiveDate,
    pub window: ActivityWindow,
    pub activity: DailyActivity,
    pub categories: Vec<CategoryRate>,
    pub month: MonthlySummary,
}

pub fn progress_report<Tz: TimeZone>(
    list: &TodoList,
    categories: &CategorySet,
    reference: &DateTime<Tz>,
    window: ActivityWindow,
) -> ProgressReport {
    ProgressReport {
        date: reference.date_naive(),
        window,
        activity: activity(list, reference, window),
        categories: category_completion_rates(list, categories),
        month: monthly_summary(list, reference),
    }
}

// ---------------------------------------------------------------------------
// Memoization
// ---------------------------------------------------------------------------

/// Caches one query result per snapshot identity and selection key.
///
/// The snapshot is held weakly, so a cache never keeps an old collection
/// alive, and a fresh allocation can never alias a dropped one while the
/// weak reference exists.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    snapshot: Weak<TodoList>,
    key: Option<K>,
    value: Option<V>,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        QueryCache {
            snapshot: Weak::new(),
            key: None,
            value: None,
        }
    }
}

impl<K: PartialEq, V> QueryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value when `snapshot` and `key` match the last
    /// call; otherwise run `compute` and cache its result.
    pub fn get_or_compute(
        &mut self,
        snapshot: &Arc<TodoList>,
        key: K,
        compute: impl FnOnce(&TodoList, &K) -> V,
    ) -> &V {
        let same_snapshot = std::ptr::eq(self.snapshot.as_ptr(), Arc::as_ptr(snapshot));
        let cached = if same_snapshot && self.key.as_ref() == Some(&key) {
            self.value.take()
        } else {
            None
        };
        let value = cached.unwrap_or_else(|| compute(snapshot, &key));
        self.snapshot = Arc::downgrade(snapshot);
        self.key = Some(key);
        self.value.insert(value)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
