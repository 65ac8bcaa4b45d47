//! View sessions: the state a screen keeps between aggregation passes.

use crate::config::LedgerConfig;
use crate::publish::Published;
use chrono::NaiveDate;
use ledger_core::{ItemCatalog, ItemId, MiningEvent, PriceLookup};
use ledger_econ::{RollupRow, ReprocessSettings, SettingsError};
use ledger_series::{
    aggregate, ChartView, DateWindow, MiningMetric, QuickDate, Series, SeriesKey, SeriesLabels,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Selected source items and the published reprocessing rows.
#[derive(Debug)]
pub struct ReprocessingSession {
    sources: BTreeSet<ItemId>,
    settings: ReprocessSettings,
    rows: Published<RollupRow>,
}

impl ReprocessingSession {
    pub fn new(settings: ReprocessSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            sources: BTreeSet::new(),
            settings,
            rows: Published::new("reprocessed"),
        })
    }

    /// Replace the selection.
    pub fn set<I: IntoIterator<Item = ItemId>>(&mut self, ids: I) {
        self.sources.clear();
        self.add(ids);
    }

    pub fn add<I: IntoIterator<Item = ItemId>>(&mut self, ids: I) {
        self.sources.extend(ids);
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        self.sources.remove(&id)
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn sources(&self) -> &BTreeSet<ItemId> {
        &self.sources
    }

    pub fn settings(&self) -> &ReprocessSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ReprocessSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Recompute the rollup and publish it in one swap.
    ///
    /// Returns the rows of this pass, even if another pass has published
    /// since.
    pub fn refresh<P>(&self, catalog: &ItemCatalog, prices: &P) -> Arc<Vec<RollupRow>>
    where
        P: PriceLookup + ?Sized,
    {
        let rows = Arc::new(ledger_econ::aggregate(
            &self.sources,
            catalog,
            prices,
            &self.settings,
        ));
        self.rows.publish_shared(Arc::clone(&rows));
        rows
    }

    pub fn rows(&self) -> Arc<Vec<RollupRow>> {
        self.rows.snapshot()
    }
}

/// Metric, date window and series selection of the mining graph.
#[derive(Debug)]
pub struct MiningGraphSession {
    metric: MiningMetric,
    labels: SeriesLabels,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    window: DateWindow,
    selected: BTreeSet<SeriesKey>,
    initialized: bool,
    series: Published<Series>,
}

impl MiningGraphSession {
    pub fn new(metric: MiningMetric, labels: SeriesLabels) -> Self {
        Self {
            metric,
            labels,
            from: None,
            to: None,
            window: DateWindow::all(),
            selected: BTreeSet::new(),
            initialized: false,
            series: Published::new("mining-graph"),
        }
    }

    pub fn from_config(cfg: &LedgerConfig) -> Self {
        let mut session = Self::new(cfg.metric, cfg.labels.clone());
        session.set_days(cfg.window.from, cfg.window.to);
        session
    }

    pub fn metric(&self) -> MiningMetric {
        self.metric
    }

    pub fn set_metric(&mut self, metric: MiningMetric) {
        self.metric = metric;
    }

    pub fn labels(&self) -> &SeriesLabels {
        &self.labels
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Selected days, after a `from` past `to` has been snapped.
    pub fn days(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.from, self.to)
    }

    pub fn set_days(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        let to = match (from, to) {
            (Some(f), Some(t)) if f > t => Some(f),
            _ => to,
        };
        self.from = from;
        self.to = to;
        self.window = DateWindow::from_days(from, to);
    }

    /// Move `from` to the preset's start; `Reset` clears both days.
    pub fn apply_quick(&mut self, quick: QuickDate, today: NaiveDate) {
        if quick == QuickDate::Reset {
            self.set_days(None, None);
            return;
        }
        let to = self.to.unwrap_or(today);
        if let Some(from) = quick.apply(to) {
            self.set_days(Some(from), self.to);
        }
    }

    /// The preset matching the current days, if any.
    pub fn quick(&self, today: NaiveDate) -> Option<QuickDate> {
        QuickDate::matching(self.from, self.to, today)
    }

    pub fn selected(&self) -> &BTreeSet<SeriesKey> {
        &self.selected
    }

    pub fn select(&mut self, key: SeriesKey) -> bool {
        self.selected.insert(key)
    }

    pub fn deselect(&mut self, key: &SeriesKey) -> bool {
        self.selected.remove(key)
    }

    pub fn select_all(&mut self) {
        let snapshot = self.series.snapshot();
        self.selected = snapshot.iter().map(|s| s.key.clone()).collect();
    }

    /// Recompute the series from scratch and publish them in one swap.
    ///
    /// The first non-empty pass selects every series; later passes keep the
    /// selection of series that still exist and leave new ones unselected.
    pub fn refresh(&mut self, events: &[MiningEvent], catalog: &ItemCatalog) -> Arc<Vec<Series>> {
        let records = self.metric.timed_values(events);
        let rollup = aggregate(&records, self.labels.resolver(catalog), &self.window);
        if !self.initialized && !rollup.is_empty() {
            self.selected = rollup.keys().cloned().collect();
            self.initialized = true;
        } else {
            let present: BTreeSet<&SeriesKey> = rollup.keys().collect();
            self.selected.retain(|k| present.contains(k));
        }
        debug!(
            metric = self.metric.name(),
            series = rollup.len(),
            selected = self.selected.len(),
            "mining graph refreshed"
        );
        let series = Arc::new(rollup.into_series());
        self.series.publish_shared(Arc::clone(&series));
        series
    }

    pub fn series(&self) -> Arc<Vec<Series>> {
        self.series.snapshot()
    }

    /// Chart state of the latest published series for the current selection.
    pub fn view(&self) -> ChartView {
        let snapshot = self.series.snapshot();
        ChartView::build(
            &snapshot,
            &self.selected,
            &self.labels,
            self.metric.number_format(),
        )
    }
}
