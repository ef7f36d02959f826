use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use shipping::{Shipment, ShipmentId};
use stores::catalog::{Catalog, CatalogSource};
use stores::shipments::{ShipmentStore, StoreError};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cancel::{pause, CancelToken};
use crate::config::AutoLinkConfig;
use crate::execution::{ExecutionEngine, ExecutionResult, ProductLinker};
use crate::hooks::{AlertNotifier, EditorMode, Notifier, ProductEditor, ViewRefresh};
use crate::index::LinkIndex;
use crate::planner::SelectionPlanner;
use crate::progress::{AutoLinkPhase, ProgressSink};

/// Which shipments a run considers, only unlinked ones are ever planned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunScope {
    #[default]
    All,
    Shipments(Vec<ShipmentId>),
}

impl RunScope {
    pub fn includes(&self, id: &ShipmentId) -> bool {
        match self {
            RunScope::All => true,
            RunScope::Shipments(ids) => ids.contains(id),
        }
    }
}

#[derive(Error, Debug)]
pub enum PrerequisiteError {
    #[error("Shipment store not configured")]
    MissingStore,
    #[error("Product catalog not configured")]
    MissingCatalog,
    #[error("Linking capability not available")]
    MissingLinker,
    #[error("Product editor not available")]
    MissingEditor,
    #[error("Shipment store is empty")]
    EmptyStore,
    #[error("Product catalog is empty")]
    EmptyCatalog,
    #[error("Timed out waiting for the store and catalog. timeout: {0:?}")]
    NotReady(Duration),
    #[error("Store unavailable. cause: {0}")]
    Unavailable(StoreError),
}

#[derive(Error, Debug)]
pub enum AutoLinkError {
    #[error("Prerequisites not met. cause: {0}")]
    Prerequisite(#[from] PrerequisiteError),

    #[error("An auto-link run is already in progress")]
    AlreadyRunning,

    #[error("Shipment not found. shipment: {0}")]
    ShipmentNotFound(ShipmentId),

    #[error("Product editor failed. cause: {0}")]
    Editor(anyhow::Error),
}

/// The user-facing category of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCategory {
    Prerequisites,
    NotFound,
    StoreUnavailable,
    Generic,
}

impl AutoLinkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AutoLinkError::Prerequisite(PrerequisiteError::NotReady(_) | PrerequisiteError::Unavailable(_)) => {
                ErrorCategory::StoreUnavailable
            }
            AutoLinkError::Prerequisite(_) => ErrorCategory::Prerequisites,
            AutoLinkError::ShipmentNotFound(_) => ErrorCategory::NotFound,
            AutoLinkError::AlreadyRunning | AutoLinkError::Editor(_) => ErrorCategory::Generic,
        }
    }

    pub fn user_message(&self) -> String {
        match (self.category(), self) {
            (ErrorCategory::Prerequisites, AutoLinkError::Prerequisite(cause)) => {
                format!("Auto-linking cannot start: {}. Load shipments and products first.", cause)
            }
            (ErrorCategory::NotFound, AutoLinkError::ShipmentNotFound(id)) => {
                format!("Shipment {} no longer exists.", id)
            }
            (ErrorCategory::StoreUnavailable, _) => {
                "The shipment store is not available right now, please try again.".to_string()
            }
            (ErrorCategory::Generic, AutoLinkError::AlreadyRunning) => {
                "Auto-linking is already running, wait for it to finish.".to_string()
            }
            _ => format!("Auto-linking failed: {}", self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(strum_macros::Display)]
pub enum Terminal {
    Success,
    /// Every shipment in scope already had products linked.
    NothingToDo,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoLinkReport {
    pub terminal: Terminal,
    pub execution: ExecutionResult,
    pub unlinked_shipments: usize,
    pub planned_shipments: usize,
    /// Non-fatal problems, e.g. a failed durable mirror write.
    pub warnings: Vec<String>,
}

impl AutoLinkReport {
    fn new(terminal: Terminal, unlinked_shipments: usize, planned_shipments: usize) -> Self {
        Self {
            terminal,
            execution: ExecutionResult::default(),
            unlinked_shipments,
            planned_shipments,
            warnings: vec![],
        }
    }
}

struct Prerequisites {
    store: Arc<dyn ShipmentStore>,
    catalog: Catalog,
    linker: Arc<dyn ProductLinker>,
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequences an auto-link run: validate, analyze, plan, execute, persist, finalize.
///
/// Single-flight, a second [`AutoLinker::run`] while one is in progress is rejected with
/// [`AutoLinkError::AlreadyRunning`].
pub struct AutoLinker {
    config: AutoLinkConfig,
    store: Option<Arc<dyn ShipmentStore>>,
    catalog: Option<Arc<dyn CatalogSource>>,
    linker: Option<Arc<dyn ProductLinker>>,
    notifier: Arc<dyn Notifier>,
    view_refresh: Option<Arc<dyn ViewRefresh>>,
    product_editor: Option<Arc<dyn ProductEditor>>,
    rng: Mutex<SmallRng>,
    in_flight: AtomicBool,
}

impl AutoLinker {
    pub fn new(config: AutoLinkConfig) -> Self {
        Self {
            config,
            store: None,
            catalog: None,
            linker: None,
            notifier: Arc::new(AlertNotifier),
            view_refresh: None,
            product_editor: None,
            rng: Mutex::new(SmallRng::from_os_rng()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ShipmentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_linker(mut self, linker: Arc<dyn ProductLinker>) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_view_refresh(mut self, view_refresh: Arc<dyn ViewRefresh>) -> Self {
        self.view_refresh = Some(view_refresh);
        self
    }

    pub fn with_product_editor(mut self, product_editor: Arc<dyn ProductEditor>) -> Self {
        self.product_editor = Some(product_editor);
        self
    }

    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn config(&self) -> &AutoLinkConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fatal errors are also delivered to the notifier, as a friendly message.
    pub async fn run(
        &self,
        scope: RunScope,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<AutoLinkReport, AutoLinkError> {
        let result = match InFlightGuard::acquire(&self.in_flight) {
            Some(_guard) => self.run_phases(&scope, progress, cancel).await,
            None => Err(AutoLinkError::AlreadyRunning),
        };

        if let Err(error) = &result {
            error!("Auto-link failed. category: {}, error: {}", error.category(), error);
            self.notifier.error(&error.user_message());
        }

        result
    }

    async fn run_phases(
        &self,
        scope: &RunScope,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<AutoLinkReport, AutoLinkError> {
        progress.report(AutoLinkPhase::Validate.start(), "Validating prerequisites");
        let Prerequisites {
            store,
            catalog,
            linker,
        } = self.validate().await?;
        progress.report(AutoLinkPhase::Validate.end(), "Prerequisites validated");

        if pause(self.config.phase_delay, cancel).await.is_err() {
            return Ok(self.cancelled(AutoLinkReport::new(Terminal::Cancelled, 0, 0)));
        }

        progress.report(AutoLinkPhase::Analyze.start(), "Analyzing shipments");
        let shipments = store.list();
        if let RunScope::Shipments(ids) = scope {
            if let Some(missing) = ids
                .iter()
                .find(|id| !shipments.iter().any(|shipment| shipment.id.eq(*id)))
            {
                return Err(AutoLinkError::ShipmentNotFound(missing.clone()));
            }
        }
        let unlinked = shipments
            .into_iter()
            .filter(|shipment| shipment.is_unlinked() && scope.includes(&shipment.id))
            .collect::<Vec<_>>();
        let eligible = catalog
            .products()
            .filter(|product| product.valid_specifications().is_some())
            .cloned()
            .collect::<Vec<_>>();
        info!(
            "Analyzed shipments. unlinked: {}, eligible_products: {}, catalog: {}",
            unlinked.len(),
            eligible.len(),
            catalog.len()
        );

        if unlinked.is_empty() {
            progress.report(100, "All shipments already have linked products");
            self.notifier
                .success("All shipments already have linked products, nothing to do.");
            return Ok(AutoLinkReport::new(Terminal::NothingToDo, 0, 0));
        }
        progress.report(
            AutoLinkPhase::Analyze.end(),
            &format!("{} unlinked shipments, {} eligible products", unlinked.len(), eligible.len()),
        );

        if pause(self.config.phase_delay, cancel).await.is_err() {
            return Ok(self.cancelled(AutoLinkReport::new(Terminal::Cancelled, unlinked.len(), 0)));
        }

        progress.report(AutoLinkPhase::Plan.start(), "Planning links");
        let plan = {
            let mut rng = self.rng.lock();
            SelectionPlanner::new(&mut *rng, self.config.max_products_per_shipment).plan(&unlinked, &eligible)
        };
        if plan.is_empty() {
            warn!("No plan items produced. unlinked: {}, eligible_products: {}", unlinked.len(), eligible.len());
        }
        progress.report(
            AutoLinkPhase::Plan.end(),
            &format!("Planned {} of {} shipments", plan.len(), unlinked.len()),
        );

        let mut report = AutoLinkReport::new(Terminal::Success, unlinked.len(), plan.len());

        if pause(self.config.phase_delay, cancel).await.is_err() {
            report.terminal = Terminal::Cancelled;
            return Ok(self.cancelled(report));
        }

        progress.report(AutoLinkPhase::Execute.start(), "Linking products");
        let engine = ExecutionEngine::new(store.as_ref(), &catalog, linker.as_ref(), &self.config);
        report.execution = engine
            .execute(&plan, progress, cancel)
            .await;
        if report.execution.cancelled {
            report.terminal = Terminal::Cancelled;
        }

        // whatever was applied is persisted, even when cancelled
        progress.report(AutoLinkPhase::Persist.start(), "Saving shipments");
        if let Err(error) = store.persist().await {
            warn!("Persisting shipments failed. error: {}", error);
            let message = format!("Products were linked but could not be saved. cause: {}", error);
            self.notifier.warning(&message);
            report.warnings.push(message);
        }
        progress.report(AutoLinkPhase::Persist.end(), "Shipments saved");

        let index = LinkIndex::build(&store.list(), &catalog);
        if report.terminal == Terminal::Cancelled {
            self.refresh_view(&index);
            return Ok(self.cancelled(report));
        }

        if pause(self.config.phase_delay, cancel).await.is_err() {
            info!("Cancellation requested after persisting, finishing the run.");
        }

        progress.report(AutoLinkPhase::Finalize.start(), "Refreshing views");
        self.refresh_view(&index);
        self.notifier
            .success(&Self::summary(&report.execution));
        progress.report(AutoLinkPhase::Finalize.end(), "Auto-link completed");

        info!(
            "Auto-link completed. successes: {}, failures: {}, products: {}, unlinked_remaining: {}",
            report.execution.success_count,
            report.execution.failure_count,
            report.execution.total_products,
            index.unlinked_shipments.len()
        );

        Ok(report)
    }

    async fn validate(&self) -> Result<Prerequisites, PrerequisiteError> {
        let store = self
            .store
            .clone()
            .ok_or(PrerequisiteError::MissingStore)?;
        let catalog_source = self
            .catalog
            .clone()
            .ok_or(PrerequisiteError::MissingCatalog)?;
        let linker = self
            .linker
            .clone()
            .ok_or(PrerequisiteError::MissingLinker)?;

        let readiness = async {
            store.wait_ready().await?;
            catalog_source.wait_ready().await
        };
        match tokio::time::timeout(self.config.readiness_timeout, readiness).await {
            Err(_elapsed) => return Err(PrerequisiteError::NotReady(self.config.readiness_timeout)),
            Ok(Err(cause)) => return Err(PrerequisiteError::Unavailable(cause)),
            Ok(Ok(())) => {}
        }

        if store.count() == 0 {
            return Err(PrerequisiteError::EmptyStore);
        }

        let catalog = Catalog::new(catalog_source.list());
        if catalog.is_empty() {
            return Err(PrerequisiteError::EmptyCatalog);
        }

        Ok(Prerequisites {
            store,
            catalog,
            linker,
        })
    }

    fn cancelled(&self, report: AutoLinkReport) -> AutoLinkReport {
        info!("Auto-link cancelled. processed: {}", report.execution.processed());
        self.notifier.warning(&format!(
            "Auto-link cancelled after {} of {} shipments.",
            report.execution.processed(),
            report.planned_shipments
        ));
        report
    }

    fn refresh_view(&self, index: &LinkIndex) {
        let Some(view_refresh) = &self.view_refresh else {
            return;
        };
        if let Err(error) = view_refresh.refresh(index) {
            warn!("View refresh failed. error: {:?}", error);
        }
    }

    fn summary(execution: &ExecutionResult) -> String {
        let mut summary = format!(
            "Linked {} products to {} shipments.",
            execution.total_products, execution.success_count
        );
        if execution.failure_count > 0 {
            summary.push_str(&format!(
                " {} failed: {}",
                execution.failure_count,
                execution
                    .errors
                    .iter()
                    .map(|failure| format!("{} ({})", failure.shipment_id, failure.message))
                    .join(", ")
            ));
        }
        summary
    }

    /// Entry point for a bound "manage" control.
    pub fn manage_products(&self, shipment_id: &ShipmentId) -> Result<(), AutoLinkError> {
        self.open_editor(shipment_id, EditorMode::Manage)
    }

    /// Entry point for a bound "add" control.
    pub fn add_products(&self, shipment_id: &ShipmentId) -> Result<(), AutoLinkError> {
        self.open_editor(shipment_id, EditorMode::Add)
    }

    fn open_editor(&self, shipment_id: &ShipmentId, mode: EditorMode) -> Result<(), AutoLinkError> {
        let result = self
            .find_shipment(shipment_id)
            .and_then(|(shipment, editor)| {
                info!("Opening product editor. shipment: {}, mode: {}", shipment.id, mode);
                editor
                    .open(&shipment, mode)
                    .map_err(AutoLinkError::Editor)
            });

        if let Err(error) = &result {
            error!("Opening product editor failed. category: {}, error: {}", error.category(), error);
            self.notifier.error(&error.user_message());
        }

        result
    }

    fn find_shipment(&self, shipment_id: &ShipmentId) -> Result<(Shipment, &dyn ProductEditor), AutoLinkError> {
        let store = self
            .store
            .as_ref()
            .ok_or(PrerequisiteError::MissingStore)?;
        let editor = self
            .product_editor
            .as_deref()
            .ok_or(PrerequisiteError::MissingEditor)?;
        let shipment = store
            .get(shipment_id)
            .ok_or_else(|| AutoLinkError::ShipmentNotFound(shipment_id.clone()))?;

        Ok((shipment, editor))
    }
}

#[cfg(test)]
mod auto_linker_tests {
    use std::future::pending;

    use async_trait::async_trait;
    use rstest::rstest;
    use shipping::{Product, ProductId, Route, ShipmentType, Specifications};
    use stores::kv::{KeyValueStore, MemoryKeyValueStore};
    use stores::shipments::{InMemoryShipmentStore, ShipmentUpdate, SHIPMENTS_KEY};

    use super::*;
    use crate::execution::MergeLinker;
    use crate::progress::NoProgress;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingNotifier {
        fn messages(&self, kind: &str) -> Vec<String> {
            self.messages
                .lock()
                .iter()
                .filter(|(it, _)| (*it).eq(kind))
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.messages
                .lock()
                .push(("success", message.to_string()));
        }

        fn error(&self, message: &str) {
            self.messages
                .lock()
                .push(("error", message.to_string()));
        }

        fn warning(&self, message: &str) {
            self.messages
                .lock()
                .push(("warning", message.to_string()));
        }
    }

    #[derive(Default)]
    struct RecordingViewRefresh {
        indexes: Mutex<Vec<LinkIndex>>,
    }

    impl ViewRefresh for RecordingViewRefresh {
        fn refresh(&self, index: &LinkIndex) -> anyhow::Result<()> {
            self.indexes.lock().push(index.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEditor {
        opened: Mutex<Vec<(ShipmentId, EditorMode)>>,
    }

    impl ProductEditor for RecordingEditor {
        fn open(&self, shipment: &Shipment, mode: EditorMode) -> anyhow::Result<()> {
            self.opened
                .lock()
                .push((shipment.id.clone(), mode));
            Ok(())
        }
    }

    /// Never becomes ready.
    struct StalledStore;

    #[async_trait]
    impl ShipmentStore for StalledStore {
        fn list(&self) -> Vec<Shipment> {
            vec![]
        }

        fn get(&self, _id: &ShipmentId) -> Option<Shipment> {
            None
        }

        fn update(&self, id: &ShipmentId, _update: ShipmentUpdate) -> Result<Shipment, StoreError> {
            Err(StoreError::ShipmentNotFound(id.clone()))
        }

        async fn persist(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn wait_ready(&self) -> Result<(), StoreError> {
            pending().await
        }
    }

    fn product(id: &str, value: f64) -> Product {
        Product::new(ProductId::from(id), format!("Product {}", id), format!("SKU-{}", id), Specifications {
            weight: 3.0,
            volume: 0.4,
            value,
        })
    }

    fn shipment(id: &str, kind: ShipmentType) -> Shipment {
        Shipment::new(ShipmentId::from(id), format!("NUM-{}", id), kind, Route::default())
    }

    fn shipments() -> Vec<Shipment> {
        vec![
            shipment("S-1", ShipmentType::Container),
            shipment("S-2", ShipmentType::Awb),
            shipment("S-3", ShipmentType::Lcl),
            shipment("S-4", ShipmentType::Parcel),
        ]
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![
            product("P-1", 1500.0),
            product("P-2", 700.0),
            product("P-3", 250.0),
            product("P-4", 40.0),
        ]))
    }

    struct Fixture {
        store: Arc<InMemoryShipmentStore>,
        notifier: Arc<RecordingNotifier>,
        view_refresh: Arc<RecordingViewRefresh>,
        auto_linker: AutoLinker,
    }

    fn fixture(store: InMemoryShipmentStore) -> Fixture {
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let view_refresh = Arc::new(RecordingViewRefresh::default());

        let auto_linker = AutoLinker::new(AutoLinkConfig::default())
            .with_store(store.clone())
            .with_catalog(catalog())
            .with_linker(Arc::new(MergeLinker))
            .with_notifier(notifier.clone())
            .with_view_refresh(view_refresh.clone())
            .with_rng(SmallRng::seed_from_u64(42));

        Fixture {
            store,
            notifier,
            view_refresh,
            auto_linker,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_links_every_unlinked_shipment() {
        // given
        let Fixture {
            store,
            notifier,
            view_refresh,
            auto_linker,
        } = fixture(InMemoryShipmentStore::new(shipments()));
        let reported = Mutex::new(vec![]);
        let sink = |percent: u8, _message: &str| reported.lock().push(percent);

        // when
        let report = auto_linker
            .run(RunScope::All, &sink, &CancelToken::new())
            .await
            .unwrap();

        // then
        assert_eq!(report.terminal, Terminal::Success);
        assert_eq!(report.unlinked_shipments, 4);
        assert_eq!(report.planned_shipments, 4);
        assert_eq!(report.execution.success_count, 4);
        assert_eq!(report.execution.failure_count, 0);
        assert!(report.warnings.is_empty());
        assert!(store
            .list()
            .iter()
            .all(|shipment| !shipment.is_unlinked()));

        let reported = reported.into_inner();
        assert!(reported
            .windows(2)
            .all(|pair| pair[0] <= pair[1]), "{:?}", reported);
        assert_eq!(reported.last(), Some(&100));

        let indexes = view_refresh.indexes.lock();
        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].unlinked_shipments.is_empty());
        assert_eq!(notifier.messages("success").len(), 1);
        assert!(!auto_linker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn already_linked_shipments_are_nothing_to_do() {
        // given
        let mut linked = shipment("S-1", ShipmentType::Container);
        linked
            .link_product(&product("P-1", 1500.0), 1)
            .unwrap();
        let Fixture {
            store,
            view_refresh,
            auto_linker,
            ..
        } = fixture(InMemoryShipmentStore::new(vec![linked.clone()]));
        let reported = Mutex::new(vec![]);
        let sink = |percent: u8, message: &str| {
            reported
                .lock()
                .push((percent, message.to_string()))
        };

        // when
        let report = auto_linker
            .run(RunScope::All, &sink, &CancelToken::new())
            .await
            .unwrap();

        // then
        assert_eq!(report.terminal, Terminal::NothingToDo);
        assert_eq!(report.execution, ExecutionResult::default());
        assert_eq!(
            reported
                .into_inner()
                .last()
                .map(|(percent, _)| *percent),
            Some(100)
        );
        assert_eq!(store.list(), vec![linked]);
        assert!(view_refresh.indexes.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_catalog_is_a_prerequisite_failure() {
        // given
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(InMemoryShipmentStore::new(shipments()));
        let auto_linker = AutoLinker::new(AutoLinkConfig::default())
            .with_store(store.clone())
            .with_catalog(Arc::new(Catalog::default()))
            .with_linker(Arc::new(MergeLinker))
            .with_notifier(notifier.clone());

        // when
        let result = auto_linker
            .run(RunScope::All, &NoProgress, &CancelToken::new())
            .await;

        // then
        let error = result.unwrap_err();
        assert!(matches!(error, AutoLinkError::Prerequisite(PrerequisiteError::EmptyCatalog)));
        assert_eq!(error.category(), ErrorCategory::Prerequisites);
        assert_eq!(notifier.messages("error"), vec![error.user_message()]);
        assert!(store
            .list()
            .iter()
            .all(Shipment::is_unlinked));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_linker_is_a_prerequisite_failure() {
        // given
        let auto_linker = AutoLinker::new(AutoLinkConfig::default())
            .with_store(Arc::new(InMemoryShipmentStore::new(shipments())))
            .with_catalog(catalog())
            .with_notifier(Arc::new(RecordingNotifier::default()));

        // when
        let result = auto_linker
            .run(RunScope::All, &NoProgress, &CancelToken::new())
            .await;

        // then
        assert!(matches!(
            result,
            Err(AutoLinkError::Prerequisite(PrerequisiteError::MissingLinker))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_times_out() {
        // given
        let auto_linker = AutoLinker::new(AutoLinkConfig::default())
            .with_store(Arc::new(StalledStore))
            .with_catalog(catalog())
            .with_linker(Arc::new(MergeLinker))
            .with_notifier(Arc::new(RecordingNotifier::default()));

        // when
        let error = auto_linker
            .run(RunScope::All, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        // then
        assert!(matches!(
            error,
            AutoLinkError::Prerequisite(PrerequisiteError::NotReady(timeout)) if timeout == Duration::from_secs(5)
        ));
        assert_eq!(error.category(), ErrorCategory::StoreUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_run_is_rejected() {
        // given
        let Fixture {
            auto_linker,
            notifier,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()));
        let cancel = CancelToken::new();

        // when
        let (first, second) = tokio::join!(
            auto_linker.run(RunScope::All, &NoProgress, &cancel),
            auto_linker.run(RunScope::All, &NoProgress, &cancel),
        );

        // then
        assert_eq!(first.unwrap().terminal, Terminal::Success);
        assert!(matches!(second, Err(AutoLinkError::AlreadyRunning)));
        assert_eq!(notifier.messages("error").len(), 1);
        assert!(!auto_linker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_persist_is_a_warning() {
        // given
        let mirror = Arc::new(MemoryKeyValueStore::new());
        mirror.set_reject_writes(true);
        let Fixture {
            auto_linker,
            notifier,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()).with_mirror(mirror.clone()));

        // when
        let report = auto_linker
            .run(RunScope::All, &NoProgress, &CancelToken::new())
            .await
            .unwrap();

        // then
        assert_eq!(report.terminal, Terminal::Success);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(notifier.messages("warning"), report.warnings);
        assert_eq!(notifier.messages("success").len(), 1);
        assert_eq!(mirror.get(SHIPMENTS_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_execution_mutates_nothing() {
        // given
        let Fixture {
            store,
            auto_linker,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()));
        let cancel = CancelToken::new();
        cancel.cancel();

        // when
        let report = auto_linker
            .run(RunScope::All, &NoProgress, &cancel)
            .await
            .unwrap();

        // then
        assert_eq!(report.terminal, Terminal::Cancelled);
        assert!(store
            .list()
            .iter()
            .all(Shipment::is_unlinked));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_execution_persists_applied_items() {
        // given
        let mirror = Arc::new(MemoryKeyValueStore::new());
        let Fixture {
            store,
            view_refresh,
            auto_linker,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()).with_mirror(mirror.clone()));
        let cancel = CancelToken::new();
        let sink = |percent: u8, _message: &str| {
            if percent > AutoLinkPhase::Execute.start() {
                cancel.cancel();
            }
        };

        // when
        let report = auto_linker
            .run(RunScope::All, &sink, &cancel)
            .await
            .unwrap();

        // then
        assert_eq!(report.terminal, Terminal::Cancelled);
        assert_eq!(report.execution.processed(), 1);
        assert_eq!(
            store
                .list()
                .iter()
                .filter(|shipment| !shipment.is_unlinked())
                .count(),
            1
        );
        let persisted: Vec<Shipment> = serde_json::from_slice(&mirror.get(SHIPMENTS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, store.list());
        assert_eq!(view_refresh.indexes.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scoped_run_only_links_the_given_shipments() {
        // given
        let Fixture {
            store,
            auto_linker,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()));

        // when
        let report = auto_linker
            .run(
                RunScope::Shipments(vec![ShipmentId::from("S-2")]),
                &NoProgress,
                &CancelToken::new(),
            )
            .await
            .unwrap();

        // then
        assert_eq!(report.execution.success_count, 1);
        let linked = store
            .list()
            .into_iter()
            .filter(|shipment| !shipment.is_unlinked())
            .map(|shipment| shipment.id)
            .collect::<Vec<_>>();
        assert_eq!(linked, vec![ShipmentId::from("S-2")]);
    }

    #[tokio::test(start_paused = true)]
    async fn scoped_run_with_unknown_shipment_is_not_found() {
        // given
        let Fixture {
            auto_linker, ..
        } = fixture(InMemoryShipmentStore::new(shipments()));

        // when
        let error = auto_linker
            .run(
                RunScope::Shipments(vec![ShipmentId::from("S-404")]),
                &NoProgress,
                &CancelToken::new(),
            )
            .await
            .unwrap_err();

        // then
        assert_eq!(error.category(), ErrorCategory::NotFound);
        assert_eq!(error.user_message(), "Shipment S-404 no longer exists.");
    }

    #[test]
    fn editor_entry_points_open_the_shipment() {
        // given
        let editor = Arc::new(RecordingEditor::default());
        let Fixture {
            auto_linker,
            notifier,
            ..
        } = fixture(InMemoryShipmentStore::new(shipments()));
        let auto_linker = auto_linker.with_product_editor(editor.clone());

        // when
        auto_linker
            .manage_products(&ShipmentId::from("S-1"))
            .unwrap();
        auto_linker
            .add_products(&ShipmentId::from("S-3"))
            .unwrap();
        let missing = auto_linker.add_products(&ShipmentId::from("S-404"));

        // then
        assert_eq!(editor.opened.lock().clone(), vec![
            (ShipmentId::from("S-1"), EditorMode::Manage),
            (ShipmentId::from("S-3"), EditorMode::Add),
        ]);
        assert!(matches!(missing, Err(AutoLinkError::ShipmentNotFound(_))));
        assert_eq!(notifier.messages("error").len(), 1);
    }

    #[rstest]
    #[case(AutoLinkError::Prerequisite(PrerequisiteError::EmptyStore), "prerequisites")]
    #[case(AutoLinkError::Prerequisite(PrerequisiteError::NotReady(Duration::from_secs(1))), "store-unavailable")]
    #[case(AutoLinkError::Prerequisite(PrerequisiteError::Unavailable(StoreError::Unavailable("offline".to_string()))), "store-unavailable")]
    #[case(AutoLinkError::ShipmentNotFound(ShipmentId::from("S-1")), "not-found")]
    #[case(AutoLinkError::AlreadyRunning, "generic")]
    #[case(AutoLinkError::Editor(anyhow::anyhow!("boom")), "generic")]
    fn error_categories(#[case] error: AutoLinkError, #[case] expected: &str) {
        assert_eq!(error.category().to_string(), expected);
    }
}
