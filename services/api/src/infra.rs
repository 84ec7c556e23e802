use crewmatch::error::AppError;
use crewmatch::marketplace::{CompetencyCsvImporter, MarketplaceSeed, MemoryStores};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Builds the in-memory stores from an optional seed fixture and competency export.
pub(crate) fn load_stores(
    seed_path: Option<&Path>,
    competencies_csv: Option<&Path>,
) -> Result<MemoryStores, AppError> {
    let seed = match seed_path {
        Some(path) => {
            info!(path = %path.display(), "loading marketplace seed");
            MarketplaceSeed::from_path(path)?
        }
        None => MarketplaceSeed::default(),
    };
    let stores = seed.into_stores()?;

    if let Some(path) = competencies_csv {
        let grouped = CompetencyCsvImporter::from_path(path)?;
        CompetencyCsvImporter::apply(grouped, &stores.competencies);
    }

    Ok(stores)
}
