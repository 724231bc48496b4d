use std::sync::Arc;

use crate::config::Config;
use spotprice_core::prices::{
    ProviderSourceClient, ReconciliationService, RecordStore, SourceClient, SourceId,
};
use spotprice_core::utils::{Clock, SystemClock};
use spotprice_market_data::{AwattarProvider, ProviderConfig, SmartEnergyProvider, SpotPriceProvider};
use spotprice_storage_sqlite::{db, SpotPriceRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub reconciliation_service: Arc<ReconciliationService>,
    pub store: Arc<dyn RecordStore>,
    pub clients: Vec<Arc<dyn SourceClient>>,
    pub clock: Arc<dyn Clock>,
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn build_provider(config: &Config, source: &SourceId) -> Arc<dyn SpotPriceProvider> {
    let timeout = config.reconciliation.fetch_timeout();
    if *source == SourceId::smartenergy() {
        let provider_config =
            ProviderConfig::new(config.smartenergy_base_url.as_str()).with_timeout(timeout);
        Arc::new(SmartEnergyProvider::new(provider_config))
    } else {
        let provider_config =
            ProviderConfig::new(config.awattar_base_url.as_str()).with_timeout(timeout);
        Arc::new(AwattarProvider::new(config.awattar_market, provider_config))
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(Arc::clone(&pool));

    let store: Arc<dyn RecordStore> = Arc::new(SpotPriceRepository::new(pool, writer));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut service = ReconciliationService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.reconciliation.clone(),
    );
    let mut clients: Vec<Arc<dyn SourceClient>> = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let client: Arc<dyn SourceClient> = Arc::new(ProviderSourceClient::new(
            source.clone(),
            build_provider(config, source),
        ));
        tracing::info!("Registered source {}", source);
        service.register(Arc::clone(&client));
        clients.push(client);
    }

    Ok(Arc::new(AppState {
        reconciliation_service: Arc::new(service),
        store,
        clients,
        clock,
    }))
}
