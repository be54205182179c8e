use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use parking_tracker::config::EnvironmentConfig;
use parking_tracker::database::DatabaseConnection;
use parking_tracker::repositories::{MemoryStore, ParkingStore, PostgresStore};
use parking_tracker::utils::SystemClock;
use parking_tracker::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,parking_tracker=debug")),
        )
        .init();

    info!("🅿️ Parking Tracker");
    info!("==================");

    let config = EnvironmentConfig::from_env().context("Invalid configuration")?;

    match config.database.clone() {
        Some(database) => {
            let connection = DatabaseConnection::connect(&database)
                .await
                .context("Error connecting to the database")?;
            serve(Arc::new(PostgresStore::new(connection.into_pool())), config).await
        }
        None => {
            warn!("⚠️ DATABASE_URL no definido, usando almacén en memoria (los datos no persisten)");
            serve(Arc::new(MemoryStore::new()), config).await
        }
    }
}

/// Prepara plazas y admin por defecto y arranca el servidor
async fn serve<S: ParkingStore>(store: Arc<S>, config: EnvironmentConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Invalid HOST/PORT: {}", config.server_url()))?;

    let state = AppState::new(store, config, Arc::new(SystemClock));

    let created = state
        .parking_service()
        .provision_spots(state.config.parking_spot_count)
        .await
        .context("Error provisioning parking spots")?;
    info!(
        "🅿️ {} plazas configuradas ({} nuevas)",
        state.config.parking_spot_count, created
    );

    if state
        .auth_service()
        .ensure_default_admin(&state.config.admin_username, &state.config.admin_password)
        .await
        .context("Error creating the default admin")?
    {
        info!("👤 Administrador por defecto '{}' creado", state.config.admin_username);
    }

    let app = create_app(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/auth/login | POST /api/auth/logout | GET /api/auth/me");
    info!("   POST /api/vehicles | POST /api/vehicles/exit");
    info!("   GET  /api/sessions/active | GET /api/sessions/search");
    info!("   GET  /api/spots | GET /api/dashboard");
    info!("   GET  /api/reports (admin) | POST /api/users (admin)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = wait_for_ctrl_c(signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

/// Sin handler de Ctrl+C no hay señal que esperar: nunca termina
async fn wait_for_ctrl_c<F>(ctrl_c: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = ctrl_c.await {
        error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_ctrl_c_handler_does_not_trigger_shutdown() {
        let failed = async { Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "no handler")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_ctrl_c(failed)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_received_ctrl_c_triggers_shutdown() {
        let received = async { Ok::<(), std::io::Error>(()) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_ctrl_c(received)).await;
        assert!(waited.is_ok());
    }
}
