//! Conexión a PostgreSQL
//!
//! Este módulo abre el pool de conexiones y aplica las migraciones embebidas.

use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::repositories::StoreError;

/// Conexión a la base de datos ya migrada
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Abrir el pool y ejecutar las migraciones pendientes
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!("🔌 Conectando a {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;

        run_migrations(&pool).await?;
        info!("✅ Base de datos lista");

        Ok(Self { pool })
    }

    pub fn into_pool(self) -> PgPool {
        self.pool
    }
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Enmascarar las credenciales de la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.find('@') else {
        return url.to_string();
    };
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    if scheme_end + 3 > at_pos {
        return url.to_string();
    }

    format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
}
