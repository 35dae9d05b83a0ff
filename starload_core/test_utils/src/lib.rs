use async_trait::async_trait;
use once_cell::sync::Lazy;
use shared_clients::{AsyncDatabaseAdapter, DatabaseAdapterError, SqlRow};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use uuid::Uuid;

/// Serialises tests that change the process working directory.
pub static TEST_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// The example project shipped in the workspace.
pub fn get_root_dir() -> PathBuf {
    let workspace_root = env::var("CARGO_WORKSPACE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .ancestors()
                .nth(2)
                .expect("crate should live under <workspace>/starload_core/<crate>")
                .to_path_buf()
        });
    workspace_root.join("example/warehouse-project")
}

/// Run `f` with the working directory set to `target`, restoring it after,
/// panics included.
pub fn with_chdir<F, T>(target: impl AsRef<Path>, f: F) -> std::io::Result<T>
where
    F: FnOnce() -> T,
{
    let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let original = env::current_dir()?;
    env::set_current_dir(target.as_ref())?;

    struct Reset(PathBuf);
    impl Drop for Reset {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.0);
        }
    }
    let _guard = Reset(original);

    Ok(f())
}

/// In-memory adapter that records every statement.
///
/// `execute` fails with a rejected-statement error when the SQL contains the
/// configured pattern; the failing statement is still recorded. `query`
/// answers with the rows of the first registered pattern found in the SQL,
/// or no rows.
#[derive(Default)]
pub struct RecordingAdapter {
    pub executed: Vec<String>,
    pub queried: Mutex<Vec<String>>,
    fail_on: Option<(String, String)>,
    responses: Vec<(String, Vec<SqlRow>)>,
}

impl RecordingAdapter {
    pub fn failing_on(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.fail_on = Some((pattern.into(), message.into()));
        self
    }

    pub fn respond_to(mut self, pattern: impl Into<String>, rows: Vec<SqlRow>) -> Self {
        self.responses.push((pattern.into(), rows));
        self
    }
}

#[async_trait]
impl AsyncDatabaseAdapter for RecordingAdapter {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        self.executed.push(sql.to_string());
        match &self.fail_on {
            Some((pattern, message)) if sql.contains(pattern.as_str()) => {
                Err(DatabaseAdapterError::rejected("XX000", message.clone()))
            }
            _ => Ok(()),
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DatabaseAdapterError> {
        self.queried
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sql.to_string());
        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn connection(&self) -> String {
        "recording".to_string()
    }
}

pub const PG_DB: &str = "postgres";
pub const PG_USER: &str = "postgres";
pub const PG_PASSWORD: &str = "postgres";
pub const LOCAL_HOST: &str = "127.0.0.1";

pub struct PgTestContainer {
    pub container: ContainerAsync<GenericImage>,
    pub port: u16,
    pub db_name: &'static str,
    pub user: &'static str,
    pub password: &'static str,
    pub host: &'static str,
}

pub async fn setup_postgres() -> Result<PgTestContainer, Box<dyn std::error::Error>> {
    let name = format!("starload-postgres-{}", Uuid::new_v4());
    let postgres = GenericImage::new("postgres", "16")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_container_name(&name)
        .with_env_var("POSTGRES_DB", PG_DB)
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASSWORD)
        .start()
        .await?;

    let port = postgres.get_host_port_ipv4(5432).await?;

    Ok(PgTestContainer {
        container: postgres,
        port,
        db_name: PG_DB,
        user: PG_USER,
        password: PG_PASSWORD,
        host: LOCAL_HOST,
    })
}
