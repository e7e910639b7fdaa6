//! SQL connections used by the executor

use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::error::DeployError;

/// The operations the executor needs from a live connection
pub trait SqlConnection {
    /// Run one batch of SQL text
    fn execute(&mut self, sql: &str) -> Result<(), DeployError>;

    /// Commit work issued by [`SqlConnection::execute`]
    fn commit(&mut self) -> Result<(), DeployError> {
        Ok(())
    }

    /// Release the connection. Calling it twice is a no-op.
    fn close(&mut self) -> Result<(), DeployError> {
        Ok(())
    }
}

/// How to authenticate a TDS connection
#[derive(Clone, PartialEq, Eq)]
pub enum WarehouseAuth {
    /// Azure AD / Entra access token for `https://database.windows.net/`
    AccessToken(String),
    SqlServer { user: String, password: String },
    /// Whatever the connection string itself specifies
    ConnectionString,
}

impl std::fmt::Debug for WarehouseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseAuth::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            WarehouseAuth::SqlServer { user, .. } => f
                .debug_struct("SqlServer")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            WarehouseAuth::ConnectionString => f.write_str("ConnectionString"),
        }
    }
}

type TdsClient = Client<Compat<TcpStream>>;

/// TDS connection to a Fabric Warehouse SQL endpoint.
///
/// The client is async; a private current-thread runtime drives it so that
/// callers see a plain blocking connection.
pub struct TdsConnection {
    runtime: Runtime,
    client: Option<TdsClient>,
}

impl TdsConnection {
    pub fn connect(
        warehouse: &str,
        connection_string: &str,
        auth: &WarehouseAuth,
    ) -> Result<Self, DeployError> {
        let connection_error = |message: String| DeployError::Connection {
            warehouse: warehouse.to_string(),
            message,
        };

        let mut config =
            Config::from_ado_string(connection_string).map_err(|e| connection_error(e.to_string()))?;
        match auth {
            WarehouseAuth::AccessToken(token) => config.authentication(AuthMethod::aad_token(token)),
            WarehouseAuth::SqlServer { user, password } => {
                config.authentication(AuthMethod::sql_server(user, password))
            }
            WarehouseAuth::ConnectionString => {}
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        debug!(addr = %config.get_addr(), "opening TDS connection");
        let client = runtime
            .block_on(connect_client(config))
            .map_err(|e| connection_error(e.to_string()))?;
        info!(warehouse, "Connected to Fabric Warehouse");

        Ok(Self {
            runtime,
            client: Some(client),
        })
    }
}

async fn open_client(config: Config) -> tiberius::Result<TdsClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

async fn connect_client(config: Config) -> tiberius::Result<TdsClient> {
    match open_client(config.clone()).await {
        // Azure SQL gateways may redirect to another host
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "following TDS routing redirect");
            let mut config = config;
            config.host(&host);
            config.port(port);
            open_client(config).await
        }
        other => other,
    }
}

impl SqlConnection for TdsConnection {
    fn execute(&mut self, sql: &str) -> Result<(), DeployError> {
        let client = self.client.as_mut().ok_or(DeployError::NotConnected)?;
        self.runtime.block_on(async {
            let stream = client.simple_query(sql).await?;
            stream.into_results().await?;
            Ok::<_, tiberius::error::Error>(())
        })?;
        Ok(())
    }

    /// Batches run in autocommit mode, so there is nothing pending.
    fn commit(&mut self) -> Result<(), DeployError> {
        if self.client.is_none() {
            return Err(DeployError::NotConnected);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeployError> {
        if let Some(client) = self.client.take() {
            self.runtime.block_on(client.close())?;
        }
        Ok(())
    }
}
