use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::ConnectOptions;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

pub(super) fn build_tiberius_config(options: &ConnectOptions) -> tiberius::Result<Config> {
    let mut config = Config::from_ado_string(&options.to_connection_string())?;
    if options.trust_server_certificate {
        config.trust_cert();
    }
    Ok(config)
}

/// Open a client for `options`, resolving named instances through SQL Browser and
/// following a routing redirect once.
pub(super) async fn connect_client(options: &ConnectOptions) -> tiberius::Result<MssqlClient> {
    let config = build_tiberius_config(options)?;

    let tcp = if options.instance_name().is_some() {
        TcpStream::connect_named(&config).await?
    } else {
        TcpStream::connect(config.get_addr()).await?
    };
    tcp.set_nodelay(true)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure gateways hand the session to the node that owns the database
        Err(tiberius::error::Error::Routing { host, port }) => {
            tracing::debug!(host = %host, port, "following routing redirect");
            let mut routed = config;
            routed.host(&host);
            routed.port(port);
            let tcp = TcpStream::connect(routed.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Client::connect(routed, tcp.compat_write()).await
        }
        Err(err) => Err(err),
    }
}
