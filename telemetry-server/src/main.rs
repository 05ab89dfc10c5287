// Telemetry server: dual-stack UDP listener, one task per datagram, shared client table.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use telemetry_core::ClientTable;
use telemetry_server::{Config, Dispatcher};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let config = Config::default();
    let table = Arc::new(ClientTable::new());

    let rt = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    rt.block_on(async {
        let dispatcher = Dispatcher::bind(&config, table)?;
        let addr = dispatcher.local_addr()?;
        log::info!(
            "Listening for UDP requests (IPv6/IPv4) on {}. Use CTRL+C to terminate the server",
            addr
        );
        dispatcher.run().await;
        Ok::<(), anyhow::Error>(())
    })
}
