//! KNX Link 网关服务。

use knx_link_bus::InMemoryBus;
use knx_link_config::AppConfig;
use knx_link_gateway::{Gateway, GatewayConfig};
use knx_link_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    info!(
        knx_mode = %config.knx.mode,
        knx_nat = config.knx.nat,
        knx_address = ?config.knx.address,
        knx_port = config.knx.port,
        discovery = config.knx.uses_discovery(),
        "knx client settings"
    );
    // 暂无 KNXnet/IP 传输实现，使用内存总线
    warn!("no KNXnet/IP transport available, serving the in-memory bus");
    let bus = Arc::new(InMemoryBus::new());

    let handle = Gateway::start(GatewayConfig::from(&config), bus).await?;
    info!(local_addr = %handle.local_addr(), "knx link ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    handle.shutdown().await;

    let snapshot = metrics().snapshot();
    info!(?snapshot, "final counters");
    Ok(())
}
