// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use catalink::config::settings::Settings;
use catalink::domain::models::link_status::BrokenLinkAspect;
use catalink::domain::services::link_probe_service::LinkProber;
use catalink::domain::services::quality_service::QualityAggregator;
use catalink::engines::router::SchemeRouter;
use catalink::infrastructure::metrics::init_metrics;
use catalink::infrastructure::registry::http_registry_client::HttpRegistryClient;
use catalink::queue::host_serializer::HostSerializer;
use catalink::utils::telemetry;
use catalink::workers::LinkCheckWorker;
use clap::{Parser, Subcommand};
use tracing::info;

/// 目录数据采集与链接健康检查
#[derive(Debug, Parser)]
#[command(name = "catalink", version, about)]
struct Cli {
    /// 输出JSON格式日志
    #[arg(long, global = true, env = "CATALINK_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 检查注册中心中所有数据集的分发链接
    CheckLinks,
    /// 检查单条记录
    CheckRecord {
        /// 记录ID
        id: String,
    },
}

/// 主函数
///
/// 初始化日志、配置和各组件后执行子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    telemetry::init_telemetry(cli.json_logs);
    info!("Starting catalink...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded, registry at {}", settings.registry.url);

    if settings.metrics.enabled {
        init_metrics(&settings.metrics.listen_addr);
    }

    // 3. Initialize components
    let router = SchemeRouter::with_default_engines(
        &settings.link_check.user_agent,
        settings.attempt_timeout(),
    )?;
    let prober = LinkProber::new(Arc::new(router), HostSerializer::new(), settings.probe_config());
    let registry = Arc::new(HttpRegistryClient::new(settings.registry_client_config())?);
    let aggregator = Arc::new(QualityAggregator::new(
        registry.clone(),
        prober,
        settings.link_check_config(),
    ));
    let worker = LinkCheckWorker::new(registry, aggregator);

    // 4. Run
    match cli.command {
        Command::CheckLinks => {
            let summary = worker.run_once().await?;
            print!("{}", summary.summarize());
        }
        Command::CheckRecord { id } => {
            let report = worker.check_record(&id).await?;
            for distribution in &report.distributions {
                let aspect = BrokenLinkAspect::from(&distribution.status);
                let mut line = format!("{}: {}", distribution.distribution_id, aspect.status.as_str());
                if let Some(code) = aspect.http_status_code {
                    line.push_str(&format!(" ({})", code));
                }
                if let Some(details) = aspect.error_details {
                    line.push_str(&format!(" - {}", details));
                }
                println!("{}", line);
            }
            match report.quality {
                Some(rating) => println!("Quality score: {:.2}", rating.score),
                None => println!("No distributions to rate"),
            }
            for failure in &report.write_failures {
                println!("Write failed for {}: {}", failure.object_id(), failure.cause());
            }
        }
    }

    Ok(())
}
