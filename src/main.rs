use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use bnb_invoice_batch::browser::{connect_to_browser, launch_headless_browser};
use bnb_invoice_batch::infrastructure::ChromiumRenderer;
use bnb_invoice_batch::models::MAX_BATCH_SIZE;
use bnb_invoice_batch::orchestrator::{
    BatchEvent, BatchProcessor, Controller, EventSink, ProgressStatus,
};
use bnb_invoice_batch::services::{
    normalize_license_key, CreditClient, DocumentWriter, FileKeyStore, HttpLedger, InvoiceDiscovery,
    Preflight,
};
use bnb_invoice_batch::utils::logging;
use bnb_invoice_batch::workflow::ReservationFlow;
use bnb_invoice_batch::{Config, ReservationCode};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

type LiveController = Controller<ChromiumRenderer, HttpLedger, FileKeyStore>;

#[derive(Debug, Parser)]
#[command(name = "bnb-invoice", about = "批量下载预订收据和增值税发票")]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 批量下载（最多 25 个，超出部分忽略）
    Batch {
        codes: Vec<String>,
        #[arg(long)]
        domain: Option<String>,
        /// 跳过开始前的额度检查
        #[arg(long)]
        skip_credit_check: bool,
    },
    /// 下载单个预订
    Single {
        code: String,
        #[arg(long)]
        domain: Option<String>,
    },
    /// 查询剩余额度
    Credits,
    /// 激活许可证密钥
    Activate { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging || cli.verbose);

    let credits = CreditClient::new(
        HttpLedger::from_config(&config)?,
        FileKeyStore::new(&config.license_file),
    );

    match cli.command {
        Command::Credits => {
            let balance = credits.balance().await?;
            info!("💳 剩余额度: {}/{}", balance.remaining, balance.total);
        }
        Command::Activate { key } => {
            let key = normalize_license_key(&key)?;
            credits.activate(&key).await?;
        }
        Command::Single { code, domain } => {
            let code = ReservationCode::parse(&code)?;
            let domain = domain.unwrap_or_else(|| config.domain.clone());
            let controller = build_controller(&config, credits).await?;

            let result = controller.start_single(code, &domain).await;
            if result.success {
                info!("✅ 已下载: {}", result.files.join(", "));
            } else if let Some(line) = result.error_line() {
                error!("❌ {}", line);
            }
        }
        Command::Batch {
            codes,
            domain,
            skip_credit_check,
        } => {
            let codes = codes
                .iter()
                .map(|c| ReservationCode::parse(c))
                .collect::<Result<Vec<_>, _>>()?;
            let domain = domain.unwrap_or_else(|| config.domain.clone());
            run_batch(&config, credits, codes, &domain, skip_credit_check).await?;
        }
    }

    Ok(())
}

async fn build_controller(
    config: &Config,
    credits: CreditClient<HttpLedger, FileKeyStore>,
) -> Result<LiveController> {
    logging::log_startup(&config.output_dir);

    let browser = if config.headless {
        launch_headless_browser(config.chrome_executable.as_deref().map(Path::new)).await?
    } else {
        connect_to_browser(config.browser_debug_port).await?
    };

    let flow = ReservationFlow::new(
        Arc::new(ChromiumRenderer::new(browser)),
        InvoiceDiscovery::new(),
        DocumentWriter::new(&config.output_dir),
    );
    Ok(Controller::new(BatchProcessor::new(flow, credits)))
}

async fn run_batch(
    config: &Config,
    credits: CreditClient<HttpLedger, FileKeyStore>,
    codes: Vec<ReservationCode>,
    domain: &str,
    skip_credit_check: bool,
) -> Result<()> {
    if codes.is_empty() {
        warn!("⚠️ 没有需要处理的预订，程序结束");
        return Ok(());
    }
    if codes.len() > MAX_BATCH_SIZE {
        warn!("共 {} 个预订，只处理前 {} 个", codes.len(), MAX_BATCH_SIZE);
    }

    if !skip_credit_check {
        match credits.preflight(codes.len().min(MAX_BATCH_SIZE)).await {
            Preflight::Insufficient { remaining: 0, .. } => {
                warn!("⚠️ 额度已用完，请购买更多额度后再试");
                return Ok(());
            }
            Preflight::Insufficient {
                remaining,
                requested,
            } => {
                warn!(
                    "⚠️ 剩余 {} 个额度，但选择了 {} 个预订，请减少 {} 个后再试",
                    remaining,
                    requested,
                    requested - remaining as usize
                );
                return Ok(());
            }
            Preflight::Ready { remaining } => info!("💳 剩余额度: {}", remaining),
            Preflight::Unchecked => {}
        }
    }

    logging::init_log_file(&config.output_log_file)?;
    let controller = Arc::new(build_controller(config, credits).await?);

    let (events, mut rx) = EventSink::channel(config.event_channel_capacity);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    // Ctrl-C 只请求取消，当前预订会跑完
    let abort_handle = Arc::clone(&controller);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到 Ctrl-C，当前预订完成后停止");
            abort_handle.abort();
        }
    });

    let summary = controller.start_batch(codes, domain, &events).await;

    drop(events);
    ctrl_c.abort();
    printer.await?;

    logging::print_final_stats(&summary, &config.output_log_file)?;
    Ok(())
}

fn print_event(event: &BatchEvent) {
    match event {
        BatchEvent::Progress {
            current,
            total,
            code,
            status: ProgressStatus::Downloading,
        } => info!("⏳ 正在处理 {} ({}/{})", code, current, total),
        BatchEvent::Progress {
            current,
            total,
            status: ProgressStatus::Cancelled,
            ..
        } => info!("⏹ 已取消，完成 {}/{}", current, total),
        BatchEvent::CreditUpdate { remaining } => info!("💳 剩余额度: {}", remaining),
        BatchEvent::BatchComplete {
            total,
            succeeded,
            error: Some(reason),
            ..
        } => warn!("⚠️ 已停止: {} ({}/{} 完成)", reason, succeeded, total),
        BatchEvent::BatchComplete {
            succeeded,
            failed,
            errors,
            ..
        } => {
            info!("🎉 完成: 成功 {}，失败 {}", succeeded, failed);
            for line in errors {
                warn!("   {}", line);
            }
        }
    }
}
