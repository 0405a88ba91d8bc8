use clap::Parser;
use flight_lookup::utils::error::ErrorCategory;
use flight_lookup::utils::{logger, validation::Validate};
use flight_lookup::{app, AppConfig, CliArgs, ComparisonResponse, FlightError, FlightSearch, SearchContext, SearchParams};
use std::time::Duration;
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting flight-lookup CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = run(args).await {
        report(&e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(args: CliArgs) -> Result<(), FlightError> {
    args.validate()?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    // 離線模式不需要憑證
    if let Err(e) = config.validate_with(!config.is_offline()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    let params = args.to_query(&config.search).into_params()?;
    let search = app::build_search(&config)?;
    let username = args.username(&config);

    tracing::info!("🧩 providers: {}", search.provider_names().join(", "));

    match args.watch_interval() {
        Some(interval) => watch(&search, &config, username, params, interval).await,
        None => {
            let ctx = SearchContext::new(username).with_timeout(config.overall_timeout());
            let ctrl_c = cancel_on_ctrl_c(ctx.clone());
            let result = search.search(&ctx, params).await;
            ctrl_c.abort();

            let response = result?;
            print_response(&response)?;
            tracing::info!("✅ {} offers compared", response.comparison.len());
            Ok(())
        }
    }
}

/// 每隔 interval 重新查詢，直到 Ctrl-C
async fn watch(
    search: &FlightSearch,
    config: &AppConfig,
    username: String,
    params: SearchParams,
    interval: Duration,
) -> Result<(), FlightError> {
    let root = SearchContext::new(username);
    let ctrl_c = cancel_on_ctrl_c(root.clone());
    let mut ticker = tokio::time::interval(interval);

    tracing::info!("👀 watching every {:?}, Ctrl-C to stop", interval);

    loop {
        tokio::select! {
            _ = root.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // 每一輪有自己的截止時間，但共用 Ctrl-C 的取消訊號
        let ctx = root.clone().with_timeout(config.overall_timeout());

        match search.search(&ctx, params.clone()).await {
            Ok(response) => print_response(&response)?,
            Err(_) if root.is_cancelled() => break,
            Err(e) if e.category() == ErrorCategory::Input => {
                ctrl_c.abort();
                return Err(e);
            }
            Err(e) => report(&e),
        }
    }

    ctrl_c.abort();
    tracing::info!("🛑 watch stopped");
    Ok(())
}

fn cancel_on_ctrl_c(ctx: SearchContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 interrupted, cancelling in-flight requests");
            ctx.cancel();
        }
    })
}

fn print_response(response: &ComparisonResponse) -> Result<(), FlightError> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn report(e: &FlightError) {
    // 記錄詳細錯誤信息
    tracing::error!("❌ Lookup failed: {} (Category: {:?})", e, e.category());
    for failure in e.provider_failures() {
        tracing::error!("   ↳ {}: {}", failure.provider, failure.error);
    }

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}

fn exit_code(e: &FlightError) -> i32 {
    match e.category() {
        ErrorCategory::Input => 2,
        ErrorCategory::Upstream => 1,
        ErrorCategory::Configuration | ErrorCategory::System => 3,
    }
}
