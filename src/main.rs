use bag_etl::domain::ports::ProjectSettings;
use bag_etl::utils::{file, logger, validation::Validate};
use bag_etl::{BagPipeline, CliConfig, EtlEngine, LocalStorage, TomlConfig};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting bag-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let project_dir = file::project_dir(Path::new(&args.base_dir), config.project_name());
    let rosbag_dir = file::rosbag_dir(Path::new(&args.base_dir), config.project_name());
    file::create_if_not_exist(&rosbag_dir)?;
    tracing::info!("📂 Project directory: {}", project_dir.display());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        let bags = file::list_bag_files(&rosbag_dir)?;
        println!("Project '{}' ({} Hz sampling)", config.project_name(), config.sampling_hz());
        println!("Topics: {}", config.topic_list().join(", "));
        println!("{} bag file(s) would be processed:", bags.len());
        for bag in bags {
            println!("  {}", bag.display());
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(project_dir.display().to_string());
    let pipeline = BagPipeline::new(storage, config);

    // 創建ETL引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Bundle conversion completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Bundle conversion completed successfully!");
            println!("📁 Output saved to: {}/{}", project_dir.display(), output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Bundle conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                bag_etl::utils::error::ErrorSeverity::Low => 0,
                bag_etl::utils::error::ErrorSeverity::Medium => 2,
                bag_etl::utils::error::ErrorSeverity::High => 1,
                bag_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
