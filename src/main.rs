use clap::Parser;
use front_desk::app::commands::{execute, run_shell};
use front_desk::config::cli::Command;
use front_desk::utils::error::ErrorSeverity;
use front_desk::utils::{logger, validation::Validate};
use front_desk::{AppConfig, CliConfig, LocalStorage, Repository, ReservationService};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入設定檔，命令列參數優先
    let mut config = match AppConfig::from_file_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    if cli.json_logs {
        logger::init_json_logger(cli.verbose, &config.logging.level);
    } else {
        logger::init_cli_logger(cli.verbose, &config.logging.level);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    tracing::debug!("Effective config: {:?}", config);

    let storage = LocalStorage::new(config.storage.data_dir.clone());
    let repository = Repository::new(storage, &config);
    let service = ReservationService::new(repository, config.delete_policy());

    if let Command::Shell = cli.command {
        let stdin = std::io::stdin();
        run_shell(&service, stdin.lock(), std::io::stdout())?;
        return Ok(());
    }

    match execute(&service, &cli.command) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
