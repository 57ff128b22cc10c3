use std::path::PathBuf;

use clap::Parser;
use epubtc::batch::collect_inputs;
use epubtc::{BatchDriver, BatchSummary, ConvertConfig, FileStatus, Result, Transcoder};
use tracing_subscriber::EnvFilter;

/// 📚 epubtc - EPUB简繁转换工具
#[derive(Parser)]
#[command(name = "epubtc")]
#[command(about = "将EPUB文件中的简体中文转换为繁体中文")]
#[command(version)]
struct Args {
    /// 要转换的EPUB文件（可以是一个通配符模式，例如 "*.epub"）
    #[arg(help = "要转换的EPUB文件或通配符模式")]
    files: Vec<String>,

    /// 转换目录下的所有EPUB文件
    #[arg(short, long, help = "转换该目录下所有EPUB文件，输出到 tc 子目录")]
    directory: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long, help = "YAML配置文件路径")]
    config: Option<PathBuf>,

    /// 生成默认配置文件
    #[arg(long, value_name = "PATH", help = "在指定路径生成默认配置文件后退出")]
    init_config: Option<PathBuf>,

    /// 详细输出模式
    #[arg(short, long, help = "显示每个条目的处理信息")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(args) {
        eprintln!("❌ 错误: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.init_config {
        ConvertConfig::generate_default_config(path)?;
        println!("📝 已生成默认配置文件: {}", path.display());
        return Ok(());
    }

    if args.directory.is_none() && args.files.is_empty() {
        println!("未指定要转换的EPUB文件或目录。");
        return Ok(());
    }

    let config = ConvertConfig::load(args.config.as_deref())?;

    // 转换器只构建一次，供所有文件共享
    let converter = config.converter()?;
    let transcoder = Transcoder::with_patcher(&converter, config.metadata_patcher());
    let driver = BatchDriver::new(transcoder, &config);

    let summary = match &args.directory {
        Some(directory) => driver.convert_directory(directory)?,
        None => driver.convert_files(&collect_inputs(&args.files)?),
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    for outcome in &summary.outcomes {
        match &outcome.status {
            FileStatus::Converted { report, summary } => {
                let output = outcome
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!(
                    "✅ {} -> {} ({:.2}s)",
                    outcome.input.display(),
                    output,
                    outcome.elapsed.as_secs_f64()
                );
                if let Some(book) = summary {
                    if let Some(title) = &book.title {
                        println!("   📖 {} [{}]", title, book.language.as_deref().unwrap_or("?"));
                    }
                }
                if !report.is_complete() {
                    println!(
                        "   ⚠️  跳过了 {} 个条目（共 {} 个）",
                        report.failures.len(),
                        report.source_entries
                    );
                }
            }
            FileStatus::Skipped => {
                println!("⏭️  跳过 {}，它不是EPUB文档", outcome.input.display());
            }
            FileStatus::Failed(e) => {
                eprintln!("❌ {}: {}", outcome.input.display(), e);
            }
        }
    }

    println!(
        "🎉 完成: {} 个成功, {} 个失败, {} 个跳过",
        summary.converted(),
        summary.failed(),
        summary.skipped()
    );
}
