// ==========================================
// 多级 BOM 展开引擎 - 命令行入口
// ==========================================
// 用法:
//   bom-explosion [--source PATH] [--output PATH] [--key-date YYYY-MM-DD]
//                 [--include-deleted] [--config FILE]
//                 [--child-alternatives inherit|preferred]
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use bom_explosion::importer::parse_date;
use bom_explosion::{logging, run_pipeline, ChildAlternativePolicy, ConfigOverrides, ExplosionConfig};
use std::path::PathBuf;

const USAGE: &str = "用法: bom-explosion [--source PATH] [--output PATH] [--key-date YYYY-MM-DD] \
[--include-deleted] [--config FILE] [--child-alternatives inherit|preferred]";

struct CliArgs {
    config_file: Option<PathBuf>,
    overrides: ConfigOverrides,
}

fn parse_args() -> Result<Option<CliArgs>> {
    let mut args = std::env::args().skip(1);
    let mut config_file = None;
    let mut overrides = ConfigOverrides::default();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| anyhow!("{} 需要参数值", flag));
        match arg.as_str() {
            "--source" => overrides.source_path = Some(PathBuf::from(value("--source")?)),
            "--output" => overrides.output_path = Some(PathBuf::from(value("--output")?)),
            "--config" => config_file = Some(PathBuf::from(value("--config")?)),
            "--key-date" => {
                let raw = value("--key-date")?;
                let date = parse_date(&raw).ok_or_else(|| anyhow!("无法解析关键日期: {}", raw))?;
                overrides.key_date = Some(date);
            }
            "--include-deleted" => overrides.include_deleted = Some(true),
            "--child-alternatives" => {
                let raw = value("--child-alternatives")?;
                let policy = ChildAlternativePolicy::parse(&raw)
                    .ok_or_else(|| anyhow!("未知的子级替代策略: {}", raw))?;
                overrides.child_alternative_policy = Some(policy);
            }
            "-h" | "--help" => return Ok(None),
            other => bail!("未知参数: {}\n{}", other, USAGE),
        }
    }

    Ok(Some(CliArgs {
        config_file,
        overrides,
    }))
}

fn main() -> Result<()> {
    logging::init();

    let cli = match parse_args()? {
        Some(cli) => cli,
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    tracing::info!("{} v{}", bom_explosion::APP_NAME, bom_explosion::VERSION);

    let config = match &cli.config_file {
        Some(path) => ExplosionConfig::load_from_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
        None => ExplosionConfig::default(),
    };

    let report = run_pipeline(config, &cli.overrides)?;

    println!("run_id={}", report.run_id);
    println!("key_date={}", report.key_date);
    println!("roots={}", report.root_count);
    println!("records={}", report.leaves.len());
    println!("truncated_paths={}", report.truncated_paths.len());
    println!("unmatched_cost={}", report.unmatched_cost_count);
    println!("total_cost={:.2}", report.total_cost());
    Ok(())
}
