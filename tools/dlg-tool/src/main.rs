//! # dlg-tool
//!
//! 对话脚本工具 - 语法检查、JSON 导入导出、资源清单。
//!
//! ## 用法
//!
//! ```bash
//! # 检查脚本文件或目录（递归收集 .dlg）
//! cargo run -p dlg-tool -- check scripts/
//! cargo run -p dlg-tool -- check intro.dlg chapter2/
//!
//! # 文本 → JSON 交换格式
//! cargo run -p dlg-tool -- export intro.dlg -o intro.json
//!
//! # JSON → 规范化文本
//! cargo run -p dlg-tool -- import intro.json -o intro.dlg
//!
//! # 列出可解析的资源（JSON）
//! cargo run -p dlg-tool -- assets --root assets
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use walkdir::WalkDir;

use dialogue_assets::{AssetCategory, AssetResolver, FsSource};
use dialogue_runtime::{Parser, Script, render, validate_script};

#[derive(ClapParser)]
#[command(name = "dlg-tool")]
#[command(about = "对话脚本工具 - 语法检查、JSON 导入导出、资源清单")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查脚本文件（语法警告 + 图校验）
    Check {
        /// 脚本文件或目录
        paths: Vec<PathBuf>,
    },

    /// 文本脚本导出为 JSON 交换格式
    Export {
        /// 脚本文件路径
        script: PathBuf,

        /// 输出文件（缺省打印到标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// JSON 交换格式导入为规范化文本
    Import {
        /// JSON 文件路径
        json: PathBuf,

        /// 输出文件（缺省打印到标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 列出可解析的资源清单（JSON）
    Assets {
        /// 资源根目录
        #[arg(long, default_value = "assets")]
        root: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("dlg-tool error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { paths } => check(&paths),
        Commands::Export { script, output } => export(&script, output.as_deref()),
        Commands::Import { json, output } => import(&json, output.as_deref()),
        Commands::Assets { root } => assets(&root),
    }
}

//=============================================================================
// check 命令
//=============================================================================

fn check(paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = collect_script_files(paths)?;
    if files.is_empty() {
        eprintln!("未找到脚本文件（.dlg）");
        return Ok(());
    }

    let mut parser = Parser::new();
    let mut warning_count = 0usize;
    let mut error_count = 0usize;

    for file in &files {
        let text = std::fs::read_to_string(file)
            .map_err(|e| anyhow::anyhow!("无法读取 {}: {}", file.display(), e))?;
        let script = parser.parse(&text);

        for warning in parser.warnings() {
            println!("{}: [WARN] {}", file.display(), warning);
            warning_count += 1;
        }

        for diagnostic in validate_script(&script) {
            println!("{}: {}", file.display(), diagnostic);
            if diagnostic.is_error() {
                error_count += 1;
            } else {
                warning_count += 1;
            }
        }
    }

    println!(
        "已检查 {} 个脚本：{} 个错误，{} 个警告",
        files.len(),
        error_count,
        warning_count
    );

    if error_count > 0 {
        anyhow::bail!("脚本检查未通过");
    }
    Ok(())
}

/// 收集脚本文件：文件直接收入，目录递归收集 .dlg
fn collect_script_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
                let p = entry.path();
                if p.is_file() && p.extension().is_some_and(|ext| ext == "dlg") {
                    files.push(p.to_path_buf());
                }
            }
        } else {
            anyhow::bail!("路径不存在: {}", path.display());
        }
    }

    files.sort();
    Ok(files)
}

//=============================================================================
// export / import 命令
//=============================================================================

fn export(script_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script_path)
        .map_err(|e| anyhow::anyhow!("无法读取 {}: {}", script_path.display(), e))?;

    let mut parser = Parser::new();
    let script = parser.parse(&text);
    for warning in parser.warnings() {
        eprintln!("[WARN] {}", warning);
    }

    let json = script.to_json()?;
    write_output(output, &json)
}

fn import(json_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(json_path)
        .map_err(|e| anyhow::anyhow!("无法读取 {}: {}", json_path.display(), e))?;

    let script = Script::from_json(&json)?;
    let text = render(&script);
    write_output(output, &text)
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| anyhow::anyhow!("无法写入 {}: {}", path.display(), e))?;
            eprintln!("已写入 {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

//=============================================================================
// assets 命令
//=============================================================================

fn assets(root: &Path) -> anyhow::Result<()> {
    let resolver = AssetResolver::new(Box::new(FsSource::new(root)));

    let mut listing = serde_json::Map::new();
    for category in AssetCategory::ALL {
        listing.insert(
            category.base_dir().to_string(),
            serde_json::json!(resolver.list_assets(category)),
        );
    }
    listing.insert(
        "characters".to_string(),
        serde_json::json!(resolver.list_portraits()),
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(listing))?
    );
    Ok(())
}
