use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use report_pdf::{
    AnalysisCategory, Error, FsAssetLoader, Notice, Progress, ReportConfig, ReportListener,
    ReportRequest, VisualNode, generate_with_assets, write_report,
};

#[derive(Parser)]
#[command(name = "report-pdf")]
#[command(version)]
#[command(about = "Compose a paginated PDF report from an analysis result", long_about = None)]
struct Cli {
    /// Analysis result (JSON)
    #[arg(value_name = "ANALYSIS")]
    analysis: Option<PathBuf>,

    /// Document title, also used for the file name
    #[arg(short, long)]
    title: String,

    /// Name printed on the cover
    #[arg(short, long)]
    author: Option<String>,

    /// numerology, astrology, tarot or general
    #[arg(short, long, default_value = "general")]
    category: AnalysisCategory,

    /// View snapshot (JSON) captured when the analysis has no sections
    #[arg(long, value_name = "TREE")]
    fallback: Option<PathBuf>,

    /// Layout configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Logo image for the page header, overrides the configured one
    #[arg(long, value_name = "PNG")]
    logo: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,
}

struct LogListener;

impl ReportListener for LogListener {
    fn progress(&mut self, progress: Progress) {
        log::info!("{:>3}% {}", progress.percent, progress.step);
    }

    fn notice(&mut self, notice: Notice) {
        match notice {
            Notice::Started => log::info!("Generating report"),
            Notice::Succeeded { filename } => log::info!("Report ready: {filename}"),
            Notice::Failed => log::error!("Report generation failed"),
        }
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn run(cli: Cli) -> Result<PathBuf, Error> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(logo) = cli.logo {
        config.logo_path = Some(logo);
    }

    let analysis = cli.analysis.as_deref().map(read_json).transpose()?;
    let fallback = match &cli.fallback {
        Some(path) => Some(serde_json::from_value::<VisualNode>(read_json(path)?)?),
        None => None,
    };
    let asset_root = cli
        .fallback
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let request = ReportRequest {
        analysis,
        category: cli.category,
        title: cli.title,
        fallback,
    };
    let author = cli.author.unwrap_or_default();
    let assets = Arc::new(FsAssetLoader::new(asset_root));
    let report = generate_with_assets(&request, &author, &config, assets, &mut LogListener)?;
    write_report(&report, &cli.output)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
