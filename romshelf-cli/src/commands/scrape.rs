use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_scraper::{
    Credentials, Gateway, RateBudget, RetryPolicy, RunPhase, RunSummary, ScrapeConfig,
    ScrapeEvent, StopFlag, run_pipeline, run_with_events,
};

#[derive(Args)]
pub struct ScrapeArgs {
    /// Directory containing the system's ROM files
    #[arg(long)]
    pub rom_dir: PathBuf,

    /// ES-DE downloaded_media directory (media lands under <scrape-dir>/<system>/)
    #[arg(long)]
    pub scrape_dir: PathBuf,

    /// System folder name (e.g. snes)
    #[arg(long)]
    pub system: String,

    /// ScreenScraper system ID (e.g. 4 for SNES); strongly recommended
    #[arg(long)]
    pub system_id: Option<u32>,

    /// ES-DE gamelists directory; omit to skip gamelist.xml output
    #[arg(long)]
    pub gamelist_dir: Option<PathBuf>,

    /// Number of concurrent workers (clamped to the account's max threads)
    #[arg(short, long, default_value_t = 6)]
    pub threads: usize,

    /// Maximum API requests per minute
    #[arg(long, default_value_t = 50)]
    pub rate: usize,

    /// ROM extensions to recognize (defaults to the common cartridge/disc set)
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Process at most this many ROMs
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Audit and report without downloading anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip writing the scrape-log report file
    #[arg(long)]
    pub no_log: bool,

    /// ScreenScraper username (overrides env/config)
    #[arg(long)]
    pub ssid: Option<String>,

    /// ScreenScraper password (overrides env/config)
    #[arg(long)]
    pub sspassword: Option<String>,

    /// Developer ID (overrides env/config)
    #[arg(long)]
    pub devid: Option<String>,

    /// Developer password (overrides env/config)
    #[arg(long)]
    pub devpassword: Option<String>,
}

pub async fn run(args: ScrapeArgs) -> ExitCode {
    let creds = match Credentials::load() {
        Ok(creds) => creds.with_overrides(
            args.devid.clone(),
            args.devpassword.clone(),
            args.ssid.clone(),
            args.sspassword.clone(),
        ),
        Err(e) => {
            log::error!(
                "{} {e}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            );
            log::error!("");
            log::error!("Set credentials via environment variables:");
            log::error!("  SCREENSCRAPER_DEVID, SCREENSCRAPER_DEVPASSWORD");
            log::error!("  SCREENSCRAPER_SSID, SCREENSCRAPER_SSPASSWORD (optional)");
            log::error!("");
            log::error!("Or run 'romshelf config set' to store them in the config file.");
            return ExitCode::FAILURE;
        }
    };

    let budget = Arc::new(RateBudget::new(args.rate.max(1), Duration::from_secs(60)));
    let gateway = match Gateway::new(creds, budget, RetryPolicy::default(), args.system_id) {
        Ok(gateway) => gateway,
        Err(e) => {
            log::error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Preflight: validate credentials and clamp workers to the account limit.
    let spinner = connect_spinner();
    let user_info = match gateway.connect().await {
        Ok(info) => info,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!(
                "{} Failed to connect to ScreenScraper: {e}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            );
            return ExitCode::FAILURE;
        }
    };
    spinner.finish_and_clear();

    let threads = args.threads.clamp(1, user_info.max_threads().max(1) as usize);
    println!(
        "{} Connected to ScreenScraper (requests today: {}/{}, using {} workers)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        user_info.requests_today(),
        user_info.max_requests_per_day(),
        threads,
    );

    let mut config = ScrapeConfig::new(args.rom_dir, args.scrape_dir, args.system.clone());
    config.manifest_dir = args.gamelist_dir.clone();
    config.thread_count = threads;
    config.limit = args.limit;
    config.dry_run = args.dry_run;
    if let Some(exts) = args.extensions {
        config.extensions = exts;
    }
    if args.dry_run {
        println!(
            "{}",
            "Dry run: nothing will be downloaded".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let stop = StopFlag::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping after in-flight jobs finish...");
                stop.stop();
            }
        });
    }

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut render = Renderer::new();
    let result = run_with_events(
        run_pipeline(&config, &gateway, &gateway, event_tx, &stop),
        event_rx,
        |event| render.handle(event),
    )
    .await;
    render.finish();

    match result {
        Ok(summary) => {
            print_summary(&summary);
            if let Some(ref dir) = args.gamelist_dir {
                if !args.no_log && !args.dry_run {
                    match romshelf_scraper::write_report(dir, &args.system, &summary) {
                        Ok(path) => println!("  Report: {}", path.display()),
                        Err(e) => log::warn!("Could not write scrape report: {e}"),
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "{} Scrape failed: {e}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            );
            ExitCode::FAILURE
        }
    }
}

fn connect_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("/-\\|"),
    );
    pb.set_message("Connecting to ScreenScraper...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders pipeline events onto one progress bar plus per-job lines.
struct Renderer {
    bar: ProgressBar,
}

impl Renderer {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    fn handle(&mut self, event: ScrapeEvent) {
        match event {
            ScrapeEvent::Phase(RunPhase::Scanning) => {
                self.bar = ProgressBar::new_spinner();
                self.bar.set_style(
                    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                        .unwrap()
                        .tick_chars("/-\\|"),
                );
                self.bar.set_message("Scanning for ROM files...");
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
            ScrapeEvent::ScanComplete { total_items } => {
                self.bar.finish_and_clear();
                println!("Found {total_items} ROMs");
            }
            ScrapeEvent::AuditComplete {
                total_jobs,
                items_complete,
            } => {
                if items_complete > 0 {
                    println!("{items_complete} already complete");
                }
                if total_jobs > 0 {
                    self.bar = ProgressBar::new(total_jobs as u64);
                    self.bar.set_style(
                        ProgressStyle::with_template(
                            "  [{bar:30.cyan/dim}] {pos}/{len} {msg}",
                        )
                        .unwrap()
                        .progress_chars("=> "),
                    );
                }
            }
            ScrapeEvent::JobStarted { file, kind } => {
                self.bar.set_message(format!("{file} ({kind})"));
            }
            ScrapeEvent::JobSucceeded { file, kind } => {
                self.bar.inc(1);
                self.bar.println(format!(
                    "  {} {file} ({kind})",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                ));
            }
            ScrapeEvent::JobSkipped { file, kind, reason } => {
                self.bar.inc(1);
                log::info!("  skipped {file} ({kind}): {reason}");
            }
            ScrapeEvent::JobFailed { file, kind, reason } => {
                self.bar.inc(1);
                self.bar.println(format!(
                    "  {} {file} ({kind}): {reason}",
                    "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                ));
            }
            ScrapeEvent::Phase(RunPhase::Finalizing) => {
                self.bar.finish_and_clear();
            }
            _ => {}
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Summary:".if_supports_color(Stdout, |t| t.bold()));
    println!(
        "  {} {} items found, {} already complete",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.items_seen,
        summary.items_complete,
    );
    if summary.fetched_total() > 0 {
        println!(
            "  {} {} metadata records, {} media files fetched",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            summary.metadata_fetched,
            summary.assets_fetched,
        );
    }
    if summary.jobs_skipped > 0 {
        println!(
            "  {} {} jobs skipped",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            summary.jobs_skipped,
        );
    }
    if !summary.failures.is_empty() {
        println!(
            "  {} {} jobs failed:",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            summary.failed_jobs(),
        );
        for failure in &summary.failures {
            println!("      {} ({}): {}", failure.file, failure.kind, failure.reason);
        }
    }
}
