use std::process::ExitCode;

use clap::Subcommand;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_scraper::{CredentialSource, Credentials};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the credentials config file path
    Path,

    /// Show configured credentials and where each value comes from
    Show,

    /// Store credentials in the config file
    Set {
        #[arg(long)]
        devid: String,
        #[arg(long)]
        devpassword: String,
        #[arg(long)]
        ssid: Option<String>,
        #[arg(long)]
        sspassword: Option<String>,
        /// Software name registered with ScreenScraper
        #[arg(long, default_value = "romshelf")]
        softname: String,
    },
}

pub fn run(action: ConfigAction) -> ExitCode {
    match action {
        ConfigAction::Path => run_path(),
        ConfigAction::Show => run_show(),
        ConfigAction::Set {
            devid,
            devpassword,
            ssid,
            sspassword,
            softname,
        } => run_set(devid, devpassword, ssid, sspassword, softname),
    }
}

fn run_path() -> ExitCode {
    match romshelf_scraper::config_path() {
        Some(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Could not determine config directory");
            ExitCode::FAILURE
        }
    }
}

fn mask_value(s: &str) -> String {
    if s.chars().count() <= 2 {
        "****".to_string()
    } else {
        let head: String = s.chars().take(2).collect();
        format!("{head}****")
    }
}

fn run_show() -> ExitCode {
    let path = romshelf_scraper::config_path();
    let sources = romshelf_scraper::credential_sources();

    println!(
        "{}",
        "ScreenScraper Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();
    match &path {
        Some(p) if p.exists() => println!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        Some(p) => println!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => println!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    println!();

    // Load() fails when required fields are missing, so resolve per field.
    let creds = Credentials::load().ok();
    let fields: [(&str, &CredentialSource, Option<String>, bool); 5] = [
        ("dev_id", &sources.dev_id, creds.as_ref().map(|c| c.dev_id.clone()), false),
        (
            "dev_password",
            &sources.dev_password,
            creds.as_ref().map(|c| c.dev_password.clone()),
            true,
        ),
        (
            "soft_name",
            &sources.soft_name,
            creds.as_ref().map(|c| c.soft_name.clone()),
            false,
        ),
        ("user_id", &sources.user_id, creds.as_ref().and_then(|c| c.user_id.clone()), false),
        (
            "user_password",
            &sources.user_password,
            creds.as_ref().and_then(|c| c.user_password.clone()),
            true,
        ),
    ];

    for (name, source, value, is_secret) in fields {
        let shown = match (source, value) {
            (CredentialSource::Missing, _) | (_, None) => None,
            (_, Some(v)) if is_secret => Some(mask_value(&v)),
            (_, Some(v)) => Some(v),
        };
        match shown {
            Some(v) => println!(
                "  {name:14} {v:24} {}",
                format!("({source})").if_supports_color(Stdout, |t| t.dimmed()),
            ),
            None => println!(
                "  {name:14} {}",
                "not set".if_supports_color(Stdout, |t| t.yellow()),
            ),
        }
    }
    ExitCode::SUCCESS
}

fn run_set(
    devid: String,
    devpassword: String,
    ssid: Option<String>,
    sspassword: Option<String>,
    softname: String,
) -> ExitCode {
    let creds = Credentials {
        dev_id: devid,
        dev_password: devpassword,
        soft_name: softname,
        user_id: ssid,
        user_password: sspassword,
    };
    match romshelf_scraper::save_to_file(&creds) {
        Ok(path) => {
            println!(
                "{} Credentials saved to {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                path.display(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "{} Failed to save credentials: {e}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            );
            ExitCode::FAILURE
        }
    }
}
