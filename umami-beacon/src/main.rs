//! umami-beacon - CLI tool for checking and sending Umami beacons
//!
//! This tool provides commands for:
//! - Showing the normalized tracker settings and resolved endpoint
//! - Evaluating preflight for a simulated browser
//! - Sending a pageview or custom event from a simulated browser
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/umami-beacon/config.toml (~/.config/umami-beacon/config.toml)
//! - Logs: $XDG_STATE_HOME/umami-beacon/umami-beacon.log

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use umami_beacon_core::context::{Document, Location, Navigator, Screen};
use umami_beacon_core::{ClientContext, Config, PageState, Tracker, ViewOverrides};

#[derive(Parser)]
#[command(name = "umami-beacon")]
#[command(about = "Check and send Umami pageview beacons")]
#[command(version)]
struct Args {
    /// Verbose output (writes the log file)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show normalized settings and the collector endpoint
    Status,

    /// Evaluate the tracking gate for a simulated browser
    Preflight {
        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Send a pageview
    View {
        #[command(flatten)]
        browser: BrowserArgs,

        /// Override the tracked url
        #[arg(long)]
        url: Option<String>,

        /// Override the tracked referrer
        #[arg(long = "ref")]
        referrer_override: Option<String>,
    },

    /// Send a named custom event
    Event {
        /// Event name
        name: String,

        /// Event data as JSON
        #[arg(long)]
        data: Option<String>,

        #[command(flatten)]
        browser: BrowserArgs,
    },
}

/// Simulated browser state
#[derive(ClapArgs)]
struct BrowserArgs {
    /// Current page URL
    #[arg(long, default_value = "http://localhost/")]
    href: String,

    /// document.referrer
    #[arg(long, default_value = "")]
    referrer: String,

    /// Page title
    #[arg(long, default_value = "")]
    title: String,

    /// navigator.language
    #[arg(long, default_value = "en-US")]
    language: String,

    /// Screen size as WIDTHxHEIGHT
    #[arg(long, default_value = "1920x1080")]
    screen: String,

    /// Do-Not-Track signal value (e.g. 1, yes)
    #[arg(long)]
    dnt: Option<String>,

    /// Simulate server-side rendering (no browser)
    #[arg(long)]
    ssr: bool,
}

impl BrowserArgs {
    fn client(&self) -> Result<Option<ClientContext>> {
        if self.ssr {
            return Ok(None);
        }

        Ok(Some(ClientContext {
            location: Location::from_href(&self.href),
            screen: parse_screen(&self.screen)?,
            navigator: Navigator {
                language: self.language.clone(),
                do_not_track: self.dnt.clone().map(serde_json::Value::String),
                ms_do_not_track: None,
            },
            document: Document {
                referrer: self.referrer.clone(),
                title: self.title.clone(),
            },
            do_not_track: None,
        }))
    }
}

fn parse_screen(value: &str) -> Result<Screen> {
    let Some((width, height)) = value.split_once('x') else {
        bail!("screen must look like WIDTHxHEIGHT, got {:?}", value);
    };
    Ok(Screen {
        width: width.trim().parse().context("invalid screen width")?,
        height: height.trim().parse().context("invalid screen height")?,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(
            umami_beacon_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };

    let tracker = Tracker::new(&config).context("failed to build tracker")?;

    match args.command {
        Command::Status => cmd_status(&config, &tracker),
        Command::Preflight { browser } => cmd_preflight(&tracker, &browser),
        Command::View {
            browser,
            url,
            referrer_override,
        } => {
            let overrides = ViewOverrides {
                url,
                referrer: referrer_override,
            };
            cmd_view(&tracker, &browser, &overrides)
        }
        Command::Event {
            name,
            data,
            browser,
        } => cmd_event(&tracker, &browser, &name, data.as_deref()),
    }
}

fn cmd_status(config: &Config, tracker: &Tracker) -> Result<()> {
    let settings = tracker.settings();

    println!("Umami Beacon Configuration");
    println!("==========================");
    println!();
    println!("Config file:     {}", Config::config_path().display());
    println!("Mode:            {:?}", config.mode);
    println!(
        "Host:            {}",
        settings
            .host
            .as_ref()
            .map(|h| h.as_str())
            .unwrap_or("<not set or invalid>")
    );
    println!(
        "Website ID:      {}",
        if settings.id.is_empty() {
            "<not set>"
        } else {
            settings.id.as_str()
        }
    );
    println!("Version:         {}", settings.version);
    println!("Endpoint:        {}", tracker.endpoint());
    println!(
        "Domains:         {}",
        settings
            .domains
            .as_ref()
            .map(|d| d.join(", "))
            .unwrap_or_else(|| "<any>".to_string())
    );
    println!("Ignore DNT:      {}", settings.ignore_dnt);
    println!("Ignore local:    {}", settings.ignore_local);
    println!("Auto track:      {}", settings.auto_track);
    println!("Use directive:   {}", settings.use_directive);
    println!("Debug:           {}", settings.debug);

    if settings.host.is_none() || settings.id.is_empty() {
        println!();
        println!("Tracking is not configured. Set it in config.toml:");
        println!();
        println!("  [umami]");
        println!("  host = \"https://your-umami-instance.com\"");
        println!("  id = \"your-website-id\"");
    }

    Ok(())
}

fn cmd_preflight(tracker: &Tracker, browser: &BrowserArgs) -> Result<()> {
    let client = browser.client()?;
    let result = tracker.preflight(client.as_ref());
    println!("{}", result);
    Ok(())
}

fn cmd_view(tracker: &Tracker, browser: &BrowserArgs, overrides: &ViewOverrides) -> Result<()> {
    let client = browser.client()?;
    let page = PageState::default();

    run_tracking(tracker, client.as_ref(), |tracker, client| {
        tracker.track_view(client, &page, overrides)
    })
}

fn cmd_event(
    tracker: &Tracker,
    browser: &BrowserArgs,
    name: &str,
    data: Option<&str>,
) -> Result<()> {
    let client = browser.client()?;
    let data: Option<serde_json::Value> = data
        .map(serde_json::from_str)
        .transpose()
        .context("event data must be valid JSON")?;
    let page = PageState::default();

    run_tracking(tracker, client.as_ref(), |tracker, client| {
        tracker.track_event(client, &page, name, data)
    })
}

/// Run one tracking call on a local runtime and wait for delivery
fn run_tracking<F>(tracker: &Tracker, client: Option<&ClientContext>, track: F) -> Result<()>
where
    F: FnOnce(&Tracker, Option<&ClientContext>) -> Option<tokio::task::JoinHandle<()>>,
{
    let preflight = tracker.preflight(client);
    if !preflight.is_allowed() {
        println!("Not sent: {}", preflight);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    runtime.block_on(async {
        if let Some(task) = track(tracker, client) {
            // The task swallows delivery failures; a join error means it panicked.
            task.await.context("beacon task failed")?;
        }
        Ok::<_, anyhow::Error>(())
    })?;

    tracing::info!(endpoint = %tracker.endpoint(), "Beacon dispatched");
    println!("Dispatched to {}", tracker.endpoint());
    Ok(())
}
