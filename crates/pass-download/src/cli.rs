//! Exposes the command line application.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pass_download_service::config::Config;
use pass_download_service::metrics;

use crate::logging;
use crate::server;

/// Download service commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server.
    #[command(name = "run")]
    Run,
}

/// Deployment settings that take precedence over the configuration file.
#[derive(Debug, Default, Args)]
struct Overrides {
    /// Port for serving the HTTP API on all interfaces.
    #[arg(long, global = true, env = "DOWNLOAD_SERVICE_PORT")]
    port: Option<u16>,

    /// URI of the Fedora container to deposit binaries into.
    #[arg(long = "download-dest", global = true, env = "DOWNLOAD_SERVICE_DEST")]
    download_dest: Option<String>,

    /// Maximum number of redirects followed when downloading a file.
    #[arg(
        long = "download-maxredirects",
        global = true,
        env = "DOWNLOAD_SERVICE_MAXREDIRECTS"
    )]
    max_redirects: Option<usize>,

    /// Email used for making Unpaywall API requests.
    #[arg(long = "unpaywall-email", global = true, env = "UNPAYWALL_REQUEST_EMAIL")]
    unpaywall_email: Option<String>,

    /// Unpaywall API base URI.
    #[arg(long = "unpaywall-baseuri", global = true, env = "UNPAYWALL_BASEURI")]
    unpaywall_base_uri: Option<String>,

    /// External (public) Fedora base URL.
    #[arg(
        long = "fedora-public-baseurl",
        global = true,
        env = "PASS_EXTERNAL_FEDORA_BASEURL"
    )]
    fedora_public_base_url: Option<String>,

    /// Internal (private) Fedora base URL.
    #[arg(
        long = "fedora-internal-baseurl",
        global = true,
        env = "PASS_FEDORA_BASEURL"
    )]
    fedora_internal_base_url: Option<String>,

    /// Username for basic auth to Fedora.
    #[arg(long = "fedora-username", global = true, env = "PASS_FEDORA_USER")]
    fedora_username: Option<String>,

    /// Password for basic auth to Fedora.
    #[arg(
        long = "fedora-password",
        short = 'p',
        global = true,
        env = "PASS_FEDORA_PASSWORD",
        hide_env_values = true
    )]
    fedora_password: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.bind = format!("0.0.0.0:{port}");
        }
        if let Some(dest) = self.download_dest {
            config.download_dest = dest;
        }
        if let Some(max_redirects) = self.max_redirects {
            config.max_redirects = max_redirects;
        }
        if let Some(email) = self.unpaywall_email {
            config.unpaywall.email = email;
        }
        if let Some(base_uri) = self.unpaywall_base_uri {
            config.unpaywall.base_uri = base_uri;
        }
        if let Some(url) = self.fedora_public_base_url {
            config.fedora.public_base_url = url;
        }
        if let Some(url) = self.fedora_internal_base_url {
            config.fedora.internal_base_url = url;
        }
        if self.fedora_username.is_some() {
            config.fedora.username = self.fedora_username;
        }
        if self.fedora_password.is_some() {
            config.fedora.password = self.fedora_password;
        }
    }
}

/// Command line interface parser.
#[derive(Debug, Parser)]
#[command(bin_name = "pass-download", version)]
struct Cli {
    /// Path to your configuration file.
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Returns the path to the configuration file.
    fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Loads the configuration file and applies the overrides from the command line.
    fn load_config(self) -> Result<(Config, Command)> {
        let mut config = Config::get(self.config()).context("failed loading config")?;
        self.overrides.apply(&mut config);
        Ok((config, self.command))
    }
}

/// Runs the main application.
pub fn execute() -> Result<()> {
    let (config, command) = Cli::parse().load_config()?;

    let _sentry = sentry::init(sentry::ClientOptions {
        dsn: config.sentry_dsn.clone(),
        release: sentry::release_name!(),
        ..Default::default()
    });

    // SAFETY: `init_logging` is called before any other threads are spawned.
    unsafe { logging::init_logging(&config) };

    if let Some(ref statsd) = config.metrics.statsd {
        let mut tags = config.metrics.custom_tags.clone();
        if let Some(tag) = config.metrics.hostname_tag.clone() {
            if let Some(name) = hostname::get().ok().and_then(|s| s.into_string().ok()) {
                tags.insert(tag, name);
            }
        }
        metrics::configure_statsd(&config.metrics.prefix, statsd.as_str(), tags)
            .context("failed to configure metrics")?;
    }

    match command {
        Command::Run => server::run(config).context("failed to start the server")?,
    }

    Ok(())
}
