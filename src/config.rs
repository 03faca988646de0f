//! Startup configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! the `LISTEN` environment variable, then command-line flags. The result
//! is a [`ServerConfig`] that never changes after startup.

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port used when CGI is enabled and nothing else is configured.
pub const DEFAULT_CGI_PORT: u16 = 8000;
/// Port used for static-only serving when nothing else is configured.
pub const DEFAULT_STATIC_PORT: u16 = 8080;
pub const DEFAULT_CGI_TIMEOUT_SECS: u64 = 30;

/// Command-line interface.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "sensible-server",
    version,
    about = "A simple HTTP server that serves content with optional CGI scripting."
)]
pub struct Cli {
    /// The root of the web content to serve.
    #[arg(value_name = "DOCUMENT_ROOT")]
    pub document_root: Option<PathBuf>,

    /// Run executable `.py` files (and directory `index.py` files) as CGI scripts.
    #[arg(short = 'c', long)]
    pub enable_cgi: bool,

    /// Address to bind.
    #[arg(short, long)]
    pub bind: Option<IpAddr>,

    /// Port to listen on [default: 8000 with CGI, 8080 without].
    #[arg(short, long)]
    pub port: Option<u16>,

    /// YAML file with default settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds to wait for a client to send its request (off by default).
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    /// Seconds a CGI script may run before it is killed.
    #[arg(long, value_name = "SECS")]
    pub cgi_timeout: Option<u64>,
}

/// Settings that can be provided by a YAML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub document_root: Option<PathBuf>,
    pub enable_cgi: Option<bool>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub read_timeout_secs: Option<u64>,
    pub cgi_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid configuration file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file '{}'", path.display()))?;
        Self::from_yaml(&text)
    }
}

/// Immutable server configuration, shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Absolute, canonical path of the content tree
    pub document_root: PathBuf,
    pub cgi_enabled: bool,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// How long to wait for request bytes; `None` waits forever
    pub read_timeout: Option<Duration>,
    /// How long a CGI script may run
    pub cgi_timeout: Duration,
}

impl ServerConfig {
    /// Builds a configuration with defaults for everything but the root.
    ///
    /// Fails if `document_root` does not exist or is not a directory.
    pub fn new(document_root: impl AsRef<Path>, cgi_enabled: bool) -> anyhow::Result<Self> {
        let document_root = resolve_document_root(document_root.as_ref())?;

        Ok(Self {
            document_root,
            cgi_enabled,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: default_port(cgi_enabled),
            read_timeout: None,
            cgi_timeout: Duration::from_secs(DEFAULT_CGI_TIMEOUT_SECS),
        })
    }

    /// Loads the layered configuration, reading `LISTEN` from the environment.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let listen = std::env::var("LISTEN").ok();
        Self::from_sources(cli, listen.as_deref())
    }

    /// Merges defaults, the optional config file, a `LISTEN` value and CLI flags.
    pub fn from_sources(cli: &Cli, listen: Option<&str>) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let document_root = cli
            .document_root
            .clone()
            .or(file.document_root)
            .context("no document root given")?;

        let cgi_enabled = cli.enable_cgi || file.enable_cgi.unwrap_or(false);
        let mut config = Self::new(document_root, cgi_enabled)?;

        if let Some(bind) = file.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = file.port {
            config.port = port;
        }

        if let Some(listen) = listen {
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("invalid LISTEN address '{}'", listen))?;
            config.bind_addr = addr.ip();
            config.port = addr.port();
        }

        if let Some(bind) = cli.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(secs) = cli.read_timeout.or(file.read_timeout_secs) {
            config.read_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = cli.cgi_timeout.or(file.cgi_timeout_secs) {
            config.cgi_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

pub fn default_port(cgi_enabled: bool) -> u16 {
    if cgi_enabled {
        DEFAULT_CGI_PORT
    } else {
        DEFAULT_STATIC_PORT
    }
}

fn resolve_document_root(path: &Path) -> anyhow::Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("No such directory: '{}'", path.display()))?;

    if !root.is_dir() {
        bail!("No such directory: '{}'", root.display());
    }

    Ok(root)
}
