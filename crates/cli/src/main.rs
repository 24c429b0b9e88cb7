// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Desktop Remote - CLI Client
// Command-line interface for controlling a desktop running the companion server

mod config;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use desktop_remote_gui_core::{
    FileItem, FileListing, KeyboardInput, MouseButton, MouseEvent, Notification,
    NotificationReceiver, RemoteControlClient, RequestId, SystemMetrics,
};

use config::{CliConfig, Overrides};

#[derive(Parser)]
#[command(name = "desktop-remote")]
#[command(about = "Desktop Remote CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Server host (default from config, else 127.0.0.1)
    #[arg(short = 'H', long, global = true)]
    host: Option<String>,

    /// Server port (default from config, else 8080)
    #[arg(short = 'P', long, global = true)]
    port: Option<u16>,

    /// Bearer token for the companion server
    #[arg(short = 't', long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show system metrics of the remote desktop
    Metrics {
        /// Output as JSON for scripting
        #[arg(short, long)]
        json: bool,
    },

    /// Shut down the remote desktop
    Shutdown {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List a remote directory
    Ls {
        /// Directory relative to the server's file root
        #[arg(default_value = "")]
        path: String,

        /// Output as JSON for scripting
        #[arg(short, long)]
        json: bool,
    },

    /// Download a remote file
    Get {
        /// Remote file path
        remote: String,

        /// Local destination (default: remote file name in the current directory)
        local: Option<String>,
    },

    /// Upload a local file
    Put {
        /// Local file path
        local: String,

        /// Remote destination directory
        #[arg(default_value = "")]
        remote_dir: String,
    },

    /// Capture the remote screen
    Screenshot {
        /// Output file (default: screenshot.<format>)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Send a mouse action
    Mouse {
        #[command(subcommand)]
        action: MouseCommands,
    },

    /// Type text on the remote desktop
    Type {
        text: String,
    },

    /// Press a named key (enter, backspace, tab, escape, ...)
    Key {
        name: String,
    },
}

#[derive(Subcommand)]
enum MouseCommands {
    /// Move the pointer
    Move { x: i32, y: i32 },

    /// Click at a position
    Click {
        x: i32,
        y: i32,

        #[arg(short, long, value_enum, default_value_t = ButtonArg::Left)]
        button: ButtonArg,
    },

    /// Double-click at a position
    DoubleClick { x: i32, y: i32 },

    /// Scroll by wheel units (negative scrolls down)
    Scroll {
        #[arg(allow_hyphen_values = true)]
        amount: i32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ButtonArg {
    Left,
    Right,
    Middle,
}

impl From<ButtonArg> for MouseButton {
    fn from(button: ButtonArg) -> Self {
        match button {
            ButtonArg::Left => MouseButton::Left,
            ButtonArg::Right => MouseButton::Right,
            ButtonArg::Middle => MouseButton::Middle,
        }
    }
}

impl From<MouseCommands> for MouseEvent {
    fn from(action: MouseCommands) -> Self {
        match action {
            MouseCommands::Move { x, y } => MouseEvent::Move { x, y },
            MouseCommands::Click { x, y, button } => MouseEvent::Click {
                x,
                y,
                button: button.into(),
            },
            MouseCommands::DoubleClick { x, y } => MouseEvent::DoubleClick { x, y },
            MouseCommands::Scroll { amount } => MouseEvent::Scroll { amount },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load()?.apply(Overrides {
        host: cli.host,
        port: cli.port,
        token: cli.token,
        timeout: cli.timeout,
    });
    debug!(
        "Using server {}:{}",
        config.client.host, config.client.port
    );

    let mut session = Session::connect(config)?;

    match cli.command {
        Commands::Metrics { json } => session.metrics(json).await?,
        Commands::Shutdown { yes } => session.shutdown(yes).await?,
        Commands::Ls { path, json } => session.list(&path, json).await?,
        Commands::Get { remote, local } => session.download(&remote, local).await?,
        Commands::Put { local, remote_dir } => session.upload(&local, &remote_dir).await?,
        Commands::Screenshot { output } => session.screenshot(output).await?,
        Commands::Mouse { action } => session.mouse(action.into()).await?,
        Commands::Type { text } => session.keyboard(KeyboardInput::Text(text)).await?,
        Commands::Key { name } => session.keyboard(KeyboardInput::Key(name)).await?,
    }

    Ok(())
}

/// One CLI invocation: a client, its notifications and the target server
struct Session {
    client: RemoteControlClient,
    events: NotificationReceiver,
    host: String,
    port: u16,
}

impl Session {
    fn connect(config: CliConfig) -> Result<Self> {
        let host = config.client.host.clone();
        let port = config.client.port;
        let (client, events) = RemoteControlClient::new(config.client)
            .context("Failed to create remote control client")?;
        Ok(Self {
            client,
            events,
            host,
            port,
        })
    }

    /// Wait for the terminal notification of `request`
    ///
    /// Ctrl-C cancels the request; its cancellation is then reported like
    /// any other failure.
    async fn wait(&mut self, request: RequestId, bar: Option<&ProgressBar>) -> Result<Notification> {
        let mut interrupted = false;
        loop {
            let notification = tokio::select! {
                notification = self.events.recv() => notification,
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    self.client.cancel(request);
                    continue;
                }
            };

            let notification = notification
                .ok_or_else(|| anyhow::anyhow!("Notification channel closed unexpectedly"))?;
            if notification.request() != request {
                continue;
            }

            match notification {
                Notification::TransferProgress { percent, .. } => {
                    if let Some(bar) = bar {
                        bar.set_position(u64::from(percent));
                    }
                }
                terminal => return Ok(terminal),
            }
        }
    }

    async fn metrics(&mut self, json: bool) -> Result<()> {
        let request = self.client.fetch_metrics(&self.host, "", "", self.port);
        match self.wait(request, None).await? {
            Notification::MetricsReceived { metrics, .. } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&metrics)?);
                    return Ok(());
                }

                let metrics = SystemMetrics::from_map(&metrics);
                let cpu = metrics
                    .cpu_percent
                    .map(|cpu| format!("{:.1}%", cpu))
                    .unwrap_or_else(|| "Unknown".to_string());

                println!();
                println!("{}", metrics.hostname.bold().cyan());
                println!("  Uptime:      {}", metrics.uptime);
                println!("  CPU:         {}", cpu);
                println!("  RAM:         {}", metrics.ram);
                println!("  Temperature: {}", metrics.temperature);
                println!();
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn shutdown(&mut self, yes: bool) -> Result<()> {
        if !yes
            && !Confirm::new()
                .with_prompt(format!("Shut down the desktop at {}?", self.host))
                .default(false)
                .interact()?
        {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }

        let request = self.client.shutdown_host(&self.host, self.port);
        match self.wait(request, None).await? {
            Notification::ShutdownCompleted {
                success: true,
                message,
                ..
            } => {
                println!("{}", format!("✓ {}", message).green().bold());
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn list(&mut self, path: &str, json: bool) -> Result<()> {
        let request = self.client.list_files(&self.host, self.port, path);
        match self.wait(request, None).await? {
            Notification::FileListReceived { listing, .. } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                } else {
                    print_listing(&FileListing::from_map(&listing));
                }
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn download(&mut self, remote: &str, local: Option<String>) -> Result<()> {
        let local = match local {
            Some(local) => expand_path(&local),
            None => PathBuf::from(remote_file_name(remote)?),
        };

        let bar = transfer_bar(remote)?;
        let request = self
            .client
            .download_file(&self.host, self.port, remote, &local);
        let outcome = self.wait(request, Some(&bar)).await?;
        bar.finish_and_clear();

        match outcome {
            Notification::DownloadCompleted {
                filename,
                local_path,
                ..
            } => {
                println!(
                    "{} {} → {}",
                    "✓ Downloaded".green().bold(),
                    filename.cyan(),
                    local_path.display()
                );
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn upload(&mut self, local: &str, remote_dir: &str) -> Result<()> {
        let local = expand_path(local);
        let bar = transfer_bar(&local.display().to_string())?;
        let request = self
            .client
            .upload_file(&self.host, self.port, &local, remote_dir);
        let outcome = self.wait(request, Some(&bar)).await?;
        bar.finish_and_clear();

        match outcome {
            Notification::UploadCompleted { filename, .. } => {
                let target = if remote_dir.is_empty() { "/" } else { remote_dir };
                println!(
                    "{} {} → {}",
                    "✓ Uploaded".green().bold(),
                    filename.cyan(),
                    target
                );
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn screenshot(&mut self, output: Option<String>) -> Result<()> {
        let request = self.client.capture_screen(&self.host, self.port);
        match self.wait(request, None).await? {
            Notification::ScreenshotReady { screenshot, .. } => {
                let path = match output {
                    Some(output) => expand_path(&output),
                    None => PathBuf::from(format!("screenshot.{}", screenshot.extension())),
                };
                let image = screenshot.decode_image()?;
                fs::write(&path, &image)
                    .with_context(|| format!("Failed to write {}", path.display()))?;

                println!(
                    "{} {}x{} desktop saved to {} ({} bytes)",
                    "✓".green().bold(),
                    screenshot.width,
                    screenshot.height,
                    path.display().to_string().cyan(),
                    image.len()
                );
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn mouse(&mut self, event: MouseEvent) -> Result<()> {
        let request = self.client.send_mouse_event(&self.host, self.port, event);
        match self.wait(request, None).await? {
            Notification::MouseControlResult {
                success: true,
                message,
                ..
            } => {
                println!("{}", format!("✓ {}", message).green());
                Ok(())
            }
            other => Err(failure(other)),
        }
    }

    async fn keyboard(&mut self, input: KeyboardInput) -> Result<()> {
        let request = self.client.send_keyboard_input(&self.host, self.port, input);
        match self.wait(request, None).await? {
            Notification::KeyboardInputResult {
                success: true,
                message,
                ..
            } => {
                println!("{}", format!("✓ {}", message).green());
                Ok(())
            }
            other => Err(failure(other)),
        }
    }
}

/// Turn a failure-shaped terminal notification into an error
fn failure(notification: Notification) -> anyhow::Error {
    let message = match notification {
        Notification::OperationFailed { error, .. }
        | Notification::FileOperationFailed { error, .. } => error,
        Notification::ShutdownCompleted { message, .. }
        | Notification::MouseControlResult { message, .. }
        | Notification::KeyboardInputResult { message, .. } => message,
        other => format!("Unexpected response: {:?}", other),
    };
    anyhow::anyhow!(message)
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn remote_file_name(remote: &str) -> Result<&str> {
    remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Cannot derive a local file name from '{}'", remote))
}

fn transfer_bar(name: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")?
            .progress_chars("=> "),
    );
    bar.set_message(name.to_string());
    Ok(bar)
}

fn print_listing(listing: &FileListing) {
    if listing.items.is_empty() {
        println!("{}", "Directory is empty.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    // Header
    table.set_header(vec![
        Cell::new("Name")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Size")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Modified")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
    ]);

    for item in &listing.items {
        let name = if item.is_dir {
            Cell::new(format!("{}/", item.name)).fg(Color::Blue)
        } else {
            Cell::new(&item.name)
        };
        table.add_row(vec![
            name,
            Cell::new(format_size(item)),
            Cell::new(format_modified(item.modified)).fg(Color::DarkGrey),
        ]);
    }

    let location = if listing.path.is_empty() {
        "/"
    } else {
        listing.path.as_str()
    };

    println!();
    println!("{}", location.bold());
    println!("{}", table);
    println!();
    println!("{} item(s)", listing.items.len().to_string().cyan());
    println!();
}

fn format_size(item: &FileItem) -> String {
    if item.is_dir {
        return "-".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = item.size as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", item.size)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn format_modified(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|time| {
            time.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
