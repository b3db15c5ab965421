use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "udeck",
    version,
    about = "terminal console for a remote user directory",
    long_about = "udeck is a terminal admin console for a remote user directory API.\n\nExamples:\n  udeck login --email admin@example.com --password s3cret\n  udeck dashboard\n  udeck users --search bru --sort name --order asc\n  udeck users --interactive\n  udeck delete 42\n\nTip: Use --config to persist connection settings and keep invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Connection",
        help = "Path to config file (defaults to ~/.udeck/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'b',
        long = "base-url",
        value_name = "URL",
        help_heading = "Connection",
        help = "Base URL of the user directory API."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Connection",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        help_heading = "Connection",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered result to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub output_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate against the configured credentials and open a session
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },

    /// Close the current session
    Logout,

    /// Show session and connection status
    Status,

    /// Fetch the directory and render the metrics dashboard
    Dashboard,

    /// Browse the user directory
    Users {
        #[arg(long, value_name = "TERM", help = "Filter by name or email substring.")]
        search: Option<String>,

        #[arg(long, value_name = "FIELD", help = "Sort field: id, name, email, created.")]
        sort: Option<String>,

        #[arg(long, value_name = "ORDER", help = "Sort order: asc or desc.")]
        order: Option<String>,

        #[arg(long, value_name = "N", default_value_t = 1, help = "1-based page number.")]
        page: usize,

        #[arg(long, value_name = "N", help = "Records per page.")]
        page_size: Option<usize>,

        #[arg(short = 'i', long, help = "Browse interactively.")]
        interactive: bool,
    },

    /// Delete a user by id (asks for confirmation)
    Delete {
        #[arg(value_name = "ID")]
        id: i64,

        #[arg(short = 'y', long, help = "Skip the confirmation prompt.")]
        yes: bool,
    },
}
