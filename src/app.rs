use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget};

use crate::api::{Client, ClientOptions};
use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::metrics;
use crate::mutation::{DeleteOutcome, MutationCoordinator, MutationError};
use crate::output::{self, OutputFormat};
use crate::session::{Authenticator, ConfigCredentials, SessionStore};
use crate::store::{LoadStatus, RecordStore};
use crate::view::{self, SortField, SortOrder, ViewParams};

const DEFAULT_BASE_URL: &str = "https://portal-nexion.fly.dev/api";

fn print_banner() {
    const BANNER: &str = r#"
            __         __
 __  ______/ /__  _____/ /__
/ / / / __  / _ \/ ___/ //_/
\ \_/ / /_/ /  __/ /__/ ,<
 \__,_\__,_/\___/\___/_/|_|

    user directory console
"#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    base_url: String,
    timeout_seconds: usize,
    proxy: Option<String>,
    no_color: bool,
    output: Option<String>,
    output_format: Option<String>,
    page_size: usize,
    default_sort_field: SortField,
    default_sort_order: SortOrder,
    credentials: Option<ConfigCredentials>,
    session_path: PathBuf,
}

fn build_run_config(args: &CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(args)?;

    let base_url = args
        .base_url
        .clone()
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(10);
    let proxy = args.proxy.clone().or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let output = args
        .output
        .clone()
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = args.output_format.clone().or(cfg.output_format);

    let page_size = cfg.page_size.unwrap_or(view::DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size in config, expected positive integer".to_string());
    }

    let default_sort_field = match cfg.sort.as_deref() {
        Some(raw) => SortField::parse(raw)
            .ok_or_else(|| format!("invalid sort '{raw}' in config"))?,
        None => SortField::CreatedAt,
    };
    let default_sort_order = match cfg.order.as_deref() {
        Some(raw) => SortOrder::parse(raw)
            .ok_or_else(|| format!("invalid order '{raw}' in config"))?,
        None => SortOrder::Descending,
    };

    let credentials = match (cfg.admin_email, cfg.admin_password) {
        (Some(email), Some(password)) => Some(ConfigCredentials { email, password }),
        _ => None,
    };

    let session_path = cfg
        .session_file
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_session_path)
        .unwrap_or_else(|| PathBuf::from(".udeck-session"));

    Ok(RunConfig {
        base_url,
        timeout_seconds,
        proxy,
        no_color,
        output,
        output_format,
        page_size,
        default_sort_field,
        default_sort_order,
        credentials,
        session_path,
    })
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => {
                // First run scaffolds a commented config; a read-only home
                // is not fatal.
                let _ = config::ensure_default_config_file(&path);
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };

    let command = args.command.clone();
    let run = build_run_config(&args, cfg)?;

    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run, command))
}

async fn run_async(run: RunConfig, command: Command) -> Result<(), String> {
    match command {
        Command::Login { email, password } => login(&run, &email, &password),
        Command::Logout => logout(&run),
        Command::Status => status(&run),
        Command::Dashboard => dashboard(&run).await,
        Command::Users {
            search,
            sort,
            order,
            page,
            page_size,
            interactive,
        } => {
            users(
                &run,
                UsersView {
                    search,
                    sort,
                    order,
                    page,
                    page_size,
                    interactive,
                },
            )
            .await
        }
        Command::Delete { id, yes } => delete(&run, id, yes).await,
    }
}

fn session_store(run: &RunConfig) -> SessionStore {
    SessionStore::new(run.session_path.clone())
}

fn require_session(run: &RunConfig) -> Result<(), String> {
    if session_store(run).is_present() {
        Ok(())
    } else {
        Err("no session open; run `udeck login` first".to_string())
    }
}

fn login(run: &RunConfig, email: &str, password: &str) -> Result<(), String> {
    let credentials = run.credentials.as_ref().ok_or_else(|| {
        "admin credentials are not configured; set admin_email and admin_password in the config file"
            .to_string()
    })?;

    if !credentials.authenticate(email, password) {
        return Err("invalid email or password".to_string());
    }

    session_store(run).open().map_err(|e| e.to_string())?;
    println!(
        "{} session opened for {}",
        "ok ::".bold().green(),
        email.bold().white()
    );
    Ok(())
}

fn logout(run: &RunConfig) -> Result<(), String> {
    session_store(run).close().map_err(|e| e.to_string())?;
    println!("{} session closed", "ok ::".bold().green());
    Ok(())
}

fn status(run: &RunConfig) -> Result<(), String> {
    let session = session_store(run);
    format_kv_line(
        "Session",
        if session.is_present() { "open" } else { "closed" },
    );
    format_kv_line("Endpoint", &run.base_url);
    format_kv_line("Timeout", &format!("{}s", run.timeout_seconds));
    format_kv_line(
        "View",
        &format!(
            "page_size={} sort={} {}",
            run.page_size,
            run.default_sort_field.as_str(),
            run.default_sort_order.as_str()
        ),
    );
    Ok(())
}

fn build_client(run: &RunConfig) -> Result<Client, String> {
    Client::new(&ClientOptions {
        base_url: run.base_url.clone(),
        timeout_seconds: run.timeout_seconds,
        proxy: run.proxy.clone(),
    })
    .map_err(|e| e.to_string())
}

async fn fetch_into_store(store: &mut RecordStore, client: &Client) {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("fetching {}/users", client.base_url()));
    store.load(client).await;
    pb.finish_and_clear();
}

/// Prints a load failure without discarding the view; returns true when the
/// store holds usable data.
fn report_load_status(store: &RecordStore) -> bool {
    match store.status() {
        LoadStatus::Failed(reason) => {
            eprintln!("{} {}", "error ::".bold().red(), reason);
            if store.records().is_empty() {
                eprintln!("{} retry with the same command once the server is reachable", "hint ::".bold().yellow());
                false
            } else {
                eprintln!(
                    "{} showing the previously loaded {} users",
                    "stale ::".bold().yellow(),
                    store.records().len()
                );
                true
            }
        }
        _ => true,
    }
}

fn resolve_format(run: &RunConfig) -> OutputFormat {
    run.output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| {
            run.output
                .as_deref()
                .and_then(output::infer_format_from_path)
        })
        .unwrap_or(OutputFormat::Text)
}

fn emit(run: &RunConfig, text: String, json: Vec<u8>) -> Result<(), String> {
    let rendered = match resolve_format(run) {
        OutputFormat::Text => text.into_bytes(),
        OutputFormat::Json => json,
    };

    match run.output.as_deref() {
        Some(path) => {
            std::fs::write(path, &rendered)
                .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
            println!(
                "{} results saved in {}",
                "ok ::".bold().green(),
                path.bold().cyan()
            );
        }
        None => {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(&rendered);
            let _ = stdout.flush();
        }
    }
    Ok(())
}

async fn dashboard(run: &RunConfig) -> Result<(), String> {
    require_session(run)?;
    print_banner();

    let client = build_client(run)?;
    let mut store = RecordStore::new();
    fetch_into_store(&mut store, &client).await;

    if !report_load_status(&store) {
        return Err("could not load the user directory".to_string());
    }

    let snapshot = metrics::derive(store.records(), chrono::Local::now());
    emit(
        run,
        output::render_dashboard_text(&snapshot),
        output::render_dashboard_json(&snapshot),
    )
}

struct UsersView {
    search: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    page: usize,
    page_size: Option<usize>,
    interactive: bool,
}

async fn users(run: &RunConfig, view_args: UsersView) -> Result<(), String> {
    require_session(run)?;

    let client = build_client(run)?;
    let mut store = RecordStore::new();
    fetch_into_store(&mut store, &client).await;

    if !report_load_status(&store) {
        return Err("could not load the user directory".to_string());
    }

    let mut params = ViewParams {
        sort_field: run.default_sort_field,
        sort_order: run.default_sort_order,
        page_size: view_args.page_size.unwrap_or(run.page_size),
        ..Default::default()
    };
    if let Some(raw) = view_args.sort.as_deref() {
        // Validated upfront; an explicit field starts ascending unless an
        // order was also given.
        params.sort_field = SortField::parse(raw).unwrap_or(params.sort_field);
        params.sort_order = SortOrder::Ascending;
    }
    if let Some(raw) = view_args.order.as_deref() {
        params.sort_order = SortOrder::parse(raw).unwrap_or(params.sort_order);
    }
    if let Some(term) = view_args.search.as_deref() {
        params.set_search(term);
    }
    params.page = view_args.page;

    if view_args.interactive {
        print_banner();
        return browse_loop(&client, &mut store, params).await;
    }

    let projection = view::project(store.records(), &params);
    emit(
        run,
        output::render_users_text(&projection, &params),
        output::render_users_json(&projection),
    )
}

const BROWSE_HELP: &str =
    "commands: /term search :: s <id|name|email|created> sort :: n/p page :: d <id> delete :: r refresh :: q quit";

async fn browse_loop(
    client: &Client,
    store: &mut RecordStore,
    mut params: ViewParams,
) -> Result<(), String> {
    let mut coordinator = MutationCoordinator::new();

    loop {
        let mut projection = view::project(store.records(), &params);
        let previous_page = params.page;
        params.clamp_page(projection.total_pages);
        if params.page != previous_page {
            projection = view::project(store.records(), &params);
        }

        println!();
        print!("{}", output::render_users_text(&projection, &params));
        println!("  {}", BROWSE_HELP.dimmed());
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            break;
        }
        if line.is_empty() {
            // stdin closed
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "q" | "quit" => break,
            "n" => {
                if params.page < projection.total_pages {
                    params.page += 1;
                }
            }
            "p" => {
                if params.page > 1 {
                    params.page -= 1;
                }
            }
            "r" => {
                fetch_into_store(store, client).await;
                report_load_status(store);
            }
            _ => {
                if let Some(term) = input.strip_prefix('/') {
                    params.set_search(term);
                } else if let Some(raw) = input.strip_prefix("s ") {
                    match SortField::parse(raw) {
                        Some(field) => params.toggle_sort(field),
                        None => eprintln!(
                            "{} unknown sort field '{raw}'",
                            "error ::".bold().red()
                        ),
                    }
                } else if let Some(raw) = input.strip_prefix("d ") {
                    match raw.trim().parse::<i64>() {
                        Ok(id) => delete_from_browse(&mut coordinator, client, store, id).await,
                        Err(_) => eprintln!(
                            "{} expected a numeric id, got '{raw}'",
                            "error ::".bold().red()
                        ),
                    }
                } else {
                    println!("  {}", BROWSE_HELP.dimmed());
                }
            }
        }
    }

    Ok(())
}

async fn delete_from_browse(
    coordinator: &mut MutationCoordinator,
    client: &Client,
    store: &mut RecordStore,
    id: i64,
) {
    match coordinator
        .delete_record(client, store, id, confirm_delete)
        .await
    {
        Ok(DeleteOutcome::Deleted) => {
            println!("{} user #{id} deleted", "ok ::".bold().green());
        }
        Ok(DeleteOutcome::Cancelled) => {
            println!("{} delete cancelled", "ok ::".bold().green());
        }
        // Conflicts stay silent; nothing reached the backend.
        Err(MutationError::Conflict { .. }) => {}
        Err(e) => {
            eprintln!("{} {}", "error ::".bold().red(), e);
        }
    }
}

async fn delete(run: &RunConfig, id: i64, yes: bool) -> Result<(), String> {
    require_session(run)?;

    let client = build_client(run)?;
    let mut store = RecordStore::new();
    fetch_into_store(&mut store, &client).await;

    if !report_load_status(&store) {
        return Err("could not load the user directory".to_string());
    }

    if !store.records().iter().any(|r| r.id == id) {
        println!(
            "{} user #{id} is not in the directory; nothing to delete",
            "ok ::".bold().green()
        );
        return Ok(());
    }

    let mut coordinator = MutationCoordinator::new();
    let confirm = |id: i64| yes || confirm_delete(id);
    match coordinator.delete_record(&client, &mut store, id, confirm).await {
        Ok(DeleteOutcome::Deleted) => {
            println!(
                "{} user #{id} deleted, {} users remain",
                "ok ::".bold().green(),
                store.records().len()
            );
            Ok(())
        }
        Ok(DeleteOutcome::Cancelled) => {
            println!("{} delete cancelled", "ok ::".bold().green());
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn confirm_delete(id: i64) -> bool {
    print!("delete user #{id}? this cannot be undone [y/N] ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
