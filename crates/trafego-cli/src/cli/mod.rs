//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use trafego_core::api::types::{BUDGET_TYPES, PLATFORMS, ROLES};
use trafego_core::api::{CampaignDraft, CampaignQuery, CampaignStatus, CampaignUpdate};
use trafego_core::config;

use crate::logging;

mod commands;

use commands::AppContext;
use commands::auth::SecretSource;
use commands::campaigns::{parse_date, parse_datetime};

const STATUSES: &[&str] = &["draft", "active", "paused", "ended", "archived"];

fn platform_parser() -> PossibleValuesParser {
    PossibleValuesParser::new(PLATFORMS.iter().copied())
}

fn status_parser() -> impl TypedValueParser<Value = CampaignStatus> {
    PossibleValuesParser::new(STATUSES.iter().copied()).map(|s| CampaignStatus::parse(&s))
}

#[derive(Parser)]
#[command(name = "trafego")]
#[command(version)]
#[command(about = "Paid-traffic campaign dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL for this run
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Log requests and session changes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(short, long, env = "TRAFEGO_USERNAME")]
        username: Option<String>,

        /// Read the password from stdin
        #[arg(long)]
        password_stdin: bool,

        #[arg(long, env = "TRAFEGO_PASSWORD", hide = true, hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,

        /// Full name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "viewer", value_parser = PossibleValuesParser::new(ROLES.iter().copied()))]
        role: String,

        /// Read the password from stdin
        #[arg(long)]
        password_stdin: bool,
    },
    /// Change the password of the logged-in user
    ChangePassword {
        /// Read current and new password from stdin, one per line
        #[arg(long)]
        password_stdin: bool,
    },
    /// Refresh and show the campaign dashboard
    Dashboard {
        /// Number of campaigns to list (default from config)
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Manage campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum CampaignCommands {
    /// List campaigns
    List {
        #[arg(long, value_parser = status_parser())]
        status: Option<CampaignStatus>,

        #[arg(long, value_parser = platform_parser())]
        platform: Option<String>,

        #[arg(long)]
        skip: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,

        /// Only campaigns starting on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<chrono::NaiveDate>,

        /// Only campaigns starting on or before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        to: Option<chrono::NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one campaign
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Create a campaign
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, value_parser = platform_parser())]
        platform: String,

        /// Budget amount
        #[arg(long)]
        budget: f64,

        #[arg(long, default_value = "daily", value_parser = PossibleValuesParser::new(BUDGET_TYPES.iter().copied()))]
        budget_type: String,

        /// Start date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_datetime)]
        start: chrono::NaiveDateTime,

        /// End date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_datetime)]
        end: Option<chrono::NaiveDateTime>,

        #[arg(long, value_parser = status_parser())]
        status: Option<CampaignStatus>,

        /// Target audience description
        #[arg(long)]
        audience: Option<String>,

        /// Keyword (repeatable)
        #[arg(long = "keyword", value_name = "KEYWORD")]
        keywords: Vec<String>,

        #[arg(long)]
        bid_strategy: Option<String>,

        #[arg(long)]
        creative_url: Option<String>,
    },
    /// Update fields of a campaign
    Update {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Budget amount
        #[arg(long)]
        budget: Option<f64>,

        #[arg(long, value_parser = status_parser())]
        status: Option<CampaignStatus>,

        /// End date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: Option<chrono::NaiveDate>,

        /// Target audience description
        #[arg(long)]
        audience: Option<String>,
    },
    /// Delete a campaign
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Pause a campaign
    Pause {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Activate a campaign
    Activate {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Show performance metrics of a campaign
    Metrics {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Summarize all campaigns on one platform
    Summary {
        #[arg(value_name = "PLATFORM", value_parser = platform_parser())]
        platform: String,
    },
    /// Replace all campaigns with sample data and show the dashboard
    PopulateSample,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        api_url,
        verbose: _,
    } = cli;

    // config commands must work without a valid config or session
    if let Commands::Config { command } = command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let mut ctx = AppContext::load(config, api_url.as_deref())?;

    match command {
        Commands::Login {
            username,
            password_stdin,
            password,
        } => {
            let source = match (password_stdin, password) {
                (true, _) => SecretSource::Stdin,
                (false, Some(password)) => SecretSource::Value(password),
                (false, None) => SecretSource::Prompt,
            };
            commands::auth::login(&mut ctx, username, source).await
        }
        Commands::Logout => commands::auth::logout(&mut ctx),
        Commands::Whoami => commands::auth::whoami(&mut ctx).await,
        Commands::Register {
            email,
            name,
            role,
            password_stdin,
        } => {
            let source = if password_stdin {
                SecretSource::Stdin
            } else {
                SecretSource::Prompt
            };
            commands::auth::register(&mut ctx, email, name, role, source).await
        }
        Commands::ChangePassword { password_stdin } => {
            commands::auth::change_password(&mut ctx, password_stdin).await
        }
        Commands::Dashboard { rows } => commands::dashboard::run(&mut ctx, rows).await,
        Commands::Campaigns { command } => dispatch_campaigns(&mut ctx, command).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

async fn dispatch_campaigns(ctx: &mut AppContext, command: CampaignCommands) -> Result<()> {
    use commands::campaigns;

    match command {
        CampaignCommands::List {
            status,
            platform,
            skip,
            limit,
            from,
            to,
            json,
        } => {
            let query = CampaignQuery {
                skip,
                limit,
                status,
                platform,
                start_date_from: from,
                start_date_to: to,
            };
            campaigns::list(ctx, query, json).await
        }
        CampaignCommands::Show { id } => campaigns::show(ctx, &id).await,
        CampaignCommands::Create {
            name,
            platform,
            budget,
            budget_type,
            start,
            end,
            status,
            audience,
            keywords,
            bid_strategy,
            creative_url,
        } => {
            let draft = CampaignDraft {
                name,
                platform,
                budget_type,
                budget_amount: budget,
                start_date: start,
                end_date: end,
                status,
                target_audience: audience,
                keywords,
                bid_strategy,
                creative_url,
            };
            campaigns::create(ctx, draft).await
        }
        CampaignCommands::Update {
            id,
            name,
            budget,
            status,
            end,
            audience,
        } => {
            let update = CampaignUpdate {
                name,
                budget_amount: budget,
                status,
                end_date: end,
                target_audience: audience,
            };
            campaigns::update(ctx, &id, update).await
        }
        CampaignCommands::Delete { id } => campaigns::delete(ctx, &id).await,
        CampaignCommands::Pause { id } => campaigns::pause(ctx, &id).await,
        CampaignCommands::Activate { id } => campaigns::activate(ctx, &id).await,
        CampaignCommands::Metrics { id } => campaigns::metrics(ctx, &id).await,
        CampaignCommands::Summary { platform } => campaigns::summary(ctx, &platform).await,
        CampaignCommands::PopulateSample => campaigns::populate_sample(ctx).await,
    }
}
