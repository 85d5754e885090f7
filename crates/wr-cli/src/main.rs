//! `wr-report`: browse ward problem reports from the command line

mod render;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use render::Format;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wr_core::{AppContext, DisclosureSurface, DrilldownQuery, Page, ReportConfig, ReportSession, SessionResult};
use wr_model::{DocumentId, FlatProblemRow, GroupKey, IssueTag, Language, RequestId, Ward, WardGroupKey, WardId};

fn request_arg() -> Arg {
    Arg::new("request")
        .required(true)
        .help("Request identifier")
}

fn page_args() -> [Arg; 2] {
    [
        Arg::new("page")
            .long("page")
            .value_parser(value_parser!(usize))
            .help("Page to show, from 1"),
        Arg::new("page-size")
            .long("page-size")
            .value_parser(value_parser!(usize))
            .help("Rows per page; defaults to the configured page size"),
    ]
}

fn cli() -> Command {
    Command::new("wr-report")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ward problem report browser")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .help("Reporting backend base URL"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .global(true)
                .help("Description language (en or hindi)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(Command::new("requests").about("List requests"))
        .subcommand(Command::new("users").about("List users"))
        .subcommand(
            Command::new("details")
                .about("Request details with its documents")
                .arg(request_arg()),
        )
        .subcommand(
            Command::new("document")
                .about("One document of a request")
                .arg(request_arg())
                .arg(Arg::new("document").required(true).help("Document identifier")),
        )
        .subcommand(
            Command::new("common")
                .about("Common-problem groups")
                .arg(request_arg()),
        )
        .subcommand(
            Command::new("wards")
                .about("Problem groups per ward")
                .arg(request_arg()),
        )
        .subcommand(
            Command::new("analysis")
                .about("Per-ward issue analytics")
                .arg(request_arg())
                .arg(
                    Arg::new("min")
                        .long("min")
                        .value_parser(value_parser!(i64))
                        .help("Lowest numeric ward to show"),
                )
                .arg(
                    Arg::new("max")
                        .long("max")
                        .value_parser(value_parser!(i64))
                        .help("Highest numeric ward to show"),
                ),
        )
        .subcommand(
            Command::new("tag")
                .about("Problems carrying an issue tag")
                .arg(request_arg())
                .arg(Arg::new("issue").required(true).help("Issue tag"))
                .args(page_args()),
        )
        .subcommand(
            Command::new("group")
                .about("Members of a common-problem group")
                .arg(request_arg())
                .arg(Arg::new("group").required(true).help("Group identifier"))
                .args(page_args()),
        )
        .subcommand(
            Command::new("ward-group")
                .about("Members of a ward group")
                .arg(request_arg())
                .arg(Arg::new("ward-id").required(true).help("Ward group identifier"))
                .arg(Arg::new("summary").required(true).help("Group summary"))
                .args(page_args()),
        )
        .subcommand(
            Command::new("ward-issue")
                .about("Problems of one issue in one ward")
                .arg(request_arg())
                .arg(Arg::new("ward").required(true).help("Ward"))
                .arg(Arg::new("issue").required(true).help("Issue tag"))
                .args(page_args()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ReportConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ReportConfig::from_path(path)?,
        None => ReportConfig::new(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(url) = matches.get_one::<String>("backend") {
        config = config.with_backend_url(url.clone());
    }
    if let Some(lang) = matches.get_one::<String>("lang") {
        config = config.with_language(lang.parse::<Language>()?);
    }
    config.validate()?;
    Ok(config)
}

fn string<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{name}>"))
}

/// Current page, or the one asked for on the command line
fn select_page<Q: DrilldownQuery>(
    surface: &DisclosureSurface<Q>,
    args: &ArgMatches,
) -> SessionResult<Page<FlatProblemRow>> {
    let page = args.get_one::<usize>("page").copied();
    let page_size = args.get_one::<usize>("page-size").copied();
    if page.is_none() && page_size.is_none() {
        return surface.page();
    }
    let page_size = page_size
        .or_else(|| surface.cursor().map(|c| c.page_size))
        .unwrap_or(1);
    surface.paginate(page.unwrap_or(1), page_size)
}

async fn report<W: Write>(
    session: &ReportSession,
    name: &str,
    args: &ArgMatches,
    format: Format,
    out: &mut W,
) -> anyhow::Result<()> {
    match name {
        "common" => render::common(out, format, &*session.common_problems().await?),
        "wards" => render::wards(out, format, &*session.ward_report().await?),
        "analysis" => {
            let view = session.analysis().await?;
            let min = args.get_one::<i64>("min").copied();
            let max = args.get_one::<i64>("max").copied();
            let entries = match (view.bounds(), min.or(max)) {
                (Some(bounds), Some(_)) => session.set_ward_range(
                    min.unwrap_or(bounds.min),
                    max.unwrap_or_else(|| bounds.effective_max()),
                )?,
                _ => session.filtered_analysis()?,
            };
            render::analysis(out, format, &entries)
        }
        "tag" => {
            let issue = IssueTag::new(string(args, "issue")?);
            session.open_tag(&issue).await?;
            let page = select_page(session.tag_surface(), args)?;
            render::page(out, format, &format!("tag {issue}"), &page)
        }
        "group" => {
            let key = GroupKey::new(string(args, "group")?);
            session.open_group(&key).await?;
            let page = select_page(session.group_surface(), args)?;
            render::page(out, format, &format!("group {key}"), &page)
        }
        "ward-group" => {
            let key = WardGroupKey {
                ward_id: WardId::new(string(args, "ward-id")?),
                summary: string(args, "summary")?.to_string(),
            };
            session.open_ward_group(&key).await?;
            let page = select_page(session.ward_group_surface(), args)?;
            render::page(out, format, &format!("ward group {}", key.ward_id), &page)
        }
        "ward-issue" => {
            let ward = Ward::new(string(args, "ward")?);
            let issue = IssueTag::new(string(args, "issue")?);
            session.analysis().await?;
            session.select_ward(&ward)?;
            session.select_issue_slice(&issue).await?;
            let page = select_page(session.ward_issue_surface(), args)?;
            render::page(out, format, &format!("ward {ward} {issue}"), &page)
        }
        other => bail!("unknown command {other}"),
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let format = if matches.get_flag("json") {
        Format::Json
    } else {
        Format::Text
    };
    let config = load_config(matches)?;
    tracing::debug!(backend = %config.backend_url, "connecting");
    let ctx = AppContext::connect(config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        Some(("requests", _)) => render::requests(&mut out, format, &ctx.client().list_requests().await?),
        Some(("users", _)) => {
            let users = ctx.client().list_users().await?;
            if !users.is_complete() {
                tracing::warn!(skipped = users.skipped.len(), "some users could not be read");
            }
            render::users(&mut out, format, &users.items)
        }
        Some(("details", args)) => {
            let request_id = RequestId::new(string(args, "request")?);
            render::details(&mut out, format, &ctx.client().request_details(&request_id).await?)
        }
        Some(("document", args)) => {
            let request_id = RequestId::new(string(args, "request")?);
            let document_id = DocumentId::new(string(args, "document")?);
            let document = ctx.client().document_details(&request_id, &document_id).await?;
            render::document(&mut out, format, &document)
        }
        Some((name, args)) => {
            let session = ReportSession::new(ctx, RequestId::new(string(args, "request")?));
            report(&session, name, args, format, &mut out).await
        }
        None => bail!("no command given"),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    if let Err(e) = run(&matches).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
