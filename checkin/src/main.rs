//! `turnstile` - ticket check-in from the command line.
//!
//! Configuration comes from the environment (and a `.env` file, if present):
//! `TURNSTILE_API_URL`, `TURNSTILE_TOKEN`, `TURNSTILE_TENANT_ID`,
//! `TURNSTILE_ROLE`, `TURNSTILE_TENANT_HEADER`, `TURNSTILE_TIMEOUT_SECS`,
//! `TURNSTILE_PAGE_SIZE`.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_checkin::{
    CheckInAction, CheckInEnvironment, CheckInReducer, CheckInState, ClientConfig, EventId,
    HttpTicketApi, Outcome, Session, VerificationPhase,
};
use turnstile_core::environment::SystemClock;
use turnstile_runtime::Store;

type CheckInStore =
    Store<CheckInState, CheckInAction, CheckInEnvironment<HttpTicketApi>, CheckInReducer<HttpTicketApi>>;

#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(about = "Verify and check in event tickets", long_about = None)]
struct Cli {
    /// Base URL of the ticket API
    #[arg(long, env = "TURNSTILE_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List ongoing and upcoming events
    Events,
    /// Verify and check in one ticket
    Verify {
        /// Event to check against (default: first listed)
        #[arg(long)]
        event: Option<String>,
        /// Ticket code
        ticket: String,
    },
    /// Show attendance counts and one page of attendees
    Summary {
        /// Event to summarise (default: first listed)
        #[arg(long)]
        event: Option<String>,
        /// 1-based attendee page
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Read ticket codes from stdin, one per line
    Scan {
        /// Event to check against (default: first listed)
        #[arg(long)]
        event: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile=info,turnstile_checkin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let session = Session::from_env()?.ok_or_else(|| {
        anyhow!("not signed in: set TURNSTILE_TOKEN and TURNSTILE_TENANT_ID")
    })?;
    tracing::debug!(?session, api_url = %config.api_url, "Starting");

    let api = HttpTicketApi::new(&config).context("invalid client configuration")?;
    let env = CheckInEnvironment::new(api, Some(session), Arc::new(SystemClock));
    let store = Store::new(CheckInState::new(config.page_size), CheckInReducer::new(), env);
    let timeout = config.timeout + Duration::from_secs(1);

    let code = match cli.command {
        Command::Events => {
            load_events(&store, timeout).await?;
            let state = store.state(Clone::clone).await;
            print_events(&state);
            ExitCode::SUCCESS
        },
        Command::Verify { event, ticket } => {
            load_events(&store, timeout).await?;
            select_event(&store, event, timeout).await?;
            dispatch(&store, CheckInAction::QrScanned { payload: ticket }, timeout).await?;

            let state = store.state(Clone::clone).await;
            print_verification(&state);
            match state.verification.result() {
                Some(result) if result.outcome.outcome == Outcome::Success => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        },
        Command::Summary { event, page } => {
            load_events(&store, timeout).await?;
            select_event(&store, event, timeout).await?;
            dispatch(&store, CheckInAction::OpenSummary, timeout).await?;
            dispatch(&store, CheckInAction::SetSummaryPage { page }, timeout).await?;

            let state = store.state(Clone::clone).await;
            print_summary(&state);
            if state.summary.error.is_some() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        },
        Command::Scan { event } => {
            load_events(&store, timeout).await?;
            select_event(&store, event, timeout).await?;
            scan(&store, timeout).await?;
            ExitCode::SUCCESS
        },
    };

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(code)
}

/// Send an action and wait until the responses it triggers are reduced
async fn dispatch(store: &CheckInStore, action: CheckInAction, timeout: Duration) -> Result<()> {
    let mut handle = store.send(action).await?;
    handle.wait_with_timeout(timeout).await?;
    Ok(())
}

async fn load_events(store: &CheckInStore, timeout: Duration) -> Result<()> {
    dispatch(store, CheckInAction::LoadEvents, timeout).await?;

    if let Some(error) = store.state(|s| s.events_error.clone()).await {
        bail!("could not load events: {error}");
    }
    Ok(())
}

async fn select_event(store: &CheckInStore, event: Option<String>, timeout: Duration) -> Result<()> {
    if let Some(id) = event {
        let event_id = EventId::new(id);
        dispatch(store, CheckInAction::SelectEvent { event_id: event_id.clone() }, timeout).await?;

        if store.state(|s| s.selected_event.clone()).await.as_ref() != Some(&event_id) {
            bail!("event `{event_id}` is not ongoing or upcoming");
        }
    }

    match store.state(|s| s.selected().cloned()).await {
        Some(event) => {
            eprintln!("Checking tickets for {} ({})", event.name, event.id);
            Ok(())
        },
        None => bail!("no ongoing or upcoming events"),
    }
}

async fn scan(store: &CheckInStore, timeout: Duration) -> Result<()> {
    eprintln!("Enter ticket codes; :confirm :summary :next :prev :event ID :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let action = match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            (":quit" | ":q", _) => break,
            (":confirm", _) => CheckInAction::ConfirmCheckIn,
            (":summary", _) => CheckInAction::OpenSummary,
            (":next", _) => CheckInAction::NextPage,
            (":prev", _) => CheckInAction::PreviousPage,
            (":close", _) => CheckInAction::CloseSummary,
            (":event", id) if !id.is_empty() => CheckInAction::SelectEvent {
                event_id: EventId::new(id),
            },
            (command, _) if command.starts_with(':') => {
                eprintln!("unknown command `{command}`");
                continue;
            },
            _ if line.is_empty() => continue,
            _ => CheckInAction::QrScanned {
                payload: line.to_string(),
            },
        };

        let shows_summary = matches!(
            action,
            CheckInAction::OpenSummary | CheckInAction::NextPage | CheckInAction::PreviousPage
        );
        dispatch(store, action, timeout).await?;

        let state = store.state(Clone::clone).await;
        if shows_summary {
            print_summary(&state);
        } else {
            if let Some(event) = state.selected() {
                eprintln!("[{}]", event.name);
            }
            print_verification(&state);
        }
    }

    Ok(())
}

fn print_events(state: &CheckInState) {
    if state.events.is_empty() {
        println!("No ongoing or upcoming events.");
        return;
    }
    for event in &state.events {
        let marker = if state.selected_event.as_ref() == Some(&event.id) { '*' } else { ' ' };
        println!("{marker} {}  {}", event.id, event.name);
    }
}

fn print_verification(state: &CheckInState) {
    match &state.verification {
        VerificationPhase::Completed(result) => {
            let label = match result.outcome.outcome {
                Outcome::Success => "VALID",
                Outcome::Invalid => "INVALID",
            };
            println!("{label}  {}  {}", result.ticket_code, result.outcome.message);
            if result.outcome.is_success() {
                println!("       (:confirm to check in again)");
            }
        },
        VerificationPhase::Verifying { ticket_code, .. } => println!("...    {ticket_code}  still verifying"),
        VerificationPhase::Idle | VerificationPhase::Scanning => {},
    }
}

fn print_summary(state: &CheckInState) {
    let summary = &state.summary;

    if let Some(error) = &summary.error {
        println!("Could not load summary: {error}");
    }
    let Some(counts) = summary.summary else {
        return;
    };

    println!(
        "Total {}  Checked in {}  Remaining {}",
        counts.total_tickets, counts.checked_in, counts.remaining
    );
    println!(
        "Attendees (page {} of {})",
        summary.pagination.page(),
        summary.total_pages().max(1)
    );
    for attendee in summary.page() {
        println!(
            "  {:<24} {:<28} {}/{} checked in",
            attendee.name, attendee.email, attendee.checked_in_count, attendee.quantity
        );
    }
}
