// Entry point and interactive report flow.
//
// The terminal menu mirrors the report page controls:
// - Options [1]-[4] mutate the filter; each mutation immediately re-fetches
//   (or re-filters, for the text query) and re-renders, same as the page.
// - Options [6]/[7] export documents and show the print view.
// - Option [8] submits a check-in/check-out event the way the kiosks do.
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use sfms_report::client::ApiClient;
use sfms_report::types::{CheckAction, Facility, FilterState, Granularity};
use sfms_report::util::{format_int, parse_date_safe};
use sfms_report::view::ReportView;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "sfms-report",
    about = "Check-in reports for the sports facility management backend"
)]
struct Cli {
    /// Backend base URL.
    #[arg(long, default_value = "http://localhost:8000/")]
    base_url: Url,

    /// Directory for exported documents and the rendered chart.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Start of the report range (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the report range (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Anti-forgery token echoed on check-event submissions.
    #[arg(long)]
    csrf_token: Option<String>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    prompt("Enter choice: ")
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn set_range(view: &mut ReportView) {
    let from = prompt("From (YYYY-MM-DD): ");
    let to = prompt("To (YYYY-MM-DD): ");
    match (parse_date_safe(Some(&from)), parse_date_safe(Some(&to))) {
        (Some(f), Some(t)) => {
            view.filter.from = f;
            view.filter.to = t;
        }
        _ => println!("Invalid date. Keeping the current range.\n"),
    }
}

fn set_facility(view: &mut ReportView) {
    let input = prompt("Facility (all/outdoor/badminton/pool/track): ");
    if input == "all" {
        view.filter.facility = None;
    } else if let Some(f) = Facility::from_key(&input) {
        view.filter.facility = Some(f);
    } else {
        println!("Invalid facility. Keeping the current selection.\n");
    }
}

fn set_granularity(view: &mut ReportView) {
    let input = prompt("Granularity (hour/day/month/year): ");
    match Granularity::from_key(&input) {
        Some(g) => view.filter.granularity = g,
        None => println!("Invalid granularity. Keeping the current value.\n"),
    }
}

/// Fetch for the current filter and show the refreshed report.
fn refresh_and_render(view: &mut ReportView, client: &ApiClient) {
    match view.refresh(client) {
        Ok(report) => {
            println!(
                "\nFetched {} records ({} kept).",
                format_int(report.total_rows as i64),
                format_int(report.parsed_rows as i64)
            );
            if report.parse_errors > 0 {
                println!(
                    "Note: {} records skipped due to parse errors.",
                    format_int(report.parse_errors as i64)
                );
            }
            view.render_summary();
        }
        Err(e) => eprintln!("Render failed: {}\n", e),
    }
}

fn handle_export(view: &ReportView, out_dir: &Path) {
    match view.export_all(out_dir) {
        Ok(paths) => {
            println!("\nExported:");
            for p in paths {
                println!("  {}", p.display());
            }
            println!();
        }
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

/// Submit a check-in/check-out event, surfacing any rejection message the
/// server sends back.
fn handle_check_event(client: &ApiClient) {
    let facility = match Facility::from_key(&prompt("Facility (outdoor/badminton/pool/track): ")) {
        Some(f) => f,
        None => {
            println!("Invalid facility.\n");
            return;
        }
    };
    let action = match CheckAction::from_key(&prompt("Action (in/out): ")) {
        Some(a) => a,
        None => {
            println!("Invalid action.\n");
            return;
        }
    };
    match client.post_check_event(facility, action) {
        Ok(ack) if ack.ok => {
            println!(
                "Recorded {} {} (event id {}).\n",
                facility.key(),
                action.key(),
                ack.id.map(|i| i.to_string()).unwrap_or_else(|| "?".into())
            );
        }
        Ok(ack) => {
            let reason = ack
                .message
                .or(ack.error)
                .unwrap_or_else(|| "rejected".to_string());
            println!("Check event not recorded: {}\n", reason);
        }
        Err(e) => eprintln!("Check event failed: {}\n", e),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let today = Local::now().date_naive();
    let filter = FilterState::new(cli.from.unwrap_or(today), cli.to.unwrap_or(today));
    let client = ApiClient::new(cli.base_url.clone(), cli.csrf_token.clone());
    let mut view = ReportView::new(filter, cli.out_dir.join("checkin_chart.html"));

    // Initial load, same as the page does on open.
    refresh_and_render(&mut view, &client);

    loop {
        println!("[1] Date range  [2] Facility  [3] Granularity  [4] Name filter");
        println!("[5] Refresh  [6] Export documents  [7] Print view  [8] Record check event  [0] Exit\n");
        match read_choice().as_str() {
            "1" => {
                set_range(&mut view);
                refresh_and_render(&mut view, &client);
            }
            "2" => {
                set_facility(&mut view);
                refresh_and_render(&mut view, &client);
            }
            "3" => {
                set_granularity(&mut view);
                refresh_and_render(&mut view, &client);
            }
            "4" => {
                // The text query filters the rows already fetched; no round
                // trip, same as typing in the search box.
                view.filter.query = prompt("Name filter (blank to clear): ");
                match view.apply_filters() {
                    Ok(()) => view.render_summary(),
                    Err(e) => eprintln!("Render failed: {}\n", e),
                }
            }
            "5" => refresh_and_render(&mut view, &client),
            "6" => handle_export(&view, &cli.out_dir),
            "7" => view.print_view(),
            "8" => handle_check_event(&client),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-8.\n"),
        }
    }
    Ok(())
}
