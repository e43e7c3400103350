// Entry point and high-level CLI flow.
//
// The binary is an interactive analysis session over the payment datasets:
// - Option [1] opens the database, loads and canonicalizes every dataset,
//   and loads the boundary reference.
// - Option [2] prints the dashboard overview (quick statistics, latest
//   heatmap, all-time trend) and exports its tables and chart specs.
// - Option [3] walks a case study: pick the study, then a year and quarter
//   drawn from its primary dataset, then preview and export each section.
mod aggregate;
mod charts;
mod error;
mod frame;
mod geo;
mod loader;
mod normalize;
mod output;
mod schema;
mod store;
mod util;
mod views;

use clap::Parser;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use geo::GeoReference;
use loader::Loader;
use normalize::AliasTable;
use schema::col;
use store::Store;
use views::{CaseStudy, View};

/// Command-line configuration. Navigation stays interactive; the flags only
/// point the session at its inputs and outputs.
#[derive(Parser, Debug)]
#[command(name = "pulse_insights")]
#[command(about = "Terminal insight reports over digital-payment aggregates", long_about = None)]
struct Args {
    /// SQLite database holding the aggregated payment tables
    #[arg(short, long, default_value = "phonepe_pulse.db")]
    database: PathBuf,

    /// GeoJSON file with state boundaries (NAME_1 name property)
    #[arg(short, long, default_value = "Indian_States.geojson")]
    geojson: PathBuf,

    /// Extra region-name aliases merged over the built-ins (JSON)
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Directory for exported tables and chart specifications
    #[arg(short, long, default_value = "insights_out")]
    out_dir: PathBuf,
}

// Simple in-memory app state so we only open the database and canonicalize
// the datasets once but can explore any number of views in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { session: None }));

struct AppState {
    session: Option<Session>,
}

/// Everything option [1] produces: the memoizing loader and the boundary
/// reference, shared by every later view.
struct Session {
    loader: Loader,
    geo: GeoReference,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// The prompt is reused for both the main menu and simple numeric inputs.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the section menu after a view has
/// been rendered.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Section Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Numbered pick over a list of periods (years or quarters). `None` means
/// there was nothing to pick from.
fn pick_period(label: &str, options: &[i64]) -> Option<i64> {
    if options.is_empty() {
        return None;
    }
    println!("Select {}:", label);
    for (i, value) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, value);
    }
    loop {
        match read_choice().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Some(options[n - 1]),
            _ => println!(
                "Invalid choice. Please enter a number between 1 and {}.",
                options.len()
            ),
        }
    }
}

/// Handle option [1]: open the database, load every dataset, and load the
/// boundary reference.
///
/// The session lands in `APP_STATE` even when the database fails to open:
/// the store then serves every dataset empty, and the boundary reference
/// loads independently of it. Datasets that fail to load are served empty
/// and reported here rather than aborting the session.
fn handle_load(args: &Args) {
    let mut aliases = AliasTable::default();
    if let Some(path) = &args.aliases {
        if let Err(e) = aliases.merge_json_file(path) {
            eprintln!(
                "Failed to read alias file {}: {} (continuing with built-ins)",
                path.display(),
                e
            );
        }
    }

    let store = match Store::open(&args.database) {
        Ok(store) => store,
        Err(e) => {
            eprintln!(
                "Failed to open database {}: {} (continuing without it)",
                args.database.display(),
                e
            );
            Store::unavailable()
        }
    };

    let geo = GeoReference::load(&args.geojson, &aliases);
    let loader = Loader::new(store, aliases);

    println!("Processing datasets... ({})", args.database.display());
    let reports = loader.load_all();
    let mut loaded = 0usize;
    for report in &reports {
        if report.degraded {
            println!("  {}: unavailable, served empty", report.dataset.key());
        } else {
            println!(
                "  {}: {} rows",
                report.dataset.key(),
                util::format_int(report.rows as i64)
            );
            loaded += 1;
        }
    }
    println!("Note: {} of {} datasets loaded.", loaded, reports.len());

    if geo.feature_count() == 0 {
        println!("Note: boundary reference unavailable; maps will have no regions to match.");
    } else {
        println!(
            "Boundary reference: {} features, {} canonical keys.",
            geo.feature_count(),
            geo.keys().len()
        );
        let canonical_file = args.out_dir.join("states_canonical.geojson");
        if let Err(e) = geo.export(&canonical_file) {
            eprintln!("Write error: {}", e);
        }

        // Surface region keys that would silently miss the map join.
        let mut unmatched: Vec<String> = Vec::new();
        for report in &reports {
            let frame = loader.frame(report.dataset);
            if frame.column_index(col::STATE).is_some() {
                if let Ok(states) = frame.column_strings(col::STATE) {
                    unmatched.extend(geo.unmatched(states.iter().map(String::as_str)));
                }
            }
        }
        unmatched.sort_unstable();
        unmatched.dedup();
        if !unmatched.is_empty() {
            println!(
                "Note: {} region keys have no boundary match: {}",
                unmatched.len(),
                unmatched.join(", ")
            );
        }
    }
    println!("");

    let mut state = APP_STATE.lock().unwrap();
    state.session = Some(Session { loader, geo });
}

/// Handle option [2]: quick statistics plus the dashboard view.
///
/// This function is intentionally side-effectful:
/// - writes one CSV and one chart-spec JSON per section,
/// - writes a quick-stats JSON,
/// - and prints Markdown previews of each table to the console.
fn handle_dashboard(args: &Args) {
    let state = APP_STATE.lock().unwrap();
    let Some(session) = state.session.as_ref() else {
        println!("Error: No data loaded. Please load the datasets first (option 1).\n");
        return;
    };

    let stats = views::quick_stats(&session.loader);
    println!("Quick Statistics:");
    println!(
        "  Total Transactions: {}",
        util::format_scaled(stats.total_transaction_count, 1e9, "B")
    );
    println!(
        "  Total Amount: ₹{}",
        util::format_scaled(stats.total_transaction_amount, 1e12, "T")
    );
    println!(
        "  Registered Users: {}",
        util::format_scaled(stats.total_registered_users, 1e6, "M")
    );
    println!(
        "  Insurance Amount: ₹{}\n",
        util::format_scaled(stats.total_insurance_amount, 1e9, "B")
    );
    if let Err(e) = output::write_json(&args.out_dir.join("quick_stats.json"), &stats) {
        eprintln!("Write error: {}", e);
    }

    match views::dashboard(&session.loader, &session.geo) {
        Ok(view) => render_view(&view, args, "dashboard"),
        Err(e) => eprintln!("Failed to build the dashboard: {}", e),
    }
}

/// Handle option [3]: select a case study and a period, then render it.
fn handle_case_studies(args: &Args) {
    let state = APP_STATE.lock().unwrap();
    let Some(session) = state.session.as_ref() else {
        println!("Error: No data loaded. Please load the datasets first (option 1).\n");
        return;
    };

    println!("Select Case Study:");
    for (i, study) in CaseStudy::ALL.iter().enumerate() {
        println!("[{}] {}", i + 1, study.title());
    }
    let study = loop {
        match read_choice().parse::<usize>() {
            Ok(n) if (1..=CaseStudy::ALL.len()).contains(&n) => break CaseStudy::ALL[n - 1],
            _ => println!(
                "Invalid choice. Please enter a number between 1 and {}.",
                CaseStudy::ALL.len()
            ),
        }
    };

    let dataset = study.dataset();
    let years = views::years(&session.loader, dataset);
    let Some(year) = pick_period("Year", &years) else {
        println!("No data available for {}.\n", study.title());
        return;
    };
    let quarters = views::quarters(&session.loader, dataset, year);
    let Some(quarter) = pick_period("Quarter", &quarters) else {
        println!("No data available for {}.\n", study.title());
        return;
    };

    println!("");
    match views::case_study(study, &session.loader, &session.geo, year, quarter) {
        Ok(view) => render_view(&view, args, study.slug()),
        Err(e) => eprintln!("Failed to build {}: {}", study.title(), e),
    }
}

/// Preview every section of a view and export its table and chart spec.
fn render_view(view: &View, args: &Args, prefix: &str) {
    println!("{}\n", view.title);
    if let Some(notice) = &view.notice {
        println!("{}\n", notice);
        return;
    }
    for (i, section) in view.sections.iter().enumerate() {
        println!("{}. {}", i + 1, section.heading);
        if let Some(chart) = &section.chart {
            println!("({})", chart.title());
        }
        output::preview_frame(&section.table, 5);

        let table_file = format!("{}_{}.csv", prefix, section.slug);
        if let Err(e) = output::write_csv(&args.out_dir.join(&table_file), &section.table) {
            eprintln!("Write error: {}", e);
        }
        match &section.chart {
            Some(chart) => {
                let chart_file = format!("{}_{}_chart.json", prefix, section.slug);
                if let Err(e) = output::write_json(&args.out_dir.join(&chart_file), chart) {
                    eprintln!("Write error: {}", e);
                }
                println!(
                    "(Table exported to {}, chart spec to {})\n",
                    table_file, chart_file
                );
            }
            None => {
                println!("(No data for the chart; table exported to {})\n", table_file);
            }
        }
    }
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    if let Err(e) = std::fs::create_dir_all(&args.out_dir) {
        eprintln!(
            "Failed to create output directory {}: {}",
            args.out_dir.display(),
            e
        );
    }
    loop {
        println!("Select Analysis Section:");
        println!("[1] Load the datasets");
        println!("[2] Dashboard Overview");
        println!("[3] Case Studies\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&args);
            }
            "2" => {
                println!("");
                handle_dashboard(&args);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!("");
                handle_case_studies(&args);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2, or 3.\n");
            }
        }
    }
}
