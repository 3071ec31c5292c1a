mod cli;
mod lib;
mod load;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{App, Arg, ArgMatches};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::session::Dashboard;
use lib::{date::Period, entry::Selection, error::Record};

fn main() {
    let matches = App::new("billdash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Billing dashboard over the sheets of a workbook")
        .arg(
            Arg::with_name("WORKBOOK")
                .help("Workbook holding the billing calendar and the deduction sheets")
                .default_value(load::DEFAULT_WORKBOOK)
                .index(1),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("START..END")
                .help("Date range, YYYY-MM-DD or DD/MM/YYYY (default: all the data)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("segment")
                .short("s")
                .long("segment")
                .value_name("SEGMENT")
                .help("Segment to select, or 'Todos'")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("coordinator")
                .short("c")
                .long("coordinator")
                .value_name("COORDINATOR")
                .help("Coordinator to select, or 'Todos'")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("plot")
                .long("plot")
                .value_name("DIR")
                .help("Also write the charts as SVG files into DIR")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("options")
                .long("options")
                .help("List the available filter choices and exit"),
        )
        .arg(
            Arg::with_name("interactive")
                .short("i")
                .long("interactive")
                .help("Read filter commands from stdin"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Debug logging"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));
    let errs = match execute(&matches) {
        Ok(errs) => errs,
        Err(e) => {
            let mut errs = Record::new();
            errs.make("Output failed").text(e);
            errs
        }
    };
    if !errs.is_empty() {
        eprint!("{}", errs);
    }
    if errs.is_fatal() {
        process::exit(1);
    }
}

/// Priority: RUST_LOG > --verbose > warnings only
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(io::stderr),
        )
        .init();
}

fn execute(matches: &ArgMatches) -> io::Result<Record> {
    let workbook = matches
        .value_of("WORKBOOK")
        .unwrap_or(load::DEFAULT_WORKBOOK);
    let mut dash = Dashboard::new(PathBuf::from(workbook));
    debug!("workbook {}", workbook);
    if let Some(text) = matches.value_of("period") {
        match Period::parse(text) {
            Ok(period) => dash.set_period(Some(period)),
            Err(e) => {
                let mut errs = Record::new();
                cli::range_error(&mut errs, &e);
                return Ok(errs);
            }
        }
    }
    if let Some(label) = matches.value_of("segment") {
        dash.set_segment(Selection::parse(label));
    }
    if let Some(label) = matches.value_of("coordinator") {
        dash.set_coordinator(Selection::parse(label));
    }
    dash.set_plot_dir(matches.value_of("plot").map(PathBuf::from));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if matches.is_present("options") {
        return dash.options(&mut out);
    }
    let errs = dash.run(&mut out)?;
    if matches.is_present("interactive") {
        eprint!("{}", errs);
        let stdin = io::stdin();
        let failed = dash.interact(stdin.lock(), &mut out)? + usize::from(errs.is_fatal());
        let mut summary = Record::new();
        if failed > 0 {
            summary
                .make("Session had failures")
                .text(format!("{} request(s) ended on an error", failed));
        }
        return Ok(summary);
    }
    Ok(errs)
}
