//! Application context and the interactive command loop
//!
//! A `Dashboard` owns the cache of loaded workbooks and the current filter
//! settings. Each run re-executes the whole pipeline; only the workbook read
//! is memoized.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::{self, plot};
use crate::lib::{
    dataset::Dataset,
    date::{Period, RangeError},
    entry::Selection,
    error::Record,
    filter::Criteria,
    report::{Outcome, Report},
};
use crate::load::{self, cache::Cache, error::LoadError};

/// How a workbook file becomes a dataset
pub type Loader = fn(&Path) -> Result<Dataset, LoadError>;

pub struct Dashboard {
    path: PathBuf,
    load: Loader,
    cache: Cache<Dataset>,
    /// `None` is the full span of the data
    period: Option<Period>,
    segment: Selection,
    coordinator: Selection,
    plot_dir: Option<PathBuf>,
}

impl Dashboard {
    pub fn new(path: PathBuf) -> Self {
        Self::with_loader(path, load::open_dataset)
    }

    pub fn with_loader(path: PathBuf, load: Loader) -> Self {
        Self {
            path,
            load,
            cache: Cache::new(),
            period: None,
            segment: Selection::All,
            coordinator: Selection::All,
            plot_dir: None,
        }
    }

    pub fn set_period(&mut self, period: Option<Period>) {
        self.period = period;
    }

    pub fn set_segment(&mut self, segment: Selection) {
        self.segment = segment;
    }

    pub fn set_coordinator(&mut self, coordinator: Selection) {
        self.coordinator = coordinator;
    }

    pub fn set_plot_dir(&mut self, dir: Option<PathBuf>) {
        self.plot_dir = dir;
    }

    /// Back to the full span and no narrowing
    pub fn reset(&mut self) {
        self.period = None;
        self.segment = Selection::All;
        self.coordinator = Selection::All;
    }

    /// Drop the cached dataset so that the next run reads the file again
    pub fn reload(&mut self) {
        if !self.cache.invalidate(&load::source(&self.path)) {
            debug!("nothing cached for {}", self.path.display());
        }
    }

    fn dataset(&mut self) -> Result<Rc<Dataset>, LoadError> {
        let load = self.load;
        self.cache
            .fetch(&load::source(&self.path), |src| load(&src.path))
    }

    /// Current filters, validated against the data bounds
    fn criteria(&self, data: &Dataset) -> Result<Criteria, RangeError> {
        let period = match self.period {
            Some(p) => p.within(data.bounds())?,
            None => data.bounds(),
        };
        Ok(Criteria::new(period)
            .with_segment(self.segment.clone())
            .with_coordinator(self.coordinator.clone()))
    }

    /// One execution of the pipeline, the report goes to `out`
    pub fn run<W>(&mut self, out: &mut W) -> io::Result<Record>
    where
        W: Write,
    {
        let mut errs = Record::new();
        let data = match self.dataset() {
            Ok(data) => data,
            Err(e) => {
                cli::load_error(&mut errs, &e);
                return Ok(errs);
            }
        };
        let criteria = match self.criteria(&data) {
            Ok(crit) => crit,
            Err(e) => {
                cli::range_error(&mut errs, &e);
                return Ok(errs);
            }
        };
        match Report::build(&data, criteria) {
            Outcome::Empty(crit) => cli::empty_view(&mut errs, &crit),
            Outcome::Ready(report) => {
                write!(out, "{}", cli::render_report(&report))?;
                if let Some(dir) = &self.plot_dir {
                    if let Err(e) = plot::render(&report, dir) {
                        warn!("charts not written: {}", e);
                        errs.make("Cannot write charts")
                            .text(format!("{}: {}", dir.display(), e))
                            .hint("check that the directory is writable");
                    }
                }
            }
        }
        Ok(errs)
    }

    /// Print the filter choices of the loaded data
    pub fn options<W>(&mut self, out: &mut W) -> io::Result<Record>
    where
        W: Write,
    {
        let mut errs = Record::new();
        match self.dataset() {
            Ok(data) => write!(out, "{}", cli::render_options(&data.options()))?,
            Err(e) => cli::load_error(&mut errs, &e),
        }
        Ok(errs)
    }

    /// Read commands from `input` until `quit` or the end of input
    ///
    /// Returns how many commands ended on a fatal error.
    pub fn interact<R, W>(&mut self, input: R, out: &mut W) -> io::Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        let mut failed = 0;
        write!(out, "{}", HELP)?;
        prompt(out)?;
        for line in input.lines() {
            let line = line?;
            let errs = match Command::parse(&line) {
                Ok(None) => Record::new(),
                Ok(Some(Command::Quit)) => break,
                Ok(Some(cmd)) => self.apply(cmd, out)?,
                Err(e) => {
                    let mut errs = Record::new();
                    errs.make("Unknown command").text(&e).hint(e.fix_hint());
                    errs
                }
            };
            if errs.is_fatal() {
                failed += 1;
            }
            write!(out, "{}", errs)?;
            prompt(out)?;
        }
        writeln!(out)?;
        Ok(failed)
    }

    fn apply<W>(&mut self, cmd: Command, out: &mut W) -> io::Result<Record>
    where
        W: Write,
    {
        debug!("command {:?}", cmd);
        match cmd {
            Command::Period(text) => match Period::parse(&text) {
                Ok(period) => self.set_period(Some(period)),
                Err(e) => {
                    let mut errs = Record::new();
                    cli::range_error(&mut errs, &e);
                    return Ok(errs);
                }
            },
            Command::Segment(label) => self.set_segment(Selection::parse(&label)),
            Command::Coordinator(label) => self.set_coordinator(Selection::parse(&label)),
            Command::Reset => self.reset(),
            Command::Reload => self.reload(),
            Command::Options => return self.options(out),
            Command::Show | Command::Quit => (),
        }
        self.run(out)
    }
}

fn prompt<W>(out: &mut W) -> io::Result<()>
where
    W: Write,
{
    write!(out, "> ")?;
    out.flush()
}

const HELP: &str = "\
commands:
  period START..END    restrict the dates (YYYY-MM-DD or DD/MM/YYYY)
  segment LABEL        select a segment, 'Todos' for all
  coordinator LABEL    select a coordinator, 'Todos' for all
  reset                clear all filters
  reload               read the workbook again
  options              list the available choices
  show                 print the report again
  quit
";

/// One line of the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Period(String),
    Segment(String),
    Coordinator(String),
    Reset,
    Reload,
    Options,
    Show,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' expects an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' takes no argument")]
    UnexpectedArgument(&'static str),
}

impl CommandError {
    pub fn fix_hint(&self) -> String {
        match self {
            CommandError::Unknown(_) => {
                "one of period, segment, coordinator, reset, reload, options, show, quit".to_string()
            }
            CommandError::MissingArgument(cmd) => format!("e.g. '{} Todos'", cmd),
            CommandError::UnexpectedArgument(cmd) => format!("just type '{}'", cmd),
        }
    }
}

impl Command {
    /// `None` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        let with_arg = |name: &'static str, make: fn(String) -> Command| {
            if arg.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(make(arg.to_string()))
            }
        };
        let bare = |name: &'static str, cmd: Command| {
            if arg.is_empty() {
                Ok(cmd)
            } else {
                Err(CommandError::UnexpectedArgument(name))
            }
        };
        let cmd = match word.to_lowercase().as_str() {
            "period" | "p" => with_arg("period", Command::Period),
            "segment" | "s" => with_arg("segment", Command::Segment),
            "coordinator" | "c" => with_arg("coordinator", Command::Coordinator),
            "reset" => bare("reset", Command::Reset),
            "reload" => bare("reload", Command::Reload),
            "options" => bare("options", Command::Options),
            "show" => bare("show", Command::Show),
            "quit" | "exit" | "q" => bare("quit", Command::Quit),
            _ => Err(CommandError::Unknown(word.to_string())),
        }?;
        Ok(Some(cmd))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::sample_dataset;

    fn dashboard() -> Dashboard {
        Dashboard::with_loader(PathBuf::from("/nonexistent/book.xlsx"), |_| {
            Ok(sample_dataset())
        })
    }

    fn session(commands: &str) -> String {
        let mut out = Vec::new();
        dashboard()
            .interact(commands.as_bytes(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn failures(commands: &str) -> usize {
        dashboard()
            .interact(commands.as_bytes(), &mut Vec::new())
            .unwrap()
    }

    #[test]
    fn fatal_commands_are_counted() {
        assert_eq!(failures("show\nsegment Atacado\nperiod 2024-01-01..2024-01-31\nquit\n"), 0);
        assert_eq!(
            failures("period 2023-01-01..2023-01-31\nfrobnicate\nreset\nperiod 2024-01\n"),
            3
        );
        let mut dash = Dashboard::with_loader(PathBuf::from("book.xlsx"), |_| {
            Err(LoadError::MissingSheet {
                sheet: "CALENDARIO".to_string(),
            })
        });
        assert_eq!(dash.interact("show\noptions\n".as_bytes(), &mut Vec::new()).unwrap(), 2);
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(
            Command::parse("period 2024-01-01..2024-01-10"),
            Ok(Some(Command::Period("2024-01-01..2024-01-10".to_string())))
        );
        assert_eq!(
            Command::parse("Segment  Varejo Norte "),
            Ok(Some(Command::Segment("Varejo Norte".to_string())))
        );
        assert_eq!(Command::parse("quit"), Ok(Some(Command::Quit)));
        assert_eq!(
            Command::parse("coordinator"),
            Err(CommandError::MissingArgument("coordinator"))
        );
        assert_eq!(
            Command::parse("reset now"),
            Err(CommandError::UnexpectedArgument("reset"))
        );
        assert_eq!(
            Command::parse("plot"),
            Err(CommandError::Unknown("plot".to_string()))
        );
    }

    #[test]
    fn default_run_covers_everything() {
        let mut out = Vec::new();
        let errs = dashboard().run(&mut out).unwrap();
        assert!(errs.is_empty());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Período: 01/01 até 10/02"));
        // 31 days at 100 and 10 days at 200
        assert!(out.contains("R$ 5.100,00"));
    }

    #[test]
    fn out_of_bounds_period() {
        let mut dash = dashboard();
        dash.set_period(Period::parse("2023-12-01..2024-01-10").ok());
        let mut out = Vec::new();
        let errs = dash.run(&mut out).unwrap();
        assert!(errs.is_fatal());
        assert!(out.is_empty());
        assert!(errs.to_string().contains("Invalid period"));
    }

    #[test]
    fn failed_load() {
        let mut dash = Dashboard::with_loader(PathBuf::from("book.xlsx"), |_| {
            Err(LoadError::MissingSheet {
                sheet: "CALENDARIO".to_string(),
            })
        });
        let mut out = Vec::new();
        let errs = dash.run(&mut out).unwrap();
        assert!(errs.is_fatal());
        assert!(out.is_empty());
        assert!(dash.options(&mut out).unwrap().is_fatal());
    }

    #[test]
    fn filters_are_applied_in_turn() {
        let out = session(
            "segment Atacado\n\
             period 2024-01-01..2024-01-31\n\
             reset\n\
             period 01/02/2024..05/02/2024\n\
             coordinator Bruno\n\
             quit\n\
             show\n",
        );
        assert!(out.contains(cli::NO_DATA));
        assert!(out.contains("Segmento: Atacado"));
        assert!(out.contains("Período: 01/02 até 05/02  Segmento: Todos  Coordenador: Bruno"));
        // nothing runs after quit
        assert_eq!(out.matches("Período: 01/02 até 05/02").count(), 2);
    }

    #[test]
    fn bad_input_keeps_the_session() {
        let out = session("period 2024-02-10..2024-02-01\nfrobnicate\noptions\n");
        assert!(out.contains("did you mean 2024-02-01..2024-02-10 ?"));
        assert!(out.contains("unknown command 'frobnicate'"));
        assert!(out.contains("Segmentos: Todos, Atacado, Varejo"));
    }
}
