//! Interaction engine - the operator menu as an explicit state machine
//!
//! ```text
//! Idle -> AwaitingChoice -> ManualEntry   -> Classifying -> ReportOffered -> AwaitingChoice
//!                        -> DemoSelection -> Classifying ...
//!                        -> Terminated
//! ```
//!
//! Oracle failures, bad input and report write failures are reported on one
//! line and lead back to `AwaitingChoice`. Only resource failures (session log,
//! console I/O) end the loop early.

use bias_common::config::{EmptyEventPolicy, ReportMode};
use bias_common::{
    CompletionBackend, DemoCatalog, DetectorError, Event, Exchange, OracleClient, ReportBuilder,
    Result, SessionLog,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::theme::Theme;

/// Engine states
#[derive(Debug)]
pub enum State {
    Idle,
    AwaitingChoice,
    ManualEntry,
    DemoSelection,
    Classifying(Event),
    ReportOffered(Exchange),
    Terminated,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::AwaitingChoice => "awaiting_choice",
            State::ManualEntry => "manual_entry",
            State::DemoSelection => "demo_selection",
            State::Classifying(_) => "classifying",
            State::ReportOffered(_) => "report_offered",
            State::Terminated => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, State::Terminated)
    }
}

/// The three menu options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ManualEntry,
    DemoCatalog,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 3] = [
        MenuChoice::ManualEntry,
        MenuChoice::DemoCatalog,
        MenuChoice::Exit,
    ];

    pub fn key(&self) -> usize {
        match self {
            MenuChoice::ManualEntry => 1,
            MenuChoice::DemoCatalog => 2,
            MenuChoice::Exit => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::ManualEntry => "Describe a security event",
            MenuChoice::DemoCatalog => "Analyze a demo event",
            MenuChoice::Exit => "Exit",
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|c| trimmed == c.key().to_string())
            .ok_or_else(|| {
                DetectorError::InvalidInput(format!("'{}' is not a menu option (1-3)", trimmed))
            })
    }
}

/// Engine policy, taken from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub report_mode: ReportMode,
    pub empty_event: EmptyEventPolicy,
    pub report_dir: PathBuf,
    pub spinner: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            report_mode: ReportMode::OnRequest,
            empty_event: EmptyEventPolicy::Reject,
            report_dir: PathBuf::from("./files"),
            spinner: false,
        }
    }
}

/// What happened during a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub verdicts: usize,
    pub oracle_failures: usize,
    pub invalid_inputs: usize,
    pub report_failures: usize,
    pub reports: Vec<PathBuf>,
    /// Entries written to the session log, reported by `close`
    pub log_entries: usize,
}

pub struct Engine<'a, B, R, W> {
    client: &'a OracleClient<B>,
    catalog: &'a DemoCatalog,
    reports: &'a ReportBuilder,
    settings: EngineSettings,
    theme: Theme,
    input: R,
    output: W,
    summary: SessionSummary,
}

impl<'a, B, R, W> Engine<'a, B, R, W>
where
    B: CompletionBackend,
    R: BufRead,
    W: Write,
{
    pub fn new(
        client: &'a OracleClient<B>,
        catalog: &'a DemoCatalog,
        reports: &'a ReportBuilder,
        settings: EngineSettings,
        theme: Theme,
        input: R,
        output: W,
    ) -> Self {
        Self {
            client,
            catalog,
            reports,
            settings,
            theme,
            input,
            output,
            summary: SessionSummary::default(),
        }
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Drive the loop until `Terminated`, then close the session log.
    pub fn run(mut self, mut log: SessionLog) -> Result<SessionSummary> {
        let mut state = State::Idle;
        while !state.is_terminated() {
            state = self.step(state, &mut log)?;
        }

        self.summary.log_entries = log.close()?;
        self.say(&self.theme.info("The application is terminating."))?;
        Ok(self.summary)
    }

    /// One transition. Recoverable errors are reported here and lead back
    /// to the menu; fatal errors are returned.
    pub fn step(&mut self, state: State, log: &mut SessionLog) -> Result<State> {
        tracing::trace!("Engine state: {}", state.name());
        let result = match state {
            State::Idle => Ok(State::AwaitingChoice),
            State::AwaitingChoice => self.await_choice(),
            State::ManualEntry => self.manual_entry(),
            State::DemoSelection => self.demo_selection(),
            State::Classifying(event) => self.classify(event, log),
            State::ReportOffered(exchange) => self.offer_report(exchange),
            State::Terminated => Ok(State::Terminated),
        };

        match result {
            Err(e) if e.is_recoverable() => {
                self.record_failure(&e);
                self.say(&self.theme.error(&e.to_string()))?;
                Ok(State::AwaitingChoice)
            }
            other => other,
        }
    }

    fn record_failure(&mut self, e: &DetectorError) {
        tracing::warn!("{} ({})", e, e.code());
        match e {
            DetectorError::OracleUnavailable(_) => self.summary.oracle_failures += 1,
            DetectorError::ReportWriteFailed(_) => self.summary.report_failures += 1,
            e if e.is_invalid_input() => self.summary.invalid_inputs += 1,
            _ => {}
        }
    }

    fn await_choice(&mut self) -> Result<State> {
        self.say("")?;
        for choice in MenuChoice::ALL {
            let line = self.theme.menu_item(choice.key(), choice.label());
            self.say(&line)?;
        }
        let line = match self.ask("Choose an option: ")? {
            Some(line) => line,
            None => return Ok(State::Terminated),
        };

        Ok(match MenuChoice::parse(&line)? {
            MenuChoice::ManualEntry => State::ManualEntry,
            MenuChoice::DemoCatalog => State::DemoSelection,
            MenuChoice::Exit => State::Terminated,
        })
    }

    fn manual_entry(&mut self) -> Result<State> {
        let line = match self.ask("Describe the security event: ")? {
            Some(line) => line,
            None => return Ok(State::Terminated),
        };

        let event = Event::new(line.trim());
        if event.is_blank() && self.settings.empty_event == EmptyEventPolicy::Reject {
            return Err(DetectorError::InvalidInput(
                "the event description is empty".to_string(),
            ));
        }
        Ok(State::Classifying(event))
    }

    fn demo_selection(&mut self) -> Result<State> {
        let catalog = self.catalog;
        self.say("")?;
        for query in catalog.list() {
            let line = format!("  [{}] {}", query.index, query.text);
            self.say(&line)?;
        }
        let prompt = format!("Choose a demo event (1-{}): ", catalog.count());
        let line = match self.ask(&prompt)? {
            Some(line) => line,
            None => return Ok(State::Terminated),
        };

        let index: usize = line.trim().parse().map_err(|_| {
            DetectorError::InvalidInput(format!("'{}' is not a demo number", line.trim()))
        })?;
        let query = catalog.get(index)?;
        Ok(State::Classifying(query.event()))
    }

    fn classify(&mut self, event: Event, log: &mut SessionLog) -> Result<State> {
        self.say(&self.theme.info("Analyzing the event for bias..."))?;

        let spinner = self.settings.spinner.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("waiting for the oracle");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        let result = self.client.classify(&event, log);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let verdict = result?;
        let exchange = Exchange::new(event, verdict);
        self.summary.verdicts += 1;
        tracing::info!(exchange_id = %exchange.id, "Verdict received");

        self.say("")?;
        self.say(&self.theme.verdict(exchange.verdict.text()))?;
        Ok(State::ReportOffered(exchange))
    }

    fn offer_report(&mut self, exchange: Exchange) -> Result<State> {
        if self.settings.report_mode == ReportMode::OnRequest {
            let answer = self.ask("Generate a PDF report for this analysis? [y/N]: ")?;
            let wanted = answer
                .map(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
                .unwrap_or(false);
            if !wanted {
                return Ok(State::AwaitingChoice);
            }
        }

        let document = self.reports.build(&exchange.event, &exchange.verdict);
        let path = self
            .reports
            .write_unique(&document, &self.settings.report_dir)?;
        self.say(
            &self
                .theme
                .info(&format!("Report saved as {}.", path.display())),
        )?;
        self.summary.reports.push(path);
        Ok(State::AwaitingChoice)
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Prompt and read one line; `None` on end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", self.theme.question(prompt))?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}
