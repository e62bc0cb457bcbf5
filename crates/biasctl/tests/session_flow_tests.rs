//! End-to-end menu sessions against a scripted oracle
//!
//! Each test feeds operator keystrokes through an in-memory reader and checks
//! the console transcript, the session log and any reports written.

use bias_common::config::{EmptyEventPolicy, ReportMode};
use bias_common::{Config, DemoCatalog, FakeOracle, OracleClient, OracleError, SessionLog};
use biasctl::bootstrap::start_session;
use biasctl::engine::{Engine, EngineSettings, State};
use biasctl::theme::Theme;
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BANNER: &str = "=== RISK BIAS DETECTOR ===";
const EVENT_A: &str = "User X denied access due to location.";
const VERDICT_A: &str = "No bias detected: decision based on explicit access policy.";

struct Fixture {
    dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.session.log_path = dir.path().join("files").join("openai-log.txt");
        config.report.dir = dir.path().join("reports");
        config.display.spinner = false;
        Self { dir, config }
    }

    fn log_path(&self) -> PathBuf {
        self.config.session.log_path.clone()
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    fn reports(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.config.report.dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Run a whole session, returning (summary, transcript)
    fn run(
        &self,
        oracle: &FakeOracle,
        keys: &str,
    ) -> (biasctl::engine::SessionSummary, String) {
        let client = OracleClient::new(oracle, self.config.oracle.model.clone());
        let log = SessionLog::open(self.log_path()).unwrap();
        let mut output = Vec::new();
        let summary = start_session(
            &self.config,
            &client,
            Theme::plain(),
            log,
            keys.as_bytes(),
            &mut output,
        )
        .unwrap();
        (summary, String::from_utf8(output).unwrap())
    }
}

fn scripted(verdict: Result<&str, OracleError>) -> FakeOracle {
    FakeOracle::new(vec![
        Ok(BANNER.to_string()),
        verdict.map(|v| v.to_string()),
    ])
}

fn pdf_text(path: &Path) -> String {
    let doc = Document::load(path).unwrap();
    let mut strings = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for op in content.operations {
            if op.operator == "Tj" {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    strings.push(String::from_utf8_lossy(bytes).into_owned());
                }
            }
        }
    }
    strings.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_manual_entry_logs_one_verdict_and_returns_to_menu() {
    let fx = Fixture::new();
    let oracle = scripted(Ok(VERDICT_A));

    let keys = format!("1\n{}\nn\n3\n", EVENT_A);
    let (summary, transcript) = fx.run(&oracle, &keys);

    assert_eq!(summary.verdicts, 1);
    assert!(transcript.contains(VERDICT_A));
    // Menu shown before and after the turn
    assert_eq!(transcript.matches("Choose an option").count(), 2);

    let lines = fx.log_lines();
    assert_eq!(lines, vec![BANNER.to_string(), VERDICT_A.to_string()]);
    assert_eq!(summary.log_entries, 2);

    let requests = oracle.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].user_text(), Some(EVENT_A));
    assert!(fx.reports().is_empty());
}

#[test]
fn test_demo_selection_sends_catalog_text() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("Potential bias detected: demographic bias."));

    let (summary, _) = fx.run(&oracle, "2\n2\nn\n3\n");

    let expected = DemoCatalog::builtin().get(2).unwrap().text;
    let requests = oracle.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].user_text(), Some(expected));
    assert_eq!(summary.verdicts, 1);
}

#[test]
fn test_demo_out_of_range_is_invalid_input_without_oracle_call() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("unused"));

    let (summary, transcript) = fx.run(&oracle, "2\n4\n2\nseven\n3\n");

    assert_eq!(oracle.call_count(), 1); // banner only
    assert_eq!(summary.invalid_inputs, 2);
    assert!(transcript.contains("[!] Invalid input: demo 4 does not exist (choose 1-3)"));
    assert!(transcript.contains("[!] Invalid input: 'seven' is not a demo number"));
    assert_eq!(transcript.matches("Choose an option").count(), 3);
}

#[test]
fn test_oracle_failure_is_reported_and_not_logged() {
    let fx = Fixture::new();
    let oracle = scripted(Err(OracleError::Timeout(120)));

    let (summary, transcript) = fx.run(&oracle, "1\nSome event\n3\n");

    assert_eq!(summary.oracle_failures, 1);
    assert_eq!(summary.verdicts, 0);
    assert!(transcript.contains("[!] Oracle unavailable: request timeout after 120 seconds"));
    assert_eq!(transcript.matches("Choose an option").count(), 2);
    assert_eq!(fx.log_lines(), vec![BANNER.to_string()]);
    assert!(fx.reports().is_empty());
}

#[test]
fn test_exit_closes_log_once_and_succeeds() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("unused"));

    let client = OracleClient::new(&oracle, fx.config.oracle.model.clone());
    let log = SessionLog::open(fx.log_path()).unwrap();
    let mut output = Vec::new();
    let result = start_session(
        &fx.config,
        &client,
        Theme::plain(),
        log,
        "3\n".as_bytes(),
        &mut output,
    );

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => panic!("exit should end the session cleanly, got {:#}", e),
    };
    let transcript = String::from_utf8(output).unwrap();
    assert_eq!(summary.log_entries, 1);
    assert_eq!(summary.oracle_failures, 0);
    assert!(transcript.contains("[*] The application is terminating."));
    assert_eq!(fx.log_lines(), vec![BANNER.to_string()]);
}

#[test]
fn test_end_of_input_terminates() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("unused"));

    let (_, transcript) = fx.run(&oracle, "1\n");
    assert!(transcript.contains("The application is terminating."));
    assert_eq!(oracle.call_count(), 1);
}

#[test]
fn test_invalid_menu_choice_reprompts() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("unused"));

    let (summary, transcript) = fx.run(&oracle, "9\nhello\n3\n");
    assert_eq!(summary.invalid_inputs, 2);
    assert!(transcript.contains("[!] Invalid input: '9' is not a menu option (1-3)"));
    assert_eq!(transcript.matches("Choose an option").count(), 3);
}

#[test]
fn test_report_on_request_round_trip() {
    let fx = Fixture::new();
    let oracle = scripted(Ok(VERDICT_A));

    let keys = format!("1\n{}\ny\n3\n", EVENT_A);
    let (summary, transcript) = fx.run(&oracle, &keys);

    assert_eq!(summary.reports.len(), 1);
    let path = &summary.reports[0];
    assert!(transcript.contains(&format!("Report saved as {}.", path.display())));

    let text = pdf_text(path);
    assert!(text.contains(EVENT_A));
    assert!(text.contains(VERDICT_A));
}

#[test]
fn test_automatic_reports_never_overwrite() {
    let mut fx = Fixture::new();
    fx.config.session.report_mode = ReportMode::Automatic;
    let oracle = scripted(Ok(VERDICT_A));

    let (summary, transcript) = fx.run(&oracle, "2\n1\n2\n3\n3\n");

    assert_eq!(summary.verdicts, 2);
    assert_eq!(summary.reports.len(), 2);
    assert_ne!(summary.reports[0], summary.reports[1]);
    assert_eq!(fx.reports().len(), 2);
    assert!(!transcript.contains("[y/N]"));
}

#[test]
fn test_report_write_failure_keeps_session_alive() {
    let mut fx = Fixture::new();
    let blocker = fx.dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    fx.config.report.dir = blocker.join("reports");
    fx.config.session.report_mode = ReportMode::Automatic;
    let oracle = scripted(Ok(VERDICT_A));

    let keys = format!("1\n{}\n3\n", EVENT_A);
    let (summary, transcript) = fx.run(&oracle, &keys);

    assert_eq!(summary.report_failures, 1);
    assert!(summary.reports.is_empty());
    assert!(transcript.contains("[!] Report could not be written"));
    assert!(transcript.contains("The application is terminating."));
}

#[test]
fn test_empty_event_policy() {
    let fx = Fixture::new();
    let oracle = scripted(Ok("unused"));
    let (summary, transcript) = fx.run(&oracle, "1\n   \n3\n");
    assert_eq!(summary.invalid_inputs, 1);
    assert!(transcript.contains("[!] Invalid input: the event description is empty"));
    assert_eq!(oracle.call_count(), 1);

    let mut fx = Fixture::new();
    fx.config.session.empty_event = EmptyEventPolicy::Forward;
    let oracle = scripted(Ok("Nothing to assess."));
    let (summary, _) = fx.run(&oracle, "1\n\nn\n3\n");
    assert_eq!(summary.verdicts, 1);
    assert_eq!(oracle.requests()[1].user_text(), Some(""));
}

#[test]
fn test_banner_failure_does_not_stop_session() {
    let fx = Fixture::new();
    let oracle = FakeOracle::new(vec![
        Err(OracleError::Unauthorized(401)),
        Ok(VERDICT_A.to_string()),
    ]);

    let keys = format!("1\n{}\nn\n3\n", EVENT_A);
    let (summary, transcript) = fx.run(&oracle, &keys);

    assert!(transcript.contains("[!] Oracle unavailable: credential rejected (HTTP 401)"));
    assert!(transcript.contains("Risk Bias Detector"));
    assert_eq!(summary.verdicts, 1);
    assert_eq!(fx.log_lines(), vec![VERDICT_A.to_string()]);
}

#[test]
fn test_step_transitions() {
    let fx = Fixture::new();
    let oracle = FakeOracle::always(VERDICT_A);
    let client = OracleClient::new(&oracle, "gpt-4o");
    let catalog = DemoCatalog::builtin();
    let reports = bias_common::ReportBuilder::default();
    let mut log = SessionLog::open(fx.log_path()).unwrap();
    let mut output = Vec::new();

    let mut engine = Engine::new(
        &client,
        &catalog,
        &reports,
        EngineSettings::default(),
        Theme::plain(),
        "2\n3\nn\n".as_bytes(),
        &mut output,
    );

    let state = engine.step(State::Idle, &mut log).unwrap();
    assert!(matches!(state, State::AwaitingChoice));
    let state = engine.step(state, &mut log).unwrap();
    assert!(matches!(state, State::DemoSelection));
    let state = engine.step(state, &mut log).unwrap();
    match &state {
        State::Classifying(event) => assert_eq!(event.text(), catalog.get(3).unwrap().text),
        other => panic!("unexpected state {:?}", other),
    }
    let state = engine.step(state, &mut log).unwrap();
    assert!(matches!(state, State::ReportOffered(_)));
    let state = engine.step(state, &mut log).unwrap();
    assert!(matches!(state, State::AwaitingChoice));
    // End of input at the menu
    let state = engine.step(state, &mut log).unwrap();
    assert!(state.is_terminated());

    assert_eq!(engine.summary().verdicts, 1);
    assert_eq!(log.entries_written(), 1);
}
