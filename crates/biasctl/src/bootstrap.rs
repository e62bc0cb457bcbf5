//! Startup: credential, oracle client, welcome banner, then the menu loop.

use anyhow::{Context, Result};
use bias_common::oracle::HttpOracleSettings;
use bias_common::{
    CompletionBackend, Config, CredentialSource, CredentialStore, DemoCatalog, DetectorError,
    HttpOracle, OracleClient, ReportBuilder, SessionLog,
};
use chrono::Local;
use std::io::{self, BufRead, Write};

use crate::engine::{Engine, EngineSettings, SessionSummary};
use crate::theme::Theme;

/// Application name shown in the banner
pub const APP_NAME: &str = "Risk Bias Detector";

/// Full interactive run against the real oracle on stdin/stdout
pub fn run(config: &Config) -> Result<SessionSummary> {
    let theme = Theme::auto(config.display.color);

    let mut log = SessionLog::open(&config.session.log_path).with_context(|| {
        format!(
            "Failed to open session log {}",
            config.session.log_path.display()
        )
    })?;

    let store = CredentialStore::new(&config.session.credential_path);
    let (credential, source) = store
        .acquire(|| prompt_for_key(&theme))
        .context("Failed to obtain an API key")?;
    if source == CredentialSource::SecretFile {
        tracing::info!("Using API key from {}", store.path().display());
    }

    let backend = HttpOracle::new(
        HttpOracleSettings {
            endpoint: config.oracle.endpoint.clone(),
            timeout_secs: config.oracle.effective_timeout(),
        },
        credential,
    )
    .map_err(DetectorError::from)
    .context("Failed to initialise the oracle client")?;
    let client = OracleClient::new(backend, config.oracle.model.clone())
        .with_banner_model(config.oracle.effective_banner_model())
        .with_echo(config.display.echo_verdicts);

    log.mark_session_start()
        .context("Failed to write to session log")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    start_session(config, &client, theme, log, stdin.lock(), stdout.lock())
}

/// Banner followed by the engine loop. Works with any oracle backend.
pub fn start_session<B, R, W>(
    config: &Config,
    client: &OracleClient<B>,
    theme: Theme,
    mut log: SessionLog,
    input: R,
    mut output: W,
) -> Result<SessionSummary>
where
    B: CompletionBackend,
    R: BufRead,
    W: Write,
{
    tracing::debug!(
        model = client.model(),
        log = %log.path().display(),
        report_mode = config.session.report_mode.as_str(),
        "Starting session"
    );
    show_banner(config, client, theme, &mut log, &mut output)?;

    let catalog = DemoCatalog::builtin();
    let reports = ReportBuilder::new(
        config.report.title.clone(),
        config.report.effective_wrap_width(),
    );
    let settings = EngineSettings {
        report_mode: config.session.report_mode,
        empty_event: config.session.empty_event,
        report_dir: config.report.dir.clone(),
        spinner: config.display.spinner && theme.uses_color(),
    };

    let engine = Engine::new(client, &catalog, &reports, settings, theme, input, output);
    let summary = engine.run(log)?;
    tracing::info!(
        "Session finished: {} verdict(s), {} report(s)",
        summary.verdicts,
        summary.reports.len()
    );
    Ok(summary)
}

/// Render the generated banner. An unavailable oracle only costs the banner.
fn show_banner<B: CompletionBackend, W: Write>(
    config: &Config,
    client: &OracleClient<B>,
    theme: Theme,
    log: &mut SessionLog,
    output: &mut W,
) -> Result<()> {
    let now = Local::now();
    let location = config
        .session
        .location
        .clone()
        .unwrap_or_else(|| format!("unknown, UTC{}", now.format("%:z")));

    match client.render_banner(
        APP_NAME,
        &now.format("%Y-%m-%d %H:%M").to_string(),
        &location,
        log,
    ) {
        Ok(banner) => writeln!(output, "\n{}\n", theme.banner(&banner))?,
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Banner generation failed: {}", e);
            writeln!(output, "{}", theme.error(&e.to_string()))?;
            writeln!(output, "{}", theme.banner(APP_NAME))?;
        }
        Err(e) => return Err(e).context("Failed to write to session log"),
    }
    Ok(())
}

/// Ask for the API key, hiding input on a terminal
fn prompt_for_key(theme: &Theme) -> io::Result<String> {
    let term = console::Term::stdout();
    if term.is_term() {
        term.write_str(&theme.question("Please enter your OpenAI API key: "))?;
        return term.read_secure_line();
    }

    let mut stdout = io::stdout();
    write!(stdout, "{}", theme.question("Please enter your OpenAI API key: "))?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
