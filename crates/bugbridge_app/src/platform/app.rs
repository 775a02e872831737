use std::fs;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use bridge_logging::{bridge_debug, bridge_info, bridge_warn};
use bugbridge_core::NavigationFilter;
use bugbridge_engine::{
    ChangeNotifier, ContentScript, HostPage, NavigationDetails, PageReconciler, ReqwestFetcher,
    RunSummary, TabId,
};
use clap::Parser;
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::cli::Cli;
use super::config::{load_config, AppConfig};
use super::logging;

const TAB_ID: TabId = 1;
const BLANK_PAGE: &str = r#"<html><body><div class="group-actions"></div></body></html>"#;

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let config = load_config(cli.config.as_deref())?;

    let html = match &cli.page {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read page snapshot {:?}", path))?,
        None => BLANK_PAGE.to_string(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    let output = runtime.block_on(async {
        tokio::time::timeout(timeout, run_session(&cli, config, &html))
            .await
            .map_err(|_| anyhow!("Gave up after {} s", cli.timeout_secs))?
    })?;

    match output {
        Some(button) => println!("{button}"),
        None => println!("No button rendered for {}", cli.url),
    }
    Ok(())
}

/// Drive one page through its load and any followed navigations; returns the
/// button's final markup.
async fn run_session(cli: &Cli, config: AppConfig, html: &str) -> anyhow::Result<Option<String>> {
    let notifier = ChangeNotifier::new(NavigationFilter::from_config(&config.tracker)?);
    let page = Rc::new(HostPage::new(cli.url.clone(), html));
    let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.to_settings())?);
    let reconciler = PageReconciler::new(Arc::new(config.tracker), page.clone(), fetcher)?;
    let script = ContentScript::new(reconciler);
    let port = notifier.connect(TAB_ID);

    let (summary, replayed) = tokio::join!(
        script.run(port),
        replay_navigations(cli.follow, &page, &notifier)
    );
    report(&summary);
    replayed?;

    match script.reconciler().button() {
        Some(button) => Ok(Some(page.outer_html(button)?)),
        None => Ok(None),
    }
}

/// Feed stdin lines to the page as history-state navigations, then close.
async fn replay_navigations(
    follow: bool,
    page: &HostPage,
    notifier: &ChangeNotifier,
) -> anyhow::Result<()> {
    let result = if follow {
        follow_stdin(page, notifier).await
    } else {
        Ok(())
    };
    notifier.shutdown();
    result
}

async fn follow_stdin(page: &HostPage, notifier: &ChangeNotifier) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        page.set_location(url);
        let delivered = notifier.on_history_state_updated(&NavigationDetails {
            tab_id: TAB_ID,
            url: url.to_string(),
        });
        bridge_debug!("Navigation to {} reached {} port(s)", url, delivered);
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    bridge_info!(
        "Finished {} pass(es): {} rendered, {} ignored, {} superseded, {} failed",
        summary.total(),
        summary.rendered,
        summary.ignored,
        summary.superseded,
        summary.failed
    );
    if summary.failed > 0 {
        bridge_warn!("{} pass(es) failed", summary.failed);
    }
}
