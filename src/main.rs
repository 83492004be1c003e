use log::{error, info, warn};
use sector_alarm::config::Config;
use sector_alarm::{Panel, PanelId, SectorAlarmClient};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Panels,
    Overview,
    Temperatures,
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    command: Command,
    panel_id: Option<PanelId>,
}

fn set_panel(value: &str, current: &mut Option<PanelId>) -> Result<(), String> {
    if current.is_some() {
        return Err("`--panel` provided more than once".to_string());
    }
    if value.trim().is_empty() {
        return Err("`--panel` requires a panel id".to_string());
    }
    *current = Some(PanelId(value.trim().to_string()));
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = OsString>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut command: Option<Command> = None;
    let mut panel_id: Option<PanelId> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--panel") => {
                let value = args.next().ok_or_else(|| "`--panel` requires a panel id".to_string())?;
                let value = value.to_str().ok_or_else(|| "panel id contains invalid UTF-8".to_string())?;
                set_panel(value, &mut panel_id)?;
            }
            Some(s) if s.starts_with("--panel=") => set_panel(&s["--panel=".len()..], &mut panel_id)?,
            Some(name @ ("panels" | "overview" | "temperatures")) => {
                if command.is_some() {
                    return Err(format!("unexpected second command: {}", name));
                }
                command = Some(match name {
                    "overview" => Command::Overview,
                    "temperatures" => Command::Temperatures,
                    _ => Command::Panels,
                });
            }
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    let command = command.unwrap_or(Command::Panels);
    if command == Command::Panels && panel_id.is_some() {
        return Err("`--panel` only applies to the overview and temperatures commands".to_string());
    }
    Ok(CliArgs { command, panel_id })
}

/// Panels to query: the explicit id wins, then the configured one, then everything the account sees.
fn target_panels(explicit: Option<PanelId>, configured: Option<PanelId>, discovered: &[Panel]) -> Vec<PanelId> {
    if let Some(id) = explicit.or(configured) {
        return vec![id];
    }
    let mut ids = discovered.iter().filter_map(|p| p.panel_id.clone()).collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn require_targets(
    explicit: Option<PanelId>,
    configured: Option<PanelId>,
    discovered: &[Panel],
) -> Result<Vec<PanelId>, String> {
    let targets = target_panels(explicit, configured, discovered);
    if targets.is_empty() {
        return Err("No panels found; ensure the account has panels".into());
    }
    Ok(targets)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| format!("encoding output failed: {}", e))?;
    println!("{}", out);
    Ok(())
}

fn run(args: CliArgs) -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (base_url={}, timeout={}, panel={})",
        cfg.base_url,
        cfg.timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "-".to_string()),
        cfg.panel_id.as_ref().map(|p| p.0.as_str()).unwrap_or("-"),
    );

    // 2) Log in (cookies + version token)
    let mut client = SectorAlarmClient::with_options(cfg.credentials.clone(), cfg.client_options());
    client
        .login()
        .map_err(|e| format!("Sector Alarm login failed (check credentials): {}", e))?;
    info!("Authenticated to Sector Alarm portal");

    // 3) Discover panels unless one was named
    let discovered = if args.command == Command::Panels || (args.panel_id.is_none() && cfg.panel_id.is_none()) {
        let panels = client
            .get_panel_list()
            .map_err(|e| format!("get_panel_list failed: {}", e))?;
        info!("Discovered {} panel(s)", panels.len());
        panels
    } else {
        Vec::new()
    };

    // 4) Print the list or fetch per-panel snapshots
    match args.command {
        Command::Panels => print_json(&discovered),
        Command::Overview => {
            let mut out = BTreeMap::new();
            for id in require_targets(args.panel_id, cfg.panel_id, &discovered)? {
                let overview = client
                    .get_overview(&id)
                    .map_err(|e| format!("get_overview({id}) failed: {}", e))?;
                out.insert(id.0, overview);
            }
            print_json(&out)
        }
        Command::Temperatures => {
            let mut out = BTreeMap::new();
            for id in require_targets(args.panel_id, cfg.panel_id, &discovered)? {
                let temps = client
                    .get_temperatures(&id)
                    .map_err(|e| format!("get_temperatures({id}) failed: {}", e))?;
                for t in &temps {
                    let label = t.label.as_deref().unwrap_or("?");
                    match t.celsius() {
                        Some(c) => info!("Panel {}: {} {:.1} C", id, label, c),
                        None => warn!("Panel {}: {} has unreadable temperature {:?}", id, label, t.temperature),
                    }
                }
                out.insert(id.0, temps);
            }
            print_json(&out)
        }
    }
}

fn main() {
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    let args = match parse_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            error!("fatal: {}", err);
            eprintln!("usage: sector-alarm [panels|overview|temperatures] [--panel ID]");
            std::process::exit(2);
        }
    };

    info!(
        "sector-alarm {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(args) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
