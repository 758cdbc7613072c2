//! Subcommand execution against a session over the resource directory.

use crate::acquire;
use crate::cli::{Cli, Commands, CurveCmd, SetArgs};
use eyre::WrapErr;
use pcr_config::{Config, ExperimentDocument};
use pcr_core::{
    AcquisitionCfg, ExperimentRecord, FsDocumentStore, LedCfg, PcrError, Session,
    StandardCurvePoint,
};
use pcr_traits::SensorPort;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Remembers the current experiment between invocations, inside the resource directory.
pub const SELECTION_FILE: &str = ".current";

type CliSession = Session<FsDocumentStore, Box<dyn SensorPort>>;

fn read_selection(dir: &Path) -> Option<String> {
    std::fs::read_to_string(dir.join(SELECTION_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn write_selection(dir: &Path, name: &str) -> eyre::Result<()> {
    std::fs::create_dir_all(dir).wrap_err_with(|| format!("create {}", dir.display()))?;
    std::fs::write(dir.join(SELECTION_FILE), format!("{name}\n"))
        .wrap_err("remember current experiment")
}

fn open_session(cfg: &Config) -> eyre::Result<CliSession> {
    let dir = &cfg.storage.resource_dir;
    let documents = FsDocumentStore::new(dir, cfg.storage.template.clone()).with_fallback_template(
        ExperimentDocument::template_with_max_cycle(i64::from(cfg.acquisition.max_cycles)),
    );
    let mut builder = Session::builder(documents, acquire::make_port(cfg))
        .with_acquisition(AcquisitionCfg::from(&cfg.acquisition));
    if let Some(name) = read_selection(dir) {
        builder = builder.select(name);
    }
    Ok(builder.build()?)
}

/// Execute the parsed command.
pub fn dispatch(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    if let Commands::SelfCheck = cli.cmd {
        return self_check(cli, cfg);
    }

    let mut session = open_session(cfg)?;
    let before = session.store().current_name().to_string();
    let result = execute(cli, cfg, &mut session);

    // the current experiment can move even when the command fails (e.g. remove)
    let after = session.store().current_name();
    if after != before || read_selection(&cfg.storage.resource_dir).is_none() {
        write_selection(&cfg.storage.resource_dir, after)?;
    }
    result
}

fn target(session: &CliSession, name: Option<&String>) -> String {
    name.cloned()
        .unwrap_or_else(|| session.store().current_name().to_string())
}

fn execute(cli: &Cli, cfg: &Config, session: &mut CliSession) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::List => {
            let current = session.store().current_name();
            if cli.json {
                println!(
                    "{}",
                    json!({ "current": current, "experiments": session.store().names() })
                );
            } else {
                for name in session.store().names() {
                    let mark = if name == current { '*' } else { ' ' };
                    println!("{mark} {name}");
                }
            }
        }
        Commands::Create { name } => {
            session.create(name)?;
            tracing::info!(experiment = %name, "created");
            if cli.json {
                println!("{}", json!({ "created": name, "current": name }));
            } else {
                println!("Created {name} (now current)");
            }
        }
        Commands::Remove { name } => {
            session.remove(name)?;
            let current = session.store().current_name();
            if cli.json {
                println!("{}", json!({ "removed": name, "current": current }));
            } else {
                println!("Removed {name}; current experiment is {current}");
            }
        }
        Commands::Show { name } => {
            let name = target(session, name.as_ref());
            print_record(cli.json, session.get(&name)?);
        }
        Commands::Select { name } => {
            session.switch_current(name)?;
            if cli.json {
                println!("{}", json!({ "current": name }));
            } else {
                println!("Current experiment: {name}");
            }
        }
        Commands::Set(args) => set(cli, cfg, session, args)?,
        Commands::Curve { experiment, action } => {
            let name = target(session, experiment.as_ref());
            curve(session, &name, action)?;
            session.save(&name)?;
            let rec = session.get(&name)?;
            if cli.json {
                let pts: Vec<_> = rec.curve().points().iter().map(|p| (p.x, p.ct)).collect();
                println!("{}", json!({ "experiment": name, "standard_curve_points": pts }));
            } else {
                println!("{name}: {} standard curve point(s)", rec.curve().len());
                for (i, p) in rec.curve().points().iter().enumerate() {
                    println!("  [{i}] log_dilution={} ct={}", p.x, p.ct);
                }
            }
        }
        Commands::Analyze { name } => {
            let name = target(session, name.as_ref());
            let analysis = session.analyze(&name)?;
            session.save(&name)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "experiment": name,
                        "slope": analysis.regression.slope,
                        "y_intercept": analysis.regression.intercept,
                        "r_squared": analysis.regression.r_squared,
                        "efficiency": finite_or_null(analysis.efficiency),
                        "reliability": analysis.reliability.to_string(),
                        "summary": analysis.summary,
                    })
                );
            } else {
                println!("{name}: {}", analysis.summary);
            }
        }
        Commands::Run { experiment } => {
            if let Some(name) = experiment {
                session.switch_current(name)?;
            }
            let report = acquire::run(session)?;
            session.save_current()?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "experiment": report.experiment,
                        "samples": report.samples,
                        "skipped": report.skipped,
                        "cycle_threshold": report.cycle_threshold,
                        "reliability": report.reliability.to_string(),
                        "interrupted": report.interrupted,
                    })
                );
            } else {
                println!(
                    "Run complete: {} ({} samples, {} skipped{})",
                    report.experiment,
                    report.samples,
                    report.skipped,
                    if report.interrupted { ", interrupted" } else { "" }
                );
                match report.cycle_threshold {
                    0 => println!("Cycle threshold: not reached"),
                    ct => println!("Cycle threshold: {ct}"),
                }
                println!("Standard curve: {}", report.reliability);
            }
        }
        Commands::SelfCheck => self_check(cli, cfg)?,
    }
    Ok(())
}

fn set(cli: &Cli, cfg: &Config, session: &mut CliSession, args: &SetArgs) -> eyre::Result<()> {
    if args.is_empty() {
        eyre::bail!("nothing to set; pass at least one of --intensity-threshold, --led-level, --multiplier, --coefficient, --max-cycle");
    }
    let name = target(session, args.experiment.as_ref());
    let led = LedCfg::from(&cfg.hardware);
    session.update(&name, |rec| {
        if let Some(t) = args.intensity_threshold {
            rec.set_intensity_threshold(t)?;
        }
        if let Some(level) = args.led_level {
            if !(0..=i64::from(led.max_level)).contains(&level) {
                return Err(PcrError::InvalidData(format!(
                    "{name}: led level {level} outside 0..={}",
                    led.max_level
                )));
            }
            rec.set_led_intensity_level(level)?;
        }
        if let Some(m) = args.multiplier {
            rec.set_concentration_multiplier(m)?;
        }
        if let Some(c) = args.coefficient.as_deref() {
            rec.set_concentration_coefficient(c)?;
        }
        if let Some(n) = args.max_cycle {
            rec.set_max_cycle(n)?;
        }
        Ok(())
    })?;
    session.save(&name)?;
    print_record(cli.json, session.get(&name)?);
    Ok(())
}

fn curve(session: &mut CliSession, name: &str, action: &CurveCmd) -> eyre::Result<()> {
    match action {
        CurveCmd::Add { log_dilution, ct } => session.update(name, |rec| {
            rec.curve_mut()
                .add(StandardCurvePoint::new(*log_dilution, *ct))
        })?,
        CurveCmd::Remove { index } => {
            session.update(name, |rec| rec.curve_mut().remove(*index).map(|_| ()))?;
        }
        CurveCmd::Clear => session.update(name, |rec| {
            rec.curve_mut().clear();
            Ok(())
        })?,
        CurveCmd::Import { path } => {
            let rows = pcr_config::load_standard_curve_csv(path)?;
            let added = rows.len();
            session.update(name, |rec| {
                rows.into_iter()
                    .try_for_each(|r| rec.curve_mut().add(StandardCurvePoint::from(r)))
            })?;
            tracing::info!(experiment = %name, added, "standard curve imported");
        }
    }
    Ok(())
}

fn finite_or_null(v: f64) -> serde_json::Value {
    if v.is_finite() { json!(v) } else { serde_json::Value::Null }
}

fn print_record(as_json: bool, rec: &ExperimentRecord) {
    if as_json {
        let doc = rec.to_document();
        let mut v = serde_json::to_value(&doc).unwrap_or_else(|_| json!({}));
        v["concentration"] = rec.concentration().map_or(serde_json::Value::Null, |c| json!(c));
        v["efficiency"] = finite_or_null(rec.efficiency());
        println!("{v}");
        return;
    }
    println!("Experiment:            {}", rec.name());
    if !rec.last_saved().is_empty() {
        println!("Last saved:            {}", rec.last_saved());
    }
    println!("LED intensity level:   {}", rec.led_intensity_level());
    println!("Max cycle:             {}", rec.max_cycle());
    println!("Intensity threshold:   {}", rec.intensity_threshold());
    match rec.cycle_threshold() {
        0 => println!("Cycle threshold:       not reached"),
        ct => println!("Cycle threshold:       {ct}"),
    }
    println!(
        "Concentration:         {} x {} = {}",
        rec.concentration_coefficient(),
        rec.concentration_multiplier(),
        rec.concentration()
            .map_or_else(|| "n/a".to_string(), |c| c.to_string())
    );
    println!(
        "Standard curve:        {} point(s), slope {:.4}, intercept {:.4}, R² {:.4}",
        rec.curve().len(),
        rec.slope(),
        rec.y_intercept(),
        rec.r_squared()
    );
    if rec.efficiency().is_finite() {
        println!("Efficiency:            {:.1}%", rec.efficiency());
    } else {
        println!("Efficiency:            undefined");
    }
    if !rec.summary().is_empty() {
        println!("Summary:               {}", rec.summary());
    }
    let samples: Vec<String> = rec
        .samples()
        .values()
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect();
    println!("Samples:               {}", samples.join(" "));
}

fn self_check(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    let mut port = acquire::make_port(cfg);
    let settle = Duration::from_millis(cfg.acquisition.settle_ms);
    let lux = acquire::self_check(port.as_mut(), settle, cfg.hardware.led_max_level)?;
    if cli.json {
        println!("{}", json!({ "ok": true, "lux": lux }));
    } else {
        println!("ok: light sensor read {lux:.2} lx");
    }
    Ok(())
}
