use super::{print_report, spin_fail, spin_ok, spinner, Context, EXIT_FAILURE};
use snapshelf_core::BatchReport;
use snapshelf_runtime::{
    check_offline_prereqs, check_online_prereqs, format_missing, store_reachable,
};
use std::path::Path;
use tracing::{info, warn};

pub fn run(ctx: &Context, from: Option<&Path>, online: bool) -> Result<u8, String> {
    let offline = from.is_some() || !online;
    let missing = if offline {
        check_offline_prereqs(&ctx.config)
    } else {
        check_online_prereqs(&ctx.config)
    };
    if !missing.is_empty() {
        return Err(format_missing(&missing));
    }

    let engine = ctx.engine();
    if engine.elevation().is_none() {
        return Err("updating needs elevated privileges; run through pkexec or sudo".to_owned());
    }
    match engine.daemon().version() {
        Ok(version) => info!("snapd version: {version}"),
        Err(e) => warn!("cannot query snapd version: {e}"),
    }

    let mut report = BatchReport::default();
    let mut status: u8 = 0;

    if offline {
        let dir = ctx.resolve_folder(from);
        let catalog = ctx.load_catalog(&dir)?;
        let pb = (!ctx.json).then(|| spinner(&format!("updating from {}...", dir.display())));
        let pass = engine.update_offline(&catalog);
        if let Some(pb) = &pb {
            match &pass {
                Ok(r) if r.failures().next().is_none() => {
                    spin_ok(pb, &format!("{} packages updated offline", r.results.len()));
                }
                Ok(r) => spin_fail(pb, &format!("{} offline updates failed", r.failures().count())),
                Err(e) => spin_fail(pb, &e.to_string()),
            }
        }
        report.merge(pass.map_err(|e| e.to_string())?);
    }

    if online && !report.interrupted {
        if store_reachable(&ctx.config.store_probe_url, ctx.config.probe_timeout()) {
            let pb = (!ctx.json).then(|| spinner("refreshing from the online store..."));
            let pass = engine.update_online();
            if let Some(pb) = &pb {
                match &pass {
                    Ok(r) if r.failures().next().is_none() => {
                        spin_ok(pb, &format!("{} packages refreshed", r.results.len()));
                    }
                    Ok(r) => spin_fail(pb, &format!("{} refreshes failed", r.failures().count())),
                    Err(e) => spin_fail(pb, &e.to_string()),
                }
            }
            report.merge(pass.map_err(|e| e.to_string())?);
        } else {
            eprintln!(
                "warning: {} is not reachable; skipping online update",
                ctx.config.store_probe_url
            );
            status = EXIT_FAILURE;
        }
    }

    print_report(&report, ctx.json)?;
    Ok(report.exit_status().saturating_add(status))
}
