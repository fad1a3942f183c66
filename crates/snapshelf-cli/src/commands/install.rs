use super::{print_report, spin_fail, spin_ok, spinner, Context};
use dialoguer::Confirm;
use snapshelf_core::{shutdown_requested, BatchReport, PackageResult};
use snapshelf_runtime::{check_offline_prereqs, format_missing};
use snapshelf_schema::PackageName;
use std::io::{stderr, stdin, IsTerminal};
use std::path::Path;

pub fn run(ctx: &Context, names: &[String], from: Option<&Path>, yes: bool) -> Result<u8, String> {
    let missing = check_offline_prereqs(&ctx.config);
    if !missing.is_empty() {
        return Err(format_missing(&missing));
    }

    let dir = ctx.resolve_folder(from);
    let catalog = ctx.load_catalog(&dir)?;
    let engine = ctx.engine();
    if engine.elevation().is_none() {
        return Err("installing needs elevated privileges; run through pkexec or sudo".to_owned());
    }

    let interactive = stdin().is_terminal() && stderr().is_terminal();
    if !yes && !ctx.json && interactive {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "install {} from {}?",
                names.join(", "),
                dir.display()
            ))
            .default(true)
            .interact()
            .map_err(|e| format!("prompt failed: {e}"))?;
        if !proceed {
            return Err("aborted".to_owned());
        }
    }

    let mut report = BatchReport::default();
    for name in names {
        if shutdown_requested() {
            report.interrupted = true;
            break;
        }
        let pb = (!ctx.json).then(|| spinner(&format!("installing {name}...")));
        let outcome = engine.install_with_prerequisites(name, &catalog);
        if let Some(pb) = &pb {
            if outcome.is_success() {
                spin_ok(pb, &format!("{name} installed"));
            } else {
                spin_fail(pb, &format!("{name}: {outcome}"));
            }
        }
        report.results.push(PackageResult {
            name: PackageName::new(name.as_str()),
            revision: catalog.lookup(name).map(|e| e.revision.get()),
            outcome,
        });
    }

    if ctx.json || report.interrupted {
        print_report(&report, ctx.json)?;
    }
    Ok(report.exit_status())
}
