use super::{discover_folder, Context, EXIT_FAILURE, EXIT_SUCCESS};
use snapshelf_catalog::{is_offline_mirror, Arch};
use snapshelf_runtime::{
    check_offline_prereqs, format_missing, store_reachable, Elevation, SnapDaemon,
};

pub fn run(ctx: &Context) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    let missing = check_offline_prereqs(&ctx.config);
    if missing.is_empty() {
        checks.push(Check::pass("host_tools", "Host tools available"));
    } else {
        all_pass = false;
        checks.push(Check::fail("host_tools", &format_missing(&missing)));
    }

    match Arch::from_machine(&ctx.machine) {
        Ok(arch) => checks.push(Check::pass(
            "architecture",
            &format!("Offline folders are searched for {arch}"),
        )),
        Err(e) => checks.push(Check::warn("architecture", &e.to_string())),
    }

    match Elevation::detect() {
        Some(elevation) => checks.push(Check::pass(
            "privileges",
            &format!("Running through {elevation}"),
        )),
        None => checks.push(Check::info(
            "privileges",
            "Not running through pkexec or sudo (install and update will refuse)",
        )),
    }

    match ctx.daemon().version() {
        Ok(version) => checks.push(Check::pass("snapd", &format!("snapd {version}"))),
        Err(e) => {
            all_pass = false;
            checks.push(Check::fail("snapd", &format!("snapd not reachable: {e}")));
        }
    }

    if store_reachable(&ctx.config.store_probe_url, ctx.config.probe_timeout()) {
        checks.push(Check::pass("online_store", "Online store reachable"));
    } else {
        checks.push(Check::warn(
            "online_store",
            &format!("{} not reachable (offline only)", ctx.config.store_probe_url),
        ));
    }

    let folder = ctx
        .config
        .offline_root
        .clone()
        .unwrap_or_else(discover_folder);
    if is_offline_mirror(&folder) {
        checks.push(Check::pass(
            "offline_folder",
            &format!("Offline mirror at {}", folder.display()),
        ));
    } else {
        checks.push(Check::info(
            "offline_folder",
            &format!("No offline mirror found; default folder {}", folder.display()),
        ));
    }

    print_results(&checks, all_pass, ctx.json)
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("snapshelf doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed.");
        }
    }

    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}
