use super::{json_pretty, Context, EXIT_FAILURE, EXIT_SUCCESS};
use snapshelf_core::arrange_wayward;
use snapshelf_runtime::{invoking_user, UnsquashfsReader};
use std::path::Path;

pub fn run(ctx: &Context, dir: Option<&Path>) -> Result<u8, String> {
    let dir = ctx.resolve_folder(dir);
    let reader = UnsquashfsReader::new(ctx.config.unsquashfs_binary.clone());
    let owner = invoking_user();

    let report = arrange_wayward(&dir, &reader, owner.as_ref()).map_err(|e| e.to_string())?;

    if ctx.json {
        println!("{}", json_pretty(&report)?);
    } else if report.moved.is_empty() && report.skipped.is_empty() && report.failed.is_empty() {
        println!("nothing to arrange in {}", dir.display());
    } else {
        for (archive, arches) in &report.moved {
            println!("{} -> {}", archive.display(), arches.join(", "));
        }
        for archive in &report.skipped {
            println!("skipped {} (unreadable)", archive.display());
        }
        for archive in &report.failed {
            println!("left {} in place (could not be moved)", archive.display());
        }
        println!("existing packages moved into architecture folders");
    }
    Ok(if report.failed.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
