use super::{json_pretty, Context, EXIT_SUCCESS};
use snapshelf_catalog::installable;
use std::path::Path;

pub fn run(ctx: &Context, dir: Option<&Path>) -> Result<u8, String> {
    let dir = ctx.resolve_folder(dir);
    let catalog = ctx.load_catalog(&dir)?;
    let installed = ctx.installed()?;
    let entries = installable(catalog.entries(), &installed);

    if ctx.json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("nothing new to install from {}", dir.display());
    } else {
        println!("{:<32} {:<10} PATH", "NAME", "REVISION");
        for entry in &entries {
            println!(
                "{:<32} {:<10} {}",
                entry.name,
                entry.revision,
                entry.archive_path.display()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
