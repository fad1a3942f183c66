use super::{json_pretty, Context, EXIT_SUCCESS};
use snapshelf_catalog::updatable;
use std::collections::BTreeMap;
use std::path::Path;

pub fn run(ctx: &Context, dir: Option<&Path>) -> Result<u8, String> {
    let dir = ctx.resolve_folder(dir);
    let catalog = ctx.load_catalog(&dir)?;
    let installed = ctx.installed()?;
    let entries = updatable(catalog.entries(), &installed);

    if ctx.json {
        println!("{}", json_pretty(&entries)?);
        return Ok(EXIT_SUCCESS);
    }
    if entries.is_empty() {
        println!("everything is up to date with {}", dir.display());
        return Ok(EXIT_SUCCESS);
    }

    let current: BTreeMap<&str, &str> = installed
        .iter()
        .map(|p| (p.name.as_str(), p.revision.as_str()))
        .collect();
    println!("{:<32} {:<10} {:<10} PATH", "NAME", "INSTALLED", "OFFLINE");
    for entry in &entries {
        println!(
            "{:<32} {:<10} {:<10} {}",
            entry.name,
            current.get(entry.name.as_str()).copied().unwrap_or("-"),
            entry.revision,
            entry.archive_path.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
