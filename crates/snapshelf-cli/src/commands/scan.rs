use super::{json_pretty, Context, EXIT_SUCCESS};
use std::path::Path;

pub fn run(ctx: &Context, dir: Option<&Path>) -> Result<u8, String> {
    let dir = ctx.resolve_folder(dir);
    let catalog = ctx.load_catalog(&dir)?;

    if ctx.json {
        println!("{}", json_pretty(&catalog.entries())?);
    } else if catalog.is_empty() {
        println!("no package archives found in {}", dir.display());
    } else {
        println!("{:<32} {:<10} PATH", "NAME", "REVISION");
        for entry in catalog.entries() {
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
