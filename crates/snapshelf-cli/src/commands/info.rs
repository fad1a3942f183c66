use super::{json_pretty, Context, EXIT_SUCCESS};
use snapshelf_schema::{Confinement, PackageName};
use std::path::Path;

pub fn run(ctx: &Context, archive: &Path) -> Result<u8, String> {
    let manifest = ctx
        .engine()
        .read_manifest(archive)
        .map_err(|e| e.to_string())?;

    if ctx.json {
        println!("{}", json_pretty(&manifest)?);
        return Ok(EXIT_SUCCESS);
    }

    let confinement = manifest
        .confinement
        .map_or("unspecified", Confinement::as_str);
    let prerequisites = if manifest.prerequisites.is_empty() {
        "none".to_owned()
    } else {
        manifest
            .prerequisites
            .iter()
            .map(PackageName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("name:          {}", manifest.name);
    println!("revision:      {}", manifest.revision);
    println!("summary:       {}", manifest.summary);
    println!("type:          {:?}", manifest.kind);
    println!("base:          {}", manifest.base);
    println!("confinement:   {confinement}");
    println!("prerequisites: {prerequisites}");
    println!("architectures: {}", manifest.architectures.join(", "));
    Ok(EXIT_SUCCESS)
}
