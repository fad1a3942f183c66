use super::{discover_folder, json_pretty, Context, EXIT_SUCCESS};
use snapshelf_catalog::is_offline_mirror;

pub fn run(ctx: &Context) -> Result<u8, String> {
    let folder = discover_folder();
    let mirror = is_offline_mirror(&folder);
    if ctx.json {
        let payload = serde_json::json!({
            "folder": folder,
            "offline_mirror": mirror,
        });
        println!("{}", json_pretty(&payload)?);
    } else if mirror {
        println!("{} (offline mirror)", folder.display());
    } else {
        println!("{}", folder.display());
    }
    Ok(EXIT_SUCCESS)
}
