use super::{human_size, json_pretty, Context, EXIT_SUCCESS};
use snapshelf_runtime::SnapDaemon;

pub fn run(ctx: &Context) -> Result<u8, String> {
    let updates = ctx
        .daemon()
        .list_remote_updates()
        .map_err(|e| e.to_string())?;

    if ctx.json {
        println!("{}", json_pretty(&updates)?);
    } else if updates.is_empty() {
        println!("no online updates available");
    } else {
        println!("{:<32} SIZE", "NAME");
        for (name, size) in &updates {
            println!("{name:<32} {}", human_size(*size));
        }
    }
    Ok(EXIT_SUCCESS)
}
