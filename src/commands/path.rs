use anyhow::Result;
use std::path::Path;

use adaptbound::Config;

pub fn run(file: &Path, config: &Config, json: bool) -> Result<()> {
    let graph = super::load_graph(file, config)?;
    let path = super::engine(config).critical_path(&graph)?;
    let names = graph.walk_names(&path.walk);

    if json {
        let output = serde_json::json!({
            "score": path.score,
            "walk": names,
            "length": names.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No walk: every vertex has capacity 0.");
        return Ok(());
    }
    println!("Critical path ({} query steps):", path.score);
    for (i, name) in names.iter().enumerate() {
        let marker = match graph.index_of(name) {
            Some(v) if graph.is_query(v) => "*",
            _ => " ",
        };
        println!("  {:>3}. {} {}", i + 1, marker, name);
    }
    Ok(())
}
