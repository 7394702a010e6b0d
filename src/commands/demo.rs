use anyhow::Result;

use adaptbound::{BoundReport, Config};
use adaptbound::pipeline::demo_graph;

pub fn run(config: &Config, json: bool) -> Result<()> {
    let graph = demo_graph()?;
    let engine = super::engine(config);
    let analysis = engine.analyze(&graph)?;
    let path = engine.critical_path(&graph)?;
    let report = BoundReport::new(&graph, &analysis).with_reference(&graph, &path);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_human());
    }
    Ok(())
}
