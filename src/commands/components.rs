use anyhow::Result;
use std::path::Path;

use adaptbound::{Analysis, Config, FlowGraph};

pub fn run(file: &Path, config: &Config, json: bool) -> Result<()> {
    let graph = super::load_graph(file, config)?;
    let analysis = super::engine(config).analyze(&graph)?;

    if json {
        print_json(&analysis, &graph)?;
    } else {
        print_human(&analysis, &graph);
    }
    Ok(())
}

fn member_names(analysis: &Analysis, graph: &FlowGraph, id: usize) -> Vec<String> {
    analysis
        .partition
        .component(id)
        .members
        .iter()
        .map(|&v| graph.name(v).to_string())
        .collect()
}

fn print_json(analysis: &Analysis, graph: &FlowGraph) -> Result<()> {
    let components: Vec<_> = analysis
        .order
        .iter()
        .map(|&id| {
            serde_json::json!({
                "id": id,
                "members": member_names(analysis, graph, id),
                "size": analysis.partition.component(id).len(),
                "internal_bound": analysis.internal_bounds[id],
            })
        })
        .collect();

    let edges: Vec<_> = analysis
        .condensation
        .edges()
        .into_iter()
        .map(|(from, to)| serde_json::json!({ "from": from, "to": to }))
        .collect();

    let output = serde_json::json!({
        "component_count": analysis.partition.len(),
        "components": components,
        "condensation_edges": edges,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_human(analysis: &Analysis, graph: &FlowGraph) {
    if analysis.partition.is_empty() {
        println!("Graph has no vertices.");
        return;
    }

    println!("Components: {}\n", analysis.partition.len());
    for &id in &analysis.order {
        let component = analysis.partition.component(id);
        let kind = if component.is_singleton() {
            "single"
        } else {
            "cyclic"
        };
        println!(
            "  [{}] {:<6} internal={}  {}",
            id,
            kind,
            analysis.internal_bounds[id],
            member_names(analysis, graph, id).join(", ")
        );
    }

    let edges = analysis.condensation.edges();
    if !edges.is_empty() {
        println!("\nCondensation edges:");
        for (from, to) in edges {
            println!("  {} -> {}", from, to);
        }
    }
}
