use anyhow::{Result, bail};
use std::path::Path;

use adaptbound::{BoundReport, Config};

pub fn run(file: &Path, config: &Config, verify: bool, json: bool) -> Result<()> {
    let graph = super::load_graph(file, config)?;
    let engine = super::engine(config);
    let analysis = engine.analyze(&graph)?;
    let mut report = BoundReport::new(&graph, &analysis);

    if verify {
        let path = engine.critical_path(&graph)?;
        report = report.with_reference(&graph, &path);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }

    if !report.is_consistent() {
        let reference = report.reference.as_ref().map_or(0, |r| r.bound);
        bail!(
            "bound mismatch for {}: decomposition gives {}, enumeration gives {}",
            file.display(),
            report.bound,
            reference
        );
    }
    Ok(())
}

fn print_human(report: &BoundReport) {
    println!("Adaptivity bound: {}", report.bound);
    if report.coarse_bound != report.bound {
        println!(
            "  (component estimate {} counts walks that cannot be chained across components)",
            report.coarse_bound
        );
    }
    if let Some(reference) = &report.reference {
        let verdict = if reference.agrees { "agrees" } else { "DISAGREES" };
        println!("Reference enumerator: {} ({})", reference.bound, verdict);
        if !reference.critical_path.is_empty() {
            println!("Critical path: {}", reference.critical_path.join(" -> "));
        }
    }
}
