use anyhow::Result;
use std::path::Path;

use adaptbound::Config;

pub fn run(file: &Path, config: &Config, json: bool) -> Result<()> {
    let graph = super::load_graph(file, config)?;
    let bound = super::engine(config).bound_naive(&graph)?;

    if json {
        let output = serde_json::json!({
            "vertices": graph.len(),
            "bound": bound,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Reference bound: {}", bound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_naive_respects_reference_limit() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("chain.toml");
        std::fs::write(
            &file,
            concat!(
                "[[steps]]\nname = \"a\"\nquery = true\n\n",
                "[[steps]]\nname = \"b\"\nquery = true\ndepends_on = [\"a\"]\n\n",
                "[[steps]]\nname = \"c\"\ndepends_on = [\"b\"]\n",
            ),
        )
        .unwrap();
        let mut config = Config::default();
        assert!(run(&file, &config, true).is_ok());
        config.limits.max_reference_vertices = 2;
        let err = run(&file, &config, false).unwrap_err();
        assert!(err.to_string().contains("3 vertices"));
    }
}
