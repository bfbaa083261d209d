use std::path::{Path, PathBuf};

use lokiprobe_domain::{ConfigDocument, ProbeConfig};

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../demos")
}

fn demo_config() -> ProbeConfig {
    ProbeConfig::load_from_path(&demos_dir().join("probe.yaml")).expect("demo config loads")
}

#[test]
fn demo_config_is_valid() {
    let config = demo_config();
    assert_eq!(config.variants.len(), 3);
    assert_eq!(config.process_groups.len(), 3);
    assert_eq!(config.queries.windows.len(), 4);
    assert_eq!(config.results.path, demos_dir().join("results.txt"));
}

#[test]
fn demo_fragments_parse_as_mappings() {
    for variant in demo_config().variants {
        let text = std::fs::read_to_string(&variant.fragment).expect("fragment readable");
        ConfigDocument::parse(&text, &variant.name).expect("fragment parses");
    }
}
