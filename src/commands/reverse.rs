use anyhow::Context;
use sitetree::build::reverse;
use sitetree::build::{DEFAULT_EXCEPTIONS, Selector};
use sitetree::config::{SiteConfig, base_path_from_config, config_path_from_arg};

use crate::ReverseArgs;

pub fn run(args: &ReverseArgs) -> Result<(), anyhow::Error> {
    let config_path = config_path_from_arg(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_arg(Some(&config_path))
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let root = config.section_tree(&base_path_from_config(&config_path));
    let exceptions = Selector::compile(DEFAULT_EXCEPTIONS)?;

    let sections: Vec<_> = root
        .iter()
        .filter(|node| match &args.section {
            Some(name) => &node.name == name,
            None => node.source_template_path.is_some(),
        })
        .collect();
    if let Some(name) = &args.section
        && sections.is_empty()
    {
        anyhow::bail!("no section named '{name}' in {}", config_path.display());
    }

    let dry_run = !args.write;
    for node in sections {
        let targets = reverse::generate(node, &exceptions, dry_run)?;
        for target in &targets {
            println!("{}: {}", node.name, target.display());
        }
        println!("{}: {} pages converted back", node.name, targets.len());
    }
    if dry_run {
        println!("Nothing was written; pass --write to write the markdown files");
    }

    Ok(())
}
