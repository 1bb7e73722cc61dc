use anyhow::Context;
use sitetree::build::{Generator, NukeGate};
use sitetree::config::{SiteConfig, base_path_from_config, config_path_from_arg};

use crate::BuildArgs;

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = config_path_from_arg(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_arg(Some(&config_path))
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);
    let root = config.section_tree(&base_path);

    let generator = Generator::new(config.generate_options()?);
    let summary = generator.run(&root, &mut NukeGate::interactive())?;

    println!(
        "Generated {} sections ({} converted, {} copied, {} indexed, {} QR images, {} QR pages)",
        summary.sections,
        summary.converted,
        summary.copied,
        summary.indexed,
        summary.qr_images,
        summary.qr_pages
    );
    if summary.nuked > 0 {
        println!("Removed {} destination trees before generating", summary.nuked);
    }

    Ok(())
}
