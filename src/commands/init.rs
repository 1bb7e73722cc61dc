use sitetree::build::Rules;
use sitetree::config::{
    DEFAULT_CONFIG_FILE, GenerateConfig, MarkdownConfig, RecordConfig, SectionConfig, SiteConfig,
    TemplatesConfig,
};

use crate::InitArgs;

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
</head>
<body>
  <h1>{{ title }}</h1>
  <main>
{{ content_html }}
  </main>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
</head>
<body>
  <h1>{{ title }}</h1>
  <ul>
  {% for row in index %}
    <li><a href="{{ row.link }}">{{ row.title }}</a></li>
  {% endfor %}
  </ul>
</body>
</html>
"#;

const QR_PAGE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
</head>
<body>
  <table>
  {% for row in table %}
    <tr>
    {% for entry in row %}
      <td><img src="../{{ entry }}.png" alt="{{ entry }}"><br>{{ entry }}</td>
    {% endfor %}
    </tr>
  {% endfor %}
  </table>
</body>
</html>
"#;

const SOURCE_TEMPLATE: &str = "---\ntitle: {{ title }}\n---\n\n{{ content }}\n";

const WELCOME_PAGE: &str = "---\ntitle: Welcome\n---\n\nYour first page.\n";

pub fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            std::fs::create_dir_all(&path)?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "{config_file} already exists",
            config_file = config_file.display()
        ));
    }

    let pages = SectionConfig {
        name: "pages".into(),
        destination: "docs/pages".into(),
        source: Some("content/pages".into()),
        url_prefix: Some("https://example.org/pages/".into()),
        rules: Rules::default(),
        templates: TemplatesConfig {
            destination: Some("templates/page.html".into()),
            source: Some("templates/source.md".into()),
            index: Some("templates/index.html".into()),
            qr_pages: Some("templates/qr_page.html".into()),
        },
        index: Default::default(),
        qr: Default::default(),
        record: RecordConfig {
            required: vec!["title".into()],
        },
        children: vec![],
    };
    let default_config = SiteConfig {
        generate: GenerateConfig::default(),
        markdown: MarkdownConfig::default(),
        root: SectionConfig {
            name: "site".into(),
            destination: "docs".into(),
            source: None,
            url_prefix: None,
            rules: Rules::default(),
            templates: TemplatesConfig::default(),
            index: Default::default(),
            qr: Default::default(),
            record: RecordConfig::default(),
            children: vec![pages],
        },
    };

    println!("Initializing project in {}", path.display());

    let starter_files = [
        ("templates/page.html", PAGE_TEMPLATE),
        ("templates/index.html", INDEX_TEMPLATE),
        ("templates/qr_page.html", QR_PAGE_TEMPLATE),
        ("templates/source.md", SOURCE_TEMPLATE),
        ("content/pages/welcome.md", WELCOME_PAGE),
    ];
    for (relative, contents) in starter_files {
        let file = path.join(relative);
        if file.exists() {
            continue;
        }
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, contents)?;
    }

    let config_text = serde_yaml::to_string(&default_config)?;
    std::fs::write(&config_file, config_text)?;

    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    Ok(())
}
