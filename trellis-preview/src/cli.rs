//! Command-line arguments and the preview run itself.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use trellis_api::{Layout, ObjectValue};
use trellis_kernel::parsers::ViewItem;
use trellis_kernel::widget::describe_tree;
use trellis_kernel::{
    EditorContext, IdGenerator, Inflater, InflaterConfig, LayoutStore, ParserRegistry, Session,
    WidgetRef, NO_DATA_INDEX,
};

#[derive(Parser, Debug)]
#[command(name = "trellis-preview")]
#[command(about = "Inflate a layout headlessly and print the widget tree", long_about = None)]
#[command(version)]
pub struct Args {
    /// JSON document mapping layout names to layouts
    pub layouts: PathBuf,

    /// Name of the layout to inflate
    #[arg(short, long)]
    pub layout: String,

    /// JSON object used as the data context
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Data index, for previewing one item of a repeated collection
    #[arg(short, long, default_value_t = NO_DATA_INDEX, allow_negative_numbers = true)]
    pub index: i32,

    /// Inflater config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render unknown view types as plain views instead of failing
    #[arg(long)]
    pub placeholders: bool,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn config(&self) -> Result<InflaterConfig> {
        let config = match &self.config {
            Some(path) => InflaterConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => InflaterConfig::default(),
        };
        let mut config = config.with_env_overrides();
        if self.verbose > 0 {
            config.verbose = true;
        }
        Ok(config)
    }

    fn data(&self) -> Result<ObjectValue> {
        let Some(path) = &self.data else {
            return Ok(ObjectValue::new());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read data {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid data JSON in {}", path.display()))?;
        match json {
            serde_json::Value::Object(map) => Ok(ObjectValue::from_json_map(map)),
            other => anyhow::bail!("data must be a JSON object, got {}", other),
        }
    }
}

fn placeholder(
    _inflater: &Inflater,
    view_type: &str,
    _layout: &Arc<Layout>,
    _data: &ObjectValue,
    _data_index: i32,
) -> Option<WidgetRef> {
    tracing::warn!("no parser for '{}', using a placeholder view", view_type);
    Some(Arc::new(ViewItem::new()))
}

/// Inflate the requested layout and render the resulting tree.
pub fn run(args: &Args) -> Result<String> {
    let config = args.config()?;
    let data = args.data()?;

    let ids = Arc::new(IdGenerator::new());
    let text = std::fs::read_to_string(&args.layouts)
        .with_context(|| format!("failed to read layouts {}", args.layouts.display()))?;
    let mut layouts = LayoutStore::new();
    let count = layouts
        .load_json(&text, &ids)
        .with_context(|| format!("invalid layouts in {}", args.layouts.display()))?;
    tracing::info!("loaded {} layouts from {}", count, args.layouts.display());

    let mut builder = EditorContext::builder()
        .parsers(ParserRegistry::with_builtins(&ids))
        .layouts(layouts)
        .config(config);
    if args.placeholders {
        builder = builder.callback(placeholder);
    }
    let session = Session::new(Arc::new(builder.build()), ids);

    let root = session
        .inflater()
        .inflate_named_indexed(&args.layout, &data, args.index)
        .with_context(|| format!("failed to inflate '{}'", args.layout))?;
    Ok(describe_tree(&root, session.ids()))
}
