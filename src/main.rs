use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use qirust_live::helper::{save_png, to_data_uri, to_svg_string, to_terminal_string};
use qirust_live::preview::{
    FormEvent, FormState, ImageSurface, LivePreview, MetaPanel, StatusLine,
};
use qirust_live::{PreviewConfig, QrCodeGenEncoder};

type Preview = LivePreview<QrCodeGenEncoder, ImageSurface, MetaPanel, StatusLine>;

/// Live QR code preview: renders the form values and re-renders on every edit.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Message to encode
    #[arg(short, long)]
    text: Option<String>,

    /// Auxiliary text, encoded after the message when enabled
    #[arg(long)]
    aux: Option<String>,

    /// Error correction level: L, M, Q or H
    #[arg(short, long)]
    ecl: Option<String>,

    /// Pixels per module (clamped to 2-20)
    #[arg(short, long, allow_hyphen_values = true)]
    scale: Option<String>,

    /// Quiet zone in modules (clamped to 0-10)
    #[arg(short, long, allow_hyphen_values = true)]
    margin: Option<String>,

    /// JSON preview settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON form snapshot to start from
    #[arg(long)]
    form: Option<PathBuf>,

    /// PNG file rewritten after every render
    #[arg(short, long, default_value = "generated/qr.png")]
    output: PathBuf,

    /// Also write an SVG file
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print the PNG as a data URI
    #[arg(long)]
    data_uri: bool,

    /// Stamp the metadata with the generation time
    #[arg(long)]
    timestamp: bool,

    /// Encode the auxiliary text field
    #[arg(long)]
    aux_field: bool,

    /// Do not print the terminal preview
    #[arg(short, long)]
    quiet: bool,

    /// Read `field=value` edits from stdin and re-render after each one
    #[arg(short, long)]
    watch: bool,
}

impl Args {
    fn config(&self) -> Result<PreviewConfig> {
        let mut config = match &self.config {
            Some(path) => PreviewConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PreviewConfig::default(),
        };
        config.timestamp |= self.timestamp;
        config.auxiliary |= self.aux_field;
        Ok(config)
    }

    fn form(&self) -> Result<FormState> {
        let mut form = match &self.form {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading form {}", path.display()))?;
                FormState::from_json(&json)?
            }
            None => FormState::default(),
        };
        let overrides = [
            (&mut form.text, &self.text),
            (&mut form.auxiliary, &self.aux),
            (&mut form.error_level, &self.ecl),
            (&mut form.scale, &self.scale),
            (&mut form.margin, &self.margin),
        ];
        for (slot, value) in overrides {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
        Ok(form)
    }
}

fn publish(preview: &Preview, args: &Args) -> Result<()> {
    println!("{}", preview.status().text());
    let fields = preview.meta().fields();
    println!(
        "version: {}  size: {}  level: {}  mask: {}",
        fields.version, fields.size, fields.error_level, fields.mask
    );
    if preview.config().timestamp {
        println!("generated: {}", fields.timestamp);
    }

    let Some(result) = preview.surface().current() else {
        return Ok(());
    };

    save_png(&result.image, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if let Some(path) = &args.svg {
        let svg = to_svg_string(&result.matrix, &result.options, &preview.config().palette());
        std::fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    if args.data_uri {
        println!("{}", to_data_uri(&result.image)?);
    }
    if !args.quiet {
        print!("{}", to_terminal_string(&result.matrix, result.options.margin));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut preview = LivePreview::new(
        args.config()?,
        ImageSurface::default(),
        MetaPanel::default(),
        StatusLine::default(),
    );

    let state = preview.load(args.form()?);
    info!("initial render: {state}");
    publish(&preview, &args)?;

    if !args.watch {
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = match FormEvent::parse_edit(&line) {
            Ok(event) => event,
            Err(err) => {
                error!("{err}");
                continue;
            }
        };
        preview.handle(&event);
        publish(&preview, &args)?;
    }
    Ok(())
}
