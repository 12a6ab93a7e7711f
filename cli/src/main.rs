use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use ww2ogg::{
    CodebookLibrary, CodebookSource, ConversionOptions, ForcePacketFormat, WwiseRiffVorbis,
};

#[derive(Parser)]
#[command(name = "ww2ogg")]
#[command(about = "Convert Wwise RIFF/RIFX Vorbis audio (.wem) to Ogg Vorbis", version)]
struct Cli {
    /// Input WEM file
    input: PathBuf,

    /// Output OGG file (defaults to the input with an .ogg extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Codebooks are stored inline in the setup packet
    #[arg(long)]
    inline_codebooks: bool,

    /// Setup packet carries full Vorbis setup data (implies inline codebooks)
    #[arg(long)]
    full_setup: bool,

    /// Force the modified Wwise packet layout
    #[arg(long, conflicts_with = "no_mod_packets")]
    mod_packets: bool,

    /// Force the standard Vorbis packet layout
    #[arg(long)]
    no_mod_packets: bool,

    /// External packed codebooks file
    #[arg(long, value_name = "FILE", conflicts_with = "pcb_aotuv")]
    pcb: Option<PathBuf>,

    /// Use the embedded aoTuV 6.03 codebooks instead of the standard set
    #[arg(long)]
    pcb_aotuv: bool,
}

impl Cli {
    fn options(&self) -> ConversionOptions {
        let force = if self.mod_packets {
            ForcePacketFormat::ForceModPackets
        } else if self.no_mod_packets {
            ForcePacketFormat::ForceNoModPackets
        } else {
            ForcePacketFormat::NoForce
        };
        ConversionOptions::new()
            .with_inline_codebooks(self.inline_codebooks || self.full_setup)
            .with_full_setup(self.full_setup)
            .with_force_packet_format(force)
    }

    fn codebook_source(&self) -> CodebookSource {
        if let Some(path) = &self.pcb {
            CodebookSource::External(path.clone())
        } else if self.pcb_aotuv {
            CodebookSource::EmbeddedAotuv
        } else if self.inline_codebooks || self.full_setup {
            CodebookSource::InlineOnly
        } else {
            CodebookSource::EmbeddedStandard
        }
    }
}

/// One end-to-end conversion into a fresh in-memory buffer.
fn convert(
    data: &[u8],
    codebooks: CodebookLibrary,
    options: ConversionOptions,
) -> std::result::Result<Vec<u8>, ww2ogg::Ww2OggError> {
    let mut converter = WwiseRiffVorbis::builder(Cursor::new(data), codebooks)
        .options(options)
        .build()?;
    let mut out = Vec::new();
    converter.generate_ogg(&mut out)?;
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let out_path = match &cli.output {
        Some(path) => path.clone(),
        None => cli.input.with_extension("ogg"),
    };

    let data =
        fs::read(&cli.input).with_context(|| format!("Error opening {}", cli.input.display()))?;

    let source = cli.codebook_source();
    let options = cli.options();

    let ogg = match convert(&data, source.load()?, options.clone()) {
        Ok(ogg) => ogg,
        // With the default embedded set, a codebook-shaped failure is worth
        // one retry against the aoTuV set before giving up. Parse and file
        // errors are never retried.
        Err(e) if e.is_codebook_family() && source == CodebookSource::EmbeddedStandard => {
            println!("{e}; retrying with aoTuV codebooks");
            match convert(&data, CodebookSource::EmbeddedAotuv.load()?, options) {
                Ok(ogg) => ogg,
                Err(retry) => bail!("{retry}"),
            }
        }
        Err(e) => bail!("{e}"),
    };

    fs::write(&out_path, &ogg)
        .with_context(|| format!("Error writing {}", out_path.display()))?;

    println!(
        "Converted {} -> {} ({} bytes)",
        cli.input.display(),
        out_path.display(),
        ogg.len()
    );
    Ok(())
}
