//! Command-line tool for inspecting and editing JPEG Exif segments

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use exif_splice::{
    remove_adobe_metadata, remove_exif_segment, tables, update_exif_segment, IfdGraph, IfdKind,
    Tag, TagValue,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// JPEG Exif segment editor
#[derive(Parser)]
#[command(name = "exif-splice")]
#[command(about = "Inspects and edits Exif metadata in JPEG files")]
#[command(version)]
struct Cli {
    /// Enable per-marker and per-IFD diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump every IFD of a JPEG file
    Dump { file: PathBuf },
    /// Remove the Exif segment
    Strip { input: PathBuf, output: PathBuf },
    /// Remove the Adobe XMP metadata segment
    StripXmp { input: PathBuf, output: PathBuf },
    /// Drop GPS data, the thumbnail directory and identifying tags
    Scrub { input: PathBuf, output: PathBuf },
    /// Save the embedded thumbnail JPEG
    Thumbnail { input: PathBuf, output: PathBuf },
    /// Embed a thumbnail JPEG into the Exif segment
    SetThumbnail {
        input: PathBuf,
        thumbnail: PathBuf,
        output: PathBuf,
    },
    /// Replace the Make tag in the 0th IFD
    SetMake {
        input: PathBuf,
        value: String,
        output: PathBuf,
    },
}

/// Tags the scrub command drops, on top of the GPS and 1st IFDs
const SENSITIVE_TAGS: &[(IfdKind, u16)] = &[
    (IfdKind::Zeroth, tables::MAKE),
    (IfdKind::Zeroth, tables::MODEL),
    (IfdKind::Zeroth, tables::DATE_TIME),
    (IfdKind::Zeroth, tables::IMAGE_DESCRIPTION),
    (IfdKind::Zeroth, tables::SOFTWARE),
    (IfdKind::Zeroth, tables::ARTIST),
    (IfdKind::Exif, tables::MAKER_NOTE),
    (IfdKind::Exif, tables::USER_COMMENT),
    (IfdKind::Exif, tables::DATE_TIME_ORIGINAL),
    (IfdKind::Exif, tables::DATE_TIME_DIGITIZED),
    (IfdKind::Exif, tables::SUB_SEC_TIME),
    (IfdKind::Exif, tables::SUB_SEC_TIME_ORIGINAL),
    (IfdKind::Exif, tables::SUB_SEC_TIME_DIGITIZED),
    (IfdKind::Exif, tables::IMAGE_UNIQUE_ID),
    (IfdKind::Exif, tables::CAMERA_OWNER_NAME),
    (IfdKind::Exif, tables::BODY_SERIAL_NUMBER),
    (IfdKind::Exif, tables::LENS_MAKE),
    (IfdKind::Exif, tables::LENS_MODEL),
    (IfdKind::Exif, tables::LENS_SERIAL_NUMBER),
];

/// JFIF preamble a standalone thumbnail file may carry; the embedded copy
/// must start at its own SOI instead
const JFIF_HEADER: [u8; 18] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01,
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Dump { file } => dump(&file, cli.verbose),
        Command::Strip { input, output } => strip(&input, &output),
        Command::StripXmp { input, output } => strip_xmp(&input, &output),
        Command::Scrub { input, output } => scrub(&input, &output),
        Command::Thumbnail { input, output } => save_thumbnail(&input, &output),
        Command::SetThumbnail {
            input,
            thumbnail,
            output,
        } => set_thumbnail(&input, &thumbnail, &output),
        Command::SetMake {
            input,
            value,
            output,
        } => set_make(&input, &value, &output),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_graph(path: &Path) -> anyhow::Result<IfdGraph> {
    match IfdGraph::from_file(path).with_context(|| format!("reading {}", path.display()))? {
        Some(graph) => Ok(graph),
        None => bail!("{} does not contain an Exif segment", path.display()),
    }
}

fn dump(file: &Path, verbose: bool) -> anyhow::Result<()> {
    let graph = load_graph(file)?;
    if graph.is_partial() {
        eprintln!(
            "{} contains one or more damaged IFDs; dump is partial",
            file.display()
        );
    }
    print!("{}", graph.dump(verbose));
    Ok(())
}

fn strip(input: &Path, output: &Path) -> anyhow::Result<()> {
    if remove_exif_segment(input, output)? {
        println!("Exif segment removed, wrote {}", output.display());
    } else {
        println!("{} has no Exif segment", input.display());
    }
    Ok(())
}

fn strip_xmp(input: &Path, output: &Path) -> anyhow::Result<()> {
    if remove_adobe_metadata(input, output)? {
        println!("XMP segment removed, wrote {}", output.display());
    } else {
        println!("{} has no XMP segment", input.display());
    }
    Ok(())
}

fn scrub(input: &Path, output: &Path) -> anyhow::Result<()> {
    let mut graph = load_graph(input)?;
    graph.remove_ifd(IfdKind::Gps);
    graph.remove_ifd(IfdKind::First);
    let mut removed = 0;
    for &(kind, id) in SENSITIVE_TAGS {
        removed += graph.remove_tag(kind, id);
    }
    update_exif_segment(input, output, &mut graph)?;
    println!(
        "dropped {removed} tags, wrote {}",
        output.display()
    );
    Ok(())
}

fn save_thumbnail(input: &Path, output: &Path) -> anyhow::Result<()> {
    let graph = load_graph(input)?;
    let thumbnail = graph
        .thumbnail()
        .with_context(|| format!("{} has no thumbnail", input.display()))?;
    fs::write(output, &thumbnail).with_context(|| format!("writing {}", output.display()))?;
    println!("saved {} thumbnail bytes to {}", thumbnail.len(), output.display());
    Ok(())
}

fn set_thumbnail(input: &Path, thumbnail: &Path, output: &Path) -> anyhow::Result<()> {
    let data = fs::read(thumbnail).with_context(|| format!("reading {}", thumbnail.display()))?;
    let trimmed = strip_jfif_header(data);

    let mut graph = match IfdGraph::from_file(input)? {
        Some(graph) => graph,
        None => {
            let mut graph = IfdGraph::new();
            graph.insert_ifd(IfdKind::Zeroth)?;
            graph
        }
    };
    graph.set_thumbnail(&trimmed)?;
    update_exif_segment(input, output, &mut graph)?;
    println!("embedded {} thumbnail bytes into {}", trimmed.len(), output.display());
    Ok(())
}

/// Drop a leading JFIF APP0 header so the embedded thumbnail opens with SOI
fn strip_jfif_header(mut data: Vec<u8>) -> Vec<u8> {
    if data.len() > JFIF_HEADER.len() && data[..10] == JFIF_HEADER[..10] {
        let mut trimmed = data.split_off(JFIF_HEADER.len());
        trimmed.insert(0, 0xD8);
        trimmed.insert(0, 0xFF);
        return trimmed;
    }
    data
}

fn set_make(input: &Path, value: &str, output: &Path) -> anyhow::Result<()> {
    let mut graph = match IfdGraph::from_file(input)? {
        Some(mut graph) => {
            graph.remove_tag(IfdKind::Zeroth, tables::MAKE);
            graph
        }
        None => {
            let mut graph = IfdGraph::new();
            graph.insert_ifd(IfdKind::Zeroth)?;
            graph
        }
    };
    graph.insert_tag(IfdKind::Zeroth, Tag::new(tables::MAKE, TagValue::ascii(value))?)?;
    update_exif_segment(input, output, &mut graph)?;
    println!("set Make to [{value}], wrote {}", output.display());
    Ok(())
}
