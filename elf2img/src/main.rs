use std::path::PathBuf;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert a linked ELF into a finalized LogicROM application image, like
/// `objcopy -O binary` followed by the header size/CRC fixup.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short)]
    in_file: PathBuf,

    #[arg(short)]
    out_file: PathBuf,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let elf_data = std::fs::read(&args.in_file)
        .wrap_err_with(|| format!("Failed to open ELF file {}", args.in_file.display()))?;

    let raw = logicrom_image::elf::flatten(&elf_data).wrap_err("Failed to parse ELF file")?;
    info!("Binary size: {}", raw.len());

    let image = logicrom_image::finalize(&raw)?;
    info!("Image size: {}, CRC {:#010x}", image.declared_size(), image.checksum());

    std::fs::write(&args.out_file, image.as_bytes())
        .wrap_err_with(|| format!("Failed to write {}", args.out_file.display()))?;

    Ok(())
}
