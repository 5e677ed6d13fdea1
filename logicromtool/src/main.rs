use std::path::{Path, PathBuf};
use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;
use logicrom_build::{
    Artifact, BuildEnv, BuildOptions, BuildType, FotaOutcome, HostPlatform, ImageStrategy, Pipeline,
    SystemRunner, Toolchain,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Arduino framework package containing cores/<core>/logicromsdk
    #[arg(long, env = "LOGICROM_FRAMEWORK_DIR", global = true)]
    framework_dir: Option<PathBuf>,

    /// Board manifest (JSON)
    #[arg(short, long, global = true)]
    board: Option<PathBuf>,

    #[arg(long, default_value = ".pio/build", global = true)]
    build_dir: PathBuf,

    #[arg(long, default_value = "firmware", global = true)]
    progname: String,

    /// Link the debug LogicROM runtime
    #[arg(long, action, global = true)]
    debug: bool,

    /// Override host platform detection (linux, windows, darwin)
    #[arg(long, global = true)]
    platform: Option<HostPlatform>,

    /// How to produce the application image (mkappimg, objcopy, native)
    #[arg(long, global = true)]
    image_strategy: Option<ImageStrategy>,

    #[arg(long, env = "LOGICROM_CC", global = true)]
    cc: Option<PathBuf>,

    #[arg(long, env = "LOGICROM_OBJCOPY", global = true)]
    objcopy: Option<PathBuf>,

    #[arg(long, env = "LOGICROM_PYTHON", global = true)]
    python: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Subcommands,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Pad a raw image and fix up its header size and CRC
    Finalize {
        image: PathBuf,
        /// Write here instead of rewriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    LinkerScript,

    Image {
        elf: PathBuf,
    },

    Pac {
        elf: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    Fota {
        pac: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    Flags {
        #[arg(long, action)]
        json: bool,
    },

    UploadArgs,

    Targets,
}

use Subcommands::*;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn load_env(args: &Args) -> color_eyre::Result<BuildEnv> {
    let host = match args.platform {
        Some(host) => host,
        None => HostPlatform::current()
            .ok_or_else(|| eyre!("unsupported host OS {}; pass --platform", std::env::consts::OS))?,
    };

    let framework_dir = args.framework_dir.clone()
        .ok_or_else(|| eyre!("--framework-dir (or LOGICROM_FRAMEWORK_DIR) is required"))?;
    let board = args.board.clone().ok_or_else(|| eyre!("--board is required"))?;

    let defaults = Toolchain::for_host(host);
    let toolchain = Toolchain {
        cc: args.cc.clone().unwrap_or(defaults.cc),
        objcopy: args.objcopy.clone().unwrap_or(defaults.objcopy),
        python: args.python.clone().unwrap_or(defaults.python),
    };

    let options = BuildOptions {
        framework_dir,
        board: board.clone(),
        build_dir: args.build_dir.clone(),
        progname: args.progname.clone(),
        build_type: if args.debug { BuildType::Debug } else { BuildType::Release },
        host,
        image_strategy: args.image_strategy,
        toolchain: Some(toolchain),
    };

    BuildEnv::load(options).wrap_err_with(|| format!("Failed to load build configuration for {}", board.display()))
}

fn finalize(image: &Path, output: Option<&Path>) -> color_eyre::Result<()> {
    let finalized = match output {
        None => logicrom_image::finalize_file(image)?,
        Some(output) => {
            let raw = std::fs::read(image).wrap_err_with(|| format!("Failed to read {}", image.display()))?;
            info!("Binary size: {}", raw.len());
            let finalized = logicrom_image::finalize(&raw)?;
            std::fs::write(output, finalized.as_bytes())
                .wrap_err_with(|| format!("Failed to write {}", output.display()))?;
            finalized
        }
    };

    println!("size {:#x}, crc {:#010x}", finalized.declared_size(), finalized.checksum());
    Ok(())
}

fn print_flags(env: &BuildEnv, json: bool) -> color_eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&env.flags)?);
        return Ok(());
    }

    let flags = &env.flags;
    let paths = |dirs: &[PathBuf]| dirs.iter().map(|d| d.display().to_string()).collect::<Vec<_>>().join(" ");

    println!("BUILD_TYPE: {}", flags.build_type);
    println!("ASFLAGS: {}", flags.asflags.join(" "));
    println!("CCFLAGS: {}", flags.ccflags.join(" "));
    println!("CFLAGS: {}", flags.cflags.join(" "));
    println!("CXXFLAGS: {}", flags.cxxflags.join(" "));
    println!("CPPDEFINES: {}", flags.define_flags().collect::<Vec<_>>().join(" "));
    println!("CPPPATH: {}", paths(&flags.include_dirs));
    println!("LINKFLAGS: {}", flags.linkflags.join(" "));
    println!("LIBS: {}", flags.link_libs().join(" "));
    println!("LIBPATH: {}", paths(&flags.lib_dirs));
    println!("LIBSOURCE_DIRS: {}", paths(&flags.lib_source_dirs));
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Finalize { image, output } => finalize(image, output.as_deref())?,
        Targets => {
            for artifact in Artifact::all() {
                println!("{:<14} {} -> {}", artifact.builder_name(), artifact.source_suffix(), artifact.suffix());
            }
        }
        LinkerScript => {
            let env = load_env(&args)?;
            let script = Pipeline::new(&env, SystemRunner).linker_script()?;
            println!("{}", script.display());
        }
        Image { elf } => {
            let env = load_env(&args)?;
            let img = Pipeline::new(&env, SystemRunner).firmware_image(elf)?;
            println!("{}", img.display());
        }
        Pac { elf, output } => {
            let env = load_env(&args)?;
            let pac = Pipeline::new(&env, SystemRunner).package(elf, output)?;
            println!("{}", pac.display());
        }
        Fota { pac, output } => {
            let env = load_env(&args)?;
            match Pipeline::new(&env, SystemRunner).fota(pac, output)? {
                FotaOutcome::Created(bin) => println!("{}", bin.display()),
                // printed regardless of RUST_LOG
                FotaOutcome::Unsupported(message) => println!("{message}"),
            }
        }
        Flags { json } => print_flags(&load_env(&args)?, *json)?,
        UploadArgs => println!("{}", load_env(&args)?.upload_args().join(" ")),
    }

    Ok(())
}
