use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tpdne", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample and publish images until the process is stopped.
    Run(RunArgs),
    /// Print the nginx site serving the published image.
    Nginx(NginxArgs),
    /// Print the systemd unit for a run configuration.
    Systemd(SystemdArgs),
}

/// Run file accepted by `--config`: publish settings plus the sampler to use.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunFile {
    publish: tpdne::PublishConfig,
    source: tpdne::SourceConfig,
}

#[derive(Args, Debug)]
struct PublishArgs {
    /// JSON run file; when given, the publish and source flags below are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Public image path without extension.
    #[arg(long, default_value = "./out/random")]
    output: PathBuf,

    /// Output image format.
    #[arg(long, value_enum, default_value_t = FormatChoice::Webp)]
    format: FormatChoice,

    /// Minimum time between iterations, in milliseconds.
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Scratch directory for rotation slots (must exist).
    #[arg(long, default_value = "/tmp")]
    tmp_dir: PathBuf,

    /// Number of rotation slots.
    #[arg(long, default_value_t = 10)]
    rotations: usize,

    /// Encode quality, 1..=100.
    #[arg(long, default_value_t = 99)]
    quality: u8,

    /// Resize every image to WIDTHxHEIGHT before encoding.
    #[arg(long, value_parser = parse_size)]
    resize: Option<[u32; 2]>,

    /// Do not publish a favicon.
    #[arg(long)]
    no_favicon: bool,

    /// Favicon edge length (16 or 32).
    #[arg(long, default_value_t = 32)]
    favicon_size: u32,

    /// Only log warnings and errors.
    #[arg(long)]
    quiet: bool,

    /// Stop after this many iterations (also applies with --config).
    #[arg(long)]
    iterations: Option<u64>,

    /// Built-in sampler.
    #[arg(long, value_enum, default_value_t = SourceChoice::Gradient)]
    source: SourceChoice,

    /// Gradient width in pixels.
    #[arg(long, default_value_t = 256)]
    width: usize,

    /// Gradient height in pixels.
    #[arg(long, default_value_t = 256)]
    height: usize,

    /// Directory of images for `--source dir`.
    #[arg(long)]
    image_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// Server name written into the nginx site.
    #[arg(long, default_value = "localhost")]
    server_name: String,

    /// Custom nginx template with {{root}}, {{index}} and {{server_name}} placeholders.
    #[arg(long)]
    nginx_template: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    publish: PublishArgs,

    #[command(flatten)]
    site: SiteArgs,

    /// Write the nginx site into the scratch dir before starting.
    #[arg(long)]
    nginx: bool,

    /// Also link the nginx site into this directory (e.g. /etc/nginx/sites-enabled).
    #[arg(long, requires = "nginx")]
    nginx_sites_dir: Option<PathBuf>,

    /// Install a systemd unit for this configuration and exit, unless already supervised.
    #[arg(long)]
    systemd: bool,

    /// Directory the unit is linked into.
    #[arg(long, default_value = "/etc/systemd/system")]
    systemd_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct NginxArgs {
    #[command(flatten)]
    publish: PublishArgs,

    #[command(flatten)]
    site: SiteArgs,
}

#[derive(Parser, Debug)]
struct SystemdArgs {
    /// Run file the unit passes to `tpdne run --config`.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Webp,
    Png,
    Jpeg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceChoice {
    Gradient,
    Dir,
}

const NGINX_FILE_NAME: &str = "tpdne.nginx.conf";
const UNIT_FILE_NAME: &str = "tpdne.service";
const RUN_FILE_NAME: &str = "tpdne.json";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Nginx(args) => cmd_nginx(args),
        Command::Systemd(args) => cmd_systemd(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_size(s: &str) -> Result<[u32; 2], String> {
    let (w, h) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok([w, h])
}

fn load_run_file(args: &PublishArgs) -> anyhow::Result<RunFile> {
    let mut run = match &args.config {
        Some(path) => {
            let f = std::fs::File::open(path)
                .with_context(|| format!("open run file '{}'", path.display()))?;
            serde_json::from_reader(std::io::BufReader::new(f))
                .with_context(|| format!("parse run file '{}'", path.display()))?
        }
        None => RunFile {
            publish: publish_config_from_flags(args),
            source: source_config_from_flags(args)?,
        },
    };
    if args.iterations.is_some() {
        run.publish.max_iterations = args.iterations;
    }
    Ok(run)
}

fn publish_config_from_flags(args: &PublishArgs) -> tpdne::PublishConfig {
    tpdne::PublishConfig {
        output_path: args.output.clone(),
        format: match args.format {
            FormatChoice::Webp => tpdne::ImageFormat::Webp,
            FormatChoice::Png => tpdne::ImageFormat::Png,
            FormatChoice::Jpeg => tpdne::ImageFormat::Jpeg,
        },
        min_interval_ms: args.interval_ms,
        tmp_dir: args.tmp_dir.clone(),
        rotation_count: args.rotations,
        quality: args.quality,
        resize_to: args.resize,
        favicon: tpdne::FaviconConfig {
            enabled: !args.no_favicon,
            size: args.favicon_size,
        },
        verbose: !args.quiet,
        max_iterations: args.iterations,
    }
}

fn source_config_from_flags(args: &PublishArgs) -> anyhow::Result<tpdne::SourceConfig> {
    Ok(match args.source {
        SourceChoice::Gradient => tpdne::SourceConfig::Gradient {
            width: args.width,
            height: args.height,
        },
        SourceChoice::Dir => tpdne::SourceConfig::Dir {
            path: args
                .image_dir
                .clone()
                .context("--source dir requires --image-dir")?,
        },
    })
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let run = load_run_file(&args.publish)?;
    init_tracing(run.publish.verbose);
    run.publish.validate()?;

    if args.nginx {
        let site = render_site(&run.publish, &args.site)?;
        let conf = tpdne::deploy::write_artifact(&run.publish.tmp_dir, NGINX_FILE_NAME, &site)?;
        tracing::info!(path = %conf.display(), "wrote nginx site");
        if let Some(dir) = &args.nginx_sites_dir {
            tpdne::deploy::link_into(&conf, dir)?;
            eprintln!("nginx site linked into {}; reload nginx to apply it", dir.display());
        }
    }

    if args.systemd && !tpdne::is_supervised() {
        return install_unit(&run, &args);
    }

    let mut publisher = tpdne::Publisher::new(run.publish)?;
    let mut sampler = run.source.build()?;
    publisher.run(sampler.as_mut())?;
    Ok(())
}

fn install_unit(run: &RunFile, args: &RunArgs) -> anyhow::Result<()> {
    let script = match &args.publish.config {
        Some(path) => std::fs::canonicalize(path)
            .with_context(|| format!("resolve run file '{}'", path.display()))?,
        None => {
            // The supervised process runs until stopped, whatever this invocation asked for.
            let mut persisted = run.clone();
            persisted.publish.max_iterations = None;
            let json = serde_json::to_string_pretty(&persisted).context("serialize run file")?;
            tpdne::deploy::write_artifact(&run.publish.tmp_dir, RUN_FILE_NAME, &json)?
        }
    };

    let unit_text = render_unit(&script)?;
    let unit = tpdne::deploy::write_artifact(&run.publish.tmp_dir, UNIT_FILE_NAME, &unit_text)?;
    let link = tpdne::deploy::link_into(&unit, &args.systemd_dir)?;

    eprintln!("installed {}", link.display());
    eprintln!("enable it with:  systemctl daemon-reload && systemctl enable --now tpdne");
    eprintln!("follow logs with: journalctl -u tpdne -f");
    Ok(())
}

fn render_site(cfg: &tpdne::PublishConfig, site: &SiteArgs) -> anyhow::Result<String> {
    let template = match &site.nginx_template {
        Some(path) => tpdne::Template::from_path(path)?,
        None => tpdne::Template::new(tpdne::DEFAULT_NGINX_TEMPLATE),
    };
    let public = cfg.public_path();
    let index = public
        .file_name()
        .context("public path has no file name")?
        .to_string_lossy()
        .into_owned();
    let site = tpdne::NginxSite {
        root: absolute(&cfg.public_dir())?,
        index,
        server_name: site.server_name.clone(),
    };
    Ok(tpdne::render_nginx_site(&template, &site)?)
}

fn render_unit(script: &Path) -> anyhow::Result<String> {
    let unit = tpdne::SystemdUnit {
        working_dir: std::env::current_dir().context("resolve working directory")?,
        executable: std::env::current_exe().context("resolve executable path")?,
        script: absolute(script)?,
    };
    let template = tpdne::Template::new(tpdne::DEFAULT_SYSTEMD_TEMPLATE);
    Ok(tpdne::render_systemd_unit(&template, &unit)?)
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve '{}'", path.display()))
}

fn cmd_nginx(args: NginxArgs) -> anyhow::Result<()> {
    let run = load_run_file(&args.publish)?;
    print!("{}", render_site(&run.publish, &args.site)?);
    Ok(())
}

fn cmd_systemd(args: SystemdArgs) -> anyhow::Result<()> {
    print!("{}", render_unit(&args.config)?);
    Ok(())
}
