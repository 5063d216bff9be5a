use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    desktop: bool,
    media: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    neonspin::app::run(neonspin::app::AppOptions {
        desktop_host: args.desktop,
        initial_media: args.media,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    for arg in args {
        match arg.as_str() {
            "--desktop" => out.desktop = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument {other}"),
            other => {
                if out.media.is_some() {
                    anyhow::bail!("only one media path can be opened at startup");
                }
                out.media = Some(PathBuf::from(other));
            }
        }
    }
    Ok(out)
}

fn print_help() {
    println!("NEONSPIN");
    println!("  [path]       Audio file or .json playlist to open at startup");
    println!("  --desktop    Enable desktop-shell features (playlist import)");
}
