//! `kite-run <script.lua> [--screenshot out.png]`
//!
//! Runs a Lua script against an off-screen GPU context, presents once and
//! optionally saves the screen as PNG.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use kite_engine::backend::WgpuBackend;
use kite_engine::device::{GpuContext, GpuInit};
use kite_engine::graphics::{Graphics, GraphicsConfig};
use kite_engine::logging::{LoggingConfig, init_logging};
use mlua::Lua;

struct Args {
    script: PathBuf,
    screenshot: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut script = None;
    let mut screenshot = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--screenshot" => {
                let path = args.next().context("--screenshot needs a path")?;
                screenshot = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ if script.is_none() => script = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }

    Ok(Args {
        script: script.context("usage: kite-run <script.lua> [--screenshot out.png]")?,
        screenshot,
    })
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let args = parse_args(std::env::args().skip(1))?;

    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;

    let gpu = GpuContext::new_blocking(GpuInit::default()).context("creating GPU context")?;
    let graphics = Graphics::new(WgpuBackend::new(gpu), GraphicsConfig::default()).into_shared();

    let lua = Lua::new();
    kite_lua::register(&lua, graphics.clone()).map_err(|e| anyhow!("{e}"))?;

    log::info!("running {}", args.script.display());
    lua.load(source.as_str())
        .set_name(args.script.display().to_string())
        .exec()
        .map_err(|e| anyhow!("{e}"))?;

    let mut graphics = graphics.borrow_mut();
    graphics.present();

    if let Some(path) = args.screenshot {
        let png = graphics
            .new_screenshot()
            .and_then(|shot| shot.encode_png())
            .context("capturing screen")?;
        std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        log::info!("screenshot saved to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn script_and_screenshot() {
        let parsed = args(&["demo.lua", "--screenshot", "out.png"]).unwrap();
        assert_eq!(parsed.script, PathBuf::from("demo.lua"));
        assert_eq!(parsed.screenshot, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn missing_script_is_an_error() {
        assert!(args(&[]).is_err());
        assert!(args(&["--screenshot"]).is_err());
        assert!(args(&["a.lua", "b.lua"]).is_err());
        assert!(args(&["a.lua", "--fast"]).is_err());
    }
}
