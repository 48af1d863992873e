use std::env;
use std::fs;
use std::path::PathBuf;

use formats::SceneManifest;
use tools::{SimulateOptions, simulate};
use tracing_subscriber::EnvFilter;
use viewer::Viewport;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "manifest" => cmd_manifest(args),
        "check" => cmd_check(args),
        "simulate" => cmd_simulate(args),
        _ => Err(usage()),
    }
}

fn cmd_manifest(args: Vec<String>) -> Result<(), String> {
    // moonlinks manifest [--out PATH]
    let mut out: Option<PathBuf> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                i += 1;
                out = Some(PathBuf::from(value(&args, i, "--out")?));
            }
            other => return Err(format!("unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    let json = SceneManifest::default()
        .to_json_pretty()
        .map_err(|e| e.to_string())?;
    match out {
        Some(path) => {
            fs::write(&path, json + "\n").map_err(|e| format!("write {path:?}: {e}"))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_check(args: Vec<String>) -> Result<(), String> {
    // moonlinks check <manifest.json>
    let [path] = args.as_slice() else {
        return Err(usage());
    };
    let manifest = read_manifest(path)?;
    let hash = manifest.content_hash().map_err(|e| e.to_string())?;
    println!("ok: {} links (blake3={hash})", manifest.links.len());
    for (index, url) in manifest.link_urls().iter().enumerate() {
        println!("  [{index}] {url}");
    }
    Ok(())
}

fn cmd_simulate(args: Vec<String>) -> Result<(), String> {
    // moonlinks simulate [--manifest PATH] [--assets DIR] [--ticks N] [--size WxH] [--click X,Y]...
    let mut manifest = SceneManifest::default();
    let mut options = SimulateOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--manifest" => {
                i += 1;
                manifest = read_manifest(value(&args, i, "--manifest")?)?;
            }
            "--assets" => {
                i += 1;
                options.assets = Some(PathBuf::from(value(&args, i, "--assets")?));
            }
            "--ticks" => {
                i += 1;
                let raw = value(&args, i, "--ticks")?;
                options.ticks = raw
                    .parse()
                    .map_err(|_| format!("--ticks expects a count, got {raw:?}"))?;
            }
            "--size" => {
                i += 1;
                let (w, h) = parse_pair(value(&args, i, "--size")?, 'x')?;
                options.viewport = Viewport::new(w, h);
            }
            "--click" => {
                i += 1;
                options.clicks.push(parse_pair(value(&args, i, "--click")?, ',')?);
            }
            other => return Err(format!("unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    let report = simulate(&manifest, &options).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_pair(raw: &str, sep: char) -> Result<(f64, f64), String> {
    let (a, b) = raw
        .split_once(sep)
        .ok_or_else(|| format!("expected A{sep}B, got {raw:?}"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| format!("not a number: {s:?}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn read_manifest(path: &str) -> Result<SceneManifest, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    SceneManifest::from_json_str(&text).map_err(|e| format!("{path}: {e}"))
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "moonlinks".to_string());
    format!(
        "Usage:\n  {exe} manifest [--out PATH]\n  {exe} check <manifest.json>\n  {exe} simulate [--manifest PATH] [--assets DIR] [--ticks N] [--size WxH] [--click X,Y]...\n\nNotes:\n- `simulate` runs the scene headless at 60 ticks per second of scene time and prints a JSON report.\n- Clicks are replayed in order after the last tick, in client pixels (origin top left).\n- Texture paths in the manifest resolve under --assets; without it every texture falls back to its base color.\n- Set RUST_LOG=debug for session logs on stderr.\n"
    )
}
