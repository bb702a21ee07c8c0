use std::time::Duration;

use neuroboot::prelude::*;

const USAGE: &str = "\
usage: neuroboot [options]

  --variant cortex|gate   loader to show (default cortex)
  --seed N                fixed RNG seed
  --config PATH           JSON config file
  --load-secs F           seconds until the simulated load completes (default 4)
  --fullscreen            borderless fullscreen";

#[derive(Debug, PartialEq)]
struct Options {
    variant: Variant,
    seed: Option<u64>,
    config: Option<String>,
    load_secs: f32,
    fullscreen: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut options = Options {
            variant: Variant::Cortex,
            seed: None,
            config: None,
            load_secs: 4.0,
            fullscreen: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |name: &str| args.next().ok_or_else(|| format!("{name} needs a value"));
            match arg.as_str() {
                "--variant" => options.variant = value("--variant")?.parse()?,
                "--seed" => {
                    options.seed = Some(
                        value("--seed")?
                            .parse()
                            .map_err(|e| format!("bad --seed: {e}"))?,
                    )
                }
                "--config" => options.config = Some(value("--config")?),
                "--load-secs" => {
                    let secs: f32 = value("--load-secs")?
                        .parse()
                        .map_err(|e| format!("bad --load-secs: {e}"))?;
                    if !(secs.is_finite() && secs >= 0.0) {
                        return Err("--load-secs must be a non-negative number".to_string());
                    }
                    options.load_secs = secs;
                }
                "--fullscreen" => options.fullscreen = true,
                other => return Err(format!("unknown argument `{other}`")),
            }
        }
        Ok(options)
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let mut config = match &options.config {
        Some(path) => match LoaderConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, path, "could not load config");
                std::process::exit(1);
            }
        },
        None => LoaderConfig::default(),
    };
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    config.render.fullscreen |= options.fullscreen;

    // Stand-in for real asset loading
    let signal = LoadSignal::new();
    let loader = signal.clone();
    let load_secs = options.load_secs;
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs_f32(load_secs));
        loader.mark_loaded();
        tracing::info!(load_secs, "assets loaded");
    });

    let result = LoaderApp::new(config)
        .with_variant(options.variant)
        .with_signal(signal)
        .run();
    if let Err(e) = result {
        tracing::error!(error = %e, "loader failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.variant, Variant::Cortex);
        assert_eq!(options.load_secs, 4.0);
        assert!(!options.fullscreen);
    }

    #[test]
    fn test_all_flags() {
        let options = parse(&[
            "--variant",
            "gate",
            "--seed",
            "9",
            "--config",
            "loader.json",
            "--load-secs",
            "1.5",
            "--fullscreen",
        ])
        .unwrap();
        assert_eq!(options.variant, Variant::Gate);
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.config.as_deref(), Some("loader.json"));
        assert_eq!(options.load_secs, 1.5);
        assert!(options.fullscreen);
    }

    #[test]
    fn test_bad_input() {
        assert!(parse(&["--seed"]).is_err());
        assert!(parse(&["--seed", "x"]).is_err());
        assert!(parse(&["--load-secs", "-1"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }
}
