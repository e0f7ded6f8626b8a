// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![allow(clippy::uninlined_format_args)]

use std::path;

use svg2png::{Session, UploadedFile, DOWNLOAD_FILE_NAME};

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e.trim_end_matches('.'));
        std::process::exit(1);
    }
}

fn timed<F, T>(perf: bool, name: &str, mut f: F) -> T
where
    F: FnMut() -> T,
{
    let now = std::time::Instant::now();
    let result = f();
    if perf {
        let elapsed = now.elapsed().as_micros() as f64 / 1000.0;
        eprintln!("{}: {:.2}ms", name, elapsed);
    }

    result
}

fn process() -> Result<(), String> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(log::LevelFilter::Warn);
        }
    }

    let mut session = Session::with_options(args.options);

    timed(args.perf, "Reading", || -> Result<(), String> {
        match args.in_svg {
            InputFrom::File(ref file) => {
                let file = UploadedFile::from_path(file)
                    .map_err(|_| "failed to open the provided file".to_string())?;
                session.on_file_selected(Some(&file)).map_err(|e| e.to_string())
            }
            InputFrom::Stdin => {
                use std::io::Read;
                let mut buf = Vec::new();
                let stdin = std::io::stdin();
                let mut handle = stdin.lock();
                handle
                    .read_to_end(&mut buf)
                    .map_err(|_| "failed to read stdin".to_string())?;
                session.on_text_edited(&String::from_utf8_lossy(&buf));
                Ok(())
            }
        }
    })?;

    let image = timed(args.perf, "Converting", || {
        session.convert().cloned()
    })
    .map_err(|e| e.to_string())?;

    match args.out_png {
        OutputTo::Stdout => {
            use std::io::Write;
            std::io::stdout()
                .write_all(image.png())
                .map_err(|_| "failed to write to stdout".to_string())?;
        }
        OutputTo::DataUri => {
            println!("{}", image.data_uri());
        }
        OutputTo::File(ref file) => {
            timed(args.perf, "Saving", || {
                image.save(file).map_err(|e| e.to_string())
            })?;
        }
    };

    Ok(())
}

const HELP: &str = "\
svg2png converts SVG markup into a PNG image.

USAGE:
  svg2png [OPTIONS] <in-svg> [out-png]  # from file to file
  svg2png [OPTIONS] <in-svg> -c         # from file to stdout
  svg2png [OPTIONS] - [out-png]         # from stdin to file

  svg2png in.svg                        # writes converted.png
  svg2png in.svg out.png
  svg2png --data-uri in.svg

OPTIONS:
      --help                    Prints this help
  -V, --version                 Prints version
  -c                            Prints the output PNG to the stdout
      --data-uri                Prints the output PNG as a data URI

  --default-width LENGTH        Sets the width used when the root element
                                has no viewBox and no width
                                [default: 100]
  --default-height LENGTH       Sets the height used when the root element
                                has no viewBox and no height
                                [default: 100]
  --max-pixels NUM              Sets the maximum number of pixels in the output
                                [default: 67108864]
  --resources-dir DIR           Sets a directory that will be used during
                                relative paths resolving.
                                [default: input file directory]

  --use-font-file PATH          Load a specified font file into the fonts database.
                                This option can be set multiple times
  --use-fonts-dir PATH          Loads all fonts from the specified directory
                                into the fonts database.
                                This option can be set multiple times
  --skip-system-fonts           Disables system fonts loading.

  --perf                        Prints performance stats
  --quiet                       Disables warnings

ARGS:
  <in-svg>                      Input file. Must have the .svg extension.
                                Use '-' to read the markup from stdin
  <out-png>                     Output file
                                [default: converted.png]
";

#[derive(Debug)]
struct CliArgs {
    data_uri: bool,

    default_width: Option<u32>,
    default_height: Option<u32>,
    max_pixels: Option<u64>,
    resources_dir: Option<path::PathBuf>,

    font_files: Vec<path::PathBuf>,
    font_dirs: Vec<path::PathBuf>,
    skip_system_fonts: bool,

    perf: bool,
    quiet: bool,

    input: String,
    output: Option<String>,
}

fn collect_args() -> Result<CliArgs, pico_args::Error> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(CliArgs {
        data_uri: input.contains("--data-uri"),

        default_width: input.opt_value_from_fn("--default-width", parse_length)?,
        default_height: input.opt_value_from_fn("--default-height", parse_length)?,
        max_pixels: input.opt_value_from_fn("--max-pixels", parse_max_pixels)?,
        resources_dir: input.opt_value_from_str("--resources-dir")?,

        font_files: input.values_from_str("--use-font-file")?,
        font_dirs: input.values_from_str("--use-fonts-dir")?,
        skip_system_fonts: input.contains("--skip-system-fonts"),

        perf: input.contains("--perf"),
        quiet: input.contains("--quiet"),

        input: input.free_from_str()?,
        output: input.opt_free_from_str()?,
    })
}

fn parse_length(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid length")?;

    if n > 0 {
        Ok(n)
    } else {
        Err("LENGTH cannot be zero".to_string())
    }
}

fn parse_max_pixels(s: &str) -> Result<u64, String> {
    let n: u64 = s.parse().map_err(|_| "invalid number")?;

    if n > 0 {
        Ok(n)
    } else {
        Err("NUM cannot be zero".to_string())
    }
}

#[derive(Clone, PartialEq, Debug)]
enum InputFrom {
    Stdin,
    File(path::PathBuf),
}

#[derive(Clone, PartialEq, Debug)]
enum OutputTo {
    Stdout,
    DataUri,
    File(path::PathBuf),
}

struct Args {
    in_svg: InputFrom,
    out_png: OutputTo,
    perf: bool,
    quiet: bool,
    options: svg2png::Options,
}

fn parse_args() -> Result<Args, String> {
    let args = collect_args().map_err(|e| e.to_string())?;

    let in_svg = if args.input == "-" {
        InputFrom::Stdin
    } else if args.input == "-c" {
        return Err("-c should be set after input".to_string());
    } else {
        InputFrom::File(args.input.as_str().into())
    };

    let out_png = match args.output {
        _ if args.data_uri => OutputTo::DataUri,
        Some(ref out_png) if out_png == "-c" => OutputTo::Stdout,
        Some(ref out_png) => OutputTo::File(out_png.into()),
        None => OutputTo::File(DOWNLOAD_FILE_NAME.into()),
    };

    if args.data_uri && args.output.is_some() {
        println!("Warning: <out-png> has no effect when --data-uri is set.");
    }

    let mut options = svg2png::Options::default();

    let default_width = args
        .default_width
        .map(|v| v as f32)
        .unwrap_or(options.default_size.width());
    let default_height = args
        .default_height
        .map(|v| v as f32)
        .unwrap_or(options.default_size.height());
    if let Some(size) = usvg::Size::from_wh(default_width, default_height) {
        options.default_size = size;
    }

    if let Some(max_pixels) = args.max_pixels {
        options.max_pixels = max_pixels;
    }

    options.resources_dir = match args.resources_dir {
        Some(v) => Some(v),
        None if args.input != "-" => {
            // Get input file absolute directory.
            std::fs::canonicalize(&args.input)
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        }
        None => None,
    };

    options.load_system_fonts = !args.skip_system_fonts;
    options.font_files = args.font_files;
    options.font_dirs = args.font_dirs;

    Ok(Args {
        in_svg,
        out_png,
        perf: args.perf,
        quiet: args.quiet,
        options,
    })
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
            }
        }
    }

    fn flush(&self) {}
}
