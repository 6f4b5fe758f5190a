// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::{err_msg, Error};
use image::ImageFormat;
use mandelbrot::{render, Palette, RenderConfig, Viewport, MAX_AA_DEPTH};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<usize>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        Some(_) => Err("Image width and height must both be positive".to_string()),
        None => Err("Could not parse output image size".to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const FORMAT: &str = "format";
const SIZE: &str = "size";
const UPPERLEFT: &str = "upperleft";
const LOWERRIGHT: &str = "lowerright";
const ANTIALIAS: &str = "antialias";
const THREADS: &str = "threads";
const VERBOSE: &str = "verbose";

const MAX_THREADS: usize = 256;

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandel")
        .version("0.1.0")
        .about("Anti-aliased Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output PNG file"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .required(false)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .default_value("png")
                .possible_values(&["png"])
                .case_insensitive(true)
                .help("Output image format; only PNG is written"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x768")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(UPPERLEFT)
                .required(false)
                .long(UPPERLEFT)
                .short("u")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,1.125")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse upper left corner"))
                .help("Upper left corner of the viewport on the complex plane"),
        )
        .arg(
            Arg::with_name(LOWERRIGHT)
                .required(false)
                .long(LOWERRIGHT)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,-1.125")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse lower right corner"))
                .help("Lower right corner of the viewport on the complex plane"),
        )
        .arg(
            Arg::with_name(ANTIALIAS)
                .required(false)
                .long(ANTIALIAS)
                .short("a")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        MAX_AA_DEPTH,
                        "Could not parse anti-aliasing depth",
                        &format!("Anti-aliasing depth must be between 0 and {}", MAX_AA_DEPTH),
                    )
                })
                .help("Anti-aliasing depth; 0 samples each pixel once"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .help("Log debugging information"),
        )
        .get_matches()
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn pair_arg<T: FromStr>(
    matches: &ArgMatches,
    name: &str,
    separator: char,
) -> Result<(T, T), Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, separator))
        .ok_or_else(|| err_msg(format!("Could not parse {}", name)))
}

fn number_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| err_msg(format!("Could not parse {}", name)))
}

fn config_from(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let (width, height) = pair_arg::<usize>(matches, SIZE, 'x')?;
    let (min_x, max_y) = pair_arg::<f64>(matches, UPPERLEFT, ',')?;
    let (max_x, min_y) = pair_arg::<f64>(matches, LOWERRIGHT, ',')?;
    Ok(RenderConfig {
        width,
        height,
        viewport: Viewport::new(min_x, max_y, max_x, min_y),
        aa_depth: number_arg(matches, ANTIALIAS)?,
        workers: number_arg(matches, THREADS)?,
    })
}

fn format_arg(matches: &ArgMatches) -> Result<ImageFormat, Error> {
    let name = matches
        .value_of(FORMAT)
        .ok_or_else(|| err_msg("No output format provided"))?;
    ImageFormat::from_extension(name.to_lowercase())
        .ok_or_else(|| err_msg(format!("Unsupported output format {}", name)))
}

fn write_image(
    outfile: &str,
    format: ImageFormat,
    rates: &[u8],
    bounds: (usize, usize),
) -> Result<(), Error> {
    let image = Palette::default()
        .paint(rates, bounds.0 as u32, bounds.1 as u32)
        .ok_or_else(|| err_msg("Rendered raster does not match the image size"))?;
    image.save_with_format(Path::new(outfile), format)?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let config = config_from(matches)?;
    let format = format_arg(matches)?;
    let cpus = num_cpus::get();
    if config.workers > cpus {
        warn!("{} threads requested but only {} CPUs available", config.workers, cpus);
    }
    debug!("{:?}", config);

    let started = Instant::now();
    let image = render(&config)?;
    info!(
        "Rendered {}x{} in {:?} with {} thread(s)",
        image.width,
        image.height,
        started.elapsed(),
        config.workers
    );
    info!("{}", image.stats);

    let started = Instant::now();
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| err_msg("No output file provided"))?;
    write_image(output, format, &image.rates, (image.width, image.height))?;
    info!("Wrote {} in {:?}", output, started.elapsed());
    Ok(())
}

fn main() {
    let matches = args();
    init_logging(matches.is_present(VERBOSE));
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
