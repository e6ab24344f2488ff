/*
 Copyright (c) 2026 The remdet Developers

 This file is part of remdet

 remdet is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 remdet is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with remdet. If not, see <https://www.gnu.org/licenses/>.
*/

use clap::Parser;
use colored::Colorize;
use common_path::common_path_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{debug, info, trace, warn};
use remdet::{
    ColorLogger, Engine, EngineConfig, Endianness, RawSample, SampleType, TermResult,
    find_sample_files, read_samples, write_samples,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::thread::available_parallelism;
use std::{error::Error, time::Instant};

#[derive(Parser)]
#[command(
    name = "remdet",
    version,
    about = "Extract and remove the periodic deterministic part of raw integer sample files"
)]
struct Cli {
    /// Sample type: int8, uint8, int16, or uint16
    #[arg(short = 't', long = "type", default_value = "int16")]
    sample_type: String,

    /// Period in samples. Required for R and G modes; in D mode the
    /// period is the length of the waveform file
    #[arg(short = 'n', long = "period")]
    period: Option<usize>,

    /// Mode: R (remove: average and subtract), G (get the averaged
    /// waveform only), D (delete a precomputed waveform given with --det)
    #[arg(short = 'm', long = "mode", default_value = "R")]
    mode: char,

    /// Waveform file. Written in R and G modes (single input only),
    /// read in D mode. [default: <basename>_det.<ext> next to the output]
    #[arg(short = 'd', long = "det")]
    det: Option<PathBuf>,

    /// Byte order of 16-bit samples: L (little endian) or B (big endian)
    #[arg(short = 'e', long = "endianness", default_value = "L")]
    endianness: char,

    /// Output directory path. Directory must already exist but any
    /// subdirectories will be created as needed.
    /// [default: same as input file]
    #[arg(short = 'p', long = "path", default_value = None)]
    path: Option<PathBuf>,

    /// Working precision of the accumulator, in decimal digits
    #[arg(short = 'P', long = "precision", default_value = "100")]
    precision: u32,

    /// Worker threads [default: half the available cores]
    #[arg(short = 'j', long = "threads")]
    threads: Option<usize>,

    /// Always use the generic subtraction, even where a vectorized
    /// kernel exists
    #[arg(short = 'F', long = "no-fast-path")]
    no_fast_path: bool,

    /// Print diagnostic messages
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Quiet mode: suppress all log output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Recurse into directories when the supplied input paths include folders
    #[arg(short = 'R', long = "recurse")]
    recurse: bool,

    /// Input files/folders (use - for stdin)
    #[arg(name = "FILES")]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Remove,
    Extract,
    Delete,
}

enum Input {
    Stdin,
    File(PathBuf),
}

/// Everything a single input needs besides its own path.
struct Job<'a> {
    engine: &'a Engine,
    mode: Mode,
    period: Option<usize>,
    det_path: Option<&'a Path>,
    endian: Endianness,
    out_dir: Option<&'a Path>,
    base_dir: &'a Path,
}

fn main() -> TermResult {
    match run() {
        Ok(()) => TermResult(Ok(())),
        Err(e) => TermResult(Err(e.into())),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let logger = ColorLogger::new(cli.quiet, cli.verbose);
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init()?;

    let thread_count = cli.threads.unwrap_or_else(|| {
        let avail_par = available_parallelism().map(|n| n.get()).unwrap_or(1);
        (avail_par / 2).max(1)
    });

    let config = EngineConfig::new()
        .with_threads(thread_count)
        .with_fast_path(!cli.no_fast_path)
        .with_precision_digits(cli.precision)?;
    let engine = Engine::new(config)?;
    trace!("Configured worker pool with {} threads", engine.threads());

    let sample_type: SampleType = cli.sample_type.parse()?;

    let mode = match cli.mode.to_ascii_lowercase() {
        'r' => Mode::Remove,
        'g' => Mode::Extract,
        'd' => Mode::Delete,
        _ => return Err("Invalid mode; must be R, G, or D".into()),
    };

    let endian = match cli.endianness.to_ascii_lowercase() {
        'l' => Endianness::Little,
        'b' | 'm' => Endianness::Big,
        _ => return Err("Invalid endianness; must be L or B".into()),
    };

    match mode {
        Mode::Delete if cli.det.is_none() => {
            return Err("D mode needs the waveform to remove (--det)".into());
        }
        Mode::Remove | Mode::Extract if cli.period.is_none() => {
            return Err("A period is required in R and G modes (--period)".into());
        }
        _ => {}
    }

    if let Some(p) = &cli.path
        && !p.is_dir()
    {
        return Err(format!(
            "Specified output path does not exist: {}",
            p.display()
        )
        .into());
    }

    let mut inputs = if cli.files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.files.clone()
    };

    inputs.sort();
    inputs.dedup();

    let use_stdin = inputs.contains(&PathBuf::from("-"));
    inputs.retain(|p| p != &PathBuf::from("-"));

    // Filter to remove any glob patterns, yielding all inputted paths, canonicalized
    let paths = inputs
        .iter()
        .filter_map(|input| {
            if input.to_string_lossy().contains('*') {
                warn!(
                    "Unexpanded glob pattern detected in input: \"{}\". Skipping.",
                    input.display()
                );
                None
            } else {
                Some(input)
            }
        })
        .map(|p| p.canonicalize())
        .collect::<Result<Vec<_>, io::Error>>()?;

    // Base directory against which mirrored output paths are constructed.
    // Only comes into play when an output folder path is specified.
    let base_dir = if paths.len() == 1 {
        paths[0].parent().unwrap_or(Path::new("/")).to_path_buf()
    } else {
        let common = common_path_all(paths.iter().map(|p| p.as_path()))
            .unwrap_or(PathBuf::from("/"));
        common.parent().unwrap_or(Path::new("/")).to_path_buf()
    };

    let expanded_paths = find_sample_files(&paths, cli.recurse)?;
    let total_inputs = expanded_paths.len() + usize::from(use_stdin);

    if total_inputs == 0 {
        return Err("No sample files found among the given inputs".into());
    }
    if mode != Mode::Delete && cli.det.is_some() && total_inputs > 1 {
        return Err("--det can only name the waveform output for a single input".into());
    }

    let job = Job {
        engine: &engine,
        mode,
        period: cli.period,
        det_path: cli.det.as_deref(),
        endian,
        out_dir: cli.path.as_deref(),
        base_dir: &base_dir,
    };

    let wall_start = Instant::now();

    // Handle stdin once, before any file inputs.
    if use_stdin {
        dispatch(sample_type, &job, Input::Stdin)?;
    }

    let pg = if cli.quiet || expanded_paths.is_empty() {
        ProgressBar::hidden()
    } else {
        let style = ProgressStyle::with_template("{prefix} {bar:20.cyan/blue} {pos}/{len} {msg}")?;
        multi
            .add(ProgressBar::new(expanded_paths.len() as u64))
            .with_style(style)
            .with_prefix(format!("{}", "[Processing]".bold()))
    };

    for path in expanded_paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pg.set_message(file_name.clone());
        dispatch(sample_type, &job, Input::File(path))
            .map_err(|e| format!("{}: {}", file_name, e))?;
        pg.inc(1);
    }
    pg.finish_and_clear();

    let total_secs = wall_start.elapsed().as_secs();
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    info!(
        "Processed {} inputs in {:02}:{:02}:{:02}",
        total_inputs, h, m, s
    );

    Ok(())
}

/// Pick the monomorphized pipeline for the runtime sample type.
fn dispatch(sample_type: SampleType, job: &Job, input: Input) -> Result<(), Box<dyn Error>> {
    match sample_type {
        SampleType::Int8 => process::<i8>(job, input),
        SampleType::Uint8 => process::<u8>(job, input),
        SampleType::Int16 => process::<i16>(job, input),
        SampleType::Uint16 => process::<u16>(job, input),
    }
}

fn process<T: RawSample>(job: &Job, input: Input) -> Result<(), Box<dyn Error>> {
    let (label, mut samples): (String, Vec<T>) = match &input {
        Input::Stdin => ("stdin".to_string(), read_samples(io::stdin().lock(), job.endian)?),
        Input::File(path) => (
            path.display().to_string(),
            read_samples(BufReader::new(File::open(path)?), job.endian)?,
        ),
    };
    debug!("{}: read {} {} samples", label, samples.len(), T::SAMPLE_TYPE);

    let start = Instant::now();
    match job.mode {
        Mode::Remove => {
            let period = job.period.ok_or("missing period")?;
            let det = job.engine.remdet(&mut samples, period)?;
            log_removal::<T>(job, &label, period, samples.len());
            write_output(job, &input, "res", &samples)?;
            write_waveform(job, &input, &det)?;
        }
        Mode::Extract => {
            let period = job.period.ok_or("missing period")?;
            let det = job.engine.getdet(&samples, period)?;
            info!(
                "{}: averaged {} {} samples over period {}",
                label,
                samples.len(),
                T::SAMPLE_TYPE,
                period
            );
            write_waveform(job, &input, &det)?;
        }
        Mode::Delete => {
            let det_path = job.det_path.ok_or("missing waveform path")?;
            let det: Vec<T> = read_samples(BufReader::new(File::open(det_path)?), job.endian)?;
            check_waveform_period(job.period, det.len())?;
            job.engine.deldet(&mut samples, &det)?;
            log_removal::<T>(job, &label, det.len(), samples.len());
            write_output(job, &input, "res", &samples)?;
        }
    }
    trace!("{}: engine pass took {:?}", label, start.elapsed());

    Ok(())
}

/// In D mode the waveform length is the period; an explicit `--period`
/// must agree with it.
fn check_waveform_period(period: Option<usize>, det_len: usize) -> Result<(), String> {
    match period {
        Some(p) if p != det_len => Err(format!(
            "--period {} does not match the {}-sample waveform file",
            p, det_len
        )),
        _ => Ok(()),
    }
}

fn log_removal<T: RawSample>(job: &Job, label: &str, period: usize, size: usize) {
    let kernel = if job.engine.uses_fast_path::<T>(period) {
        format!(" ({} kernel)", job.engine.simd_kind().name())
    } else {
        String::new()
    };
    info!(
        "{}: removed period-{} waveform from {} {} samples{}",
        label,
        period,
        size,
        T::SAMPLE_TYPE,
        kernel
    );
}

/// Residual goes to stdout for stdin input, otherwise next to the input
/// (or mirrored under the output directory).
fn write_output<T: RawSample>(
    job: &Job,
    input: &Input,
    suffix: &str,
    samples: &[T],
) -> Result<(), Box<dyn Error>> {
    match input {
        Input::Stdin => {
            trace!("Writing {} samples to stdout", samples.len());
            write_samples(BufWriter::new(io::stdout().lock()), samples, job.endian)?;
        }
        Input::File(path) => {
            let out = output_path(path, suffix, job.out_dir, job.base_dir)?;
            debug!("Writing {}", out.display());
            write_samples(BufWriter::new(File::create(&out)?), samples, job.endian)?;
        }
    }
    Ok(())
}

fn write_waveform<T: RawSample>(job: &Job, input: &Input, det: &[T]) -> Result<(), Box<dyn Error>> {
    if let Some(det_path) = job.det_path {
        debug!("Writing waveform to {}", det_path.display());
        write_samples(BufWriter::new(File::create(det_path)?), det, job.endian)?;
        return Ok(());
    }
    match (input, job.mode) {
        // getdet on stdin: the waveform is the only product.
        (Input::Stdin, Mode::Extract) => write_output(job, input, "det", det),
        (Input::Stdin, _) => {
            warn!("Waveform from stdin not saved; pass --det to keep it");
            Ok(())
        }
        (Input::File(_), _) => write_output(job, input, "det", det),
    }
}

/// `<dir>/<stem>_<suffix>.<ext>`, where `<dir>` is the input's own folder or
/// its mirror below `out_dir`.
fn output_path(
    input: &Path,
    suffix: &str,
    out_dir: Option<&Path>,
    base_dir: &Path,
) -> io::Result<PathBuf> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "raw".to_string());
    let parent = input.parent().unwrap_or(Path::new(""));

    let dir = match out_dir {
        Some(out) => {
            let rel = parent.strip_prefix(base_dir).unwrap_or(Path::new(""));
            let dir = out.join(rel);
            fs::create_dir_all(&dir)?;
            dir
        }
        None => parent.to_path_buf(),
    };
    Ok(dir.join(format!("{}_{}.{}", stem, suffix, ext)))
}
