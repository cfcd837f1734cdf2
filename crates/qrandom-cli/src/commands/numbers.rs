use std::io::Write;

use super::{CommandResult, SourceOptions, make_sampler};

pub fn ints(opts: &SourceOptions, max: u64, count: usize) -> CommandResult {
    let values = make_sampler(opts)?.sample_ints(max, count)?;
    print_lines(&values)
}

pub fn randint(opts: &SourceOptions, a: i64, b: i64) -> CommandResult {
    println!("{}", make_sampler(opts)?.randint(a, b)?);
    Ok(())
}

pub fn floats(opts: &SourceOptions, count: usize) -> CommandResult {
    let values = make_sampler(opts)?.random_floats(count)?;
    print_lines(&values)
}

pub fn uniform(opts: &SourceOptions, start: f64, end: f64, count: usize) -> CommandResult {
    let values = make_sampler(opts)?.uniform_floats(start, end, count)?;
    print_lines(&values)
}

pub fn bits(opts: &SourceOptions, k: u32, count: usize) -> CommandResult {
    let values = make_sampler(opts)?.getrandbits_list(k, count)?;
    print_lines(&values)
}

/// One value per line through a locked stdout.
pub(crate) fn print_lines<T: std::fmt::Display>(values: &[T]) -> CommandResult {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for v in values {
        writeln!(out, "{v}")?;
    }
    out.flush()?;
    Ok(())
}
