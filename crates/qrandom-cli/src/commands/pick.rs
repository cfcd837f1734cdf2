use super::numbers::print_lines;
use super::{CommandResult, SourceOptions, make_sampler, parse_weights};

pub fn choice(opts: &SourceOptions, items: &[String]) -> CommandResult {
    println!("{}", make_sampler(opts)?.choice(items)?);
    Ok(())
}

pub fn choices(
    opts: &SourceOptions,
    items: &[String],
    weights: Option<&str>,
    k: usize,
) -> CommandResult {
    let weights = weights.map(parse_weights).transpose()?;
    let picks = make_sampler(opts)?.choices(items, weights.as_deref(), k)?;
    print_lines(&picks)
}

pub fn sample(opts: &SourceOptions, items: &[String], k: usize) -> CommandResult {
    let picks = make_sampler(opts)?.sample(items, k)?;
    print_lines(&picks)
}

pub fn shuffle(opts: &SourceOptions, mut items: Vec<String>) -> CommandResult {
    make_sampler(opts)?.shuffle(&mut items)?;
    print_lines(&items)
}
