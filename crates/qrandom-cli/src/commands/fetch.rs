use qrandom_core::{AnuResponse, DataKind, EntropySource, FetchPlan, FetchRequest};

use super::{CommandResult, SourceOptions, make_source};

/// Fetch one batch and print it in the ANU JSON envelope.
pub fn run(opts: &SourceOptions, data_type: &str, length: usize, size: usize) -> CommandResult {
    let kind = DataKind::parse(data_type)?;
    let request = FetchRequest::new(kind, length, size)?;
    let source = make_source(opts);
    let batch = source.fetch(&request)?;
    let envelope = AnuResponse::from_batch(&request, &batch);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Print the fetch plan for `count` values below `max`. Never touches the network.
pub fn plan(opts: &SourceOptions, max: u128, count: usize, json: bool) -> CommandResult {
    let plan = FetchPlan::new(max, count, &opts.sampler_config())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    println!("{plan}");
    println!();
    println!("  {:<18} {:>12}", "values per block", plan.fits);
    println!("  {:<18} {:>12}", "blocks", plan.blocks);
    println!("  {:<18} {:>12}", "remote calls", plan.passes);
    println!(
        "  {:<18} {:>12}",
        "hex digits", plan.blocks * plan.block_size
    );
    Ok(())
}
