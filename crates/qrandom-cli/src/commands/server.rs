use std::sync::Arc;

use qrandom_core::OsSource;

use super::CommandResult;

pub fn run(host: &str, port: u16) -> CommandResult {
    let base = format!("http://{host}:{port}");
    let path = qrandom_server::ANU_PATH;

    println!("qrandom server v{}", qrandom_core::VERSION);
    println!("   {base}");
    println!("   source: OS entropy (not quantum)");
    println!();
    println!("   Endpoints:");
    println!("     GET /                 API index");
    println!("     GET {path}    ANU QRNG JSON API");
    println!("     GET /health           Health check");
    println!();
    println!("   Query params for {path}:");
    println!("     type=uint8|uint16|hex16");
    println!("     length=N              Values or blocks (1-1024)");
    println!("     size=N                Hex digits per block (1-1024)");
    println!();
    println!("   Examples:");
    println!("     curl '{base}{path}?type=uint8&length=32'");
    println!("     qrandom --endpoint {base}{path} ints --max 6 --count 10");
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(qrandom_server::run_server(Arc::new(OsSource), host, port))?;
    Ok(())
}
