// wrapmeta: metadata extractor for annotated C++ SDK headers

use clap::Parser;
use wrapmeta::cli::Cli;
use wrapmeta::diagnostics;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run() {
        let _ = diagnostics::report_error(&mut std::io::stderr().lock(), &err);
        std::process::exit(err.exit_code());
    }
}
