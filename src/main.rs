use std::env::var;

use miette::Result;
use reltrack::run;

fn main() -> Result<()> {
    if var("RUST_LOG").is_ok() {
        env_logger::init();
    }
    run()
}
