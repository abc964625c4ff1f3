use std::env;
use std::process;

fn main() {
    unifmt_rt::log::init();
    let code = unifmtc::cli::run(env::args().skip(1));
    process::exit(code);
}
