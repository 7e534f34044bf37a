fn main() {
    if let Err(err) = pagepulse_lib::run() {
        eprintln!("pagepulse: {err:#}");
        std::process::exit(1);
    }
}
