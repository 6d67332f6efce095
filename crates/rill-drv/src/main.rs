fn main() {
    std::process::exit(rill_drv::run().code());
}
