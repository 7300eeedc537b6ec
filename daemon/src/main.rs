use mpvwalld::DaemonError;

fn main() -> Result<(), DaemonError> {
    smol::block_on(mpvwalld::start()).inspect_err(|err| eprintln!("{err}"))
}
