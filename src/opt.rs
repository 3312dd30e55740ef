use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "sdpart",
    about = "Particle-level jet spectra and soft-drop observables"
)]
pub struct Opt {
    /// Verbosity level: 'off', 'error', 'warn', 'info', 'debug', 'trace'
    #[structopt(short, long, default_value = "info")]
    pub verbosity: String,

    /// Analysis settings in JSON format
    #[structopt(short, long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Output file for the histograms
    #[structopt(short, long, default_value = "sdpart.json", parse(from_os_str))]
    pub output: PathBuf,

    /// Event files to analyse
    #[structopt(parse(from_os_str))]
    pub files: Vec<PathBuf>,
}
