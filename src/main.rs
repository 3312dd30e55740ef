//! Particle-level jet spectra with soft-drop declustering.
//!
//! # How to use
//!
//!     sdpart [-c CONFIG.json] [-o OUTPUT.json] EVENTFILES...
//!
//! Event files can be in any format understood by
//! [event-file-reader](https://crates.io/crates/event-file-reader),
//! optionally compressed. All events are clustered into jets, which are
//! then groomed with soft drop. The resulting histograms are written to
//! the output file in JSON format. Missing configuration entries keep
//! their default values.
//!
//! The log level can also be set with the `SDPART_LOG` environment
//! variable.
mod opt;

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, info, warn};
use serde::Serialize;
use structopt::StructOpt;

use sdpart::config::AnalysisConfig;
use sdpart::event::AcceptedEvent;
use sdpart::hist::HistManager;
use sdpart::import::import;
use sdpart::spectrum::{JetSpectrumTask, SoftdropFailures};

use crate::opt::Opt;

#[derive(Serialize)]
struct Output<'a> {
    config: &'a AnalysisConfig,
    events: u64,
    events_without_jets: u64,
    softdrop_failures: SoftdropFailures,
    histograms: &'a HistManager,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let env = Env::default().filter_or("SDPART_LOG", opt.verbosity.as_str());
    env_logger::init_from_env(env);

    let config = match &opt.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    debug!("Settings: {config:#?}");
    info!(
        "{} jets with R = {}, soft drop with zcut = {}, beta = {} after {} reclustering",
        config.jet_def.algorithm,
        config.jet_def.radius,
        config.softdrop.zcut,
        config.softdrop.beta,
        config.softdrop.reclusterizer,
    );
    info!("Cluster energies: {}", config.energy_scheme);

    let mut task = JetSpectrumTask::new(config);
    let mut hists = task.book_histograms();
    let mut events = 0;
    let mut events_without_jets = 0;
    for file in &opt.files {
        info!("Analysing events from {file:?}");
        for event in import(file)? {
            let event =
                AcceptedEvent::new(&event?, &config.particles, &config.jet_def, &config.jets);
            if !task.run(&event, &mut hists) {
                events_without_jets += 1;
            }
            events += 1;
        }
    }
    info!("Analysed {events} events");
    if events_without_jets > 0 {
        warn!("{events_without_jets} events without jets");
    }
    let failures = task.failures();
    if failures.total() > 0 {
        info!(
            "Soft drop failed for {} jets: {} without enough constituents, {} massless, \
             {} reclustering failures",
            failures.total(),
            failures.constituents,
            failures.mass,
            failures.clustering
        );
    }

    let output = Output {
        config: &config,
        events,
        events_without_jets,
        softdrop_failures: failures,
        histograms: &hists,
    };
    let out = File::create(&opt.output)
        .with_context(|| format!("Failed to create {:?}", opt.output))?;
    serde_json::to_writer(BufWriter::new(out), &output)
        .with_context(|| format!("Failed to write histograms to {:?}", opt.output))?;
    info!("Histograms written to {:?}", opt.output);
    Ok(())
}
