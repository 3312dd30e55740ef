//! Per-event jet spectrum analysis with soft drop.
//!
//! [`JetSpectrumTask::run`] is called once per event. It fills particle
//! and jet level distributions into a [`HistogramSink`] and declusters
//! every accepted jet. Declustering failures are histogrammed and tallied
//! per category; they never stop the event loop.
use std::f64::consts::TAU;

use lazy_static::lazy_static;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::constituent::Constituent;
use crate::event::{hardest, EventSnapshot};
use crate::hist::{Binning, HistManager, HistogramSink};
use crate::jets::Jet;
use crate::kinematics::{self, phi_0_2pi};
use crate::particle::Particle;
use crate::softdrop::{DeclusterError, Declusterer};

/// Value of pt-hard below which pt fractions are not filled
const MIN_PT_HARD: f64 = 1e-5;
/// Jets lighter than this count as massless
const MASSLESS: f64 = 1e-5;

const UNTAGGED_RG: f64 = -0.02;
const UNTAGGED_NSD: f64 = -1.;
const UNTAGGED_THETAG: f64 = -0.05;

enum HistDef {
    H1(&'static str, &'static str, Binning),
    H2(&'static str, &'static str, Binning, Binning),
}

fn pt_bins() -> Binning {
    Binning::linear(1000, 0., 1000.)
}

fn jet_pt_bins() -> Binning {
    Binning::linear(500, 0., 500.)
}

fn frac_bins() -> Binning {
    Binning::linear(100, 0., 10.)
}

fn eta_bins() -> Binning {
    Binning::linear(100, -1., 1.)
}

fn phi_bins() -> Binning {
    Binning::linear(100, 0., TAU)
}

fn count_bins(max: usize) -> Binning {
    Binning::linear(max + 1, -0.5, max as f64 + 0.5)
}

fn unit_bins() -> Binning {
    Binning::linear(100, 0., 1.)
}

fn failed_pt_bins() -> Binning {
    Binning::linear(300, 0., 300.)
}

fn const_bins() -> Binning {
    Binning::linear(100, 0., 100.)
}

lazy_static! {
    static ref HISTOGRAMS: Vec<HistDef> = {
        use HistDef::*;
        vec![
            // event properties
            H1("fNevents", "Number of events", Binning::linear(1, 0.5, 1.5)),
            H1("fHardPartonPt", "Pt of the hard parton", pt_bins()),
            H1("fHardGluonPt", "Pt of the hard gluon", pt_bins()),
            H1("fHardQuarkPt", "Pt of the hard quark", pt_bins()),
            H1("fFracHardPartonPt", "Pt of the hard parton / pt-hard", frac_bins()),
            H1("fFracHardGluonPt", "Pt of the hard gluon / pt-hard", frac_bins()),
            H1("fFracHardQuarkPt", "Pt of the hard quark / pt-hard", frac_bins()),
            // particle level QA
            H1("hPtParticleAll", "pt spectrum of all particles", pt_bins()),
            H1("hPtParticleCharged", "pt spectrum of charged particles", pt_bins()),
            H1("hPtParticleNeutral", "pt spectrum of neutral particles", pt_bins()),
            H1("hPtPhotons", "pt spectrum of photons", pt_bins()),
            H1("hPtParticleMax", "pt of the hardest particle", pt_bins()),
            H1("hPtParticleMaxCharged", "pt of the hardest charged particle", pt_bins()),
            H1("hPtParticleMaxNeutral", "pt of the hardest neutral particle", pt_bins()),
            H1("hPtParticleMaxPhoton", "pt of the hardest photon", pt_bins()),
            H2("hEtaPhiParticle", "eta-phi of particles", eta_bins(), phi_bins()),
            H2("hEtaPhiCharged", "eta-phi of charged particles", eta_bins(), phi_bins()),
            H2("hEtaPhiNeutral", "eta-phi of neutral particles", eta_bins(), phi_bins()),
            H2("hEtaPhiPhoton", "eta-phi of photons", eta_bins(), phi_bins()),
            H2("hEtaPhiMaxParticle", "eta-phi of the hardest particle", eta_bins(), phi_bins()),
            H2(
                "hEtaPhiMaxCharged",
                "eta-phi of the hardest charged particle",
                eta_bins(),
                phi_bins(),
            ),
            H2(
                "hEtaPhiMaxNeutral",
                "eta-phi of the hardest neutral particle",
                eta_bins(),
                phi_bins(),
            ),
            H2("hEtaPhiMaxPhoton", "eta-phi of the hardest photon", eta_bins(), phi_bins()),
            H1("hPtPhotonMothers", "pt of photons decaying into photons", pt_bins()),
            H1("hNParticlesStack", "Number of record entries / event", count_bins(2000)),
            H1("hNParticlesPrimaryStack", "Number of primaries / event", count_bins(2000)),
            H1(
                "hNParticlesPhysPrimStack",
                "Number of physical primaries / event",
                count_bins(2000),
            ),
            H1("hNParticlesSecondaryStack", "Number of secondaries / event", count_bins(2000)),
            H1("hNParticlesEvent", "Number of particles / event", count_bins(300)),
            H1("hNChargedEvent", "Number of charged particles / event", count_bins(300)),
            H1("hNNeutralEvent", "Number of neutral particles / event", count_bins(300)),
            H1("hNPhotonsEvent", "Number of photons / event", count_bins(300)),
            // jet spectrum and QA
            H1("hPtJetConstituent", "pt of all jet constituents", pt_bins()),
            H1("hPtJetConstituentCharged", "pt of charged jet constituents", pt_bins()),
            H1("hPtJetConstituentNeutral", "pt of neutral jet constituents", pt_bins()),
            H1("hPtJetConstituentPhoton", "pt of photon jet constituents", pt_bins()),
            H2("hEtaPhiJetConstituents", "eta-phi of all jet constituents", eta_bins(), phi_bins()),
            H2(
                "hEtaPhiJetConstituentsCharged",
                "eta-phi of charged jet constituents",
                eta_bins(),
                phi_bins(),
            ),
            H2(
                "hEtaPhiJetConstituentsNeutral",
                "eta-phi of neutral jet constituents",
                eta_bins(),
                phi_bins(),
            ),
            H2(
                "hEtaPhiJetConstituentsPhoton",
                "eta-phi of photon jet constituents",
                eta_bins(),
                phi_bins(),
            ),
            H1("hJetPt", "Jet pt spectrum", pt_bins()),
            H2("hJetEtaPhi", "Jet eta and phi", eta_bins(), phi_bins()),
            H2("hJetNEFPt", "Neutral energy fraction vs. pt", jet_pt_bins(), unit_bins()),
            H2("hJetNconstPt", "Number of jet constituents vs. pt", jet_pt_bins(), const_bins()),
            H2("hJetNallPt", "Number of all jet constituents vs. pt", jet_pt_bins(), const_bins()),
            H2(
                "hJetNchargedPt",
                "Number of charged jet constituents vs. pt",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hJetNneutralPt",
                "Number of neutral jet constituents vs. pt",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hJetNphotonsPt",
                "Number of photon jet constituents vs. pt",
                jet_pt_bins(),
                const_bins(),
            ),
            H1("hMaxJetPt", "Max jet pt spectrum", pt_bins()),
            H2("hMaxJetEtaPhi", "Max jet eta and phi", eta_bins(), phi_bins()),
            H2(
                "hMaxJetNEFPt",
                "Neutral energy fraction vs. pt of the max jet",
                jet_pt_bins(),
                unit_bins(),
            ),
            H2(
                "hMaxJetNconstPt",
                "Number of jet constituents vs. pt of the max jet",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hMaxJetNallPt",
                "Number of all jet constituents vs. pt of the max jet",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hMaxJetNchargedPt",
                "Number of charged jet constituents vs. pt of the max jet",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hMaxJetNneutralPt",
                "Number of neutral jet constituents vs. pt of the max jet",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hMaxJetNphotonsPt",
                "Number of photon jet constituents vs. pt of the max jet",
                jet_pt_bins(),
                const_bins(),
            ),
            H2(
                "hPtLeading",
                "Pt of the leading constituent vs. jet pt",
                jet_pt_bins(),
                jet_pt_bins(),
            ),
            H2(
                "hPtLeadingCharged",
                "Pt of the leading constituent (if charged),
                vs. jet pt",
                jet_pt_bins(),
                jet_pt_bins(),
            ),
            H2(
                "hPtLeadingNeutral",
                "Pt of the leading constituent (if neutral),
                vs. jet pt",
                jet_pt_bins(),
                jet_pt_bins(),
            ),
            H2(
                "hPtLeadingPhoton",
                "Pt of the leading constituent (if photon),
                vs. jet pt",
                jet_pt_bins(),
                jet_pt_bins(),
            ),
            H2(
                "hDrLeading",
                "DeltaR of the leading constituent vs. jet pt",
                jet_pt_bins(),
                unit_bins(),
            ),
            H2(
                "hDrLeadingCharged",
                "DeltaR of the leading constituent (if charged),
                vs. jet pt",
                jet_pt_bins(),
                unit_bins(),
            ),
            H2(
                "hDrLeadingNeutral",
                "DeltaR of the leading constituent (if neutral),
                vs. jet pt",
                jet_pt_bins(),
                unit_bins(),
            ),
            H2(
                "hDrLeadingPhoton",
                "DeltaR of the leading constituent (if photon),
                vs. jet pt",
                jet_pt_bins(),
                unit_bins(),
            ),
            H2("hEtaPhiLeading", "eta-phi of all leading constituents", eta_bins(), phi_bins()),
            H2(
                "hEtaPhiLeadingCharged",
                "eta-phi of charged leading constituents",
                eta_bins(),
                phi_bins(),
            ),
            H2(
                "hEtaPhiLeadingNeutral",
                "eta-phi of neutral leading constituents",
                eta_bins(),
                phi_bins(),
            ),
            H2(
                "hEtaPhiLeadingPhoton",
                "eta-phi of photon leading constituents",
                eta_bins(),
                phi_bins(),
            ),
            H1("hPtNoLeading", "Jet pt for jets without leading constituent", pt_bins()),
            H2(
                "hFailedSDConstituents",
                "Jets failing soft drop due to constituents",
                failed_pt_bins(),
                count_bins(100),
            ),
            H2(
                "hFailedSDMass",
                "Jets failing soft drop due to mass",
                failed_pt_bins(),
                const_bins(),
            ),
            H1("hFailedSDFastjet", "Jets failing soft drop due to reclustering", failed_pt_bins()),
            H2("hJetMassPt", "jet mass vs. pt", jet_pt_bins(), const_bins()),
            H2("hJetMassNconst", "jet mass vs. N", count_bins(100), const_bins()),
            H1("hJetNoMassPt", "pt of jets with mass 0", pt_bins()),
            H2("hJetNoMassEtaPhi", "eta-phi of jets with mass 0", eta_bins(), phi_bins()),
            H1("hJetNoMassNall", "Number of constituents for jets with mass 0", count_bins(100)),
            H1(
                "hJetNoMassNcharged",
                "Number of charged constituents for jets with mass 0",
                count_bins(100),
            ),
            H1(
                "hJetNoMassNneutral",
                "Number of neutral constituents for jets with mass 0",
                count_bins(100),
            ),
            H1(
                "hJetNoMassNphotons",
                "Number of photon constituents for jets with mass 0",
                count_bins(100),
            ),
            // outliers
            H1("hJetLeadingPtHard", "fraction of the leading jet pt / pt-hard", frac_bins()),
            H1("hPartLeadingPtHard", "fraction of the leading particle pt / pt-hard", frac_bins()),
            H1(
                "hChargedLeadingPtHard",
                "fraction of the leading charged particle pt / pt-hard",
                frac_bins(),
            ),
            H1(
                "hNeutralLeadingPtHard",
                "fraction of the leading neutral particle pt / pt-hard",
                frac_bins(),
            ),
            H1("hPhotonLeadingPtHard", "fraction of the leading photon pt / pt-hard", frac_bins()),
        ]
    };
}

/// Zg bins: one bin for untagged jets below `zcut`, then steps of 0.05
pub fn zg_binning(zcut: f64) -> Binning {
    let mut edges = vec![0.];
    if zcut > 0. {
        edges.push(zcut);
    }
    let mut next = zcut + 0.05;
    while next < 0.5 - 1e-9 {
        edges.push(next);
        next += 0.05;
    }
    edges.push(0.5);
    Binning::Custom(edges)
}

/// Rg bins: one bin for untagged jets below 0, then steps of 0.05 up to R
pub fn rg_binning(radius: f64) -> Binning {
    let mut edges = vec![-0.05, 0.];
    let mut next = 0.05;
    while next < radius - 1e-9 {
        edges.push(next);
        next += 0.05;
    }
    edges.push(radius);
    Binning::Custom(edges)
}

/// Jets failing the declustering, per cause
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SoftdropFailures {
    pub constituents: u64,
    pub mass: u64,
    pub clustering: u64,
}

impl SoftdropFailures {
    pub fn total(&self) -> u64 {
        self.constituents + self.mass + self.clustering
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Counts {
    all: usize,
    charged: usize,
    neutral: usize,
    photons: usize,
}

impl Counts {
    fn of(constituents: &[Constituent]) -> Self {
        let mut counts = Self::default();
        for c in constituents {
            counts.all += 1;
            if c.is_charged() {
                counts.charged += 1;
            } else {
                counts.neutral += 1;
                if c.is_photon() {
                    counts.photons += 1;
                }
            }
        }
        counts
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JetSpectrumTask {
    config: AnalysisConfig,
    failures: SoftdropFailures,
}

impl JetSpectrumTask {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config, failures: Default::default() }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn failures(&self) -> SoftdropFailures {
        self.failures
    }

    /// Create all histograms filled by [`run`](Self::run)
    pub fn book_histograms(&self) -> HistManager {
        let mut hists = HistManager::new();
        for def in HISTOGRAMS.iter() {
            match def {
                HistDef::H1(name, title, bins) => hists.create_h1(name, title, bins.clone()),
                HistDef::H2(name, title, x, y) => {
                    hists.create_h2(name, title, x.clone(), y.clone())
                }
            }
        }
        if self.config.do_softdrop {
            // truncate after the third decimal digit
            let r = (self.config.jet_def.radius * 1000.).trunc() / 1000.;
            let zcut = self.config.softdrop.zcut;
            hists.create_h2("hSDZg", "Zg vs. pt", zg_binning(zcut), jet_pt_bins());
            hists.create_h2("hSDRg", "Rg vs. pt", rg_binning(r), jet_pt_bins());
            let nsd_bins = Binning::linear(22, -1.5, 20.5);
            hists.create_h2("fSDNsd", "Nsd vs. pt", nsd_bins, jet_pt_bins());
            let thetag_bins = Binning::linear(11, -0.1, 1.);
            hists.create_h2("fSDThetag", "Thetag vs. pt", thetag_bins, jet_pt_bins());
        }
        hists
    }

    /// Analyse one event
    ///
    /// Returns `false` if the event provides no jets, in which case only
    /// the event and particle level histograms are filled.
    pub fn run(&mut self, event: &dyn EventSnapshot, hists: &mut dyn HistogramSink) -> bool {
        hists.fill1("fNevents", 1.);
        let pt_hard = event.pt_hard().filter(|pt| pt.abs() > MIN_PT_HARD);
        fill_hard_parton(event, pt_hard, hists);
        fill_record(event, hists);
        fill_particles(event.particles(), pt_hard, hists);

        let Some(jets) = event.jets() else {
            error!("No particle level jets available");
            return false;
        };
        let radius = event.jet_radius();
        let declusterer = Declusterer {
            radius,
            params: self.config.softdrop,
            energy_scheme: self.config.energy_scheme,
            vertex: event.vertex(),
            drop_mass0_jets: self.config.drop_mass0_jets,
        };

        let mut maxjet: Option<&Jet> = None;
        for jet in jets {
            if maxjet.map_or(true, |max| jet.pt > max.pt) {
                maxjet = Some(jet);
            }
            fill_jet(jet, hists);
            if self.config.do_softdrop && jet.n() > 1 && jet.mass() > 0. {
                self.softdrop(&declusterer, jet, hists);
            }
        }
        if let Some(jet) = maxjet {
            fill_max_jet(jet, pt_hard, hists);
        }
        true
    }

    fn softdrop(&mut self, declusterer: &Declusterer, jet: &Jet, hists: &mut dyn HistogramSink) {
        let zcut = declusterer.params.zcut;
        let res = declusterer.softdrop(jet).and_then(|sd| {
            if sd.is_tagged(zcut) {
                // only tagged jets have a soft-drop multiplicity
                let splittings = declusterer.iterative(jet)?;
                Ok((sd, Some(splittings.len())))
            } else {
                Ok((sd, None))
            }
        });
        match res {
            Ok((sd, Some(n_sd))) => {
                hists.fill2("hSDZg", sd.zg, jet.pt);
                hists.fill2("hSDRg", sd.rg, jet.pt);
                hists.fill2("fSDNsd", n_sd as f64, jet.pt);
                hists.fill2("fSDThetag", sd.rg / declusterer.radius, jet.pt);
            }
            Ok((sd, None)) => {
                hists.fill2("hSDZg", sd.zg, jet.pt);
                hists.fill2("hSDRg", UNTAGGED_RG, jet.pt);
                hists.fill2("fSDNsd", UNTAGGED_NSD, jet.pt);
                hists.fill2("fSDThetag", UNTAGGED_THETAG, jet.pt);
            }
            Err(err) => {
                debug!("Soft drop failed for jet with pt {}: {err} (code {})", jet.pt, err.code());
                match err {
                    DeclusterError::InsufficientConstituents => {
                        self.failures.constituents += 1;
                        hists.fill2("hFailedSDConstituents", jet.pt, jet.n() as f64);
                    }
                    DeclusterError::ZeroMass => {
                        self.failures.mass += 1;
                        hists.fill2("hFailedSDMass", jet.pt, jet.mass());
                    }
                    DeclusterError::ClusteringFailure(_) => {
                        self.failures.clustering += 1;
                        hists.fill1("hFailedSDFastjet", jet.pt);
                    }
                }
            }
        }
    }
}

fn fill_hard_parton(
    event: &dyn EventSnapshot,
    pt_hard: Option<f64>,
    hists: &mut dyn HistogramSink,
) {
    let Some(parton) = event.hard_parton() else {
        return;
    };
    let pt = parton.pt;
    hists.fill1("fHardPartonPt", pt);
    let (name, frac_name) = if parton.is_quark() {
        ("fHardQuarkPt", "fFracHardQuarkPt")
    } else {
        ("fHardGluonPt", "fFracHardGluonPt")
    };
    hists.fill1(name, pt);
    if let Some(pt_hard) = pt_hard {
        hists.fill1("fFracHardPartonPt", pt / pt_hard);
        hists.fill1(frac_name, pt / pt_hard);
    }
}

fn fill_record(event: &dyn EventSnapshot, hists: &mut dyn HistogramSink) {
    let record = event.record();
    for &pt in &record.photon_mother_pt {
        hists.fill1("hPtPhotonMothers", pt);
    }
    hists.fill1("hNParticlesStack", event.n_record() as f64);
    hists.fill1("hNParticlesPrimaryStack", record.n_primary as f64);
    hists.fill1("hNParticlesPhysPrimStack", record.n_physical_primary as f64);
    hists.fill1("hNParticlesSecondaryStack", record.n_secondary as f64);
}

fn fill_particles(particles: &[Particle], pt_hard: Option<f64>, hists: &mut dyn HistogramSink) {
    let mut counts = Counts::default();
    for part in particles {
        let (pt, eta, phi) = (part.pt, part.eta, phi_0_2pi(part.phi));
        counts.all += 1;
        hists.fill1("hPtParticleAll", pt);
        hists.fill2("hEtaPhiParticle", eta, phi);
        if part.is_charged() {
            counts.charged += 1;
            hists.fill1("hPtParticleCharged", pt);
            hists.fill2("hEtaPhiCharged", eta, phi);
        } else {
            counts.neutral += 1;
            hists.fill1("hPtParticleNeutral", pt);
            hists.fill2("hEtaPhiNeutral", eta, phi);
            if part.is_photon() {
                counts.photons += 1;
                hists.fill1("hPtPhotons", pt);
                hists.fill2("hEtaPhiPhoton", eta, phi);
            }
        }
    }

    let maxima = [
        (hardest(particles), "hPtParticleMax", "hEtaPhiMaxParticle", "hPartLeadingPtHard"),
        (
            hardest(particles.iter().filter(|p| p.is_charged())),
            "hPtParticleMaxCharged",
            "hEtaPhiMaxCharged",
            "hChargedLeadingPtHard",
        ),
        (
            hardest(particles.iter().filter(|p| !p.is_charged())),
            "hPtParticleMaxNeutral",
            "hEtaPhiMaxNeutral",
            "hNeutralLeadingPtHard",
        ),
        (
            hardest(particles.iter().filter(|p| p.is_photon())),
            "hPtParticleMaxPhoton",
            "hEtaPhiMaxPhoton",
            "hPhotonLeadingPtHard",
        ),
    ];
    for (max, pt_name, eta_phi_name, frac_name) in maxima {
        let Some(max) = max else { continue };
        hists.fill1(pt_name, max.pt);
        hists.fill2(eta_phi_name, max.eta, phi_0_2pi(max.phi));
        if let Some(pt_hard) = pt_hard {
            hists.fill1(frac_name, max.pt / pt_hard);
        }
    }

    hists.fill1("hNParticlesEvent", counts.all as f64);
    hists.fill1("hNChargedEvent", counts.charged as f64);
    hists.fill1("hNNeutralEvent", counts.neutral as f64);
    hists.fill1("hNPhotonsEvent", counts.photons as f64);
}

fn fill_jet(jet: &Jet, hists: &mut dyn HistogramSink) {
    let pt = jet.pt;
    let mass = jet.mass();
    let n = jet.n() as f64;
    hists.fill1("hJetPt", pt);
    hists.fill2("hJetEtaPhi", jet.eta, phi_0_2pi(jet.phi));
    hists.fill2("hJetNEFPt", pt, jet.nef());
    hists.fill2("hJetNconstPt", pt, n);
    hists.fill2("hJetMassPt", pt, mass);
    hists.fill2("hJetMassNconst", n, mass);

    let counts = Counts::of(&jet.constituents);
    if mass.abs() < MASSLESS {
        hists.fill1("hJetNoMassPt", pt);
        hists.fill2("hJetNoMassEtaPhi", jet.eta, phi_0_2pi(jet.phi));
        hists.fill1("hJetNoMassNall", counts.all as f64);
        hists.fill1("hJetNoMassNcharged", counts.charged as f64);
        hists.fill1("hJetNoMassNneutral", counts.neutral as f64);
        hists.fill1("hJetNoMassNphotons", counts.photons as f64);
    }

    for c in &jet.constituents {
        let (cpt, ceta, cphi) = (c.pt(), c.eta(), phi_0_2pi(c.phi()));
        hists.fill1("hPtJetConstituent", cpt);
        hists.fill2("hEtaPhiJetConstituents", ceta, cphi);
        if c.is_charged() {
            hists.fill1("hPtJetConstituentCharged", cpt);
            hists.fill2("hEtaPhiJetConstituentsCharged", ceta, cphi);
        } else {
            hists.fill1("hPtJetConstituentNeutral", cpt);
            hists.fill2("hEtaPhiJetConstituentsNeutral", ceta, cphi);
            if c.is_photon() {
                hists.fill1("hPtJetConstituentPhoton", cpt);
                hists.fill2("hEtaPhiJetConstituentsPhoton", ceta, cphi);
            }
        }
    }
    hists.fill2("hJetNallPt", pt, counts.all as f64);
    hists.fill2("hJetNchargedPt", pt, counts.charged as f64);
    hists.fill2("hJetNneutralPt", pt, counts.neutral as f64);
    hists.fill2("hJetNphotonsPt", pt, counts.photons as f64);

    let Some(leading) = jet.leading() else {
        hists.fill1("hPtNoLeading", pt);
        return;
    };
    let (lpt, leta, lphi) = (leading.pt(), leading.eta(), phi_0_2pi(leading.phi()));
    let dr = kinematics::delta_r(&jet.p, &leading.nominal_momentum());
    let suffixes: &[&str] = if leading.is_charged() {
        &["", "Charged"]
    } else if leading.is_photon() {
        &["", "Neutral", "Photon"]
    } else {
        &["", "Neutral"]
    };
    for suffix in suffixes {
        hists.fill2(&format!("hPtLeading{suffix}"), pt, lpt);
        hists.fill2(&format!("hEtaPhiLeading{suffix}"), leta, lphi);
        hists.fill2(&format!("hDrLeading{suffix}"), pt, dr);
    }
}

fn fill_max_jet(jet: &Jet, pt_hard: Option<f64>, hists: &mut dyn HistogramSink) {
    let pt = jet.pt;
    if let Some(pt_hard) = pt_hard {
        hists.fill1("hJetLeadingPtHard", pt / pt_hard);
    }
    hists.fill1("hMaxJetPt", pt);
    hists.fill2("hMaxJetEtaPhi", jet.eta, phi_0_2pi(jet.phi));
    hists.fill2("hMaxJetNEFPt", pt, jet.nef());
    let counts = Counts::of(&jet.constituents);
    hists.fill2("hMaxJetNconstPt", pt, jet.n() as f64);
    hists.fill2("hMaxJetNallPt", pt, counts.all as f64);
    hists.fill2("hMaxJetNchargedPt", pt, counts.charged as f64);
    hists.fill2("hMaxJetNneutralPt", pt, counts.neutral as f64);
    hists.fill2("hMaxJetNphotonsPt", pt, counts.photons as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AcceptedEvent, RecordSummary};
    use crate::hist::Histogram;
    use crate::kinematics::from_pt_eta_phi;
    use particle_id::ParticleID;

    fn particle(pdg: i32, pt: f64, eta: f64, phi: f64) -> Particle {
        Particle::new(ParticleID::new(pdg), from_pt_eta_phi(pt, eta, phi))
    }

    fn jet(particles: &[Particle]) -> Jet {
        Jet::from_constituents(particles.iter().map(|&p| p.into()).collect())
    }

    fn event(jets: Option<Vec<Jet>>) -> AcceptedEvent {
        let particles = jets
            .iter()
            .flatten()
            .flat_map(|j| j.constituents.iter())
            .filter_map(|c| match c {
                Constituent::Particle(p) => Some(*p),
                Constituent::Cluster(_) => None,
            })
            .collect();
        AcceptedEvent {
            particles,
            jets,
            jet_radius: 0.4,
            pt_hard: Some(50.),
            hard_parton: Some(particle(21, 60., 0., 0.)),
            n_record: 100,
            record: RecordSummary {
                n_primary: 90,
                n_physical_primary: 40,
                n_secondary: 6,
                photon_mother_pt: vec![12.5, 3.5],
            },
            vertex: [0.; 3],
        }
    }

    fn total(hists: &HistManager, name: &str) -> u64 {
        hists.get(name).map(Histogram::entries).unwrap_or_else(|| panic!("no histogram {name}"))
    }

    #[test]
    fn binnings() {
        let Binning::Custom(zg) = zg_binning(0.1) else { panic!() };
        assert_eq!(zg.len(), 10);
        assert_eq!(zg[0], 0.);
        assert_eq!(zg[1], 0.1);
        assert_eq!(*zg.last().unwrap(), 0.5);
        let Binning::Custom(rg) = rg_binning(0.4) else { panic!() };
        assert_eq!(rg.len(), 10);
        assert_eq!(rg[0], -0.05);
        assert_eq!(*rg.last().unwrap(), 0.4);
        assert!(rg.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn catalogue_has_unique_names() {
        let task = JetSpectrumTask::new(AnalysisConfig::default());
        let hists = task.book_histograms();
        assert_eq!(hists.len(), HISTOGRAMS.len() + 4);
        let mut no_sd = AnalysisConfig::default();
        no_sd.do_softdrop = false;
        assert_eq!(JetSpectrumTask::new(no_sd).book_histograms().len(), HISTOGRAMS.len());
    }

    #[test]
    fn tagged_and_untagged_jets() {
        let tagged = jet(&[particle(211, 20., 0., 0.), particle(22, 10., 0.1, 0.1)]);
        let untagged = jet(&[particle(211, 50., 0., 2.), particle(-211, 1., 0.1, 2.1)]);
        let mut task = JetSpectrumTask::new(AnalysisConfig::default());
        let mut hists = task.book_histograms();
        let ev = event(Some(vec![tagged.clone(), untagged.clone()]));
        assert!(task.run(&ev, &mut hists));

        let nsd = hists.h2("fSDNsd").unwrap();
        assert_eq!(nsd.content_at(1., tagged.pt), 1.);
        assert_eq!(nsd.content_at(-1., untagged.pt), 1.);
        let rg = hists.h2("hSDRg").unwrap();
        assert_eq!(rg.content_at(UNTAGGED_RG, untagged.pt), 1.);
        let zg = hists.h2("hSDZg").unwrap();
        assert_eq!(zg.content_at(0.05, untagged.pt), 1.);
        assert_eq!(zg.content_at(1. / 3., tagged.pt), 1.);

        assert_eq!(total(&hists, "hJetPt"), 2);
        assert_eq!(total(&hists, "hMaxJetPt"), 1);
        assert_eq!(hists.h1("hMaxJetPt").unwrap().content_at(untagged.pt), 1.);
        assert_eq!(total(&hists, "hPtParticleAll"), 4);
        assert_eq!(total(&hists, "hPtPhotons"), 1);
        assert_eq!(total(&hists, "hPtLeadingCharged"), 2);
        assert_eq!(total(&hists, "hPtLeadingPhoton"), 0);
        assert_eq!(hists.h1("hNChargedEvent").unwrap().content_at(3.), 1.);
        assert_eq!(total(&hists, "fHardGluonPt"), 1);
        assert_eq!(total(&hists, "fFracHardGluonPt"), 1);
        assert_eq!(total(&hists, "fFracHardQuarkPt"), 0);
        assert_eq!(task.failures().total(), 0);
    }

    #[test]
    fn failures_are_tallied_and_processing_continues() {
        // all constituents charged, but only neutral ones are declustered
        let mut config = AnalysisConfig::default();
        config.softdrop.use_charged = false;
        let charged = jet(&[particle(211, 20., 0., 0.), particle(211, 10., 0.1, 0.1)]);
        let mixed = jet(&[
            particle(22, 20., 0., 1.),
            particle(22, 10., 0.1, 1.1),
            particle(211, 5., 0., 1.05),
        ]);
        let mut task = JetSpectrumTask::new(config);
        let mut hists = task.book_histograms();
        assert!(task.run(&event(Some(vec![charged.clone(), mixed.clone()])), &mut hists));
        assert_eq!(task.failures(), SoftdropFailures { constituents: 1, mass: 0, clustering: 0 });
        let failed = hists.h2("hFailedSDConstituents").unwrap();
        assert_eq!(failed.content_at(charged.pt, 2.), 1.);
        assert_eq!(total(&hists, "hSDZg"), 1);
    }

    #[test]
    fn massless_jets_skip_softdrop() {
        let collinear = Jet::new(
            [30., 30., 0., 0.],
            vec![particle(211, 20., 0., 0.).into(), particle(22, 10., 0., 0.).into()],
        );
        let mut task = JetSpectrumTask::new(AnalysisConfig::default());
        let mut hists = task.book_histograms();
        assert!(task.run(&event(Some(vec![collinear])), &mut hists));
        assert_eq!(total(&hists, "hJetNoMassPt"), 1);
        assert_eq!(hists.h1("hJetNoMassNphotons").unwrap().content_at(1.), 1.);
        assert_eq!(total(&hists, "hSDZg"), 0);
        assert_eq!(task.failures().total(), 0);
    }

    #[test]
    fn missing_jets_stop_processing() {
        let mut task = JetSpectrumTask::new(AnalysisConfig::default());
        let mut hists = task.book_histograms();
        assert!(!task.run(&event(None), &mut hists));
        assert_eq!(total(&hists, "fNevents"), 1);
        assert_eq!(total(&hists, "hJetPt"), 0);
        assert_eq!(hists.h1("hNParticlesStack").unwrap().content_at(100.), 1.);
    }

    #[test]
    fn record_histograms() {
        let mut task = JetSpectrumTask::new(AnalysisConfig::default());
        let mut hists = task.book_histograms();
        assert!(!task.run(&event(None), &mut hists));
        let content = |name: &str, x: f64| hists.h1(name).unwrap().content_at(x);
        assert_eq!(content("hNParticlesPrimaryStack", 90.), 1.);
        assert_eq!(content("hNParticlesPhysPrimStack", 40.), 1.);
        assert_eq!(content("hNParticlesSecondaryStack", 6.), 1.);
        assert_eq!(total(&hists, "hPtPhotonMothers"), 2);
        assert_eq!(content("hPtPhotonMothers", 12.5), 1.);
        assert_eq!(content("hPtPhotonMothers", 3.5), 1.);
    }
}
