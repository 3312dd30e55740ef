use std::cmp::Ordering;
use std::convert::From;

use avery::event::Status;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::jets::{Jet, JetDefinition};
use crate::kinematics;
use crate::particle::Particle;

/// Strange hadrons whose weak decays produce secondaries
const WEAKLY_DECAYING_STRANGE: [i32; 8] = [310, 321, 3112, 3122, 3222, 3312, 3322, 3334];
const PHOTON: i32 = 22;

/// Counts from the production history of the generator record
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct RecordSummary {
    /// Entries that are not incoming
    pub n_primary: usize,
    /// Final-state particles not coming from weak decays
    pub n_physical_primary: usize,
    /// Final-state particles from weak decays of strange hadrons
    pub n_secondary: usize,
    /// Transverse momenta of photons decaying into at least one photon
    pub photon_mother_pt: Vec<f64>,
}

impl RecordSummary {
    /// Derive the counts from the event topology
    ///
    /// Without a topology every final-state particle counts as physical
    /// primary.
    pub fn new(event: &avery::Event) -> Self {
        let particles = &event.particles;
        let n_vertices = event.topology.node_count();
        let mut production = vec![None; particles.len()];
        let mut decay = vec![None; particles.len()];
        let mut vertex_in = vec![Vec::new(); n_vertices];
        let mut vertex_out = vec![Vec::new(); n_vertices];
        for edge in event.topology.raw_edges() {
            let idx = edge.weight;
            if idx >= particles.len() {
                continue;
            }
            let (start, end) = (edge.source().index(), edge.target().index());
            production[idx] = Some(start);
            decay[idx] = Some(end);
            vertex_out[start].push(idx);
            vertex_in[end].push(idx);
        }
        let abs_pdg = |idx: usize| particles[idx].id.map(|id| id.id().abs());

        let mut summary = Self::default();
        for (idx, particle) in particles.iter().enumerate() {
            if !matches!(particle.status, Some(Status::Incoming | Status::IncomingBeam)) {
                summary.n_primary += 1;
            }
            if particle.status == Some(Status::Outgoing) {
                let from_weak_decay = production[idx].map_or(false, |vx| {
                    vertex_in[vx].iter().any(|&mother| {
                        abs_pdg(mother).map_or(false, |pdg| WEAKLY_DECAYING_STRANGE.contains(&pdg))
                    })
                });
                if from_weak_decay {
                    summary.n_secondary += 1;
                } else {
                    summary.n_physical_primary += 1;
                }
            }
            if abs_pdg(idx) == Some(PHOTON) {
                let is_photon_mother = decay[idx].map_or(false, |vx| {
                    vertex_out[vx].iter().any(|&daughter| abs_pdg(daughter) == Some(PHOTON))
                });
                if let (true, Some(p)) = (is_photon_mother, particle.p) {
                    summary.photon_mother_pt.push(kinematics::pt(&p));
                }
            }
        }
        summary
    }
}

#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Event {
    /// Final-state particles
    pub out: Vec<Particle>,
    /// Number of entries in the generator record
    pub n_record: usize,
    pub record: RecordSummary,
    /// Hard scale of the generated process
    pub pt_hard: Option<f64>,
    /// Hardest parton in the generator record
    pub hard_parton: Option<Particle>,
    pub vertex: [f64; 3],
}

impl From<avery::Event> for Event {
    fn from(event: avery::Event) -> Self {
        let n_record = event.particles.len();
        let record = RecordSummary::new(&event);
        let mut out = Vec::new();
        let mut hard_parton: Option<Particle> = None;
        for particle in &event.particles {
            let (Some(id), Some(p)) = (particle.id, particle.p) else {
                continue;
            };
            let is_outgoing = particle.status == Some(Status::Outgoing);
            let is_incoming = particle.status == Some(Status::Incoming);
            let particle = Particle::new(id, p);
            if is_outgoing {
                out.push(particle);
            }
            if !is_incoming && particle.is_parton() {
                match hard_parton {
                    Some(hardest) if hardest.pt >= particle.pt => {}
                    _ => hard_parton = Some(particle),
                }
            }
        }
        Event {
            out,
            n_record,
            record,
            // the event scale, falling back to the shower starting scale
            pt_hard: event.scales.mu_r.or(event.scales.mu_ps),
            hard_parton,
            vertex: [0.; 3],
        }
    }
}

/// Acceptance for event-level particles
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(default)]
pub struct ParticleSelection {
    pub min_pt: f64,
    pub max_abs_eta: f64,
}

impl Default for ParticleSelection {
    fn default() -> Self {
        Self { min_pt: 0., max_abs_eta: 0.7 }
    }
}

impl ParticleSelection {
    pub fn accepts(&self, p: &Particle) -> bool {
        p.pt >= self.min_pt && p.eta.abs() < self.max_abs_eta
    }
}

/// Acceptance for jets
///
/// Jets have to be fully contained in the particle acceptance, so their
/// pseudorapidity is limited to `max_abs_eta - R`.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(default)]
pub struct JetSelection {
    pub min_pt: f64,
    pub max_pt: f64,
    pub max_constituent_pt: f64,
    pub max_abs_eta: f64,
}

impl Default for JetSelection {
    fn default() -> Self {
        Self {
            min_pt: 0.,
            max_pt: 1000.,
            max_constituent_pt: 1000.,
            max_abs_eta: 0.7,
        }
    }
}

impl JetSelection {
    pub fn accepts(&self, jet: &Jet, radius: f64) -> bool {
        jet.pt >= self.min_pt
            && jet.pt < self.max_pt
            && jet.max_constituent_pt() < self.max_constituent_pt
            && jet.eta.abs() < self.max_abs_eta - radius
    }
}

/// Read-only view of one event as seen by an analysis
pub trait EventSnapshot {
    /// Accepted particles
    fn particles(&self) -> &[Particle];
    /// Accepted jets, `None` if no jet collection is available
    fn jets(&self) -> Option<&[Jet]>;
    /// Radius of the jets
    fn jet_radius(&self) -> f64;
    fn pt_hard(&self) -> Option<f64>;
    fn hard_parton(&self) -> Option<&Particle>;
    fn n_record(&self) -> usize;
    fn record(&self) -> &RecordSummary;
    fn vertex(&self) -> [f64; 3];
}

/// An event after particle and jet selection
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct AcceptedEvent {
    pub particles: Vec<Particle>,
    pub jets: Option<Vec<Jet>>,
    pub jet_radius: f64,
    pub pt_hard: Option<f64>,
    pub hard_parton: Option<Particle>,
    pub n_record: usize,
    pub record: RecordSummary,
    pub vertex: [f64; 3],
}

impl AcceptedEvent {
    /// Select particles, then find and select jets among them
    pub fn new(
        event: &Event,
        particle_sel: &ParticleSelection,
        jet_def: &JetDefinition,
        jet_sel: &JetSelection,
    ) -> Self {
        let particles: Vec<Particle> =
            event.out.iter().filter(|p| particle_sel.accepts(p)).copied().collect();
        let jets = match jet_def.find_jets(&particles) {
            Ok(jets) => Some(
                jets.into_iter()
                    .filter(|jet| jet_sel.accepts(jet, jet_def.radius))
                    .collect(),
            ),
            Err(err) => {
                warn!("Jet finding failed: {err}");
                None
            }
        };
        Self {
            particles,
            jets,
            jet_radius: jet_def.radius,
            pt_hard: event.pt_hard,
            hard_parton: event.hard_parton,
            n_record: event.n_record,
            record: event.record.clone(),
            vertex: event.vertex,
        }
    }
}

impl EventSnapshot for AcceptedEvent {
    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn jets(&self) -> Option<&[Jet]> {
        self.jets.as_deref()
    }

    fn jet_radius(&self) -> f64 {
        self.jet_radius
    }

    fn pt_hard(&self) -> Option<f64> {
        self.pt_hard
    }

    fn hard_parton(&self) -> Option<&Particle> {
        self.hard_parton.as_ref()
    }

    fn n_record(&self) -> usize {
        self.n_record
    }

    fn record(&self) -> &RecordSummary {
        &self.record
    }

    fn vertex(&self) -> [f64; 3] {
        self.vertex
    }
}

/// Hardest particle according to transverse momentum
pub fn hardest<'a, I>(particles: I) -> Option<&'a Particle>
where
    I: IntoIterator<Item = &'a Particle>,
{
    particles
        .into_iter()
        .max_by(|a, b| a.pt.partial_cmp(&b.pt).unwrap_or(Ordering::Equal))
}
