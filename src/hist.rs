//! Named 1D and 2D histograms.
//!
//! Bin contents are stored with one underflow and one overflow bin per
//! axis, bin 0 being the underflow and bin n + 1 the overflow.
use std::collections::BTreeMap;

use log::{error, trace};
use serde::{Deserialize, Serialize};

/// Receiver of histogram fills, addressed by histogram name
pub trait HistogramSink {
    fn fill1(&mut self, name: &str, x: f64);
    fn fill2(&mut self, name: &str, x: f64, y: f64);
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Binning {
    /// `n` bins of equal width in `[min, max)`
    Linear { n: usize, min: f64, max: f64 },
    /// Explicit ascending bin edges
    Custom(Vec<f64>),
}

impl Binning {
    pub fn linear(n: usize, min: f64, max: f64) -> Self {
        debug_assert!(n > 0 && max > min);
        Binning::Linear { n, min, max }
    }

    pub fn n_bins(&self) -> usize {
        match self {
            Binning::Linear { n, .. } => *n,
            Binning::Custom(edges) => edges.len().saturating_sub(1),
        }
    }

    pub fn edges(&self) -> Vec<f64> {
        match self {
            Binning::Linear { n, min, max } => {
                let width = (max - min) / *n as f64;
                (0..=*n).map(|i| min + i as f64 * width).collect()
            }
            Binning::Custom(edges) => edges.clone(),
        }
    }

    /// Storage index of `x`, including under- and overflow
    ///
    /// `None` for NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let n = self.n_bins();
        let idx = match self {
            Binning::Linear { min, max, .. } => {
                if x < *min {
                    0
                } else if x >= *max {
                    n + 1
                } else {
                    let bin = ((x - min) / (max - min) * n as f64) as usize;
                    // rounding may push values just below max into the overflow
                    1 + bin.min(n - 1)
                }
            }
            Binning::Custom(edges) => {
                if edges.is_empty() || x < edges[0] {
                    0
                } else if x >= edges[edges.len() - 1] {
                    n + 1
                } else {
                    edges.partition_point(|&e| e <= x)
                }
            }
        };
        Some(idx)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hist1 {
    pub title: String,
    pub binning: Binning,
    /// Bin contents, including under- and overflow
    pub content: Vec<f64>,
    pub entries: u64,
}

impl Hist1 {
    pub fn new(title: impl Into<String>, binning: Binning) -> Self {
        let content = vec![0.; binning.n_bins() + 2];
        Self { title: title.into(), binning, content, entries: 0 }
    }

    pub fn fill(&mut self, x: f64) {
        if let Some(bin) = self.binning.find_bin(x) {
            self.content[bin] += 1.;
            self.entries += 1;
        }
    }

    /// Content of the bin containing `x`
    pub fn content_at(&self, x: f64) -> f64 {
        self.binning.find_bin(x).map(|bin| self.content[bin]).unwrap_or(0.)
    }

    pub fn underflow(&self) -> f64 {
        self.content[0]
    }

    pub fn overflow(&self) -> f64 {
        self.content[self.content.len() - 1]
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hist2 {
    pub title: String,
    pub x_binning: Binning,
    pub y_binning: Binning,
    /// Bin contents, row-major in x, including under- and overflow
    pub content: Vec<f64>,
    pub entries: u64,
}

impl Hist2 {
    pub fn new(title: impl Into<String>, x_binning: Binning, y_binning: Binning) -> Self {
        let content = vec![0.; (x_binning.n_bins() + 2) * (y_binning.n_bins() + 2)];
        Self {
            title: title.into(),
            x_binning,
            y_binning,
            content,
            entries: 0,
        }
    }

    fn index(&self, x: f64, y: f64) -> Option<usize> {
        let ix = self.x_binning.find_bin(x)?;
        let iy = self.y_binning.find_bin(y)?;
        Some(ix * (self.y_binning.n_bins() + 2) + iy)
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        if let Some(idx) = self.index(x, y) {
            self.content[idx] += 1.;
            self.entries += 1;
        }
    }

    pub fn content_at(&self, x: f64, y: f64) -> f64 {
        self.index(x, y).map(|idx| self.content[idx]).unwrap_or(0.)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Histogram {
    H1(Hist1),
    H2(Hist2),
}

impl Histogram {
    pub fn entries(&self) -> u64 {
        match self {
            Histogram::H1(h) => h.entries,
            Histogram::H2(h) => h.entries,
        }
    }
}

/// Collection of histograms addressed by name
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct HistManager {
    histograms: BTreeMap<String, Histogram>,
}

impl HistManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_h1(&mut self, name: &str, title: &str, binning: Binning) {
        self.insert(name, Histogram::H1(Hist1::new(title, binning)))
    }

    pub fn create_h2(&mut self, name: &str, title: &str, x: Binning, y: Binning) {
        self.insert(name, Histogram::H2(Hist2::new(title, x, y)))
    }

    fn insert(&mut self, name: &str, hist: Histogram) {
        if self.histograms.insert(name.to_owned(), hist).is_some() {
            error!("Histogram {name} created twice, keeping the latest");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    pub fn h1(&self, name: &str) -> Option<&Hist1> {
        match self.histograms.get(name) {
            Some(Histogram::H1(h)) => Some(h),
            _ => None,
        }
    }

    pub fn h2(&self, name: &str) -> Option<&Hist2> {
        match self.histograms.get(name) {
            Some(Histogram::H2(h)) => Some(h),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Histogram)> {
        self.histograms.iter()
    }
}

impl HistogramSink for HistManager {
    fn fill1(&mut self, name: &str, x: f64) {
        match self.histograms.get_mut(name) {
            Some(Histogram::H1(h)) => h.fill(x),
            Some(Histogram::H2(_)) => error!("Histogram {name} is two-dimensional"),
            None => error!("No histogram {name}"),
        }
        trace!("{name} <- {x}");
    }

    fn fill2(&mut self, name: &str, x: f64, y: f64) {
        match self.histograms.get_mut(name) {
            Some(Histogram::H2(h)) => h.fill(x, y),
            Some(Histogram::H1(_)) => error!("Histogram {name} is one-dimensional"),
            None => error!("No histogram {name}"),
        }
        trace!("{name} <- ({x}, {y})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_bins() {
        let b = Binning::linear(10, 0., 1.);
        assert_eq!(b.find_bin(-0.1), Some(0));
        assert_eq!(b.find_bin(0.), Some(1));
        assert_eq!(b.find_bin(0.15), Some(2));
        assert_eq!(b.find_bin(0.99), Some(10));
        assert_eq!(b.find_bin(1.), Some(11));
        assert_eq!(b.find_bin(f64::NAN), None);
        assert_eq!(b.edges().len(), 11);
    }

    #[test]
    fn custom_bins() {
        let b = Binning::Custom(vec![0., 0.1, 0.15, 0.5]);
        assert_eq!(b.n_bins(), 3);
        assert_eq!(b.find_bin(-1.), Some(0));
        assert_eq!(b.find_bin(0.), Some(1));
        assert_eq!(b.find_bin(0.1), Some(2));
        assert_eq!(b.find_bin(0.12), Some(2));
        assert_eq!(b.find_bin(0.49), Some(3));
        assert_eq!(b.find_bin(0.5), Some(4));
    }

    #[test]
    fn fill_by_name() {
        let mut hists = HistManager::new();
        hists.create_h1("h", "test", Binning::linear(2, 0., 2.));
        hists.create_h2("h2", "test", Binning::linear(2, 0., 2.), Binning::linear(1, 0., 1.));
        hists.fill1("h", 0.5);
        hists.fill1("h", 5.);
        hists.fill1("missing", 1.);
        hists.fill2("h2", 1.5, 0.5);
        hists.fill2("h", 1.5, 0.5);
        let h = hists.h1("h").unwrap();
        assert_eq!(h.entries, 2);
        assert_eq!(h.content_at(0.2), 1.);
        assert_eq!(h.overflow(), 1.);
        assert_eq!(h.underflow(), 0.);
        let h2 = hists.h2("h2").unwrap();
        assert_eq!(h2.entries, 1);
        assert_eq!(h2.content_at(1.9, 0.1), 1.);
        assert_eq!(h2.content_at(0.1, 0.1), 0.);
    }
}
