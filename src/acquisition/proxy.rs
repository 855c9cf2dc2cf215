//! Egress proxy pool loaded from a plain-text list.

use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Proxies to pick from, one uniformly at random per download.
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<String>,
    rng: Mutex<StdRng>,
}

impl ProxyPool {
    /// Pool over `proxies`. A seed makes the draw sequence reproducible.
    pub fn new(proxies: Vec<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            proxies,
            rng: Mutex::new(rng),
        }
    }

    /// An empty pool: downloads go out directly.
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// One proxy per line; blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    /// Load the list at `path`. A missing file gives an empty pool.
    pub fn load(path: Option<&Path>, seed: Option<u64>) -> Result<Self> {
        let proxies = match path {
            Some(p) if p.is_file() => Self::parse(&std::fs::read_to_string(p)?),
            _ => Vec::new(),
        };
        debug!("Loaded {} proxies", proxies.len());
        Ok(Self::new(proxies, seed))
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Draw a proxy, avoiding `exclude` while any other proxy remains.
    pub fn choose(&self, exclude: &[String]) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }

        let fresh: Vec<&String> = self
            .proxies
            .iter()
            .filter(|p| !exclude.contains(p))
            .collect();
        let candidates: Vec<&String> = if fresh.is_empty() {
            self.proxies.iter().collect()
        } else {
            fresh
        };

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let index = rng.gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}
