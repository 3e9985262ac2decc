use crate::bbox::BoundingBox;
use crate::error::Error;
use serde_derive::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Visual tracking algorithms the provider knows how to construct.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Csrt,
    Kcf,
    Mosse,
}

impl Algorithm {
    /// Algorithms tried after the requested one, in order.
    pub const FALLBACKS: [Algorithm; 2] = [Algorithm::Kcf, Algorithm::Mosse];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Csrt => "CSRT",
            Algorithm::Kcf => "KCF",
            Algorithm::Mosse => "MOSSE",
        }
    }

    /// `self` first, then the fixed fallbacks, without repeats.
    pub fn fallback_order(self) -> Vec<Algorithm> {
        let mut order = vec![self];

        for alt in Self::FALLBACKS {
            if !order.contains(&alt) {
                order.push(alt);
            }
        }

        order
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Csrt
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CSRT" => Ok(Algorithm::Csrt),
            "KCF" => Ok(Algorithm::Kcf),
            "MOSSE" => Ok(Algorithm::Mosse),
            other => Err(Error::Validation(format!(
                "unknown tracking algorithm `{}`",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Algorithm> for String {
    fn from(a: Algorithm) -> Self {
        a.name().to_string()
    }
}

/// Where an engine constructor lives in the vision library.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Native,
    Legacy,
}

impl Namespace {
    pub const ORDER: [Namespace; 2] = [Namespace::Legacy, Namespace::Native];
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Native => f.write_str("native"),
            Namespace::Legacy => f.write_str("legacy"),
        }
    }
}

/// A stateful single-object tracker over frames of type `F`.
pub trait TrackingEngine<F> {
    /// Seeds the tracker. `Ok(false)` means the box was rejected.
    fn init(&mut self, frame: &F, bbox: &BoundingBox) -> Result<bool, Error>;

    /// `Ok(None)` when the object is lost on this frame.
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>, Error>;
}

impl<F, T: TrackingEngine<F> + ?Sized> TrackingEngine<F> for Box<T> {
    #[inline]
    fn init(&mut self, frame: &F, bbox: &BoundingBox) -> Result<bool, Error> {
        (**self).init(frame, bbox)
    }

    #[inline]
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>, Error> {
        (**self).update(frame)
    }
}

/// A constructed engine and the variant that produced it.
#[derive(Debug)]
pub struct Provided<E> {
    pub engine: E,
    pub algorithm: Algorithm,
    pub namespace: Namespace,
}

/// Tries `construct` for every algorithm of `preferred.fallback_order()`,
/// legacy namespace before native, and returns the first engine built.
pub fn provide<E, C>(preferred: Algorithm, construct: C) -> Result<Provided<E>, Error>
where
    C: Fn(Algorithm, Namespace) -> Result<E, Error>,
{
    let mut tried = Vec::new();

    for algorithm in preferred.fallback_order() {
        for namespace in Namespace::ORDER {
            match construct(algorithm, namespace) {
                Ok(engine) => {
                    tracing::info!("using {} tracker ({})", algorithm, namespace);

                    return Ok(Provided {
                        engine,
                        algorithm,
                        namespace,
                    });
                }
                Err(err) => {
                    tracing::debug!("{} tracker ({}) unavailable: {}", algorithm, namespace, err);
                    tried.push(format!("{}/{}", algorithm, namespace));
                }
            }
        }
    }

    Err(Error::TrackerUnavailable {
        tried: tried.join(", "),
    })
}
