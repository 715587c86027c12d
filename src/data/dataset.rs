use burn::data::dataset::Dataset;

/// One resized training frame with its road mask.
/// `image` is HWC RGB bytes, `mask` holds one byte per pixel (1 = road).
#[derive(Debug, Clone)]
pub struct RoadSample {
    pub image:  Vec<u8>,
    pub mask:   Vec<u8>,
    pub height: usize,
    pub width:  usize,
}

impl RoadSample {
    /// Fraction of pixels labelled as road
    pub fn road_fraction(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.mask.iter().filter(|&&m| m == 1).count() as f64 / self.mask.len() as f64
    }
}

pub struct RoadDataset {
    samples: Vec<RoadSample>,
}

impl RoadDataset {
    pub fn new(samples: Vec<RoadSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<RoadSample> for RoadDataset {
    fn get(&self, index: usize) -> Option<RoadSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
