use rand::{self, RngCore};
use rand_distr::{Distribution, Poisson, Uniform};

use segment_index::Document;

/// A random document, made of words `w0`, `w1`, ... drawn uniformly from
/// the vocabulary (with repetitions)
pub struct TestDocument {
    pub words: Vec<usize>,
}

impl TestDocument {
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|ix| word(*ix))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.text())
    }
}

pub fn word(ix: usize) -> String {
    format!("w{}", ix)
}

pub fn create_document(
    lambda_words: f32,
    vocabulary_size: usize,
    rng: &mut dyn RngCore,
) -> TestDocument {
    let poi = Poisson::new(lambda_words).unwrap();
    let num_words = 1 + poi.sample(rng) as usize;
    let uniform = Uniform::new(0, vocabulary_size);

    TestDocument {
        words: (0..num_words).map(|_| uniform.sample(rng)).collect(),
    }
}
