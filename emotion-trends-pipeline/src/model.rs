use {
    std::{fs, path::Path},
    ndarray::{Array1, Array2, ArrayView2, Axis},
    serde::Deserialize,
    tracing::info,
    crate::classifier::ClassifierError,
};

/// Forward pass of a trained sequence classifier over a padded batch of token indices.
/// Returns one row of class scores per input row.
pub trait SequenceModel: Send + Sync {
    fn num_classes(&self) -> usize;

    /// Number of token indices the model accepts, padding included, when it is bounded.
    fn vocabulary_size(&self) -> Option<usize> {
        None
    }

    fn predict(&self, inputs: ArrayView2<'_, i64>) -> Result<Array2<f32>, ClassifierError>;
}

#[derive(Deserialize)]
struct EmbeddingBagWeights {
    embedding: Vec<Vec<f32>>,
    dense_weights: Vec<Vec<f32>>,
    dense_bias: Vec<f32>,
}

/// Averages the embeddings of all non-padding positions and applies a softmax dense layer.
pub struct EmbeddingBagModel {
    embedding: Array2<f32>,
    dense_weights: Array2<f32>,
    dense_bias: Array1<f32>,
}

impl EmbeddingBagModel {
    pub fn new(embedding: Array2<f32>, dense_weights: Array2<f32>, dense_bias: Array1<f32>) -> Result<Self, ClassifierError> {
        if embedding.nrows() == 0 || embedding.ncols() == 0 {
            return Err(ClassifierError::InvalidModel("embedding matrix is empty".to_owned()));
        }
        if dense_weights.nrows() != embedding.ncols() {
            return Err(ClassifierError::InvalidModel(format!(
                "dense layer expects {} inputs, embedding dimension is {}",
                dense_weights.nrows(),
                embedding.ncols(),
            )));
        }
        if dense_weights.ncols() != dense_bias.len() || dense_bias.is_empty() {
            return Err(ClassifierError::InvalidModel(format!(
                "dense layer has {} outputs and {} biases",
                dense_weights.ncols(),
                dense_bias.len(),
            )));
        }

        Ok(Self {
            embedding,
            dense_weights,
            dense_bias,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ClassifierError> {
        let weights: EmbeddingBagWeights = serde_json::from_str(text).map_err(|source| ClassifierError::Parse { artifact: "model", source })?;

        Self::new(
            matrix("embedding", weights.embedding)?,
            matrix("dense_weights", weights.dense_weights)?,
            Array1::from(weights.dense_bias),
        )
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = fs::read_to_string(path).map_err(|source| ClassifierError::Io { path: path.to_owned(), source })?;
        let model = Self::from_json(&text)?;

        info!(
            "loaded model from {}: vocabulary {}, embedding dimension {}, {} classes",
            path.display(),
            model.embedding.nrows(),
            model.embedding.ncols(),
            model.num_classes(),
        );

        Ok(model)
    }
}

impl SequenceModel for EmbeddingBagModel {
    fn num_classes(&self) -> usize {
        self.dense_bias.len()
    }

    fn vocabulary_size(&self) -> Option<usize> {
        Some(self.embedding.nrows())
    }

    fn predict(&self, inputs: ArrayView2<'_, i64>) -> Result<Array2<f32>, ClassifierError> {
        let mut pooled = Array2::<f32>::zeros((inputs.nrows(), self.embedding.ncols()));

        for (row, mut pooled_row) in inputs.axis_iter(Axis(0)).zip(pooled.axis_iter_mut(Axis(0))) {
            let mut tokens = 0;
            for index in row.iter().filter(|index| **index != 0) {
                let embedding = usize::try_from(*index)
                    .ok()
                    .filter(|index| *index < self.embedding.nrows())
                    .map(|index| self.embedding.row(index))
                    .ok_or(ClassifierError::IndexOutOfRange(*index))?;
                pooled_row += &embedding;
                tokens += 1;
            }
            if tokens > 0 {
                pooled_row /= tokens as f32;
            }
        }

        let mut scores = pooled.dot(&self.dense_weights) + &self.dense_bias;
        for mut row in scores.axis_iter_mut(Axis(0)) {
            let max = row.fold(f32::NEG_INFINITY, |acc, v| acc.max(*v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row /= sum;
        }

        Ok(scores)
    }
}

fn matrix(name: &str, rows: Vec<Vec<f32>>) -> Result<Array2<f32>, ClassifierError> {
    let columns = rows.first().map(|row| row.len()).unwrap_or(0);
    if rows.iter().any(|row| row.len() != columns) {
        return Err(ClassifierError::InvalidModel(format!("{} has rows of different lengths", name)));
    }

    let shape = (rows.len(), columns);
    Array2::from_shape_vec(shape, rows.into_iter().flatten().collect())
        .map_err(|err| ClassifierError::InvalidModel(format!("{}: {}", name, err)))
}
